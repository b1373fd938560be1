//! Common utilities and shared types for thumbs-up.
//!
//! This crate provides the pieces used by every other thumbs-up crate:
//!
//! - **Configuration**: database and voting settings via [`Config`]
//! - **Error handling**: unified error types via [`AppError`] and [`AppResult`]
//! - **Scoring**: Wilson score lower bound via [`wilson_lower_bound`]
//! - **Statistics**: per-voteable counts and percentages via [`VoteStats`]
//!
//! # Example
//!
//! ```
//! use thumbs_up_common::VoteStats;
//!
//! let stats = VoteStats::new(3, 1);
//! assert_eq!(stats.plusminus(), 2);
//! assert_eq!(stats.percent_for(), 75);
//! ```

pub mod config;
pub mod error;
pub mod score;
pub mod stats;

pub use config::{Config, DatabaseConfig, VoteConfig};
pub use error::{AppError, AppResult};
pub use score::{DEFAULT_CONFIDENCE, normal_quantile, wilson_lower_bound};
pub use stats::VoteStats;

//! Business logic services.

pub mod karma;
pub mod voteable;
pub mod voter;

pub use karma::{KarmaService, KarmaSource, KarmaWeight};
pub use voteable::VoteableService;
pub use voter::VoterService;

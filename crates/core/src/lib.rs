//! Core voting logic for thumbs-up.
//!
//! [`VoteableService`] answers questions about the votes a record received,
//! [`VoterService`] casts and inspects votes on behalf of a voter, and
//! [`KarmaService`] scores owners by the votes their records collected.
//!
//! ```no_run
//! use thumbs_up_common::Config;
//! use thumbs_up_core::Services;
//! use thumbs_up_db::PolymorphicRef;
//!
//! # async fn run() -> thumbs_up_common::AppResult<()> {
//! let config = Config::load()?;
//! let services = Services::connect(&config).await?;
//!
//! let alice = PolymorphicRef::new("User", 1);
//! let post = PolymorphicRef::new("Post", 7);
//! services.voter.vote_for(&alice, &post).await?;
//! let percent = services.voteable.percent_for(&post).await?;
//! # let _ = percent;
//! # Ok(())
//! # }
//! ```

pub mod resolver;
pub mod services;

pub use resolver::{EntityResolver, ResolverRegistry, VoterResolver};
pub use services::*;

use std::sync::Arc;

use thumbs_up_common::{AppResult, Config};
use thumbs_up_db::VoteRepository;

/// Every service, sharing one connection pool and one vote configuration.
#[derive(Clone)]
pub struct Services {
    /// Reads on voteables.
    pub voteable: VoteableService,
    /// Voter operations.
    pub voter: VoterService,
    /// Karma scores.
    pub karma: KarmaService,
}

impl Services {
    /// Build the services over an existing repository.
    #[must_use]
    pub fn new(vote_repo: &VoteRepository, config: &Config) -> Self {
        let voting = Arc::new(config.voting.clone());
        Self {
            voteable: VoteableService::new(vote_repo.clone(), Arc::clone(&voting)),
            voter: VoterService::new(vote_repo.clone(), voting),
            karma: KarmaService::new(vote_repo.clone()),
        }
    }

    /// Connect to the configured database, run migrations and build the
    /// services.
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let db = thumbs_up_db::init(config).await?;
        thumbs_up_db::migrate(&db, config).await?;
        tracing::info!("Vote services ready");
        Ok(Self::new(&VoteRepository::new(Arc::new(db)), config))
    }
}

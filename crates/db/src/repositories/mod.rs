//! Database repositories.

pub mod vote;

pub use vote::{OwnedVoteables, VoteRepository};

//! Library configuration.

use serde::Deserialize;
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Voting configuration.
    #[serde(default)]
    pub voting: VoteConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Voting behaviour shared by every voteable and voter type.
///
/// Loaded once and handed to the query builders and services when they are
/// constructed; nothing re-reads it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VoteConfig {
    /// Name under which a voteable's votes are joined in tally queries.
    ///
    /// Caller-side filters layered on a tally refer to vote columns through
    /// this name, e.g. `votes.created_at`.
    #[serde(default = "default_relationship_name")]
    pub voteable_relationship_name: String,
    /// Name under which a voter's votes are joined in "voted on by" queries.
    #[serde(default = "default_relationship_name")]
    pub voter_relationship_name: String,
    /// Reject a second vote by the same voter on the same voteable.
    #[serde(default = "default_true")]
    pub unique_votes: bool,
}

impl Default for VoteConfig {
    fn default() -> Self {
        Self {
            voteable_relationship_name: default_relationship_name(),
            voter_relationship_name: default_relationship_name(),
            unique_votes: true,
        }
    }
}

impl VoteConfig {
    /// Configuration with custom relationship names.
    #[must_use]
    pub fn with_relationship_names(voteable: &str, voter: &str) -> Self {
        Self {
            voteable_relationship_name: voteable.to_string(),
            voter_relationship_name: voter.to_string(),
            ..Self::default()
        }
    }
}

fn default_relationship_name() -> String {
    "votes".to_string()
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    1
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `THUMBSUP_ENV`)
    /// 4. Environment variables with `THUMBSUP_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("THUMBSUP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("THUMBSUP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        tracing::debug!(
            voteable_relationship = %config.voting.voteable_relationship_name,
            voter_relationship = %config.voting.voter_relationship_name,
            unique_votes = config.voting.unique_votes,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("THUMBSUP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_vote_config_defaults() {
        let config = VoteConfig::default();
        assert_eq!(config.voteable_relationship_name, "votes");
        assert_eq!(config.voter_relationship_name, "votes");
        assert!(config.unique_votes);
    }

    #[test]
    fn test_custom_relationship_names() {
        let config = VoteConfig::with_relationship_names("votes_on", "votes_by");
        assert_eq!(config.voteable_relationship_name, "votes_on");
        assert_eq!(config.voter_relationship_name, "votes_by");
        assert!(config.unique_votes);
    }

    #[test]
    fn test_from_file_with_voting_section() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[database]
url = "postgres://localhost/thumbs_up_test"

[voting]
voteable_relationship_name = "votes_on"
unique_votes = false
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.database.url, "postgres://localhost/thumbs_up_test");
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.voting.voteable_relationship_name, "votes_on");
        assert_eq!(config.voting.voter_relationship_name, "votes");
        assert!(!config.voting.unique_votes);
    }

    #[test]
    fn test_from_file_without_voting_section() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[database]
url = "sqlite::memory:"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.voting, VoteConfig::default());
    }
}

//! # Run Configuration
//!
//! Everything a run needs, loaded from a test-case directory:
//!
//! ```text
//! testcase_<N>/
//! ├── input.txt            groupCount validation coordination moderation threshold
//! │                        followed by groupCount group file paths
//! ├── filtered_words.txt   one word per line
//! ├── groups/group_<id>.txt   user count, then that many user file paths
//! └── users/...            "<timestamp> <text>" lines
//! ```
//!
//! Group and user file paths are relative to the test-case directory.
//! Timing knobs have defaults and can be overridden from `MC_*` variables.

use mc_01_user_feed::FeedConfig;
use mc_02_moderation::{BanPolicy, FilterError, ModerationService, PolicyError, WordFilter};
use mc_03_group_coordinator::CoordinatorConfig;
use shared_types::entities::GroupId;
use shared_types::envelope::Address;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub const INPUT_FILE: &str = "input.txt";
pub const FILTERED_WORDS_FILE: &str = "filtered_words.txt";

pub const ENV_POLL_INTERVAL_MS: &str = "MC_POLL_INTERVAL_MS";
pub const ENV_FEED_GRACE_MS: &str = "MC_FEED_GRACE_MS";
pub const ENV_FEED_THROTTLE_MS: &str = "MC_FEED_THROTTLE_MS";
pub const ENV_REPORT_TIMEOUT_SECS: &str = "MC_REPORT_TIMEOUT_SECS";

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("groupCount is {declared} but {listed} group files are listed")]
    GroupCountMismatch { declared: usize, listed: usize },

    #[error("Channel address {0} is used twice")]
    DuplicateAddress(Address),

    #[error("Group id {0} is used by two group files")]
    DuplicateGroup(GroupId),

    #[error("Filtered words: {0}")]
    Filter(#[from] FilterError),

    #[error("Threshold: {0}")]
    Policy(#[from] PolicyError),
}

/// One group: its id and the user files in user-id order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPlan {
    pub group_id: GroupId,
    pub user_files: Vec<PathBuf>,
}

/// Application-tier timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationConfig {
    /// Overall wait for termination reports.
    pub report_timeout: Duration,
    /// How often finished coordinator tasks are checked for a missing report.
    pub tick: Duration,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            report_timeout: Duration::from_secs(60),
            tick: Duration::from_millis(50),
        }
    }
}

/// Complete run configuration.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub group_count: usize,
    pub validation_address: Address,
    pub coordination_address: Address,
    pub moderation_address: Address,
    pub threshold: u32,
    pub filter: WordFilter,
    pub groups: Vec<GroupPlan>,
    pub coordinator: CoordinatorConfig,
    pub feed: FeedConfig,
    pub aggregation: AggregationConfig,
}

impl RunConfig {
    /// `testcase_<number>` under the current directory.
    #[must_use]
    pub fn test_case_dir(number: u32) -> PathBuf {
        PathBuf::from(format!("testcase_{number}"))
    }

    /// Load and validate a test-case directory.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let input_path = dir.join(INPUT_FILE);
        let input = read(&input_path)?;
        let mut tokens = input.split_whitespace();

        let group_count: usize = next_number(&mut tokens, &input_path, "groupCount")?;
        let validation_address = Address(next_number(&mut tokens, &input_path, "validation address")?);
        let coordination_address =
            Address(next_number(&mut tokens, &input_path, "coordination address")?);
        let moderation_address = Address(next_number(&mut tokens, &input_path, "moderation address")?);
        let threshold: u32 = next_number(&mut tokens, &input_path, "threshold")?;

        let group_files: Vec<&str> = tokens.collect();
        if group_files.len() != group_count {
            return Err(ConfigError::GroupCountMismatch {
                declared: group_count,
                listed: group_files.len(),
            });
        }

        let groups = group_files
            .iter()
            .enumerate()
            .map(|(position, file)| load_group(dir, Path::new(file), position))
            .collect::<Result<Vec<_>, _>>()?;

        let filter = WordFilter::from_list(&read(&dir.join(FILTERED_WORDS_FILE))?)?;

        let config = Self {
            group_count,
            validation_address,
            coordination_address,
            moderation_address,
            threshold,
            filter,
            groups,
            coordinator: CoordinatorConfig::default(),
            feed: FeedConfig::default(),
            aggregation: AggregationConfig::default(),
        };
        config.validate()?;

        info!(
            dir = %dir.display(),
            groups = config.group_count,
            threshold = config.threshold,
            filtered_words = config.filter.len(),
            "Loaded test case"
        );
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        BanPolicy::new(self.threshold)?;

        if self.groups.len() != self.group_count {
            return Err(ConfigError::GroupCountMismatch {
                declared: self.group_count,
                listed: self.groups.len(),
            });
        }

        let mut addresses = HashSet::new();
        for address in [
            self.validation_address,
            self.coordination_address,
            self.moderation_address,
        ] {
            if !addresses.insert(address) {
                return Err(ConfigError::DuplicateAddress(address));
            }
        }

        let mut ids = HashSet::new();
        for plan in &self.groups {
            if !ids.insert(plan.group_id) {
                return Err(ConfigError::DuplicateGroup(plan.group_id));
            }
        }
        Ok(())
    }

    /// Build the moderation service this run uses.
    pub fn moderation_service(&self) -> Result<ModerationService, ConfigError> {
        Ok(ModerationService::new(
            self.filter.clone(),
            BanPolicy::new(self.threshold)?,
        ))
    }

    /// Apply `MC_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup. Unparsable values are ignored
    /// with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(ms) = parse_override(&lookup, ENV_POLL_INTERVAL_MS) {
            self.coordinator.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_override(&lookup, ENV_FEED_GRACE_MS) {
            self.coordinator.feed_grace = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_override(&lookup, ENV_FEED_THROTTLE_MS) {
            self.feed.throttle = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_override(&lookup, ENV_REPORT_TIMEOUT_SECS) {
            self.aggregation.report_timeout = Duration::from_secs(secs);
        }
    }
}

fn parse_override(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => {
            info!(key, value, "Configuration override");
            Some(value)
        }
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparsable override");
            None
        }
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn next_number<'a, T: std::str::FromStr>(
    tokens: &mut impl Iterator<Item = &'a str>,
    path: &Path,
    field: &str,
) -> Result<T, ConfigError> {
    let token = tokens.next().ok_or_else(|| ConfigError::Parse {
        path: path.to_path_buf(),
        reason: format!("missing {field}"),
    })?;
    token.parse().map_err(|_| ConfigError::Parse {
        path: path.to_path_buf(),
        reason: format!("{field} {token:?} is not a valid number"),
    })
}

fn load_group(dir: &Path, file: &Path, position: usize) -> Result<GroupPlan, ConfigError> {
    let path = dir.join(file);
    let contents = read(&path)?;
    let mut tokens = contents.split_whitespace();
    let user_count: usize = next_number(&mut tokens, &path, "user count")?;

    let user_files: Vec<PathBuf> = tokens.map(|t| dir.join(t)).collect();
    if user_files.len() != user_count {
        return Err(ConfigError::Parse {
            path,
            reason: format!(
                "declares {user_count} users but lists {}",
                user_files.len()
            ),
        });
    }

    Ok(GroupPlan {
        group_id: group_id_from_path(file, position),
        user_files,
    })
}

/// The number after the last `_` of the file stem, else the position.
#[must_use]
pub fn group_id_from_path(file: &Path, position: usize) -> GroupId {
    let from_stem = file
        .file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.rsplit_once('_'))
        .and_then(|(_, digits)| digits.parse::<u32>().ok());
    GroupId(from_stem.unwrap_or_else(|| u32::try_from(position).unwrap_or(u32::MAX)))
}

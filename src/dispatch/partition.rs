//! Operating modes and partitioning of input pools into work chunks.
//!
//! A run operates in one of four modes. Submit modes are data-centric: the
//! data pool is the authoritative pool, split into chunks of 30, with
//! accounts chunked by 10 and handed out as reusable vehicles. Audit modes
//! are account-centric: the account pool is authoritative, split into chunks
//! of 3, and no data is required.
//!
//! Partitioning happens once at run start and produces the initial fill for
//! the shared work queues. Chunks are never mutated after creation.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::queue::WorkQueues;

/// Data chunk size for submit (data-centric) modes.
const SUBMIT_DATA_CHUNK: usize = 30;
/// Account chunk size for submit (data-centric) modes.
const SUBMIT_ACCOUNT_CHUNK: usize = 10;
/// Account chunk size for audit (account-centric) modes.
const AUDIT_ACCOUNT_CHUNK: usize = 3;

/// Errors raised while partitioning the input pools.
#[derive(Debug, Error)]
pub enum PartitionError {
    /// A pool the selected mode cannot run without is empty.
    #[error("No {0} found. Cannot continue.")]
    EmptyPool(&'static str),
}

/// Which site family a worker's processing path targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiteVariant {
    Primary,
    Secondary,
}

/// Operating mode for a dispatch run. Fixed for the run's duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Submit data items through accounts on the primary site.
    SubmitPrimary,
    /// Audit account liveness on the primary site.
    AuditPrimary,
    /// Audit account liveness on the secondary site.
    AuditSecondary,
    /// Submit data items through accounts on the secondary site.
    SubmitSecondary,
}

/// Chunk sizing and processing-path configuration resolved from a [`Mode`].
///
/// Keeping the configuration in one record avoids scattering per-mode
/// comparisons through the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeProfile {
    /// Chunk size for the data pool.
    pub data_chunk_size: usize,
    /// Chunk size for the account pool.
    pub account_chunk_size: usize,
    /// Whether the mode consumes data chunks.
    pub requires_data: bool,
    /// Which site family workers drive.
    pub site: SiteVariant,
}

impl Mode {
    /// Resolves a mode from its numeric index (1-4), as used on the CLI.
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(Mode::SubmitPrimary),
            2 => Some(Mode::AuditPrimary),
            3 => Some(Mode::AuditSecondary),
            4 => Some(Mode::SubmitSecondary),
            _ => None,
        }
    }

    /// The mode's numeric index.
    pub fn index(self) -> u8 {
        match self {
            Mode::SubmitPrimary => 1,
            Mode::AuditPrimary => 2,
            Mode::AuditSecondary => 3,
            Mode::SubmitSecondary => 4,
        }
    }

    /// The configuration record for this mode.
    pub fn profile(self) -> ModeProfile {
        match self {
            Mode::SubmitPrimary | Mode::SubmitSecondary => ModeProfile {
                data_chunk_size: SUBMIT_DATA_CHUNK,
                account_chunk_size: SUBMIT_ACCOUNT_CHUNK,
                requires_data: true,
                site: if self == Mode::SubmitPrimary {
                    SiteVariant::Primary
                } else {
                    SiteVariant::Secondary
                },
            },
            Mode::AuditPrimary | Mode::AuditSecondary => ModeProfile {
                data_chunk_size: 0,
                account_chunk_size: AUDIT_ACCOUNT_CHUNK,
                requires_data: false,
                site: if self == Mode::AuditPrimary {
                    SiteVariant::Primary
                } else {
                    SiteVariant::Secondary
                },
            },
        }
    }

    /// Whether the data pool is the authoritative pool for this mode.
    pub fn is_data_centric(self) -> bool {
        self.profile().requires_data
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Mode::SubmitPrimary => "submit-primary",
            Mode::AuditPrimary => "audit-primary",
            Mode::AuditSecondary => "audit-secondary",
            Mode::SubmitSecondary => "submit-secondary",
        };
        write!(f, "{name}")
    }
}

/// Splits a pool into consecutive chunks of at most `size` items.
///
/// Yields `ceil(len / size)` chunks; the last may be shorter. Concatenating
/// the chunks in order reconstructs the pool exactly.
pub fn chunk_items(items: &[String], size: usize) -> Vec<Vec<String>> {
    if size == 0 {
        return Vec::new();
    }
    items.chunks(size).map(<[String]>::to_vec).collect()
}

/// The initial fill for a run's shared queues, plus derived run bounds.
#[derive(Debug)]
pub struct PartitionPlan {
    /// The mode the plan was built for.
    pub mode: Mode,
    /// Proxy pool; a single empty string when no proxies were supplied.
    pub proxies: Vec<String>,
    /// Data chunks, in pool order. Empty in account-centric modes.
    pub data_chunks: Vec<Vec<String>>,
    /// Account chunks; shuffled in data-centric modes.
    pub account_chunks: Vec<Vec<String>>,
    /// Size of the authoritative pool, for progress reporting.
    pub total: u64,
    /// Number of slots the spawn loop will iterate over.
    pub slot_count: usize,
    /// Concurrency ceiling after capping by available chunks.
    pub effective_limit: usize,
}

impl PartitionPlan {
    /// Partitions the three pools for `mode`, capping the configured
    /// concurrency limit by the number of chunks actually available.
    ///
    /// # Errors
    ///
    /// Returns [`PartitionError::EmptyPool`] when the account pool is empty,
    /// or when a data-centric mode has no data. An empty proxy pool is not
    /// fatal; a single empty-string placeholder is substituted.
    pub fn build(
        mode: Mode,
        process_limit: usize,
        proxies: Vec<String>,
        data: Vec<String>,
        accounts: Vec<String>,
    ) -> Result<Self, PartitionError> {
        let profile = mode.profile();

        if accounts.is_empty() {
            return Err(PartitionError::EmptyPool("accounts"));
        }
        if profile.requires_data && data.is_empty() {
            return Err(PartitionError::EmptyPool("data"));
        }

        let proxies = if proxies.is_empty() {
            vec![String::new()]
        } else {
            proxies
        };

        let mut account_chunks = chunk_items(&accounts, profile.account_chunk_size);

        let (data_chunks, total, slot_count) = if profile.requires_data {
            // Account-chunk order is shuffled once per run to avoid
            // correlated proxy/account reuse patterns across runs.
            account_chunks.shuffle(&mut rand::rng());
            let data_chunks = chunk_items(&data, profile.data_chunk_size);
            let slots = data_chunks.len();
            (data_chunks, data.len() as u64, slots)
        } else {
            let slots = account_chunks.len();
            (Vec::new(), accounts.len() as u64, slots)
        };

        // Never spawn more slots than there is work for.
        let effective_limit = process_limit.min(slot_count);

        Ok(Self {
            mode,
            proxies,
            data_chunks,
            account_chunks,
            total,
            slot_count,
            effective_limit,
        })
    }

    /// Pushes every partitioned chunk into the shared queues.
    ///
    /// Must run to completion before any worker slot is spawned.
    pub fn fill_queues(&self, queues: &WorkQueues) {
        queues.proxies.extend(self.proxies.iter().cloned());
        queues.accounts.extend(self.account_chunks.iter().cloned());
        queues.data.extend(self.data_chunks.iter().cloned());
    }
}

//! Safe watchers.
//!
//! - [`SafeWatcher`]: polls one safe and emits transaction events
//! - [`WatcherRegistry`]: owns the watchers of every configured safe
//! - [`SignerDirectory`]: resolves signer addresses to display names

mod error;
mod registry;
mod safe_watcher;
mod signers;

pub use error::WatcherError;
pub use registry::{ApiFactory, ReconcileSummary, UpsertOutcome, WatcherRegistry};
pub use safe_watcher::{JobSchedulerTrait, SafeWatcher, WatchSpec, WatcherStatus};
pub use signers::SignerDirectory;

/*!
 * Durable per-document progress.
 *
 * This module handles:
 * - The progress record and its set invariants (`record`)
 * - Loading, validating and atomically flushing it (`store`)
 * - Per-page partial outputs on disk (`store`)
 * - Where everything lives under the output folder (`layout`)
 * - Single-writer enforcement (`lock`)
 */

pub mod layout;
pub mod lock;
pub mod record;
pub mod store;

pub use layout::StateLayout;
pub use lock::DocumentLock;
pub use record::ProgressRecord;
pub use store::ProgressStore;

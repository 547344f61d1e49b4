/*!
 * Text translation building blocks.
 *
 * - `chunker`: length-bounded splitting of page text
 * - `sanitize`: code-point filtering for the output renderer
 * - `client`: retrying, rate-limited wrapper around a backend
 */

pub use self::client::{Backoff, RetryPolicy, TranslationClient};

pub mod chunker;
pub mod client;
pub mod sanitize;

//! Server side of the quote gate.
//!
//! - Replay cache abstraction with an in-memory (moka) implementation.
//! - Cancellable periodic task that drives the replay sweep.
//! - Quote store abstraction and a file-backed implementation.
//! - [`QuoteGate`], which ties verifier, cache and quotes together.

pub mod cache;
pub mod quotes;
pub mod server;
pub mod sweep;
pub mod time;

pub use cache::{MokaReplayCache, ReplayCache, ReplayCacheError, MIN_TTL};
pub use quotes::{QuoteBook, QuoteError, QuoteStore};
pub use server::{GateError, QuoteGate};
pub use sweep::PeriodicTask;
pub use time::{ManualTimeProvider, SystemTimeProvider, TimeProvider};

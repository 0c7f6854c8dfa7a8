//! Trading signal input and execution
//!
//! Signals arrive from an external producer, pass through the risk gate,
//! and are executed against the ledger with guaranteed-fill semantics.

mod executor;
mod types;

pub use executor::SignalExecutor;
pub use types::Signal;

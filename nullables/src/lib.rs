//! Nullable infrastructure for deterministic testing.
//!
//! External influences on an allocation (wall-clock time, change
//! notifications) are abstracted behind traits or callbacks. This crate
//! provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Record what happened for later assertions

pub mod clock;
pub mod recorder;

pub use clock::NullClock;
pub use recorder::EventRecorder;

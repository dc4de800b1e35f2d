//! `wasitrace-hostapi` — the tracing surface a virtual machine drives.
//!
//! This crate defines what the engine sees of a tracer:
//!
//! - `Hooks` — one optional callback per event kind; an absent callback means
//!   the tracer does not implement that event at all
//! - Native event parameter types (`ChainConfig`, `GasChangeReason`, `OpContext`)
//! - `TraceEvent` — an owned event that can be replayed through `Hooks`
//! - `LiveDirectory` — the process-wide registry of tracer constructors by name
//!
//! It knows nothing about sandboxes; `wasitrace-sandbox` builds `Hooks` on
//! top of a WASM guest.

pub mod error;
pub mod types;
pub mod hooks;
pub mod event;
pub mod directory;

// Re-export commonly used types at the crate root.
pub use error::DirectoryError;
pub use types::{Address, ChainConfig, GasChangeReason, OpContext, StaticOpContext, U256};
pub use hooks::Hooks;
pub use event::TraceEvent;
pub use directory::{LiveDirectory, TracerConstructor};

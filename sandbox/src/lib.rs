//! `wasitrace-sandbox` — forwards VM trace events to a WASI preview 1 guest.
//!
//! A tracer plugin is a WebAssembly module that exports one function per
//! trace event it cares about. This crate loads it inside Wasmtime and turns
//! it into the engine's [`Hooks`]:
//!
//! - **Capability discovery:** hooks the guest does not export are never
//!   installed, so the engine pays nothing for them
//! - **Allocation bridge:** each event is protobuf-encoded, copied into guest
//!   memory through the guest allocator, handed to the hook as `(ptr, len)`,
//!   and released exactly once
//! - **ABI validation:** `memory`, `malloc`, `free` and `onBlockchainInit` are
//!   checked before instantiation
//! - **Fatal forwarding errors:** a failure inside an installed hook aborts
//!   the trace session
//!
//! The entry points are [`new_hooks`] and, through a [`LiveDirectory`],
//! [`register`].

pub mod error;
pub mod config;
pub mod validation;
pub mod capabilities;
pub mod memory;
pub mod message;
pub mod runtime;
pub mod dispatch;

pub use capabilities::{Capabilities, HookTable};
pub use config::TracerConfig;
pub use dispatch::{new_hooks, TracerHandle};
pub use error::{BridgeError, SetupError};
pub use runtime::WasiTracer;

use wasitrace_hostapi::{Hooks, LiveDirectory};

/// Name the bridge is registered under.
pub const TRACER_NAME: &str = "wasip1";

/// Register the bridge in `directory` under [`TRACER_NAME`].
pub fn register(directory: &LiveDirectory) {
    directory.register(TRACER_NAME, construct);
}

fn construct(config: &serde_json::Value) -> anyhow::Result<Hooks> {
    let config = TracerConfig::from_value(config)?;
    Ok(new_hooks(&config)?)
}

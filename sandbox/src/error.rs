//! Bridge error types.
//!
//! Two tiers: [`SetupError`] is returned while building a tracer and the
//! caller may decide to run without tracing. [`BridgeError`] is raised while
//! forwarding an event; hook adapters treat it as fatal for the trace session.

use std::path::PathBuf;

use wasitrace_primitives::EventKind;

/// Failure while configuring, compiling or instantiating the guest.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// The JSON config record could not be parsed.
    #[error("unmarshalling config: {0}")]
    Config(#[from] serde_json::Error),

    /// The guest module file could not be read.
    #[error("reading WASM file {}: {source}", path.display())]
    ReadModule {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Wasmtime engine, compilation, linking or instantiation error.
    #[error("wasmtime error: {0:#}")]
    Wasmtime(#[from] anyhow::Error),

    /// A mandatory export is absent from the compiled module.
    #[error("missing required export '{0}'")]
    MissingExport(&'static str),

    /// An export exists but does not have the shape the ABI requires.
    #[error("export '{name}' is invalid: {reason}")]
    InvalidExport { name: String, reason: String },

    /// An export listed by the compiled module did not resolve on the instance.
    #[error("export '{0}' listed by the module is missing from the instance")]
    UnresolvedExport(&'static str),

    /// The guest start routine trapped.
    #[error("start routine failed: {0:#}")]
    StartFailed(anyhow::Error),
}

/// Failure while forwarding one event to the guest.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The event message could not be serialized.
    #[error("marshalling message: {0}")]
    Encode(#[from] prost::EncodeError),

    /// The guest allocator trapped or returned no usable pointer.
    #[error("allocation of {len} bytes failed within runtime allocator: {reason}")]
    AllocationFailed { len: usize, reason: String },

    /// The payload does not fit in guest memory at the allocated pointer.
    #[error(
        "memory write at offset {offset} with size {len} out of range of memory size {memory_size}"
    )]
    OutOfBounds {
        offset: u64,
        len: usize,
        memory_size: usize,
    },

    /// The guest hook function trapped.
    #[error("calling function '{function}': {source:#}")]
    CallFailed {
        function: String,
        #[source]
        source: anyhow::Error,
    },

    /// The guest deallocator trapped.
    #[error("releasing allocation at {ptr}: {source:#}")]
    ReleaseFailed {
        ptr: u64,
        #[source]
        source: anyhow::Error,
    },

    /// The guest does not export a hook for this event.
    #[error("no guest export registered for {0}")]
    NotRegistered(EventKind),

    /// The tracer was closed before the event arrived.
    #[error("tracer is closed")]
    Closed,
}

//! `wasitrace-guest` — reference tracer plugin for the wasip1 bridge.
//!
//! This crate compiles to a `.wasm` reactor that exports every hook the
//! bridge knows about:
//!
//! - `onBlockchainInit` — chain configuration, once per session (mandatory)
//! - `onEnter` / `onExit` — call frame boundaries
//! - `onOpcode` / `onFault` — per-instruction steps and failures
//! - `onGasChange` — gas accounting changes
//!
//! Each hook receives `(ptr, len)` of a protobuf payload in its own linear
//! memory, decodes it, and prints one line to stdout. The payload buffer is
//! owned by the host, which frees it through the exported `free` after the
//! hook returns; hooks must not keep it.
//!
//! `malloc` and `free` come from wasi-libc and are exported by `build.rs`.
//!
//! Build with: `cargo build -p wasitrace-guest --release --target wasm32-wasip1`

mod format;
mod exports;

pub use exports::{onBlockchainInit, onEnter, onExit, onFault, onGasChange, onOpcode};

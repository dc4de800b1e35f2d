//! Shared test helpers for integration tests.
//!
//! Provides a WAT guest generator with observable globals, temporary guest
//! files, logging setup and tracer factory functions used across all
//! integration test files.

#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

use wasitrace_primitives::EventKind;
use wasitrace_sandbox::{TracerConfig, WasiTracer};

/// Reference guest artifact (relative to sandbox crate manifest dir).
pub const REFERENCE_GUEST: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../target/wasm32-wasip1/release/wasitrace_guest.wasm"
);

/// Every hook the guest ABI defines.
pub const ALL_HOOKS: [EventKind; EventKind::COUNT] = EventKind::ALL;

// ── Logging ──

/// Route `tracing` output to the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ── Guest Generation ──

/// Per-hook id folded into the `trace` global: `trace = trace * 16 + id`.
pub fn hook_id(kind: EventKind) -> i32 {
    kind.index() as i32 + 1
}

/// Expected `trace` value after the given hooks ran in order.
pub fn trace_of(kinds: &[EventKind]) -> i32 {
    kinds
        .iter()
        .fold(0i32, |acc, kind| acc.wrapping_mul(16).wrapping_add(hook_id(*kind)))
}

/// Build a guest exporting the given hooks.
///
/// The guest uses a bump allocator starting at 1024 that never reuses
/// memory, so the last payload stays readable after it is freed. Exported
/// globals: `allocs`, `frees`, `last_freed`, `last_ptr`, `last_len`,
/// `calls`, `trace`.
pub fn guest_wat(kinds: &[EventKind]) -> String {
    GuestBuilder::new(kinds).build()
}

/// Guest construction knobs beyond the hook set.
pub struct GuestBuilder {
    kinds: Vec<EventKind>,
    trapping: Option<EventKind>,
    malloc_body: Option<String>,
    free_traps: bool,
    pages: u32,
}

impl GuestBuilder {
    pub fn new(kinds: &[EventKind]) -> Self {
        Self {
            kinds: kinds.to_vec(),
            trapping: None,
            malloc_body: None,
            free_traps: false,
            pages: 1,
        }
    }

    /// Make the hook for `kind` trap after recording its call.
    pub fn trapping(mut self, kind: EventKind) -> Self {
        self.trapping = Some(kind);
        self
    }

    /// Replace the allocator body; `$size` is the requested length.
    pub fn malloc_body(mut self, body: &str) -> Self {
        self.malloc_body = Some(body.to_string());
        self
    }

    /// Make the deallocator trap after recording its call.
    pub fn free_traps(mut self) -> Self {
        self.free_traps = true;
        self
    }

    pub fn pages(mut self, pages: u32) -> Self {
        self.pages = pages;
        self
    }

    pub fn build(&self) -> String {
        let malloc_body = self.malloc_body.clone().unwrap_or_else(|| {
            "(local.set $ptr (global.get $bump))
             (global.set $bump (i32.add (global.get $bump) (local.get $size)))
             (local.get $ptr)"
                .to_string()
        });
        let free_tail = if self.free_traps { "unreachable" } else { "" };

        let mut hooks = String::new();
        for kind in &self.kinds {
            let tail = if self.trapping == Some(*kind) {
                "unreachable"
            } else {
                ""
            };
            hooks.push_str(&format!(
                r#"
            (func (export "{name}") (param $ptr i32) (param $len i32)
                (global.set $last_ptr (local.get $ptr))
                (global.set $last_len (local.get $len))
                (global.set $calls (i32.add (global.get $calls) (i32.const 1)))
                (global.set $trace
                    (i32.add (i32.mul (global.get $trace) (i32.const 16)) (i32.const {id})))
                {tail})"#,
                name = kind.export_name(),
                id = hook_id(*kind),
            ));
        }

        format!(
            r#"
        (module
            (memory (export "memory") {pages})
            (global $bump (mut i32) (i32.const 1024))
            (global $allocs (export "allocs") (mut i32) (i32.const 0))
            (global $frees (export "frees") (mut i32) (i32.const 0))
            (global $last_freed (export "last_freed") (mut i32) (i32.const -1))
            (global $last_ptr (export "last_ptr") (mut i32) (i32.const 0))
            (global $last_len (export "last_len") (mut i32) (i32.const 0))
            (global $calls (export "calls") (mut i32) (i32.const 0))
            (global $trace (export "trace") (mut i32) (i32.const 0))
            (func (export "malloc") (param $size i32) (result i32)
                (local $ptr i32)
                (global.set $allocs (i32.add (global.get $allocs) (i32.const 1)))
                {malloc_body})
            (func (export "free") (param $ptr i32)
                (global.set $frees (i32.add (global.get $frees) (i32.const 1)))
                (global.set $last_freed (local.get $ptr))
                {free_tail})
            {hooks}
        )
    "#,
            pages = self.pages,
        )
    }
}

// ── Tracer Factories ──

/// Write a guest to a temporary file the tracer config can point at.
pub fn write_guest(wat: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".wat")
        .tempfile()
        .expect("failed to create temp guest");
    file.write_all(wat.as_bytes()).expect("failed to write temp guest");
    file
}

pub fn config_for(file: &NamedTempFile) -> TracerConfig {
    TracerConfig::new(file.path())
}

/// Set up a tracer exporting the given hooks.
pub fn load_tracer(kinds: &[EventKind]) -> WasiTracer {
    init_logging();
    WasiTracer::from_bytes(guest_wat(kinds).as_bytes()).expect("failed to set up tracer")
}

// ── Guest Observation ──

pub fn global_i32(tracer: &mut WasiTracer, name: &str) -> i32 {
    tracer
        .guest_global(name)
        .and_then(|v| v.i32())
        .unwrap_or_else(|| panic!("guest global '{name}' missing"))
}

/// The payload the guest saw in its most recent hook call.
pub fn last_payload(tracer: &mut WasiTracer) -> Vec<u8> {
    let ptr = global_i32(tracer, "last_ptr") as u32 as u64;
    let len = global_i32(tracer, "last_len") as usize;
    tracer.read_memory(ptr, len).expect("payload out of range")
}

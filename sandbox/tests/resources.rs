//! Allocation accounting and failure-path tests.
//!
//! Every forwarded event allocates exactly once and frees exactly once,
//! whatever happens in between. Failures inside installed hooks are fatal.

mod common;

use wasitrace_hostapi::{Address, GasChangeReason, U256};
use wasitrace_primitives::EventKind;
use wasitrace_sandbox::{message, BridgeError, TracerHandle, WasiTracer};

use common::*;

const INIT_AND_GAS: [EventKind; 2] = [EventKind::BlockchainInit, EventKind::GasChange];

fn load(builder: GuestBuilder) -> WasiTracer {
    init_logging();
    WasiTracer::from_bytes(builder.build().as_bytes()).expect("failed to set up tracer")
}

fn gas_change(tracer: &mut WasiTracer) -> Result<(), BridgeError> {
    let msg = message::gas_change(100, 80, GasChangeReason::CallOpCode);
    tracer.forward(EventKind::GasChange, &msg)
}

// ── Test: balanced accounting ──

#[test]
fn test_allocations_balanced() {
    let mut tracer = load_tracer(&INIT_AND_GAS);

    for i in 0..100u64 {
        let msg = message::gas_change(1000 - i, 999 - i, GasChangeReason::CallOpCode);
        tracer.forward(EventKind::GasChange, &msg).unwrap();
    }

    assert_eq!(global_i32(&mut tracer, "calls"), 100);
    assert_eq!(global_i32(&mut tracer, "allocs"), 100);
    assert_eq!(global_i32(&mut tracer, "frees"), 100);
}

#[test]
fn test_frees_the_pointer_the_hook_received() {
    let mut tracer = load_tracer(&INIT_AND_GAS);
    gas_change(&mut tracer).unwrap();

    let last_ptr = global_i32(&mut tracer, "last_ptr");
    assert_eq!(global_i32(&mut tracer, "last_freed"), last_ptr);
    assert_eq!(global_i32(&mut tracer, "last_len"), 6);
}

#[test]
fn test_empty_payload() {
    let mut tracer = load_tracer(&INIT_AND_GAS);
    let msg = message::gas_change(0, 0, GasChangeReason::Unspecified);

    tracer.forward(EventKind::GasChange, &msg).unwrap();

    assert_eq!(global_i32(&mut tracer, "last_len"), 0);
    assert_eq!(global_i32(&mut tracer, "frees"), 1);
}

// ── Test: bounds ──

#[test]
fn test_out_of_bounds_allocation_is_released() {
    let mut tracer = load(
        GuestBuilder::new(&[EventKind::BlockchainInit, EventKind::Enter])
            .malloc_body("(i32.const 65530)"),
    );
    let msg = message::enter(
        0,
        0xF1,
        &Address::zero(),
        &Address::zero(),
        &[0u8; 64],
        0,
        Some(U256::from(1)),
    );

    match tracer.forward(EventKind::Enter, &msg) {
        Err(BridgeError::OutOfBounds {
            offset,
            memory_size,
            ..
        }) => {
            assert_eq!(offset, 65530);
            assert_eq!(memory_size, 65536);
        }
        Err(e) => panic!("expected OutOfBounds, got: {:?}", e),
        Ok(_) => panic!("payload past the end of memory should fail"),
    }

    assert_eq!(global_i32(&mut tracer, "calls"), 0, "hook must not run");
    assert_eq!(global_i32(&mut tracer, "frees"), 1);
    assert_eq!(global_i32(&mut tracer, "last_freed"), 65530);
}

#[test]
fn test_payload_ending_at_memory_end() {
    // 6-byte payload at 65530 ends exactly at the 64 KiB boundary.
    let mut tracer = load(GuestBuilder::new(&INIT_AND_GAS).malloc_body("(i32.const 65530)"));
    gas_change(&mut tracer).unwrap();
    assert_eq!(global_i32(&mut tracer, "calls"), 1);
}

// ── Test: allocator failures ──

#[test]
fn test_null_allocation() {
    let mut tracer = load(GuestBuilder::new(&INIT_AND_GAS).malloc_body("(i32.const 0)"));

    match gas_change(&mut tracer) {
        Err(BridgeError::AllocationFailed { len, .. }) => assert_eq!(len, 6),
        Err(e) => panic!("expected AllocationFailed, got: {:?}", e),
        Ok(_) => panic!("null pointer should fail"),
    }
    assert_eq!(global_i32(&mut tracer, "frees"), 0);
    assert_eq!(global_i32(&mut tracer, "calls"), 0);
}

#[test]
fn test_allocator_trap() {
    let mut tracer = load(GuestBuilder::new(&INIT_AND_GAS).malloc_body("unreachable"));
    let result = gas_change(&mut tracer);
    assert!(matches!(result, Err(BridgeError::AllocationFailed { .. })));
    assert_eq!(global_i32(&mut tracer, "calls"), 0);
}

// ── Test: hook and deallocator traps ──

#[test]
fn test_trapping_hook_still_frees() {
    let mut tracer = load(GuestBuilder::new(&INIT_AND_GAS).trapping(EventKind::GasChange));

    match gas_change(&mut tracer) {
        Err(BridgeError::CallFailed { function, .. }) => assert_eq!(function, "onGasChange"),
        Err(e) => panic!("expected CallFailed, got: {:?}", e),
        Ok(_) => panic!("trapping hook should fail"),
    }
    assert_eq!(global_i32(&mut tracer, "allocs"), 1);
    assert_eq!(global_i32(&mut tracer, "frees"), 1);
}

#[test]
fn test_release_failure_reported() {
    let mut tracer = load(GuestBuilder::new(&INIT_AND_GAS).free_traps());

    let result = gas_change(&mut tracer);
    assert!(matches!(result, Err(BridgeError::ReleaseFailed { .. })));
    assert_eq!(global_i32(&mut tracer, "calls"), 1);
}

#[test]
fn test_call_failure_takes_precedence() {
    let mut tracer = load(
        GuestBuilder::new(&INIT_AND_GAS)
            .trapping(EventKind::GasChange)
            .free_traps(),
    );

    let result = gas_change(&mut tracer);
    assert!(matches!(result, Err(BridgeError::CallFailed { .. })));
    assert_eq!(global_i32(&mut tracer, "frees"), 1);
}

#[test]
#[should_panic(expected = "calling function 'onGasChange'")]
fn test_trapping_hook_is_fatal() {
    let handle = TracerHandle::new(load(
        GuestBuilder::new(&INIT_AND_GAS).trapping(EventKind::GasChange),
    ));
    let mut hooks = handle.hooks();
    hooks.gas_change(100, 80, GasChangeReason::CallOpCode);
}

// ── Test: 64-bit guest ABI ──

#[test]
fn test_i64_guest() {
    let wat = r#"
        (module
            (memory (export "memory") 1)
            (global $bump (mut i64) (i64.const 2048))
            (global $frees (export "frees") (mut i32) (i32.const 0))
            (global $last_len (export "last_len") (mut i64) (i64.const 0))
            (func (export "malloc") (param $size i64) (result i64)
                (local $ptr i64)
                (local.set $ptr (global.get $bump))
                (global.set $bump (i64.add (global.get $bump) (local.get $size)))
                (local.get $ptr))
            (func (export "free") (param i64)
                (global.set $frees (i32.add (global.get $frees) (i32.const 1))))
            (func (export "onBlockchainInit") (param i64 i64))
            (func (export "onGasChange") (param $ptr i64) (param $len i64)
                (global.set $last_len (local.get $len)))
        )
    "#;
    init_logging();
    let mut tracer = WasiTracer::from_bytes(wat.as_bytes()).unwrap();

    gas_change(&mut tracer).unwrap();

    assert_eq!(tracer.guest_global("last_len").and_then(|v| v.i64()), Some(6));
    assert_eq!(global_i32(&mut tracer, "frees"), 1);
}

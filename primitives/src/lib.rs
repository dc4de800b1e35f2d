//! `wasitrace-primitives` — shared types for the wasitrace host and guests.
//!
//! This crate provides the guest ABI (event kinds, export names) and the
//! protobuf messages carried across the sandbox boundary for every trace
//! event, together with the encode/decode entry points used on both sides.
//!
//! Supports `#![no_std]` for guest compatibility (use `default-features = false`).

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod abi;
pub mod bigint;
pub mod codec;
pub mod messages;

// Re-export commonly used types at the crate root for convenience.
pub use abi::{EventKind, ALLOCATOR_EXPORT, DEALLOCATOR_EXPORT, MEMORY_EXPORT, START_FUNCTION};
pub use codec::{decode, encode};
pub use messages::{
    BigInt, ChainConfig, OnBlockchainInitMessage, OnEnterMessage, OnExitMessage,
    OnFaultMessage, OnGasChangeMessage, OnOpcodeMessage,
};

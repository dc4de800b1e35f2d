//! Guest exported hook functions.
//!
//! All hooks take `(ptr, len)` and return nothing. A payload that fails to
//! decode is reported on stderr and the event is skipped; hooks never
//! panic, since a trap aborts the host's trace session.

#![allow(non_snake_case)]

use wasitrace_primitives::{
    decode, OnBlockchainInitMessage, OnEnterMessage, OnExitMessage, OnFaultMessage,
    OnGasChangeMessage, OnOpcodeMessage,
};

use crate::format;

/// Borrow the host-written payload.
///
/// # Safety
/// `ptr..ptr + len` must be a live allocation in this module's memory for
/// the duration of the hook call.
unsafe fn payload<'a>(ptr: u32, len: u32) -> &'a [u8] {
    if len == 0 {
        return &[];
    }
    core::slice::from_raw_parts(ptr as *const u8, len as usize)
}

fn decode_payload<M: prost::Message + Default>(hook: &str, ptr: u32, len: u32) -> Option<M> {
    let bytes = unsafe { payload(ptr, len) };
    match decode::<M>(bytes) {
        Ok(msg) => Some(msg),
        Err(err) => {
            eprintln!("{hook}: undecodable payload ({len} bytes): {err}");
            None
        }
    }
}

#[no_mangle]
pub extern "C" fn onBlockchainInit(ptr: u32, len: u32) {
    if let Some(msg) = decode_payload::<OnBlockchainInitMessage>("onBlockchainInit", ptr, len) {
        println!("{}", format::blockchain_init(&msg));
    }
}

#[no_mangle]
pub extern "C" fn onEnter(ptr: u32, len: u32) {
    if let Some(msg) = decode_payload::<OnEnterMessage>("onEnter", ptr, len) {
        println!("{}", format::enter(&msg));
    }
}

#[no_mangle]
pub extern "C" fn onExit(ptr: u32, len: u32) {
    if let Some(msg) = decode_payload::<OnExitMessage>("onExit", ptr, len) {
        println!("{}", format::exit(&msg));
    }
}

#[no_mangle]
pub extern "C" fn onOpcode(ptr: u32, len: u32) {
    if let Some(msg) = decode_payload::<OnOpcodeMessage>("onOpcode", ptr, len) {
        println!("{}", format::opcode(&msg));
    }
}

#[no_mangle]
pub extern "C" fn onFault(ptr: u32, len: u32) {
    if let Some(msg) = decode_payload::<OnFaultMessage>("onFault", ptr, len) {
        println!("{}", format::fault(&msg));
    }
}

#[no_mangle]
pub extern "C" fn onGasChange(ptr: u32, len: u32) {
    if let Some(msg) = decode_payload::<OnGasChangeMessage>("onGasChange", ptr, len) {
        println!("{}", format::gas_change(&msg));
    }
}

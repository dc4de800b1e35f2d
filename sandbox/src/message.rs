//! Native event parameters → wire messages.
//!
//! Field-for-field conversion: addresses become their raw 20 bytes, 256-bit
//! integers become minimal big-endian `BigInt`s, and an execution error
//! becomes its display text (absent when there was no error).

use std::error::Error;

use wasitrace_hostapi::{Address, ChainConfig, GasChangeReason, U256};
use wasitrace_primitives::{
    messages, BigInt, OnBlockchainInitMessage, OnEnterMessage, OnExitMessage, OnFaultMessage,
    OnGasChangeMessage, OnOpcodeMessage,
};

/// Minimal big-endian encoding of a `U256`.
pub fn big_int(value: &U256) -> BigInt {
    // `U256::byte` indexes little-endian.
    let be: Vec<u8> = (0..32).rev().map(|i| value.byte(i)).collect();
    BigInt::from_be_bytes(&be)
}

fn opt_big_int(value: &Option<U256>) -> Option<BigInt> {
    value.as_ref().map(big_int)
}

/// Display text of an execution error.
pub fn error_text(err: Option<&dyn Error>) -> Option<String> {
    err.map(|e| e.to_string())
}

fn address_bytes(address: &Address) -> Vec<u8> {
    address.as_bytes().to_vec()
}

/// Opcode and fault messages carry depth as `int32`.
fn depth_i32(depth: usize) -> i32 {
    i32::try_from(depth).unwrap_or(i32::MAX)
}

fn depth_i64(depth: usize) -> i64 {
    i64::try_from(depth).unwrap_or(i64::MAX)
}

pub fn chain_config(config: &ChainConfig) -> messages::ChainConfig {
    messages::ChainConfig {
        chain_id: opt_big_int(&config.chain_id),
        homestead_block: opt_big_int(&config.homestead_block),
        dao_fork_block: opt_big_int(&config.dao_fork_block),
        dao_fork_support: config.dao_fork_support,
        eip150_block: opt_big_int(&config.eip150_block),
        eip155_block: opt_big_int(&config.eip155_block),
        eip158_block: opt_big_int(&config.eip158_block),
        byzantium_block: opt_big_int(&config.byzantium_block),
        constantinople_block: opt_big_int(&config.constantinople_block),
        petersburg_block: opt_big_int(&config.petersburg_block),
        istanbul_block: opt_big_int(&config.istanbul_block),
        muir_glacier_block: opt_big_int(&config.muir_glacier_block),
        berlin_block: opt_big_int(&config.berlin_block),
        london_block: opt_big_int(&config.london_block),
        arrow_glacier_block: opt_big_int(&config.arrow_glacier_block),
        gray_glacier_block: opt_big_int(&config.gray_glacier_block),
        merge_netsplit_block: opt_big_int(&config.merge_netsplit_block),
        shanghai_time: config.shanghai_time,
        cancun_time: config.cancun_time,
        prague_time: config.prague_time,
        verkle_time: config.verkle_time,
        terminal_total_difficulty: opt_big_int(&config.terminal_total_difficulty),
        terminal_total_difficulty_passed: config.terminal_total_difficulty_passed,
    }
}

pub fn blockchain_init(config: &ChainConfig) -> OnBlockchainInitMessage {
    OnBlockchainInitMessage {
        chain_config: Some(chain_config(config)),
    }
}

pub fn enter(
    depth: usize,
    typ: u8,
    from: &Address,
    to: &Address,
    input: &[u8],
    gas: u64,
    value: Option<U256>,
) -> OnEnterMessage {
    OnEnterMessage {
        depth: depth_i64(depth),
        op_code: u64::from(typ),
        from: address_bytes(from),
        to: address_bytes(to),
        input: input.to_vec(),
        gas,
        value: opt_big_int(&value),
    }
}

pub fn exit(
    depth: usize,
    output: &[u8],
    gas_used: u64,
    err: Option<&dyn Error>,
    reverted: bool,
) -> OnExitMessage {
    OnExitMessage {
        depth: depth_i64(depth),
        output: output.to_vec(),
        gas_used,
        error: error_text(err),
        reverted,
    }
}

pub fn opcode(
    pc: u64,
    op: u8,
    gas: u64,
    cost: u64,
    r_data: &[u8],
    depth: usize,
    err: Option<&dyn Error>,
) -> OnOpcodeMessage {
    OnOpcodeMessage {
        pc,
        op_code: u64::from(op),
        gas,
        cost,
        r_data: r_data.to_vec(),
        depth: depth_i32(depth),
        error: error_text(err),
    }
}

pub fn fault(
    pc: u64,
    op: u8,
    gas: u64,
    cost: u64,
    depth: usize,
    err: Option<&dyn Error>,
) -> OnFaultMessage {
    OnFaultMessage {
        pc,
        op_code: u64::from(op),
        gas,
        cost,
        depth: depth_i32(depth),
        error: error_text(err),
    }
}

pub fn gas_change(old: u64, new: u64, reason: GasChangeReason) -> OnGasChangeMessage {
    OnGasChangeMessage {
        old,
        new,
        reason: u64::from(reason.as_u8()),
    }
}

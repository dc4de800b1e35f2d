//! Protobuf messages carried across the sandbox boundary, one per event kind.
//!
//! Field tags are part of the guest ABI: a guest decodes these payloads with
//! any protobuf implementation, so tags must never be renumbered.

use alloc::string::String;
use alloc::vec::Vec;

/// Arbitrary-precision non-negative integer as minimal big-endian bytes.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct BigInt {
    #[prost(bytes = "vec", tag = "1")]
    pub value: Vec<u8>,
}

/// Chain fork schedule delivered with `onBlockchainInit`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChainConfig {
    #[prost(message, optional, tag = "1")]
    pub chain_id: Option<BigInt>,
    #[prost(message, optional, tag = "2")]
    pub homestead_block: Option<BigInt>,
    #[prost(message, optional, tag = "3")]
    pub dao_fork_block: Option<BigInt>,
    #[prost(bool, tag = "4")]
    pub dao_fork_support: bool,
    #[prost(message, optional, tag = "5")]
    pub eip150_block: Option<BigInt>,
    #[prost(message, optional, tag = "6")]
    pub eip155_block: Option<BigInt>,
    #[prost(message, optional, tag = "7")]
    pub eip158_block: Option<BigInt>,
    #[prost(message, optional, tag = "8")]
    pub byzantium_block: Option<BigInt>,
    #[prost(message, optional, tag = "9")]
    pub constantinople_block: Option<BigInt>,
    #[prost(message, optional, tag = "10")]
    pub petersburg_block: Option<BigInt>,
    #[prost(message, optional, tag = "11")]
    pub istanbul_block: Option<BigInt>,
    #[prost(message, optional, tag = "12")]
    pub muir_glacier_block: Option<BigInt>,
    #[prost(message, optional, tag = "13")]
    pub berlin_block: Option<BigInt>,
    #[prost(message, optional, tag = "14")]
    pub london_block: Option<BigInt>,
    #[prost(message, optional, tag = "15")]
    pub arrow_glacier_block: Option<BigInt>,
    #[prost(message, optional, tag = "16")]
    pub gray_glacier_block: Option<BigInt>,
    #[prost(message, optional, tag = "17")]
    pub merge_netsplit_block: Option<BigInt>,
    #[prost(uint64, optional, tag = "18")]
    pub shanghai_time: Option<u64>,
    #[prost(uint64, optional, tag = "19")]
    pub cancun_time: Option<u64>,
    #[prost(uint64, optional, tag = "20")]
    pub prague_time: Option<u64>,
    #[prost(uint64, optional, tag = "21")]
    pub verkle_time: Option<u64>,
    #[prost(message, optional, tag = "22")]
    pub terminal_total_difficulty: Option<BigInt>,
    #[prost(bool, tag = "23")]
    pub terminal_total_difficulty_passed: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OnBlockchainInitMessage {
    #[prost(message, optional, tag = "1")]
    pub chain_config: Option<ChainConfig>,
}

/// Call frame entry.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OnEnterMessage {
    #[prost(int64, tag = "1")]
    pub depth: i64,
    /// Call type opcode (CALL, CREATE, ...).
    #[prost(uint64, tag = "2")]
    pub op_code: u64,
    #[prost(bytes = "vec", tag = "3")]
    pub from: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub to: Vec<u8>,
    #[prost(bytes = "vec", tag = "5")]
    pub input: Vec<u8>,
    #[prost(uint64, tag = "6")]
    pub gas: u64,
    #[prost(message, optional, tag = "7")]
    pub value: Option<BigInt>,
}

/// Call frame exit.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OnExitMessage {
    #[prost(int64, tag = "1")]
    pub depth: i64,
    #[prost(bytes = "vec", tag = "2")]
    pub output: Vec<u8>,
    #[prost(uint64, tag = "3")]
    pub gas_used: u64,
    /// Display text of the execution error, absent on success.
    #[prost(string, optional, tag = "4")]
    pub error: Option<String>,
    #[prost(bool, tag = "5")]
    pub reverted: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OnOpcodeMessage {
    #[prost(uint64, tag = "1")]
    pub pc: u64,
    #[prost(uint64, tag = "2")]
    pub op_code: u64,
    #[prost(uint64, tag = "3")]
    pub gas: u64,
    #[prost(uint64, tag = "4")]
    pub cost: u64,
    /// Return data of the previous call.
    #[prost(bytes = "vec", tag = "5")]
    pub r_data: Vec<u8>,
    #[prost(int32, tag = "6")]
    pub depth: i32,
    #[prost(string, optional, tag = "7")]
    pub error: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OnFaultMessage {
    #[prost(uint64, tag = "1")]
    pub pc: u64,
    #[prost(uint64, tag = "2")]
    pub op_code: u64,
    #[prost(uint64, tag = "3")]
    pub gas: u64,
    #[prost(uint64, tag = "4")]
    pub cost: u64,
    #[prost(int32, tag = "5")]
    pub depth: i32,
    #[prost(string, optional, tag = "6")]
    pub error: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OnGasChangeMessage {
    #[prost(uint64, tag = "1")]
    pub old: u64,
    #[prost(uint64, tag = "2")]
    pub new: u64,
    #[prost(uint64, tag = "3")]
    pub reason: u64,
}

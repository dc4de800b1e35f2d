//! One-line renderings of decoded events.

use std::fmt::Write;

use wasitrace_primitives::{
    BigInt, OnBlockchainInitMessage, OnEnterMessage, OnExitMessage, OnFaultMessage,
    OnGasChangeMessage, OnOpcodeMessage,
};

/// `0x`-prefixed lowercase hex.
pub fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// Decimal when the value fits a `u64`, hex otherwise.
pub fn big_int(value: Option<&BigInt>) -> String {
    match value {
        None => "-".to_string(),
        Some(v) => match v.to_u64() {
            Some(n) => n.to_string(),
            None => hex(&v.value),
        },
    }
}

fn error(err: Option<&str>) -> String {
    err.map(|e| format!(" error=\"{e}\"")).unwrap_or_default()
}

pub fn blockchain_init(msg: &OnBlockchainInitMessage) -> String {
    match &msg.chain_config {
        Some(config) => format!(
            "init chain_id={} london={} shanghai={}",
            big_int(config.chain_id.as_ref()),
            big_int(config.london_block.as_ref()),
            config
                .shanghai_time
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".into()),
        ),
        None => "init chain_config=-".to_string(),
    }
}

pub fn enter(msg: &OnEnterMessage) -> String {
    format!(
        "enter depth={} op=0x{:02x} from={} to={} input={}B gas={} value={}",
        msg.depth,
        msg.op_code,
        hex(&msg.from),
        hex(&msg.to),
        msg.input.len(),
        msg.gas,
        big_int(msg.value.as_ref()),
    )
}

pub fn exit(msg: &OnExitMessage) -> String {
    format!(
        "exit depth={} output={}B gas_used={} reverted={}{}",
        msg.depth,
        msg.output.len(),
        msg.gas_used,
        msg.reverted,
        error(msg.error.as_deref()),
    )
}

pub fn opcode(msg: &OnOpcodeMessage) -> String {
    format!(
        "opcode pc={} op=0x{:02x} gas={} cost={} depth={}{}",
        msg.pc,
        msg.op_code,
        msg.gas,
        msg.cost,
        msg.depth,
        error(msg.error.as_deref()),
    )
}

pub fn fault(msg: &OnFaultMessage) -> String {
    format!(
        "fault pc={} op=0x{:02x} gas={} cost={} depth={}{}",
        msg.pc,
        msg.op_code,
        msg.gas,
        msg.cost,
        msg.depth,
        error(msg.error.as_deref()),
    )
}

pub fn gas_change(msg: &OnGasChangeMessage) -> String {
    format!("gas old={} new={} reason={}", msg.old, msg.new, msg.reason)
}

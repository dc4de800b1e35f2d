//! Owned trace events.
//!
//! A `TraceEvent` is a recorded copy of one hook invocation. Replaying a
//! sequence of them through [`Hooks::emit`] reproduces what the engine would
//! have called, which is how bridges are exercised without a full VM.

use std::error::Error;
use std::fmt;

use wasitrace_primitives::EventKind;

use crate::hooks::Hooks;
use crate::types::{Address, ChainConfig, GasChangeReason, StaticOpContext, U256};

/// Execution error carried by a recorded event; only its text survives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedError(pub String);

impl fmt::Display for RecordedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for RecordedError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    BlockchainInit(ChainConfig),
    Enter {
        depth: usize,
        typ: u8,
        from: Address,
        to: Address,
        input: Vec<u8>,
        gas: u64,
        value: Option<U256>,
    },
    Exit {
        depth: usize,
        output: Vec<u8>,
        gas_used: u64,
        error: Option<RecordedError>,
        reverted: bool,
    },
    Opcode {
        pc: u64,
        op: u8,
        gas: u64,
        cost: u64,
        scope: StaticOpContext,
        r_data: Vec<u8>,
        depth: usize,
        error: Option<RecordedError>,
    },
    Fault {
        pc: u64,
        op: u8,
        gas: u64,
        cost: u64,
        scope: StaticOpContext,
        depth: usize,
        error: Option<RecordedError>,
    },
    GasChange {
        old: u64,
        new: u64,
        reason: GasChangeReason,
    },
}

impl TraceEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::BlockchainInit(_) => EventKind::BlockchainInit,
            Self::Enter { .. } => EventKind::Enter,
            Self::Exit { .. } => EventKind::Exit,
            Self::Opcode { .. } => EventKind::Opcode,
            Self::Fault { .. } => EventKind::Fault,
            Self::GasChange { .. } => EventKind::GasChange,
        }
    }
}

fn as_dyn(error: &Option<RecordedError>) -> Option<&dyn Error> {
    error.as_ref().map(|e| e as &dyn Error)
}

impl Hooks {
    /// Route a recorded event to its hook. Returns whether a hook ran.
    pub fn emit(&mut self, event: &TraceEvent) -> bool {
        match event {
            TraceEvent::BlockchainInit(config) => self.blockchain_init(config),
            TraceEvent::Enter {
                depth,
                typ,
                from,
                to,
                input,
                gas,
                value,
            } => self.enter(*depth, *typ, *from, *to, input, *gas, *value),
            TraceEvent::Exit {
                depth,
                output,
                gas_used,
                error,
                reverted,
            } => self.exit(*depth, output, *gas_used, as_dyn(error), *reverted),
            TraceEvent::Opcode {
                pc,
                op,
                gas,
                cost,
                scope,
                r_data,
                depth,
                error,
            } => self.opcode(*pc, *op, *gas, *cost, scope, r_data, *depth, as_dyn(error)),
            TraceEvent::Fault {
                pc,
                op,
                gas,
                cost,
                scope,
                depth,
                error,
            } => self.fault(*pc, *op, *gas, *cost, scope, *depth, as_dyn(error)),
            TraceEvent::GasChange { old, new, reason } => self.gas_change(*old, *new, *reason),
        }
    }

    /// Replay events in order. Returns how many reached an installed hook.
    pub fn replay<'a>(&mut self, events: impl IntoIterator<Item = &'a TraceEvent>) -> usize {
        events.into_iter().filter(|event| self.emit(event)).count()
    }
}

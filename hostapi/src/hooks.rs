//! The engine's callback surface.
//!
//! Each field is `None` unless the tracer implements that event. The engine
//! checks presence before doing any per-event work, so an unimplemented hook
//! costs nothing on the hot path.

use std::error::Error;
use std::fmt;

use wasitrace_primitives::EventKind;

use crate::types::{Address, ChainConfig, GasChangeReason, OpContext, U256};

pub type BlockchainInitHook = Box<dyn FnMut(&ChainConfig)>;
pub type EnterHook = Box<dyn FnMut(usize, u8, Address, Address, &[u8], u64, Option<U256>)>;
pub type ExitHook = Box<dyn FnMut(usize, &[u8], u64, Option<&dyn Error>, bool)>;
pub type OpcodeHook =
    Box<dyn FnMut(u64, u8, u64, u64, &dyn OpContext, &[u8], usize, Option<&dyn Error>)>;
pub type FaultHook = Box<dyn FnMut(u64, u8, u64, u64, &dyn OpContext, usize, Option<&dyn Error>)>;
pub type GasChangeHook = Box<dyn FnMut(u64, u64, GasChangeReason)>;
pub type CloseHook = Box<dyn FnOnce()>;

/// Tracing callbacks installed into the engine.
///
/// Hooks run synchronously on the engine thread in emission order:
/// `on_enter` precedes everything the nested frame does and is matched by
/// `on_exit`.
#[derive(Default)]
pub struct Hooks {
    pub on_blockchain_init: Option<BlockchainInitHook>,
    pub on_enter: Option<EnterHook>,
    pub on_exit: Option<ExitHook>,
    pub on_opcode: Option<OpcodeHook>,
    pub on_fault: Option<FaultHook>,
    pub on_gas_change: Option<GasChangeHook>,
    pub on_close: Option<CloseHook>,
}

impl Hooks {
    /// Whether the hook for `kind` is installed.
    pub fn is_installed(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::BlockchainInit => self.on_blockchain_init.is_some(),
            EventKind::Enter => self.on_enter.is_some(),
            EventKind::Exit => self.on_exit.is_some(),
            EventKind::Opcode => self.on_opcode.is_some(),
            EventKind::Fault => self.on_fault.is_some(),
            EventKind::GasChange => self.on_gas_change.is_some(),
        }
    }

    /// Event kinds with an installed hook, in table order.
    pub fn installed(&self) -> Vec<EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(|kind| self.is_installed(*kind))
            .collect()
    }

    // ── Emitters ──
    //
    // Each returns whether a hook ran.

    pub fn blockchain_init(&mut self, config: &ChainConfig) -> bool {
        match self.on_blockchain_init.as_mut() {
            Some(hook) => {
                hook(config);
                true
            }
            None => false,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn enter(
        &mut self,
        depth: usize,
        typ: u8,
        from: Address,
        to: Address,
        input: &[u8],
        gas: u64,
        value: Option<U256>,
    ) -> bool {
        match self.on_enter.as_mut() {
            Some(hook) => {
                hook(depth, typ, from, to, input, gas, value);
                true
            }
            None => false,
        }
    }

    pub fn exit(
        &mut self,
        depth: usize,
        output: &[u8],
        gas_used: u64,
        err: Option<&dyn Error>,
        reverted: bool,
    ) -> bool {
        match self.on_exit.as_mut() {
            Some(hook) => {
                hook(depth, output, gas_used, err, reverted);
                true
            }
            None => false,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn opcode(
        &mut self,
        pc: u64,
        op: u8,
        gas: u64,
        cost: u64,
        scope: &dyn OpContext,
        r_data: &[u8],
        depth: usize,
        err: Option<&dyn Error>,
    ) -> bool {
        match self.on_opcode.as_mut() {
            Some(hook) => {
                hook(pc, op, gas, cost, scope, r_data, depth, err);
                true
            }
            None => false,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn fault(
        &mut self,
        pc: u64,
        op: u8,
        gas: u64,
        cost: u64,
        scope: &dyn OpContext,
        depth: usize,
        err: Option<&dyn Error>,
    ) -> bool {
        match self.on_fault.as_mut() {
            Some(hook) => {
                hook(pc, op, gas, cost, scope, depth, err);
                true
            }
            None => false,
        }
    }

    pub fn gas_change(&mut self, old: u64, new: u64, reason: GasChangeReason) -> bool {
        match self.on_gas_change.as_mut() {
            Some(hook) => {
                hook(old, new, reason);
                true
            }
            None => false,
        }
    }

    /// Run `on_close`, at most once. Returns whether it ran.
    pub fn close(&mut self) -> bool {
        match self.on_close.take() {
            Some(hook) => {
                hook();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("installed", &self.installed())
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}

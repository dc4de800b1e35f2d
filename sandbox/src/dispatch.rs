//! Hook dispatcher: installs sparse engine hooks that forward into the guest.
//!
//! Only event kinds the guest registered get a hook installed; the rest stay
//! `None` so the engine skips them entirely. Each installed hook converts its
//! native arguments with [`crate::message`], then runs the allocation bridge
//! against the guest export.
//!
//! A forwarding failure inside an installed hook is fatal for the trace
//! session. The engine callback has no error channel, so the adapter logs the
//! error and panics with its text. Callers that want the error as a value use
//! [`TracerHandle::dispatch`] directly.

use std::cell::RefCell;
use std::error::Error;
use std::rc::Rc;

use wasitrace_hostapi::{Address, ChainConfig, GasChangeReason, Hooks, OpContext, U256};
use wasitrace_primitives::EventKind;

use crate::config::TracerConfig;
use crate::error::{BridgeError, SetupError};
use crate::message;
use crate::runtime::WasiTracer;

/// Shared owner of a tracer for the hooks installed into one engine.
///
/// Single-threaded: hooks run on the engine thread. A hook that re-enters
/// the tracer while it is already forwarding panics on the inner borrow.
#[derive(Clone)]
pub struct TracerHandle {
    inner: Rc<RefCell<Option<WasiTracer>>>,
}

impl TracerHandle {
    pub fn new(tracer: WasiTracer) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Some(tracer))),
        }
    }

    /// Scoped access to the tracer. `None` once closed.
    pub fn with<R>(&self, f: impl FnOnce(&mut WasiTracer) -> R) -> Option<R> {
        self.inner.borrow_mut().as_mut().map(f)
    }

    pub fn is_open(&self) -> bool {
        self.inner.borrow().is_some()
    }

    /// Forward one message to the guest hook for `kind`.
    pub fn dispatch<M: prost::Message>(&self, kind: EventKind, msg: &M) -> Result<(), BridgeError> {
        match self.inner.borrow_mut().as_mut() {
            Some(tracer) => tracer.forward(kind, msg),
            None => Err(BridgeError::Closed),
        }
    }

    /// Close the tracer. Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        let tracer = self.inner.borrow_mut().take();
        match tracer {
            Some(tracer) => {
                tracer.close();
                true
            }
            None => false,
        }
    }

    /// Build the engine hook set for this tracer.
    ///
    /// Installs one adapter per registered event kind and an `on_close`
    /// hook. A closed tracer yields an empty set.
    pub fn hooks(&self) -> Hooks {
        let Some(capabilities) = self.with(|tracer| tracer.capabilities()) else {
            return Hooks::default();
        };
        let mut hooks = Hooks::default();

        if capabilities.contains(EventKind::BlockchainInit) {
            let handle = self.clone();
            hooks.on_blockchain_init = Some(Box::new(move |config: &ChainConfig| {
                handle.deliver(EventKind::BlockchainInit, &message::blockchain_init(config));
            }));
        }

        if capabilities.contains(EventKind::Enter) {
            let handle = self.clone();
            hooks.on_enter = Some(Box::new(
                move |depth, typ, from: Address, to: Address, input: &[u8], gas, value: Option<U256>| {
                    let msg = message::enter(depth, typ, &from, &to, input, gas, value);
                    handle.deliver(EventKind::Enter, &msg);
                },
            ));
        }

        if capabilities.contains(EventKind::Exit) {
            let handle = self.clone();
            hooks.on_exit = Some(Box::new(
                move |depth, output: &[u8], gas_used, err: Option<&dyn Error>, reverted| {
                    let msg = message::exit(depth, output, gas_used, err, reverted);
                    handle.deliver(EventKind::Exit, &msg);
                },
            ));
        }

        if capabilities.contains(EventKind::Opcode) {
            let handle = self.clone();
            hooks.on_opcode = Some(Box::new(
                move |pc,
                      op,
                      gas,
                      cost,
                      _scope: &dyn OpContext,
                      r_data: &[u8],
                      depth,
                      err: Option<&dyn Error>| {
                    let msg = message::opcode(pc, op, gas, cost, r_data, depth, err);
                    handle.deliver(EventKind::Opcode, &msg);
                },
            ));
        }

        if capabilities.contains(EventKind::Fault) {
            let handle = self.clone();
            hooks.on_fault = Some(Box::new(
                move |pc, op, gas, cost, _scope: &dyn OpContext, depth, err: Option<&dyn Error>| {
                    let msg = message::fault(pc, op, gas, cost, depth, err);
                    handle.deliver(EventKind::Fault, &msg);
                },
            ));
        }

        if capabilities.contains(EventKind::GasChange) {
            let handle = self.clone();
            hooks.on_gas_change = Some(Box::new(move |old, new, reason: GasChangeReason| {
                handle.deliver(EventKind::GasChange, &message::gas_change(old, new, reason));
            }));
        }

        let handle = self.clone();
        hooks.on_close = Some(Box::new(move || {
            handle.close();
        }));

        hooks
    }

    fn deliver<M: prost::Message>(&self, kind: EventKind, msg: &M) {
        if let Err(err) = self.dispatch(kind, msg) {
            escalate(kind, err);
        }
    }
}

/// Fatal path for a hook that cannot return an error.
fn escalate(kind: EventKind, err: BridgeError) -> ! {
    tracing::error!(hook = kind.export_name(), error = %err, "forwarding trace event failed");
    panic!("{kind}: {err}");
}

/// Set up the guest named by `config` and return its engine hooks.
pub fn new_hooks(config: &TracerConfig) -> Result<Hooks, SetupError> {
    let tracer = WasiTracer::setup(config)?;
    tracing::debug!(
        path = %config.wasm_path().display(),
        hooks = ?tracer.capabilities().kinds(),
        "wasip1 tracer ready"
    );
    Ok(TracerHandle::new(tracer).hooks())
}

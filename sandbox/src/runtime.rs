//! Tracer runtime — Wasmtime engine, WASI preview 1, module lifecycle.
//!
//! `WasiTracer` owns the sandbox for the lifetime of a trace session:
//! one engine, one store, one instance. Setup order matters: capability
//! discovery and ABI validation run on the compiled module so that a guest
//! missing a mandatory export is rejected before anything is instantiated.
//!
//! The engine runs with epoch interruption and the store's deadline set one
//! tick ahead. Nothing advances the epoch during tracing; [`WasiTracer::close`]
//! does, which cancels the runtime context before the instance is dropped.

use wasmtime::{Config, Engine, Instance, Linker, Module, Store, Val};
use wasmtime_wasi::preview1::{self, WasiP1Ctx};
use wasmtime_wasi::WasiCtxBuilder;

use wasitrace_primitives::{
    EventKind, ALLOCATOR_EXPORT, DEALLOCATOR_EXPORT, MEMORY_EXPORT, START_FUNCTION,
};

use crate::capabilities::{Capabilities, HookTable};
use crate::config::TracerConfig;
use crate::error::{BridgeError, SetupError};
use crate::memory::{AllocFn, FreeFn, GuestMemory};
use crate::validation::validate_module;

/// Data held in the Wasmtime `Store` for the tracer instance.
pub struct TracerState {
    wasi: WasiP1Ctx,
}

impl TracerState {
    fn new() -> Self {
        let wasi = WasiCtxBuilder::new()
            .inherit_stdout()
            .inherit_stderr()
            .build_p1();
        Self { wasi }
    }
}

/// A guest tracer module, instantiated and ready to receive events.
pub struct WasiTracer {
    engine: Engine,
    store: Store<TracerState>,
    instance: Instance,
    hooks: HookTable,
    memory: GuestMemory,
}

impl WasiTracer {
    /// Read the guest module named by `config` and set it up.
    pub fn setup(config: &TracerConfig) -> Result<Self, SetupError> {
        let path = config.wasm_path();
        let wasm = std::fs::read(path).map_err(|source| SetupError::ReadModule {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = wasm.len(), "read tracer module");
        Self::from_bytes(&wasm)
    }

    /// Set up a tracer from module bytes (binary or text format).
    pub fn from_bytes(wasm: &[u8]) -> Result<Self, SetupError> {
        let engine = create_engine()?;
        let module = Module::new(&engine, wasm)?;
        tracing::debug!("compiled tracer module");

        let capabilities = Capabilities::discover(&module)?;
        validate_module(&module)?;
        tracing::debug!(hooks = ?capabilities.kinds(), "discovered tracer capabilities");

        let mut store = Store::new(&engine, TracerState::new());
        store.set_epoch_deadline(1);

        let mut linker: Linker<TracerState> = Linker::new(&engine);
        preview1::add_to_linker_sync(&mut linker, |state: &mut TracerState| &mut state.wasi)?;

        let instance = linker.instantiate(&mut store, &module)?;
        run_start_function(&instance, &mut store)?;

        let memory = resolve_memory(&instance, &mut store)?;
        let hooks = HookTable::resolve(capabilities, &instance, &mut store)?;

        Ok(Self {
            engine,
            store,
            instance,
            hooks,
            memory,
        })
    }

    /// Hooks the guest implements.
    pub fn capabilities(&self) -> Capabilities {
        self.hooks.capabilities()
    }

    pub fn is_registered(&self, kind: EventKind) -> bool {
        self.hooks.get(kind).is_some()
    }

    /// Encode `message` and deliver it to the guest hook for `kind`.
    pub fn forward<M: prost::Message>(
        &mut self,
        kind: EventKind,
        message: &M,
    ) -> Result<(), BridgeError> {
        let function = self.hooks.get(kind).ok_or(BridgeError::NotRegistered(kind))?;
        let payload = wasitrace_primitives::encode(message)?;
        tracing::trace!(hook = kind.export_name(), len = payload.len(), "forwarding event");
        self.memory
            .invoke(&mut self.store, &function, kind.export_name(), &payload)
    }

    /// Current size of guest linear memory in bytes.
    pub fn memory_size(&self) -> usize {
        self.memory.size(&self.store)
    }

    /// Copy bytes out of guest memory.
    pub fn read_memory(&self, offset: u64, len: usize) -> Result<Vec<u8>, BridgeError> {
        self.memory.read(&self.store, offset, len)
    }

    /// Read an exported guest global.
    pub fn guest_global(&mut self, name: &str) -> Option<Val> {
        let global = self.instance.get_global(&mut self.store, name)?;
        Some(global.get(&mut self.store))
    }

    /// Cancel the runtime context and release the sandbox.
    ///
    /// Must be called after all hook activity has ceased.
    pub fn close(self) {
        self.engine.increment_epoch();
        tracing::info!("wasip1 tracer closed");
        drop(self.store);
    }
}

/// Create a Wasmtime engine with an interruptible runtime context.
fn create_engine() -> Result<Engine, SetupError> {
    let mut wasm_config = Config::new();
    wasm_config.epoch_interruption(true);
    Ok(Engine::new(&wasm_config)?)
}

/// Run the guest start routine if it exports one.
fn run_start_function(instance: &Instance, store: &mut Store<TracerState>) -> Result<(), SetupError> {
    let Some(start) = instance.get_func(&mut *store, START_FUNCTION) else {
        return Ok(());
    };
    let Ok(start) = start.typed::<(), ()>(&*store) else {
        tracing::debug!(function = START_FUNCTION, "start export has a foreign signature, skipped");
        return Ok(());
    };
    start.call(&mut *store, ()).map_err(SetupError::StartFailed)?;
    tracing::debug!(function = START_FUNCTION, "ran tracer start routine");
    Ok(())
}

/// Resolve memory, allocator and deallocator on the instance, typed once.
fn resolve_memory(instance: &Instance, store: &mut Store<TracerState>) -> Result<GuestMemory, SetupError> {
    let memory = instance
        .get_memory(&mut *store, MEMORY_EXPORT)
        .ok_or(SetupError::UnresolvedExport(MEMORY_EXPORT))?;
    let allocator = instance
        .get_func(&mut *store, ALLOCATOR_EXPORT)
        .ok_or(SetupError::UnresolvedExport(ALLOCATOR_EXPORT))?;
    let deallocator = instance
        .get_func(&mut *store, DEALLOCATOR_EXPORT)
        .ok_or(SetupError::UnresolvedExport(DEALLOCATOR_EXPORT))?;
    Ok(GuestMemory::new(
        AllocFn::new(ALLOCATOR_EXPORT, allocator, &*store)?,
        FreeFn::new(DEALLOCATOR_EXPORT, deallocator, &*store)?,
        memory,
    ))
}

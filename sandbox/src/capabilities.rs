//! Capability discovery: which hooks a guest module implements.
//!
//! Discovery reads the compiled module's export list before instantiation.
//! `onBlockchainInit` is the one hard requirement; every other hook is
//! optional and its absence only disables forwarding for that event kind.
//! After instantiation each discovered name is resolved and typed once into
//! a [`HookTable`], so dispatch branches on presence and never looks up or
//! inspects an export again.

use wasmtime::{ExternType, Instance, Module, Store};

use wasitrace_primitives::EventKind;

use crate::error::SetupError;
use crate::memory::HookFn;
use crate::validation::{check_signature, exported_func};

/// Event kinds a guest module exports hooks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    present: [bool; EventKind::COUNT],
}

impl Capabilities {
    /// Inspect a compiled module's exported functions. No guest code runs.
    ///
    /// An optional hook name exported as something other than a function
    /// is not a hook and counts as absent.
    pub fn discover(module: &Module) -> Result<Self, SetupError> {
        let mut present = [false; EventKind::COUNT];

        for kind in EventKind::ALL {
            let name = kind.export_name();
            let ty = if kind.is_required() {
                exported_func(module, name)?.ok_or(SetupError::MissingExport(name))?
            } else {
                match module.get_export(name) {
                    Some(ExternType::Func(ty)) => ty,
                    Some(_) => {
                        tracing::debug!(export = name, "non-function export ignored");
                        continue;
                    }
                    None => continue,
                }
            };
            check_signature(name, &ty, 2, 0)?;
            present[kind.index()] = true;
        }

        Ok(Self { present })
    }

    /// Whether the module exports a hook for `kind`.
    pub fn contains(&self, kind: EventKind) -> bool {
        self.present[kind.index()]
    }

    /// Exported hooks, in table order.
    pub fn kinds(&self) -> Vec<EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(|kind| self.contains(*kind))
            .collect()
    }
}

/// Typed guest hooks, one slot per event kind.
#[derive(Debug, Clone)]
pub struct HookTable {
    capabilities: Capabilities,
    funcs: [Option<HookFn>; EventKind::COUNT],
}

impl HookTable {
    /// Resolve every discovered hook against the instantiated module.
    ///
    /// A name the compiled module listed but the instance does not export
    /// means the two disagree, which is an internal error.
    pub fn resolve<T: 'static>(
        capabilities: Capabilities,
        instance: &Instance,
        store: &mut Store<T>,
    ) -> Result<Self, SetupError> {
        let mut funcs = [const { None }; EventKind::COUNT];
        for kind in capabilities.kinds() {
            let name = kind.export_name();
            let func = instance
                .get_func(&mut *store, name)
                .ok_or(SetupError::UnresolvedExport(name))?;
            funcs[kind.index()] = Some(HookFn::new(name, func, &*store)?);
        }
        Ok(Self {
            capabilities,
            funcs,
        })
    }

    /// The guest hook for `kind`, if the guest implements it.
    pub fn get(&self, kind: EventKind) -> Option<HookFn> {
        self.funcs[kind.index()].clone()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }
}

//! Guest module validation — ABI shape checks on the compiled module.
//!
//! Runs before instantiation so a module that could never be driven is
//! rejected without executing any guest code. Checks:
//!
//! 1. Linear memory export present
//! 2. Allocator `(size) -> ptr` and deallocator `(ptr)` present
//! 3. Every hook export that is present takes `(ptr, len)` and returns nothing
//!
//! Integer parameters and results may be `i32` or `i64`, one width per export.

use wasmtime::{ExternType, FuncType, Module, ValType};

use wasitrace_primitives::{ALLOCATOR_EXPORT, DEALLOCATOR_EXPORT, MEMORY_EXPORT};

use crate::error::SetupError;

/// Check if a ValType can carry a pointer or length.
fn is_integer(vt: &ValType) -> bool {
    matches!(vt, ValType::I32 | ValType::I64)
}

/// Look up a function export's type on the compiled module.
///
/// Returns `Ok(None)` if the name is not exported at all.
pub(crate) fn exported_func(module: &Module, name: &str) -> Result<Option<FuncType>, SetupError> {
    let Some(export) = module.get_export(name) else {
        return Ok(None);
    };
    match export {
        ExternType::Func(ty) => Ok(Some(ty)),
        _ => Err(SetupError::InvalidExport {
            name: name.to_string(),
            reason: "must be a function".into(),
        }),
    }
}

/// Check an export takes `params` integer parameters and returns `results` integers.
pub(crate) fn check_signature(
    name: &str,
    ty: &FuncType,
    params: usize,
    results: usize,
) -> Result<(), SetupError> {
    let param_types: Vec<ValType> = ty.params().collect();
    let result_types: Vec<ValType> = ty.results().collect();

    if param_types.len() != params || !param_types.iter().all(is_integer) {
        return Err(SetupError::InvalidExport {
            name: name.to_string(),
            reason: format!(
                "expected {} integer params, got {:?}",
                params, param_types
            ),
        });
    }

    if result_types.len() != results || !result_types.iter().all(is_integer) {
        return Err(SetupError::InvalidExport {
            name: name.to_string(),
            reason: format!(
                "expected {} integer results, got {:?}",
                results, result_types
            ),
        });
    }

    let mut widths = param_types.iter().chain(&result_types);
    if let Some(first) = widths.next() {
        if widths.any(|vt| !ValType::eq(vt, first)) {
            return Err(SetupError::InvalidExport {
                name: name.to_string(),
                reason: format!(
                    "mixed integer widths {:?} -> {:?}",
                    param_types, result_types
                ),
            });
        }
    }

    Ok(())
}

/// Validate the memory and allocator exports the allocation bridge relies on.
pub fn validate_module(module: &Module) -> Result<(), SetupError> {
    match module.get_export(MEMORY_EXPORT) {
        Some(ExternType::Memory(_)) => {}
        Some(_) => {
            return Err(SetupError::InvalidExport {
                name: MEMORY_EXPORT.to_string(),
                reason: "must be a memory".into(),
            })
        }
        None => return Err(SetupError::MissingExport(MEMORY_EXPORT)),
    }

    let allocator =
        exported_func(module, ALLOCATOR_EXPORT)?.ok_or(SetupError::MissingExport(ALLOCATOR_EXPORT))?;
    check_signature(ALLOCATOR_EXPORT, &allocator, 1, 1)?;

    let deallocator = exported_func(module, DEALLOCATOR_EXPORT)?
        .ok_or(SetupError::MissingExport(DEALLOCATOR_EXPORT))?;
    check_signature(DEALLOCATOR_EXPORT, &deallocator, 1, 0)?;

    Ok(())
}

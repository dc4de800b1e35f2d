//! Allocation bridge: moving payloads into guest linear memory.
//!
//! Every payload follows the same protocol: the guest allocator reserves
//! `len` bytes, the host copies the payload in, the target export is called
//! with `(ptr, len)`, and the guest deallocator releases the block. The
//! reservation is held by an [`Allocation`] guard so the deallocator runs
//! exactly once on every exit path, including a bounds failure or a trap in
//! the target export.
//!
//! Guest functions are typed once, when they are resolved, as either the
//! 32-bit or the 64-bit shape of their export. Values are carried as `u64`
//! and narrowed for 32-bit guests, so a length that does not fit is an error
//! rather than a silent truncation.

use wasmtime::{AsContext, Func, Memory, Store, TypedFunc};

use crate::error::{BridgeError, SetupError};

// ── Typed guest functions ──

/// A hook export `(ptr, len) -> ()`.
#[derive(Clone)]
pub enum HookFn {
    W32(TypedFunc<(u32, u32), ()>),
    W64(TypedFunc<(u64, u64), ()>),
}

/// The allocator export `(size) -> ptr`.
#[derive(Clone)]
pub enum AllocFn {
    W32(TypedFunc<u32, u32>),
    W64(TypedFunc<u64, u64>),
}

/// The deallocator export `(ptr) -> ()`.
#[derive(Clone)]
pub enum FreeFn {
    W32(TypedFunc<u32, ()>),
    W64(TypedFunc<u64, ()>),
}

fn invalid(name: &str, err: anyhow::Error) -> SetupError {
    SetupError::InvalidExport {
        name: name.to_string(),
        reason: format!("{err:#}"),
    }
}

fn narrow(value: u64) -> anyhow::Result<u32> {
    u32::try_from(value).map_err(|_| anyhow::anyhow!("value {value} does not fit an i32 parameter"))
}

impl HookFn {
    pub fn new(name: &str, func: Func, store: impl AsContext) -> Result<Self, SetupError> {
        if let Ok(typed) = func.typed::<(u32, u32), ()>(&store) {
            return Ok(Self::W32(typed));
        }
        func.typed::<(u64, u64), ()>(&store)
            .map(Self::W64)
            .map_err(|e| invalid(name, e))
    }

    fn call<T: 'static>(&self, store: &mut Store<T>, ptr: u64, len: u64) -> anyhow::Result<()> {
        match self {
            Self::W32(f) => f.call(store, (narrow(ptr)?, narrow(len)?)),
            Self::W64(f) => f.call(store, (ptr, len)),
        }
    }
}

impl AllocFn {
    pub fn new(name: &str, func: Func, store: impl AsContext) -> Result<Self, SetupError> {
        if let Ok(typed) = func.typed::<u32, u32>(&store) {
            return Ok(Self::W32(typed));
        }
        func.typed::<u64, u64>(&store)
            .map(Self::W64)
            .map_err(|e| invalid(name, e))
    }

    fn call<T: 'static>(&self, store: &mut Store<T>, size: u64) -> anyhow::Result<u64> {
        match self {
            Self::W32(f) => Ok(u64::from(f.call(store, narrow(size)?)?)),
            Self::W64(f) => f.call(store, size),
        }
    }
}

impl FreeFn {
    pub fn new(name: &str, func: Func, store: impl AsContext) -> Result<Self, SetupError> {
        if let Ok(typed) = func.typed::<u32, ()>(&store) {
            return Ok(Self::W32(typed));
        }
        func.typed::<u64, ()>(&store)
            .map(Self::W64)
            .map_err(|e| invalid(name, e))
    }

    fn call<T: 'static>(&self, store: &mut Store<T>, ptr: u64) -> anyhow::Result<()> {
        match self {
            Self::W32(f) => f.call(store, narrow(ptr)?),
            Self::W64(f) => f.call(store, ptr),
        }
    }
}

impl std::fmt::Debug for HookFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::W32(_) => f.write_str("HookFn::W32"),
            Self::W64(_) => f.write_str("HookFn::W64"),
        }
    }
}

// ── Guest memory ──

/// Guest allocator, deallocator and linear memory.
#[derive(Clone)]
pub struct GuestMemory {
    allocator: AllocFn,
    deallocator: FreeFn,
    memory: Memory,
}

impl GuestMemory {
    pub fn new(allocator: AllocFn, deallocator: FreeFn, memory: Memory) -> Self {
        Self {
            allocator,
            deallocator,
            memory,
        }
    }

    /// Current size of guest linear memory in bytes.
    pub fn size<T: 'static>(&self, store: &Store<T>) -> usize {
        self.memory.data_size(store)
    }

    /// Reserve `len` bytes with the guest allocator.
    pub fn alloc<'s, T: 'static>(
        &self,
        store: &'s mut Store<T>,
        len: usize,
    ) -> Result<Allocation<'s, T>, BridgeError> {
        let failed = |reason: String| BridgeError::AllocationFailed { len, reason };

        let ptr = self
            .allocator
            .call(&mut *store, len as u64)
            .map_err(|e| failed(format!("{e:#}")))?;
        if ptr == 0 && len > 0 {
            return Err(failed("allocator returned a null pointer".into()));
        }

        Ok(Allocation {
            store,
            deallocator: self.deallocator.clone(),
            ptr,
            released: false,
        })
    }

    /// Allocate and copy `data` into guest memory.
    ///
    /// On a bounds failure the allocation is released before the error is
    /// returned.
    pub fn write<'s, T: 'static>(
        &self,
        store: &'s mut Store<T>,
        data: &[u8],
    ) -> Result<Allocation<'s, T>, BridgeError> {
        let allocation = self.alloc(store, data.len())?;
        let memory_size = self.memory.data_size(&*allocation.store);

        let offset = match check_range(allocation.ptr, data.len(), memory_size) {
            Ok(offset) => offset,
            Err(err) => {
                allocation.release_quietly();
                return Err(err);
            }
        };

        if self.memory.write(&mut *allocation.store, offset, data).is_err() {
            allocation.release_quietly();
            return Err(BridgeError::OutOfBounds {
                offset: offset as u64,
                len: data.len(),
                memory_size,
            });
        }

        Ok(allocation)
    }

    /// Run the full alloc → write → call → free protocol for one payload.
    ///
    /// `name` is only used for error reporting. A trap in `function` takes
    /// precedence over a failure to release.
    pub fn invoke<T: 'static>(
        &self,
        store: &mut Store<T>,
        function: &HookFn,
        name: &str,
        payload: &[u8],
    ) -> Result<(), BridgeError> {
        let mut allocation = self.write(store, payload)?;
        let ptr = allocation.ptr();

        let called = function.call(allocation.store_mut(), ptr, payload.len() as u64);
        let released = allocation.release();

        called.map_err(|source| BridgeError::CallFailed {
            function: name.to_string(),
            source,
        })?;
        released
    }

    /// Copy `len` bytes out of guest memory.
    pub fn read<T: 'static>(
        &self,
        store: &Store<T>,
        offset: u64,
        len: usize,
    ) -> Result<Vec<u8>, BridgeError> {
        let memory_size = self.memory.data_size(store);
        let start = check_range(offset, len, memory_size)?;
        Ok(self.memory.data(store)[start..start + len].to_vec())
    }
}

/// One outstanding guest allocation.
///
/// Borrows the store for its whole lifetime so nothing else can touch guest
/// memory while the payload is in flight. Dropping without [`release`]
/// still frees the block.
///
/// [`release`]: Allocation::release
pub struct Allocation<'s, T: 'static> {
    store: &'s mut Store<T>,
    deallocator: FreeFn,
    ptr: u64,
    released: bool,
}

impl<T: 'static> Allocation<'_, T> {
    /// Guest pointer of the block.
    pub fn ptr(&self) -> u64 {
        self.ptr
    }

    /// The store, for calling into the guest while the block is held.
    pub fn store_mut(&mut self) -> &mut Store<T> {
        &mut *self.store
    }

    /// Free the block with the guest deallocator.
    pub fn release(mut self) -> Result<(), BridgeError> {
        self.free()
    }

    /// Free the block on a path that is already failing; a deallocator trap
    /// is logged so the original error is the one reported.
    fn release_quietly(mut self) {
        if let Err(err) = self.free() {
            tracing::warn!(ptr = self.ptr, error = %err, "failed to release guest allocation");
        }
    }

    fn free(&mut self) -> Result<(), BridgeError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.deallocator
            .call(&mut *self.store, self.ptr)
            .map_err(|source| BridgeError::ReleaseFailed {
                ptr: self.ptr,
                source,
            })
    }
}

impl<T: 'static> Drop for Allocation<'_, T> {
    fn drop(&mut self) {
        if let Err(err) = self.free() {
            tracing::error!(ptr = self.ptr, error = %err, "failed to release guest allocation");
        }
    }
}

/// Validate that `[offset, offset + len)` lies inside a memory of
/// `memory_size` bytes. Returns the start as a host index.
pub fn check_range(offset: u64, len: usize, memory_size: usize) -> Result<usize, BridgeError> {
    let out_of_bounds = || BridgeError::OutOfBounds {
        offset,
        len,
        memory_size,
    };
    let start = usize::try_from(offset).map_err(|_| out_of_bounds())?;
    let end = start.checked_add(len).ok_or_else(out_of_bounds)?;
    if end > memory_size {
        return Err(out_of_bounds());
    }
    Ok(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasmtime::{Engine, Instance, Module};

    /// Bump allocator guest that counts allocator and deallocator calls.
    const COUNTING_GUEST: &str = r#"
        (module
            (memory (export "memory") 1)
            (global $bump (mut i32) (i32.const 1024))
            (global $allocs (export "allocs") (mut i32) (i32.const 0))
            (global $frees (export "frees") (mut i32) (i32.const 0))
            (global $last_ptr (export "last_ptr") (mut i32) (i32.const 0))
            (global $last_len (export "last_len") (mut i32) (i32.const 0))
            (func (export "malloc") (param $size i32) (result i32)
                (local $ptr i32)
                (local.set $ptr (global.get $bump))
                (global.set $bump (i32.add (global.get $bump) (local.get $size)))
                (global.set $allocs (i32.add (global.get $allocs) (i32.const 1)))
                (local.get $ptr))
            (func (export "free") (param i32)
                (global.set $frees (i32.add (global.get $frees) (i32.const 1))))
            (func (export "onEnter") (param $ptr i32) (param $len i32)
                (global.set $last_ptr (local.get $ptr))
                (global.set $last_len (local.get $len)))
            (func (export "onEnter64") (param $ptr i64) (param $len i64)
                (global.set $last_ptr (i32.wrap_i64 (local.get $ptr)))
                (global.set $last_len (i32.wrap_i64 (local.get $len))))
            (func (export "onFault") (param i32 i32)
                unreachable)
        )
    "#;

    /// Allocator that always hands out a block 6 bytes before the end of memory.
    const TAIL_GUEST: &str = r#"
        (module
            (memory (export "memory") 1)
            (global $frees (export "frees") (mut i32) (i32.const 0))
            (global $freed (export "freed") (mut i32) (i32.const 0))
            (func (export "malloc") (param i32) (result i32)
                i32.const 65530)
            (func (export "free") (param $ptr i32)
                (global.set $freed (local.get $ptr))
                (global.set $frees (i32.add (global.get $frees) (i32.const 1))))
            (func (export "onEnter") (param i32 i32))
        )
    "#;

    fn instantiate(wat: &str) -> (Store<()>, Instance, GuestMemory) {
        let engine = Engine::default();
        let module = Module::new(&engine, wat).unwrap();
        let mut store = Store::new(&engine, ());
        let instance = Instance::new(&mut store, &module, &[]).unwrap();
        let malloc = instance.get_func(&mut store, "malloc").unwrap();
        let free = instance.get_func(&mut store, "free").unwrap();
        let memory = GuestMemory::new(
            AllocFn::new("malloc", malloc, &store).unwrap(),
            FreeFn::new("free", free, &store).unwrap(),
            instance.get_memory(&mut store, "memory").unwrap(),
        );
        (store, instance, memory)
    }

    fn hook(store: &mut Store<()>, instance: &Instance, name: &str) -> HookFn {
        let func = instance.get_func(&mut *store, name).unwrap();
        HookFn::new(name, func, &*store).unwrap()
    }

    fn global(store: &mut Store<()>, instance: &Instance, name: &str) -> i32 {
        instance
            .get_global(&mut *store, name)
            .unwrap()
            .get(&mut *store)
            .i32()
            .unwrap()
    }

    #[test]
    fn test_check_range() {
        assert_eq!(check_range(0, 100, 100).unwrap(), 0);
        assert!(check_range(0, 101, 100).is_err());
        assert!(check_range(99, 2, 100).is_err());
        assert!(check_range(u64::MAX, 1, 100).is_err());
        assert_eq!(check_range(100, 0, 100).unwrap(), 100);
    }

    #[test]
    fn test_invoke_delivers_payload_and_frees() {
        let (mut store, instance, memory) = instantiate(COUNTING_GUEST);
        let on_enter = hook(&mut store, &instance, "onEnter");

        memory
            .invoke(&mut store, &on_enter, "onEnter", b"payload")
            .unwrap();

        assert_eq!(global(&mut store, &instance, "allocs"), 1);
        assert_eq!(global(&mut store, &instance, "frees"), 1);
        assert_eq!(global(&mut store, &instance, "last_ptr"), 1024);
        assert_eq!(global(&mut store, &instance, "last_len"), 7);
        assert_eq!(memory.read(&store, 1024, 7).unwrap(), b"payload");
    }

    #[test]
    fn test_invoke_with_i64_parameters() {
        let (mut store, instance, memory) = instantiate(COUNTING_GUEST);
        let on_enter = hook(&mut store, &instance, "onEnter64");

        memory
            .invoke(&mut store, &on_enter, "onEnter64", &[1, 2, 3])
            .unwrap();

        assert_eq!(global(&mut store, &instance, "last_len"), 3);
        assert_eq!(global(&mut store, &instance, "frees"), 1);
    }

    #[test]
    fn test_trap_still_frees() {
        let (mut store, instance, memory) = instantiate(COUNTING_GUEST);
        let on_fault = hook(&mut store, &instance, "onFault");

        let err = memory
            .invoke(&mut store, &on_fault, "onFault", b"x")
            .unwrap_err();

        match err {
            BridgeError::CallFailed { function, .. } => assert_eq!(function, "onFault"),
            other => panic!("expected CallFailed, got: {:?}", other),
        }
        assert_eq!(global(&mut store, &instance, "allocs"), 1);
        assert_eq!(global(&mut store, &instance, "frees"), 1);
    }

    #[test]
    fn test_out_of_bounds_releases_once() {
        let (mut store, instance, memory) = instantiate(TAIL_GUEST);
        let on_enter = hook(&mut store, &instance, "onEnter");

        let err = memory
            .invoke(&mut store, &on_enter, "onEnter", &[0xAB; 16])
            .unwrap_err();

        match err {
            BridgeError::OutOfBounds {
                offset,
                len,
                memory_size,
            } => {
                assert_eq!(offset, 65530);
                assert_eq!(len, 16);
                assert_eq!(memory_size, 65536);
            }
            other => panic!("expected OutOfBounds, got: {:?}", other),
        }
        assert_eq!(global(&mut store, &instance, "frees"), 1);
        assert_eq!(global(&mut store, &instance, "freed"), 65530);
    }

    #[test]
    fn test_dropped_allocation_is_freed() {
        let (mut store, instance, memory) = instantiate(COUNTING_GUEST);
        {
            let allocation = memory.write(&mut store, b"abc").unwrap();
            assert_eq!(allocation.ptr(), 1024);
        }
        assert_eq!(global(&mut store, &instance, "frees"), 1);
    }

    #[test]
    fn test_empty_payload() {
        let (mut store, instance, memory) = instantiate(COUNTING_GUEST);
        let on_enter = hook(&mut store, &instance, "onEnter");

        memory.invoke(&mut store, &on_enter, "onEnter", &[]).unwrap();

        assert_eq!(global(&mut store, &instance, "last_len"), 0);
        assert_eq!(global(&mut store, &instance, "allocs"), 1);
        assert_eq!(global(&mut store, &instance, "frees"), 1);
    }

    #[test]
    fn test_hook_width_follows_export() {
        let (mut store, instance, _) = instantiate(COUNTING_GUEST);
        assert!(matches!(hook(&mut store, &instance, "onEnter"), HookFn::W32(_)));
        assert!(matches!(hook(&mut store, &instance, "onEnter64"), HookFn::W64(_)));
    }

    #[test]
    fn test_mixed_width_hook_rejected() {
        let engine = Engine::default();
        let module = Module::new(
            &engine,
            r#"(module (func (export "onExit") (param i32 i64)))"#,
        )
        .unwrap();
        let mut store = Store::new(&engine, ());
        let instance = Instance::new(&mut store, &module, &[]).unwrap();
        let func = instance.get_func(&mut store, "onExit").unwrap();

        match HookFn::new("onExit", func, &store) {
            Err(SetupError::InvalidExport { name, .. }) => assert_eq!(name, "onExit"),
            Err(e) => panic!("expected InvalidExport, got: {:?}", e),
            Ok(_) => panic!("mixed-width hook should be rejected"),
        }
    }

    #[test]
    fn test_32_bit_allocator_rejects_oversized_length() {
        let (mut store, instance, memory) = instantiate(COUNTING_GUEST);

        let err = memory.allocator.call(&mut store, u64::from(u32::MAX) + 1).unwrap_err();

        assert!(err.to_string().contains("does not fit"), "{err}");
        assert_eq!(global(&mut store, &instance, "allocs"), 0);
    }
}

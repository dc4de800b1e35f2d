//! Guest ABI: the exports a tracer module provides and how the host names them.
//!
//! Every hook export takes `(ptr, len)` describing a protobuf payload the host
//! wrote into guest linear memory and returns nothing. Only
//! `onBlockchainInit` is mandatory; every other hook is optional and its
//! absence simply disables forwarding for that event kind.

use core::fmt;

/// Guest allocator export: `(size) -> ptr`.
pub const ALLOCATOR_EXPORT: &str = "malloc";

/// Guest deallocator export: `(ptr) -> ()`.
pub const DEALLOCATOR_EXPORT: &str = "free";

/// Guest linear memory export.
pub const MEMORY_EXPORT: &str = "memory";

/// Start routine run once after instantiation, when exported.
pub const START_FUNCTION: &str = "_initialize";

/// One of the fixed trace event kinds the virtual machine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    BlockchainInit,
    Enter,
    Exit,
    Opcode,
    Fault,
    GasChange,
}

impl EventKind {
    /// Number of event kinds.
    pub const COUNT: usize = 6;

    /// All event kinds, in table order.
    pub const ALL: [EventKind; Self::COUNT] = [
        Self::BlockchainInit,
        Self::Enter,
        Self::Exit,
        Self::Opcode,
        Self::Fault,
        Self::GasChange,
    ];

    /// Name of the guest export handling this event.
    pub const fn export_name(self) -> &'static str {
        match self {
            Self::BlockchainInit => "onBlockchainInit",
            Self::Enter => "onEnter",
            Self::Exit => "onExit",
            Self::Opcode => "onOpcode",
            Self::Fault => "onFault",
            Self::GasChange => "onGasChange",
        }
    }

    /// Whether a guest module must export this hook to be accepted.
    pub const fn is_required(self) -> bool {
        matches!(self, Self::BlockchainInit)
    }

    /// Position of this kind in dispatch tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look up an event kind by its guest export name.
    pub fn from_export_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.export_name() == name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.export_name())
    }
}

//! Native event parameter types, as the engine hands them to hooks.

pub use ethereum_types::{Address, U256};

/// Chain fork schedule passed to `on_blockchain_init`.
///
/// Block-number forks are `None` when the fork is not scheduled; time-based
/// forks carry a UNIX timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainConfig {
    pub chain_id: Option<U256>,
    pub homestead_block: Option<U256>,
    pub dao_fork_block: Option<U256>,
    pub dao_fork_support: bool,
    pub eip150_block: Option<U256>,
    pub eip155_block: Option<U256>,
    pub eip158_block: Option<U256>,
    pub byzantium_block: Option<U256>,
    pub constantinople_block: Option<U256>,
    pub petersburg_block: Option<U256>,
    pub istanbul_block: Option<U256>,
    pub muir_glacier_block: Option<U256>,
    pub berlin_block: Option<U256>,
    pub london_block: Option<U256>,
    pub arrow_glacier_block: Option<U256>,
    pub gray_glacier_block: Option<U256>,
    pub merge_netsplit_block: Option<U256>,
    pub shanghai_time: Option<u64>,
    pub cancun_time: Option<u64>,
    pub prague_time: Option<u64>,
    pub verkle_time: Option<u64>,
    pub terminal_total_difficulty: Option<U256>,
    pub terminal_total_difficulty_passed: bool,
}

impl ChainConfig {
    /// A config with only the chain id set and every fork unscheduled.
    pub fn with_chain_id(chain_id: u64) -> Self {
        Self {
            chain_id: Some(U256::from(chain_id)),
            ..Self::default()
        }
    }
}

/// Why the gas available to the current frame changed.
///
/// The numeric codes are stable and are what tracers receive on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GasChangeReason {
    Unspecified = 0,
    TxInitialBalance = 1,
    TxIntrinsicGas = 2,
    TxRefunds = 3,
    TxLeftOverReturned = 4,
    CallInitialBalance = 5,
    CallLeftOverReturned = 6,
    CallLeftOverRefunded = 7,
    CallContractCreation = 8,
    CallContractCreation2 = 9,
    CallCodeStorage = 10,
    CallOpCode = 11,
    CallPrecompiledContract = 12,
    CallStorageColdAccess = 13,
    CallFailedExecution = 14,
    Ignored = 255,
}

impl GasChangeReason {
    /// Convert from a wire code.
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Unspecified),
            1 => Some(Self::TxInitialBalance),
            2 => Some(Self::TxIntrinsicGas),
            3 => Some(Self::TxRefunds),
            4 => Some(Self::TxLeftOverReturned),
            5 => Some(Self::CallInitialBalance),
            6 => Some(Self::CallLeftOverReturned),
            7 => Some(Self::CallLeftOverRefunded),
            8 => Some(Self::CallContractCreation),
            9 => Some(Self::CallContractCreation2),
            10 => Some(Self::CallCodeStorage),
            11 => Some(Self::CallOpCode),
            12 => Some(Self::CallPrecompiledContract),
            13 => Some(Self::CallStorageColdAccess),
            14 => Some(Self::CallFailedExecution),
            255 => Some(Self::Ignored),
            _ => None,
        }
    }

    /// The wire code.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Read-only view of the frame executing an opcode.
///
/// Passed to `on_opcode` and `on_fault`; implementations borrow straight from
/// the interpreter so hooks must not retain anything past the call.
pub trait OpContext {
    /// Current frame memory.
    fn memory_data(&self) -> &[u8];
    /// Operand stack, bottom first.
    fn stack_data(&self) -> &[U256];
    /// Caller of the current frame.
    fn caller(&self) -> Address;
    /// Address whose code is executing.
    fn address(&self) -> Address;
    /// Value sent with the current call.
    fn call_value(&self) -> U256;
}

/// An owned [`OpContext`], for replaying recorded events and for tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticOpContext {
    pub memory: Vec<u8>,
    pub stack: Vec<U256>,
    pub caller: Address,
    pub address: Address,
    pub value: U256,
}

impl OpContext for StaticOpContext {
    fn memory_data(&self) -> &[u8] {
        &self.memory
    }

    fn stack_data(&self) -> &[U256] {
        &self.stack
    }

    fn caller(&self) -> Address {
        self.caller
    }

    fn address(&self) -> Address {
        self.address
    }

    fn call_value(&self) -> U256 {
        self.value
    }
}

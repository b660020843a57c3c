use alloc::rc::Rc;
use alloc::vec::Vec;

use primitive_types::{H160, H256, U256};

use crate::error::ExitError;
use crate::opcode::Opcode;

/// Per-call context of the frame. Immutable while the frame runs.
#[derive(Clone, Debug)]
pub struct Context {
	/// Address whose code is executing, and whose storage SLOAD/SSTORE
	/// operate on.
	pub address: H160,
	/// Caller of the frame.
	pub caller: H160,
	/// Apparent value of the frame, as observed by CALLVALUE.
	pub apparent_value: U256,
}

/// Per-transaction context, shared by every frame the transaction spawns.
#[derive(Clone, Debug)]
pub struct TransactionContext {
	/// Effective gas price of the transaction.
	pub gas_price: U256,
	/// Transaction origin, as observed by ORIGIN.
	pub origin: H160,
}

/// Immutable execution environment of one frame.
#[derive(Clone, Debug)]
pub struct RuntimeState {
	/// Frame context.
	pub context: Context,
	/// Transaction context.
	pub transaction_context: Rc<TransactionContext>,
	/// Call depth of the frame, maintained by the dispatcher.
	pub depth: usize,
}

/// A log emitted by LOG0..LOG4.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Log {
	/// Emitting address.
	pub address: H160,
	/// Indexed topics, at most four.
	pub topics: Vec<H256>,
	/// Payload bytes, read from memory.
	pub data: Vec<u8>,
}

/// Handle to a point in a backend's journal. Reverting to a snapshot undoes
/// every write recorded after it was taken.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Snapshot(pub usize);

/// Opcodes the frame cannot resolve locally. The interpreter charges their
/// gas, leaves their arguments on the stack, and surfaces the trap; the
/// dispatcher decodes the arguments, runs the child frame, and pushes the
/// result before stepping the machine again.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CallCreateTrap {
	/// `CREATE`
	Create,
	/// `CALL`
	Call,
	/// `CALLCODE`
	CallCode,
	/// `DELEGATECALL`
	DelegateCall,
}

impl CallCreateTrap {
	/// The opcode that raised the trap.
	#[must_use]
	pub const fn opcode(self) -> Opcode {
		match self {
			Self::Create => Opcode::CREATE,
			Self::Call => Opcode::CALL,
			Self::CallCode => Opcode::CALLCODE,
			Self::DelegateCall => Opcode::DELEGATECALL,
		}
	}
}

/// Block-level context the frame reads but never writes.
pub trait RuntimeEnvironment {
	/// Get the hash of one of the 256 most recent blocks, or zero outside
	/// that window.
	fn block_hash(&self, number: U256) -> H256;
	/// Get the current block number.
	fn block_number(&self) -> U256;
	/// Get the beneficiary address of the current block.
	fn block_coinbase(&self) -> H160;
	/// Get the timestamp of the current block.
	fn block_timestamp(&self) -> U256;
	/// Get the difficulty of the current block.
	fn block_difficulty(&self) -> U256;
	/// Get the gas limit of the current block.
	fn block_gas_limit(&self) -> U256;
}

/// World state as seen by a frame: a journaled, transactional view over
/// accounts. Writes materialize only when the dispatcher commits the frame's
/// snapshot.
pub trait RuntimeBackend {
	/// Get balance of address.
	fn balance(&self, address: H160) -> U256;
	/// Get code size of address.
	fn code_size(&self, address: H160) -> U256;
	/// Get code hash of address.
	fn code_hash(&self, address: H160) -> H256;
	/// Get code of address.
	fn code(&self, address: H160) -> Vec<u8>;
	/// Get storage value of address at index.
	fn storage(&self, address: H160, index: H256) -> H256;
	/// Get the nonce of an account.
	fn nonce(&self, address: H160) -> U256;
	/// Check whether an address exists.
	fn exists(&self, address: H160) -> bool;
	/// Check whether an address has already been marked for deletion.
	fn deleted(&self, address: H160) -> bool;

	/// Set storage value of address at index, returning the prior value.
	fn set_storage(&mut self, address: H160, index: H256, value: H256)
		-> Result<H256, ExitError>;
	/// Append a log to the transaction's log series.
	fn log(&mut self, log: Log) -> Result<(), ExitError>;
	/// Mark an address for deletion, moving its balance to the target.
	fn mark_delete(&mut self, address: H160, target: H160) -> Result<(), ExitError>;
	/// Increase the nonce of an account.
	fn inc_nonce(&mut self, address: H160) -> Result<(), ExitError>;

	/// Take a snapshot of the journal.
	fn snapshot(&mut self) -> Snapshot;
	/// Undo every write recorded after the snapshot.
	fn revert_to(&mut self, snapshot: Snapshot);
	/// Keep the writes recorded after the snapshot.
	fn commit(&mut self, snapshot: Snapshot);
}

/// Everything a frame needs from its host.
pub trait Handler: RuntimeEnvironment + RuntimeBackend {}

impl<T: RuntimeEnvironment + RuntimeBackend> Handler for T {}

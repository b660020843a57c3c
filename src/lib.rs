//! Frame-level execution core for the Ethereum Virtual Machine.
//!
//! One [Machine] is one frame: the ephemeral machine state of a single
//! invocation (stack, memory, program counter, gas meter) together with its
//! immutable execution environment. The interpreter advances it cycle by
//! cycle, charging gas before each opcode body runs, until the frame halts
//! normally, halts exceptionally, reverts, or traps into the dispatcher for
//! a nested call or create.
//!
//! World state and block context are external collaborators behind the
//! [RuntimeBackend] and [RuntimeEnvironment] traits. [InMemoryBackend]
//! provides a journaled reference implementation.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod backend;
mod error;
mod eval;
mod gasometer;
mod interpreter;
mod memory;
mod opcode;
mod runtime;
mod stack;
pub mod utils;
mod valids;

pub use crate::backend::{InMemoryAccount, InMemoryBackend, InMemoryEnvironment};
pub use crate::error::{Capture, ExitError, ExitException, ExitResult, ExitSucceed};
pub use crate::eval::Control;
pub use crate::gasometer::Gasometer;
pub use crate::memory::Memory;
pub use crate::opcode::{OpInfo, Opcode};
pub use crate::runtime::{
	CallCreateTrap, Context, Handler, Log, RuntimeBackend, RuntimeEnvironment, RuntimeState,
	Snapshot, TransactionContext,
};
pub use crate::stack::Stack;
pub use crate::valids::Valids;

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::ops::Range;

use primitive_types::U256;

/// Core execution layer for one EVM frame.
pub struct Machine {
	/// Program code.
	code: Rc<Vec<u8>>,
	/// Call data.
	data: Rc<Vec<u8>>,
	/// Program counter, or the frame outcome once terminated.
	position: Result<usize, ExitResult>,
	/// Range of memory holding the frame's return value.
	return_range: Range<U256>,
	/// Code validity map.
	valids: Valids,
	/// Memory.
	pub memory: Memory,
	/// Stack.
	pub stack: Stack,
	/// Execution environment.
	pub state: RuntimeState,
	/// Gas meter.
	pub gasometer: Gasometer,
}

impl Machine {
	/// Create a new machine with the given code and data.
	pub fn new(
		code: Rc<Vec<u8>>,
		data: Rc<Vec<u8>>,
		stack_limit: usize,
		memory_limit: usize,
		gas_limit: u64,
		state: RuntimeState,
	) -> Self {
		let valids = Valids::new(&code[..]);

		Self {
			code,
			data,
			position: Ok(0),
			return_range: U256::zero()..U256::zero(),
			valids,
			memory: Memory::new(memory_limit),
			stack: Stack::new(stack_limit),
			state,
			gasometer: Gasometer::new(gas_limit),
		}
	}

	/// Machine code.
	#[must_use]
	pub fn code(&self) -> &[u8] {
		&self.code
	}

	/// Call data of the frame.
	#[must_use]
	pub fn data(&self) -> &[u8] {
		&self.data
	}

	/// Code byte at the position. Bytes past the end of code read as STOP.
	#[must_use]
	pub fn code_byte_at(&self, position: usize) -> u8 {
		self.code.get(position).copied().unwrap_or(0)
	}

	/// Reference of the program counter, or the recorded outcome of a
	/// terminated frame.
	#[must_use]
	pub const fn position(&self) -> &Result<usize, ExitResult> {
		&self.position
	}

	/// Jump destination map of the code.
	#[must_use]
	pub const fn valids(&self) -> &Valids {
		&self.valids
	}

	/// Remaining gas.
	#[must_use]
	pub fn gas_left(&self) -> U256 {
		self.gasometer.gas()
	}

	/// Explicit exit of the machine. Further step will return the reason.
	pub fn exit(&mut self, reason: ExitResult) {
		self.position = Err(reason);
	}

	/// Inspect the machine's next opcode and current stack.
	#[must_use]
	pub fn inspect(&self) -> Option<(Opcode, &Stack)> {
		let position = match self.position {
			Ok(position) => position,
			Err(_) => return None,
		};
		self.code.get(position).map(|v| (Opcode(*v), &self.stack))
	}

	/// Copy and get the return value of the machine, if any.
	#[must_use]
	pub fn return_value(&self) -> Vec<u8> {
		if self.return_range.start > U256::from(usize::MAX) {
			let mut ret = Vec::new();
			ret.resize(
				(self.return_range.end - self.return_range.start).as_usize(),
				0,
			);
			ret
		} else if self.return_range.end > U256::from(usize::MAX) {
			let mut ret = self.memory.get(
				self.return_range.start.as_usize(),
				usize::MAX - self.return_range.start.as_usize(),
			);
			while ret.len() < (self.return_range.end - self.return_range.start).as_usize() {
				ret.push(0);
			}
			ret
		} else {
			self.memory.get(
				self.return_range.start.as_usize(),
				(self.return_range.end - self.return_range.start).as_usize(),
			)
		}
	}
}

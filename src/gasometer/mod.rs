//! Gas accounting for the interpreter cycle.
//!
//! Each cycle costs `C_op + C_mem`, where `C_op` comes either from the
//! static tier table or from a cost computed over the decoded stack
//! arguments, and `C_mem` is the increment of the quadratic memory schedule
//! caused by the cycle's prospective memory growth. Both components are
//! charged against the meter before the opcode body runs.

mod consts;
mod costs;

use core::cmp::min;

use primitive_types::{H160, H256, U256};

use crate::error::ExitException;
use crate::opcode::Opcode;
use crate::runtime::RuntimeBackend;
use crate::stack::Stack;
use crate::utils::{u256_to_h160, u256_to_h256};

pub use self::costs::memory_gas;

/// The gas meter of one frame. Monotonically non-increasing remaining gas,
/// a monotone active-word count, and the transaction's refund accumulator.
#[derive(Clone, Debug)]
pub struct Gasometer {
	gas_limit: u64,
	used_gas: u64,
	memory_gas: u64,
	active_words: usize,
	refunded_gas: i64,
}

impl Gasometer {
	/// Create a new gasometer with the given gas limit.
	#[must_use]
	pub const fn new(gas_limit: u64) -> Self {
		Self {
			gas_limit,
			used_gas: 0,
			memory_gas: 0,
			active_words: 0,
			refunded_gas: 0,
		}
	}

	/// The frame's gas limit.
	#[must_use]
	pub const fn gas_limit(&self) -> u64 {
		self.gas_limit
	}

	/// Total used gas: explicit costs plus the memory schedule total.
	#[must_use]
	pub const fn total_used_gas(&self) -> u64 {
		self.used_gas + self.memory_gas
	}

	/// Remaining gas.
	#[must_use]
	pub const fn gas64(&self) -> u64 {
		self.gas_limit - self.used_gas - self.memory_gas
	}

	/// Remaining gas, as a word for the GAS opcode.
	#[must_use]
	pub fn gas(&self) -> U256 {
		U256::from(self.gas64())
	}

	/// Number of 32-byte memory words ever paid for in this frame.
	#[must_use]
	pub const fn active_words(&self) -> usize {
		self.active_words
	}

	/// The refund accumulated so far, harvested by the transaction layer on
	/// non-exceptional termination.
	#[must_use]
	pub const fn refunded_gas(&self) -> i64 {
		self.refunded_gas
	}

	/// The refund actually creditable, bounded by half the gas used.
	#[must_use]
	pub fn effective_refund(&self) -> u64 {
		let refunded = if self.refunded_gas >= 0 {
			self.refunded_gas as u64
		} else {
			0
		};
		min(self.total_used_gas() / 2, refunded)
	}

	/// Record an explicit cost. Fails with `OutOfGas`, charging nothing,
	/// when the remaining gas does not cover it.
	pub fn record_cost(&mut self, cost: u64) -> Result<(), ExitException> {
		let all_gas_cost = self
			.total_used_gas()
			.checked_add(cost)
			.ok_or(ExitException::OutOfGas)?;
		if self.gas_limit < all_gas_cost {
			return Err(ExitException::OutOfGas);
		}

		self.used_gas += cost;
		Ok(())
	}

	/// Accumulate a refund.
	pub fn record_refund(&mut self, refund: i64) {
		self.refunded_gas += refund;
	}

	/// Promote the active-word count, charging the memory-schedule increment.
	/// Purely monotonic: a count at or below the current one is free.
	pub fn set_active_words(&mut self, words: usize) -> Result<(), ExitException> {
		if words <= self.active_words {
			return Ok(());
		}

		let memory_gas = costs::memory_gas(words)?;
		let all_gas_cost = self
			.used_gas
			.checked_add(memory_gas)
			.ok_or(ExitException::OutOfGas)?;
		if self.gas_limit < all_gas_cost {
			return Err(ExitException::OutOfGas);
		}

		self.active_words = words;
		self.memory_gas = memory_gas;
		Ok(())
	}

	/// Consume everything that remains. Exceptional halts land here.
	pub fn oog(&mut self) {
		self.memory_gas = 0;
		self.refunded_gas = 0;
		self.used_gas = self.gas_limit;
	}
}

/// Charge one cycle's cost for `opcode` before its body runs. The stack is
/// only peeked; on any error the meter is left for the caller to fail the
/// frame.
pub fn charge_opcode<H: RuntimeBackend>(
	gasometer: &mut Gasometer,
	address: H160,
	opcode: Opcode,
	stack: &Stack,
	handler: &H,
) -> Result<(), ExitException> {
	if let Some(cost) = consts::STATIC_COST_TABLE[opcode.as_usize()] {
		gasometer.record_cost(cost)
	} else {
		let (gas_cost, memory_cost) = dynamic_opcode_cost(address, opcode, stack, handler)?;

		gasometer.record_cost(gas_cost.cost()?)?;
		if let Some(memory) = memory_cost {
			if let Some(words) = memory.active_words()? {
				gasometer.set_active_words(words)?;
			}
		}
		gasometer.record_refund(gas_cost.refund());
		Ok(())
	}
}

/// Calculate the opcode cost for opcodes outside the static table.
fn dynamic_opcode_cost<H: RuntimeBackend>(
	address: H160,
	opcode: Opcode,
	stack: &Stack,
	handler: &H,
) -> Result<(GasCost, Option<MemoryCost>), ExitException> {
	let gas_cost = match opcode {
		Opcode::RETURN | Opcode::REVERT => GasCost::Zero,

		Opcode::MLOAD | Opcode::MSTORE | Opcode::MSTORE8 => GasCost::VeryLow,

		Opcode::SHA3 => GasCost::Sha3 {
			len: stack.peek(1)?,
		},

		Opcode::EXP => GasCost::Exp {
			power: stack.peek(1)?,
		},

		Opcode::CALLDATACOPY | Opcode::CODECOPY => GasCost::VeryLowCopy {
			len: stack.peek(2)?,
		},

		Opcode::EXTCODECOPY => GasCost::ExtCodeCopy {
			len: stack.peek(3)?,
		},

		Opcode::SSTORE => {
			let index = u256_to_h256(stack.peek(0)?);
			GasCost::SStore {
				current: handler.storage(address, index),
				new: u256_to_h256(stack.peek(1)?),
			}
		}

		Opcode(n @ 0xa0..=0xa4) => GasCost::Log {
			n: n - 0xa0,
			len: stack.peek(1)?,
		},

		Opcode::CREATE => GasCost::Create,

		Opcode::CALL => {
			let target = u256_to_h160(stack.peek(1)?);
			GasCost::Call {
				value: stack.peek(2)?,
				target_exists: handler.exists(target),
			}
		}

		Opcode::CALLCODE => GasCost::CallCode {
			value: stack.peek(2)?,
		},

		Opcode::DELEGATECALL => GasCost::DelegateCall,

		Opcode::SUICIDE => {
			let target = u256_to_h160(stack.peek(0)?);
			GasCost::Suicide {
				value: handler.balance(address),
				target_exists: handler.exists(target),
				already_removed: handler.deleted(address),
			}
		}

		_ => return Err(ExitException::InvalidOpcode(opcode)),
	};

	let memory_cost = match opcode {
		Opcode::SHA3 | Opcode::RETURN | Opcode::REVERT | Opcode(0xa0..=0xa4) => Some(MemoryCost {
			offset: stack.peek(0)?,
			len: stack.peek(1)?,
		}),

		Opcode::CALLDATACOPY | Opcode::CODECOPY => Some(MemoryCost {
			offset: stack.peek(0)?,
			len: stack.peek(2)?,
		}),

		Opcode::EXTCODECOPY => Some(MemoryCost {
			offset: stack.peek(1)?,
			len: stack.peek(3)?,
		}),

		Opcode::MLOAD | Opcode::MSTORE => Some(MemoryCost {
			offset: stack.peek(0)?,
			len: U256::from(32),
		}),

		Opcode::MSTORE8 => Some(MemoryCost {
			offset: stack.peek(0)?,
			len: U256::one(),
		}),

		Opcode::CREATE => Some(MemoryCost {
			offset: stack.peek(1)?,
			len: stack.peek(2)?,
		}),

		Opcode::CALL | Opcode::CALLCODE => Some(
			MemoryCost {
				offset: stack.peek(3)?,
				len: stack.peek(4)?,
			}
			.join(MemoryCost {
				offset: stack.peek(5)?,
				len: stack.peek(6)?,
			}),
		),

		Opcode::DELEGATECALL => Some(
			MemoryCost {
				offset: stack.peek(2)?,
				len: stack.peek(3)?,
			}
			.join(MemoryCost {
				offset: stack.peek(4)?,
				len: stack.peek(5)?,
			}),
		),

		_ => None,
	};

	Ok((gas_cost, memory_cost))
}

/// Gas cost for one opcode outside the static table.
#[derive(Debug, Clone, Copy)]
enum GasCost {
	/// Zero gas cost.
	Zero,
	/// Very low gas cost.
	VeryLow,
	/// Gas cost for `SHA3`.
	Sha3 {
		/// Length of the hashed data.
		len: U256,
	},
	/// Gas cost for `EXP`.
	Exp {
		/// Power of `EXP`.
		power: U256,
	},
	/// Gas cost for `SSTORE`.
	SStore {
		/// Value currently in the slot.
		current: H256,
		/// Value about to be written.
		new: H256,
	},
	/// Gas cost for `LOG0`..`LOG4`.
	Log {
		/// Topic count.
		n: u8,
		/// Data length.
		len: U256,
	},
	/// Gas cost for copy opcodes in the very-low tier.
	VeryLowCopy {
		/// Length.
		len: U256,
	},
	/// Gas cost for `EXTCODECOPY`.
	ExtCodeCopy {
		/// Length.
		len: U256,
	},
	/// Gas cost for `CREATE`.
	Create,
	/// Gas cost for `CALL`.
	Call {
		/// Call value.
		value: U256,
		/// Whether the target exists.
		target_exists: bool,
	},
	/// Gas cost for `CALLCODE`.
	CallCode {
		/// Call value.
		value: U256,
	},
	/// Gas cost for `DELEGATECALL`.
	DelegateCall,
	/// Gas cost for `SUICIDE`.
	Suicide {
		/// Balance that would move to the beneficiary.
		value: U256,
		/// Whether the beneficiary exists.
		target_exists: bool,
		/// Whether the executing account is already marked for deletion.
		already_removed: bool,
	},
}

impl GasCost {
	/// Returns the gas cost numerical value.
	fn cost(&self) -> Result<u64, ExitException> {
		Ok(match *self {
			GasCost::Zero => consts::G_ZERO,
			GasCost::VeryLow => consts::G_VERYLOW,
			GasCost::Sha3 { len } => costs::sha3_cost(len)?,
			GasCost::Exp { power } => costs::exp_cost(power),
			GasCost::SStore { current, new } => costs::sstore_cost(current, new),
			GasCost::Log { n, len } => costs::log_cost(n, len)?,
			GasCost::VeryLowCopy { len } => costs::verylowcopy_cost(len)?,
			GasCost::ExtCodeCopy { len } => costs::extcodecopy_cost(len)?,
			GasCost::Create => consts::G_CREATE,
			GasCost::Call {
				value,
				target_exists,
			} => costs::call_cost(value, true, true, !target_exists),
			GasCost::CallCode { value } => costs::call_cost(value, true, false, false),
			GasCost::DelegateCall => costs::call_cost(U256::zero(), false, false, false),
			GasCost::Suicide {
				value,
				target_exists,
				..
			} => costs::suicide_cost(value, target_exists),
		})
	}

	/// Numeric value for the refund.
	fn refund(&self) -> i64 {
		match *self {
			GasCost::SStore { current, new } => costs::sstore_refund(current, new),
			GasCost::Suicide {
				already_removed, ..
			} => costs::suicide_refund(already_removed),
			_ => 0,
		}
	}
}

/// Prospective memory footprint of one opcode, from its decoded arguments.
#[derive(Debug, Clone, Copy)]
struct MemoryCost {
	/// Affected memory offset.
	offset: U256,
	/// Affected length.
	len: U256,
}

impl MemoryCost {
	/// Join two memory regions, keeping whichever ends higher.
	fn join(self, other: MemoryCost) -> MemoryCost {
		if self.len == U256::zero() {
			return other;
		}

		if other.len == U256::zero() {
			return self;
		}

		let self_end = self.offset.saturating_add(self.len);
		let other_end = other.offset.saturating_add(other.len);

		if self_end >= other_end {
			self
		} else {
			other
		}
	}

	/// The word-aligned high-water mark the access implies, or `None` for a
	/// zero-length access, which never touches memory.
	fn active_words(&self) -> Result<Option<usize>, ExitException> {
		let from = self.offset;
		let len = self.len;

		if len == U256::zero() {
			return Ok(None);
		}

		let end = from.checked_add(len).ok_or(ExitException::OutOfGas)?;

		if end > U256::from(usize::MAX) {
			return Err(ExitException::OutOfGas);
		}
		let end = end.as_usize();

		let rem = end % 32;
		let new = if rem == 0 { end / 32 } else { end / 32 + 1 };

		Ok(Some(new))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn record_cost_never_overdraws() {
		let mut gasometer = Gasometer::new(10);
		gasometer.record_cost(8).unwrap();
		assert_eq!(gasometer.record_cost(3), Err(ExitException::OutOfGas));
		// A failed charge leaves the meter untouched.
		assert_eq!(gasometer.gas64(), 2);
		gasometer.record_cost(2).unwrap();
		assert_eq!(gasometer.gas64(), 0);
	}

	#[test]
	fn active_words_are_monotone() {
		let mut gasometer = Gasometer::new(1_000_000);
		gasometer.set_active_words(4).unwrap();
		let gas_after_four = gasometer.gas64();
		gasometer.set_active_words(2).unwrap();
		assert_eq!(gasometer.active_words(), 4);
		assert_eq!(gasometer.gas64(), gas_after_four);
		gasometer.set_active_words(8).unwrap();
		assert!(gasometer.gas64() < gas_after_four);
	}

	#[test]
	fn memory_increment_is_total_difference() {
		// Growing to a words then b words costs exactly M(b) - M(0).
		let mut gasometer = Gasometer::new(1_000_000);
		gasometer.set_active_words(100).unwrap();
		gasometer.set_active_words(1000).unwrap();
		assert_eq!(
			gasometer.total_used_gas(),
			costs::memory_gas(1000).unwrap()
		);
	}

	#[test]
	fn oog_consumes_everything() {
		let mut gasometer = Gasometer::new(1000);
		gasometer.record_cost(10).unwrap();
		gasometer.record_refund(15000);
		gasometer.oog();
		assert_eq!(gasometer.gas64(), 0);
		assert_eq!(gasometer.refunded_gas(), 0);
	}

	#[test]
	fn effective_refund_is_bounded() {
		let mut gasometer = Gasometer::new(100_000);
		gasometer.record_cost(10_000).unwrap();
		gasometer.record_refund(15_000);
		assert_eq!(gasometer.effective_refund(), 5_000);
		gasometer.record_cost(20_000).unwrap();
		assert_eq!(gasometer.effective_refund(), 15_000);
	}
}

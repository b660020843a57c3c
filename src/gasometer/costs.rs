use primitive_types::{H256, U256};

use super::consts::*;
use crate::error::ExitException;

/// Total memory cost `M(a)` for `a` active words.
pub fn memory_gas(active_words: usize) -> Result<u64, ExitException> {
	let words = active_words as u64;
	let linear = G_MEMORY
		.checked_mul(words)
		.ok_or(ExitException::OutOfGas)?;
	let quadratic = words.checked_mul(words).ok_or(ExitException::OutOfGas)? / 512;
	linear
		.checked_add(quadratic)
		.ok_or(ExitException::OutOfGas)
}

fn ceil_words(len: U256) -> U256 {
	let wordd = len / U256::from(32);
	let wordr = len % U256::from(32);
	if wordr == U256::zero() {
		wordd
	} else {
		wordd + U256::one()
	}
}

fn finish(gas: U256) -> Result<u64, ExitException> {
	if gas > U256::from(u64::MAX) {
		return Err(ExitException::OutOfGas);
	}
	Ok(gas.as_u64())
}

pub fn sha3_cost(len: U256) -> Result<u64, ExitException> {
	let gas = U256::from(G_SHA3)
		.checked_add(
			U256::from(G_SHA3WORD)
				.checked_mul(ceil_words(len))
				.ok_or(ExitException::OutOfGas)?,
		)
		.ok_or(ExitException::OutOfGas)?;
	finish(gas)
}

pub fn log_cost(n: u8, len: U256) -> Result<u64, ExitException> {
	let gas = U256::from(G_LOG)
		.checked_add(
			U256::from(G_LOGDATA)
				.checked_mul(len)
				.ok_or(ExitException::OutOfGas)?,
		)
		.ok_or(ExitException::OutOfGas)?
		.checked_add(U256::from(G_LOGTOPIC * u64::from(n)))
		.ok_or(ExitException::OutOfGas)?;
	finish(gas)
}

pub fn verylowcopy_cost(len: U256) -> Result<u64, ExitException> {
	copy_cost(G_VERYLOW, len)
}

pub fn extcodecopy_cost(len: U256) -> Result<u64, ExitException> {
	copy_cost(G_EXTCODE, len)
}

fn copy_cost(base: u64, len: U256) -> Result<u64, ExitException> {
	let gas = U256::from(base)
		.checked_add(
			U256::from(G_COPY)
				.checked_mul(ceil_words(len))
				.ok_or(ExitException::OutOfGas)?,
		)
		.ok_or(ExitException::OutOfGas)?;
	finish(gas)
}

/// EXP cost, driven by the big-endian byte length of the exponent, with
/// `byte_length(0) = 0`.
pub fn exp_cost(power: U256) -> u64 {
	if power == U256::zero() {
		G_EXP
	} else {
		G_EXP + G_EXPBYTE * (power.bits() as u64 + 7) / 8
	}
}

/// SSTORE cost, from the value currently in the slot and the value about to
/// be written.
pub fn sstore_cost(current: H256, new: H256) -> u64 {
	if current == H256::default() && new != H256::default() {
		G_SSET
	} else {
		G_SRESET
	}
}

/// SSTORE refund: clearing a non-zero slot credits the transaction.
pub fn sstore_refund(current: H256, new: H256) -> i64 {
	if current != H256::default() && new == H256::default() {
		R_SCLEAR
	} else {
		0
	}
}

pub fn call_cost(value: U256, is_call_or_callcode: bool, is_call: bool, new_account: bool) -> u64 {
	let transfers_value = value != U256::zero();
	G_CALL + xfer_cost(is_call_or_callcode, transfers_value)
		+ new_cost(is_call, new_account, transfers_value)
}

fn xfer_cost(is_call_or_callcode: bool, transfers_value: bool) -> u64 {
	if is_call_or_callcode && transfers_value {
		G_CALLVALUE
	} else {
		0
	}
}

fn new_cost(is_call: bool, new_account: bool, transfers_value: bool) -> u64 {
	if is_call && new_account && transfers_value {
		G_NEWACCOUNT
	} else {
		0
	}
}

pub fn suicide_cost(value: U256, target_exists: bool) -> u64 {
	let should_charge_topup = value != U256::zero() && !target_exists;
	G_SUICIDE + if should_charge_topup { G_NEWACCOUNT } else { 0 }
}

pub fn suicide_refund(already_removed: bool) -> i64 {
	if already_removed {
		0
	} else {
		R_SUICIDE
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn memory_gas_is_monotone() {
		let mut prior = 0;
		for words in 0..4096usize {
			let gas = memory_gas(words).unwrap();
			assert!(gas >= prior);
			prior = gas;
		}
	}

	#[test]
	fn memory_gas_matches_the_quadratic_schedule() {
		assert_eq!(memory_gas(0).unwrap(), 0);
		assert_eq!(memory_gas(1).unwrap(), 3);
		assert_eq!(memory_gas(32).unwrap(), 98);
		assert_eq!(memory_gas(1024).unwrap(), 3 * 1024 + 2048);
	}

	#[test]
	fn exp_cost_counts_exponent_bytes() {
		assert_eq!(exp_cost(U256::zero()), 10);
		assert_eq!(exp_cost(U256::one()), 20);
		assert_eq!(exp_cost(U256::from(255)), 20);
		assert_eq!(exp_cost(U256::from(256)), 30);
		assert_eq!(exp_cost(U256::MAX), 10 + 10 * 32);
	}

	#[test]
	fn sha3_cost_rounds_up_to_words() {
		assert_eq!(sha3_cost(U256::zero()).unwrap(), 30);
		assert_eq!(sha3_cost(U256::from(1)).unwrap(), 36);
		assert_eq!(sha3_cost(U256::from(32)).unwrap(), 36);
		assert_eq!(sha3_cost(U256::from(33)).unwrap(), 42);
	}

	#[test]
	fn sstore_transitions() {
		let zero = H256::default();
		let one = H256::from_low_u64_be(1);
		assert_eq!(sstore_cost(zero, one), 20000);
		assert_eq!(sstore_cost(one, one), 5000);
		assert_eq!(sstore_cost(one, zero), 5000);
		assert_eq!(sstore_cost(zero, zero), 5000);
		assert_eq!(sstore_refund(one, zero), 15000);
		assert_eq!(sstore_refund(zero, one), 0);
		assert_eq!(sstore_refund(one, one), 0);
	}

	#[test]
	fn call_surcharges() {
		assert_eq!(call_cost(U256::zero(), true, true, true), 700);
		assert_eq!(call_cost(U256::one(), true, false, false), 9700);
		assert_eq!(call_cost(U256::one(), true, true, true), 34700);
		// DELEGATECALL carries no value of its own.
		assert_eq!(call_cost(U256::zero(), false, false, false), 700);
	}
}

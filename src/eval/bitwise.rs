use primitive_types::U256;

use crate::utils::I256;

pub fn slt(op1: U256, op2: U256) -> U256 {
	let op1: I256 = op1.into();
	let op2: I256 = op2.into();

	if op1.lt(&op2) {
		U256::one()
	} else {
		U256::zero()
	}
}

pub fn sgt(op1: U256, op2: U256) -> U256 {
	let op1: I256 = op1.into();
	let op2: I256 = op2.into();

	if op1.gt(&op2) {
		U256::one()
	} else {
		U256::zero()
	}
}

pub fn iszero(op1: U256) -> U256 {
	if op1 == U256::zero() {
		U256::one()
	} else {
		U256::zero()
	}
}

pub fn not(op1: U256) -> U256 {
	!op1
}

pub fn byte(op1: U256, op2: U256) -> U256 {
	if op1 >= U256::from(32) {
		return U256::zero();
	}

	let shift = 8 * (31 - op1.as_usize());
	(op2 >> shift) & U256::from(0xff)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn signed_comparisons() {
		let minus_one = U256::MAX;
		let one = U256::one();
		assert_eq!(slt(minus_one, one), U256::one());
		assert_eq!(slt(one, minus_one), U256::zero());
		assert_eq!(sgt(one, minus_one), U256::one());
		assert_eq!(sgt(minus_one, minus_one), U256::zero());
	}

	#[test]
	fn byte_indexes_from_the_most_significant_end() {
		let word = U256::from_big_endian(&{
			let mut bytes = [0u8; 32];
			bytes[0] = 0xaa;
			bytes[31] = 0xbb;
			bytes
		});
		assert_eq!(byte(U256::zero(), word), U256::from(0xaa));
		assert_eq!(byte(U256::from(31), word), U256::from(0xbb));
		assert_eq!(byte(U256::from(32), word), U256::zero());
	}
}

use core::ops::{Div, Rem};

use primitive_types::{U256, U512};

use crate::utils::I256;

pub fn div(op1: U256, op2: U256) -> U256 {
	if op2 == U256::zero() {
		U256::zero()
	} else {
		op1 / op2
	}
}

pub fn sdiv(op1: U256, op2: U256) -> U256 {
	let op1: I256 = op1.into();
	let op2: I256 = op2.into();
	let ret = op1.div(op2);
	ret.into()
}

pub fn rem(op1: U256, op2: U256) -> U256 {
	if op2 == U256::zero() {
		U256::zero()
	} else {
		op1.rem(op2)
	}
}

pub fn srem(op1: U256, op2: U256) -> U256 {
	if op2 == U256::zero() {
		U256::zero()
	} else {
		let op1: I256 = op1.into();
		let op2: I256 = op2.into();
		let ret = op1.rem(op2);
		ret.into()
	}
}

pub fn addmod(op1: U256, op2: U256, op3: U256) -> U256 {
	if op3 == U256::zero() {
		U256::zero()
	} else {
		let op1: U512 = op1.into();
		let op2: U512 = op2.into();
		let op3: U512 = op3.into();
		let v = (op1 + op2) % op3;
		U256::try_from(v).unwrap_or_else(|_| U256::zero())
	}
}

pub fn mulmod(op1: U256, op2: U256, op3: U256) -> U256 {
	if op3 == U256::zero() {
		U256::zero()
	} else {
		let op1: U512 = op1.into();
		let op2: U512 = op2.into();
		let op3: U512 = op3.into();
		let v = (op1 * op2) % op3;
		U256::try_from(v).unwrap_or_else(|_| U256::zero())
	}
}

pub fn exp(op1: U256, op2: U256) -> U256 {
	let mut op1 = op1;
	let mut op2 = op2;
	let mut r = U256::one();

	while op2 != U256::zero() {
		if op2 & U256::one() != U256::zero() {
			r = r.overflowing_mul(op1).0;
		}
		op2 = op2 >> 1;
		op1 = op1.overflowing_mul(op1).0;
	}

	r
}

pub fn signextend(op1: U256, op2: U256) -> U256 {
	if op1 >= U256::from(32) {
		op2
	} else {
		let bit_index = 8 * op1.as_usize() + 7;
		let bit = op2.bit(bit_index);
		let mask = (U256::one() << bit_index) - U256::one();
		if bit {
			op2 | !mask
		} else {
			op2 & mask
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn division_by_zero_yields_zero() {
		assert_eq!(div(U256::from(10), U256::zero()), U256::zero());
		assert_eq!(sdiv(U256::from(10), U256::zero()), U256::zero());
		assert_eq!(rem(U256::from(10), U256::zero()), U256::zero());
		assert_eq!(srem(U256::from(10), U256::zero()), U256::zero());
		assert_eq!(addmod(U256::one(), U256::one(), U256::zero()), U256::zero());
		assert_eq!(mulmod(U256::one(), U256::one(), U256::zero()), U256::zero());
	}

	#[test]
	fn sdiv_wraps_at_the_minimum() {
		let minus_one = U256::MAX;
		let min = U256::one() << 255;
		assert_eq!(sdiv(min, minus_one), min);
		assert_eq!(sdiv(U256::from(10), minus_one), !U256::from(10) + U256::one());
	}

	#[test]
	fn addmod_survives_word_overflow() {
		// (2^256 - 1 + 2) mod 8 == 1, computed without wrapping.
		assert_eq!(
			addmod(U256::MAX, U256::from(2), U256::from(8)),
			U256::one()
		);
	}

	#[test]
	fn mulmod_survives_word_overflow() {
		assert_eq!(
			mulmod(U256::MAX, U256::MAX, U256::from(7)),
			(U512::from(U256::MAX) * U512::from(U256::MAX) % U512::from(7))
				.try_into()
				.unwrap()
		);
	}

	#[test]
	fn exp_wraps() {
		assert_eq!(exp(U256::from(2), U256::from(10)), U256::from(1024));
		assert_eq!(exp(U256::from(2), U256::from(256)), U256::zero());
		assert_eq!(exp(U256::zero(), U256::zero()), U256::one());
	}

	#[test]
	fn signextend_from_byte_zero() {
		assert_eq!(
			signextend(U256::zero(), U256::from(0x80)),
			U256::MAX - U256::from(0x7f)
		);
		assert_eq!(signextend(U256::zero(), U256::from(0x7f)), U256::from(0x7f));
		assert_eq!(signextend(U256::from(32), U256::MAX), U256::MAX);
	}
}

use alloc::vec::Vec;
use core::cmp::min;

use primitive_types::U256;

use crate::error::ExitException;

/// Byte-addressable EVM memory. Lazily extended, zero-initialized, with the
/// touched extent kept 32-byte aligned.
#[derive(Clone, Debug)]
pub struct Memory {
	data: Vec<u8>,
	effective_len: usize,
	limit: usize,
}

impl Memory {
	/// Create a new memory with the given upper bound on its byte length.
	#[must_use]
	pub const fn new(limit: usize) -> Self {
		Self {
			data: Vec::new(),
			effective_len: 0,
			limit,
		}
	}

	/// Memory limit.
	#[inline]
	#[must_use]
	pub const fn limit(&self) -> usize {
		self.limit
	}

	/// Get the length of the current effective memory range, in bytes. This is
	/// what the MSIZE opcode observes.
	#[inline]
	#[must_use]
	pub const fn effective_len(&self) -> usize {
		self.effective_len
	}

	/// Whether the memory has been touched at all.
	#[inline]
	#[must_use]
	pub const fn is_empty(&self) -> bool {
		self.effective_len == 0
	}

	/// Promote the effective memory range to cover `offset..offset + len`,
	/// aligned to the next 32-byte boundary. A zero `len` never touches
	/// memory.
	pub fn resize_offset(&mut self, offset: U256, len: U256) -> Result<(), ExitException> {
		if len == U256::zero() {
			return Ok(());
		}

		let end = offset
			.checked_add(len)
			.ok_or(ExitException::InvalidMemoryAccess)?;
		if end > U256::from(usize::MAX) {
			return Err(ExitException::InvalidMemoryAccess);
		}

		self.resize_end(end.as_usize())
	}

	/// Promote the effective memory range to end at `end`, aligned to the
	/// next 32-byte boundary. Monotone: the range never shrinks.
	pub fn resize_end(&mut self, end: usize) -> Result<(), ExitException> {
		let end = end
			.checked_add(31)
			.ok_or(ExitException::InvalidMemoryAccess)?
			/ 32 * 32;

		if end > self.limit {
			return Err(ExitException::InvalidMemoryAccess);
		}

		if end > self.effective_len {
			self.effective_len = end;
		}
		Ok(())
	}

	/// Read a memory region at the given offset. Bytes past the allocated
	/// backing are zero, per the lazy-initialization contract.
	#[must_use]
	pub fn get(&self, offset: usize, size: usize) -> Vec<u8> {
		let mut ret = Vec::new();
		ret.resize(size, 0);

		for (index, byte) in ret.iter_mut().enumerate() {
			let position = offset + index;
			if position >= self.data.len() {
				break;
			}

			*byte = self.data[position];
		}

		ret
	}

	/// Write a memory region at the given offset, zero-filling up to
	/// `target_size` when `value` is shorter.
	pub fn set(
		&mut self,
		offset: usize,
		value: &[u8],
		target_size: Option<usize>,
	) -> Result<(), ExitException> {
		let target_size = target_size.unwrap_or(value.len());
		if target_size == 0 {
			return Ok(());
		}

		let end = offset
			.checked_add(target_size)
			.ok_or(ExitException::InvalidMemoryAccess)?;
		if end > self.limit {
			return Err(ExitException::InvalidMemoryAccess);
		}

		if self.data.len() < end {
			self.data.resize(end, 0);
		}

		for index in 0..target_size {
			self.data[offset + index] = if index < value.len() { value[index] } else { 0 };
		}

		Ok(())
	}

	/// Copy `len` bytes of `data` starting at `data_offset` into memory at
	/// `memory_offset`, zero-extending where the source runs out.
	pub fn copy_large(
		&mut self,
		memory_offset: U256,
		data_offset: U256,
		len: U256,
		data: &[u8],
	) -> Result<(), ExitException> {
		if len == U256::zero() {
			return Ok(());
		}

		let memory_offset = if memory_offset > U256::from(usize::MAX) {
			return Err(ExitException::InvalidMemoryAccess);
		} else {
			memory_offset.as_usize()
		};

		let ulen = if len > U256::from(usize::MAX) {
			return Err(ExitException::InvalidMemoryAccess);
		} else {
			len.as_usize()
		};

		let data = if let Some(end) = data_offset.checked_add(len) {
			if end > U256::from(usize::MAX) {
				&[]
			} else {
				let data_offset = data_offset.as_usize();
				let end = end.as_usize();

				if data_offset > data.len() {
					&[]
				} else {
					&data[data_offset..min(end, data.len())]
				}
			}
		} else {
			&[]
		};

		self.set(memory_offset, data, Some(ulen))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reads_are_zero_extended() {
		let memory = Memory::new(0x1000);
		assert_eq!(memory.get(0x40, 4), vec![0, 0, 0, 0]);
	}

	#[test]
	fn effective_len_is_word_aligned_and_monotone() {
		let mut memory = Memory::new(0x1000);
		memory.resize_offset(U256::from(0), U256::from(1)).unwrap();
		assert_eq!(memory.effective_len(), 32);
		memory.resize_offset(U256::from(33), U256::from(1)).unwrap();
		assert_eq!(memory.effective_len(), 64);
		// Touching an already covered range never shrinks the extent.
		memory.resize_offset(U256::from(0), U256::from(1)).unwrap();
		assert_eq!(memory.effective_len(), 64);
	}

	#[test]
	fn zero_length_touch_is_free() {
		let mut memory = Memory::new(0x1000);
		memory
			.resize_offset(U256::MAX, U256::zero())
			.unwrap();
		assert_eq!(memory.effective_len(), 0);
	}

	#[test]
	fn copy_zero_extends_past_source() {
		let mut memory = Memory::new(0x1000);
		memory
			.copy_large(U256::zero(), U256::zero(), U256::from(4), &[0xaa, 0xbb])
			.unwrap();
		assert_eq!(memory.get(0, 4), vec![0xaa, 0xbb, 0, 0]);
	}

	#[test]
	fn set_beyond_limit_is_rejected() {
		let mut memory = Memory::new(64);
		assert_eq!(
			memory.set(60, &[1, 2, 3, 4, 5], None),
			Err(ExitException::InvalidMemoryAccess)
		);
	}
}

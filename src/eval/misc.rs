use core::cmp::min;

use primitive_types::U256;

use super::Control;
use crate::error::{ExitError, ExitException, ExitSucceed};
use crate::Machine;

pub fn codesize(machine: &mut Machine) -> Control {
	let size = U256::from(machine.code.len());
	push_u256!(machine, size);
	Control::Continue(1)
}

pub fn codecopy(machine: &mut Machine) -> Control {
	pop_u256!(machine, memory_offset, code_offset, len);

	try_or_fail!(machine.memory.resize_offset(memory_offset, len));
	match machine
		.memory
		.copy_large(memory_offset, code_offset, len, &machine.code[..])
	{
		Ok(()) => Control::Continue(1),
		Err(e) => Control::Exit(e.into()),
	}
}

pub fn calldataload(machine: &mut Machine) -> Control {
	pop_u256!(machine, index);

	let mut load = [0u8; 32];
	#[allow(clippy::needless_range_loop)]
	for i in 0..32 {
		if let Some(p) = index.checked_add(U256::from(i)) {
			if p <= U256::from(usize::MAX) {
				let p = p.as_usize();
				if p < machine.data.len() {
					load[i] = machine.data[p];
				}
			}
		}
	}

	push_u256!(machine, U256::from_big_endian(&load));
	Control::Continue(1)
}

pub fn calldatasize(machine: &mut Machine) -> Control {
	let len = U256::from(machine.data.len());
	push_u256!(machine, len);
	Control::Continue(1)
}

pub fn calldatacopy(machine: &mut Machine) -> Control {
	pop_u256!(machine, memory_offset, data_offset, len);

	try_or_fail!(machine.memory.resize_offset(memory_offset, len));
	if len == U256::zero() {
		return Control::Continue(1);
	}

	match machine
		.memory
		.copy_large(memory_offset, data_offset, len, &machine.data[..])
	{
		Ok(()) => Control::Continue(1),
		Err(e) => Control::Exit(e.into()),
	}
}

pub fn pop(machine: &mut Machine) -> Control {
	pop_u256!(machine, _any);
	Control::Continue(1)
}

pub fn mload(machine: &mut Machine) -> Control {
	pop_u256!(machine, index);

	try_or_fail!(machine.memory.resize_offset(index, U256::from(32)));
	let index = as_usize_or_fail!(index);
	let value = U256::from_big_endian(&machine.memory.get(index, 32)[..]);

	push_u256!(machine, value);
	Control::Continue(1)
}

pub fn mstore(machine: &mut Machine) -> Control {
	pop_u256!(machine, index, value);

	try_or_fail!(machine.memory.resize_offset(index, U256::from(32)));
	let index = as_usize_or_fail!(index);
	let mut bytes = [0u8; 32];
	value.to_big_endian(&mut bytes);

	match machine.memory.set(index, &bytes, Some(32)) {
		Ok(()) => Control::Continue(1),
		Err(e) => Control::Exit(e.into()),
	}
}

pub fn mstore8(machine: &mut Machine) -> Control {
	pop_u256!(machine, index, value);

	try_or_fail!(machine.memory.resize_offset(index, U256::one()));
	let index = as_usize_or_fail!(index);
	let value = (value.low_u64() & 0xff) as u8;

	match machine.memory.set(index, &[value], Some(1)) {
		Ok(()) => Control::Continue(1),
		Err(e) => Control::Exit(e.into()),
	}
}

pub fn jump(machine: &mut Machine) -> Control {
	pop_u256!(machine, dest);
	let dest = as_usize_or_fail!(dest, ExitException::BadJumpDestination);

	Control::Jump(dest)
}

pub fn jumpi(machine: &mut Machine) -> Control {
	pop_u256!(machine, dest, value);

	if value == U256::zero() {
		Control::Continue(1)
	} else {
		let dest = as_usize_or_fail!(dest, ExitException::BadJumpDestination);
		Control::Jump(dest)
	}
}

pub fn pc(machine: &mut Machine, position: usize) -> Control {
	push_u256!(machine, U256::from(position));
	Control::Continue(1)
}

pub fn msize(machine: &mut Machine) -> Control {
	let len = U256::from(machine.memory.effective_len());
	push_u256!(machine, len);
	Control::Continue(1)
}

pub fn push(machine: &mut Machine, n: usize, position: usize) -> Control {
	let end = min(position + 1 + n, machine.code.len());
	let slice = &machine.code[position + 1..end];
	// Immediate bytes are read big-endian; when code ends early the missing
	// low bytes are zero.
	let mut val = [0u8; 32];
	val[32 - n..32 - n + slice.len()].copy_from_slice(slice);

	let result = U256::from_big_endian(&val);
	push_u256!(machine, result);
	Control::Continue(1 + n)
}

pub fn dup(machine: &mut Machine, n: usize) -> Control {
	let value = match machine.stack.peek(n - 1) {
		Ok(value) => value,
		Err(e) => return Control::Exit(e.into()),
	};

	push_u256!(machine, value);
	Control::Continue(1)
}

pub fn swap(machine: &mut Machine, n: usize) -> Control {
	let val1 = match machine.stack.peek(0) {
		Ok(value) => value,
		Err(e) => return Control::Exit(e.into()),
	};
	let val2 = match machine.stack.peek(n) {
		Ok(value) => value,
		Err(e) => return Control::Exit(e.into()),
	};

	match machine.stack.set(0, val2) {
		Ok(()) => (),
		Err(e) => return Control::Exit(e.into()),
	}
	match machine.stack.set(n, val1) {
		Ok(()) => (),
		Err(e) => return Control::Exit(e.into()),
	}

	Control::Continue(1)
}

pub fn ret(machine: &mut Machine) -> Control {
	pop_u256!(machine, start, len);

	try_or_fail!(machine.memory.resize_offset(start, len));
	machine.return_range = start..(start.saturating_add(len));

	Control::Exit(ExitSucceed::Returned.into())
}

pub fn revert(machine: &mut Machine) -> Control {
	pop_u256!(machine, start, len);

	try_or_fail!(machine.memory.resize_offset(start, len));
	machine.return_range = start..(start.saturating_add(len));

	Control::Exit(ExitError::Reverted.into())
}

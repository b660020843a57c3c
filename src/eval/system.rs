use alloc::vec::Vec;

use primitive_types::{H256, U256};
use sha3::{Digest, Keccak256};

use super::Control;
use crate::error::{ExitException, ExitSucceed};
use crate::runtime::{Log, RuntimeBackend, RuntimeEnvironment};
use crate::utils::{h160_to_u256, u256_to_h160, u256_to_h256};
use crate::Machine;

pub fn sha3(machine: &mut Machine) -> Control {
	pop_u256!(machine, from, len);

	try_or_fail!(machine.memory.resize_offset(from, len));
	let data = if len == U256::zero() {
		Vec::new()
	} else {
		let from = as_usize_or_fail!(from);
		let len = as_usize_or_fail!(len);

		machine.memory.get(from, len)
	};

	let ret = Keccak256::digest(data.as_slice());
	push_h256!(machine, H256::from_slice(ret.as_slice()));

	Control::Continue(1)
}

pub fn address(machine: &mut Machine) -> Control {
	let ret = h160_to_u256(machine.state.context.address);
	push_u256!(machine, ret);
	Control::Continue(1)
}

pub fn caller(machine: &mut Machine) -> Control {
	let ret = h160_to_u256(machine.state.context.caller);
	push_u256!(machine, ret);
	Control::Continue(1)
}

pub fn callvalue(machine: &mut Machine) -> Control {
	let ret = machine.state.context.apparent_value;
	push_u256!(machine, ret);
	Control::Continue(1)
}

pub fn origin(machine: &mut Machine) -> Control {
	let ret = h160_to_u256(machine.state.transaction_context.origin);
	push_u256!(machine, ret);
	Control::Continue(1)
}

pub fn gasprice(machine: &mut Machine) -> Control {
	let ret = machine.state.transaction_context.gas_price;
	push_u256!(machine, ret);
	Control::Continue(1)
}

pub fn balance<H: RuntimeBackend>(machine: &mut Machine, handler: &H) -> Control {
	pop_u256!(machine, target);
	push_u256!(machine, handler.balance(u256_to_h160(target)));

	Control::Continue(1)
}

pub fn extcodesize<H: RuntimeBackend>(machine: &mut Machine, handler: &H) -> Control {
	pop_u256!(machine, target);
	push_u256!(machine, handler.code_size(u256_to_h160(target)));

	Control::Continue(1)
}

pub fn extcodecopy<H: RuntimeBackend>(machine: &mut Machine, handler: &H) -> Control {
	pop_u256!(machine, target, memory_offset, code_offset, len);

	try_or_fail!(machine.memory.resize_offset(memory_offset, len));
	let code = handler.code(u256_to_h160(target));
	match machine
		.memory
		.copy_large(memory_offset, code_offset, len, &code[..])
	{
		Ok(()) => Control::Continue(1),
		Err(e) => Control::Exit(e.into()),
	}
}

pub fn blockhash<H: RuntimeEnvironment>(machine: &mut Machine, handler: &H) -> Control {
	pop_u256!(machine, number);
	push_h256!(machine, handler.block_hash(number));

	Control::Continue(1)
}

pub fn coinbase<H: RuntimeEnvironment>(machine: &mut Machine, handler: &H) -> Control {
	push_u256!(machine, h160_to_u256(handler.block_coinbase()));
	Control::Continue(1)
}

pub fn timestamp<H: RuntimeEnvironment>(machine: &mut Machine, handler: &H) -> Control {
	push_u256!(machine, handler.block_timestamp());
	Control::Continue(1)
}

pub fn number<H: RuntimeEnvironment>(machine: &mut Machine, handler: &H) -> Control {
	push_u256!(machine, handler.block_number());
	Control::Continue(1)
}

pub fn difficulty<H: RuntimeEnvironment>(machine: &mut Machine, handler: &H) -> Control {
	push_u256!(machine, handler.block_difficulty());
	Control::Continue(1)
}

pub fn gaslimit<H: RuntimeEnvironment>(machine: &mut Machine, handler: &H) -> Control {
	push_u256!(machine, handler.block_gas_limit());
	Control::Continue(1)
}

pub fn sload<H: RuntimeBackend>(machine: &mut Machine, handler: &H) -> Control {
	pop_u256!(machine, index);
	let value = handler.storage(machine.state.context.address, u256_to_h256(index));
	push_h256!(machine, value);

	Control::Continue(1)
}

pub fn sstore<H: RuntimeBackend>(machine: &mut Machine, handler: &mut H) -> Control {
	pop_u256!(machine, index, value);

	match handler.set_storage(
		machine.state.context.address,
		u256_to_h256(index),
		u256_to_h256(value),
	) {
		Ok(_prior) => Control::Continue(1),
		Err(e) => Control::Exit(Err(e)),
	}
}

pub fn gas(machine: &mut Machine) -> Control {
	push_u256!(machine, machine.gasometer.gas());
	Control::Continue(1)
}

pub fn log<H: RuntimeBackend>(machine: &mut Machine, n: u8, handler: &mut H) -> Control {
	pop_u256!(machine, offset, len);

	try_or_fail!(machine.memory.resize_offset(offset, len));
	let data = if len == U256::zero() {
		Vec::new()
	} else {
		let offset = as_usize_or_fail!(offset);
		let len = as_usize_or_fail!(len);

		machine.memory.get(offset, len)
	};

	let mut topics = Vec::new();
	for _ in 0..n {
		pop_u256!(machine, topic);
		topics.push(u256_to_h256(topic));
	}

	let log = Log {
		address: machine.state.context.address,
		topics,
		data,
	};
	match handler.log(log) {
		Ok(()) => Control::Continue(1),
		Err(e) => Control::Exit(Err(e)),
	}
}

pub fn suicide<H: RuntimeBackend>(machine: &mut Machine, handler: &mut H) -> Control {
	pop_u256!(machine, target);

	match handler.mark_delete(machine.state.context.address, u256_to_h160(target)) {
		Ok(()) => Control::Exit(ExitSucceed::Suicided.into()),
		Err(e) => Control::Exit(Err(e)),
	}
}

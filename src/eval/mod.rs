//! Actual opcode evaluation implementations.

#[macro_use]
mod macros;
mod arithmetic;
mod bitwise;
mod misc;
mod system;

use core::ops::{BitAnd, BitOr, BitXor};

use primitive_types::U256;

use crate::error::{ExitException, ExitResult, ExitSucceed};
use crate::opcode::Opcode;
use crate::runtime::{CallCreateTrap, Handler};
use crate::Machine;

/// Control state after evaluating one opcode body.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Control {
	/// Advance the program counter by the given amount.
	Continue(usize),
	/// Exit the frame with a reason.
	Exit(ExitResult),
	/// Set the program counter from the stack, subject to destination
	/// validation.
	Jump(usize),
	/// Surface the opcode to the dispatcher.
	Trap(CallCreateTrap),
}

/// Evaluate one opcode body against the machine. Gas for the cycle has
/// already been charged when this runs.
pub fn eval<H: Handler>(
	machine: &mut Machine,
	handle: &mut H,
	opcode: Opcode,
	position: usize,
) -> Control {
	match opcode {
		Opcode::STOP => Control::Exit(ExitSucceed::Stopped.into()),
		Opcode::ADD => op2_u256_tuple!(machine, overflowing_add),
		Opcode::MUL => op2_u256_tuple!(machine, overflowing_mul),
		Opcode::SUB => op2_u256_tuple!(machine, overflowing_sub),
		Opcode::DIV => op2_u256_fn!(machine, self::arithmetic::div),
		Opcode::SDIV => op2_u256_fn!(machine, self::arithmetic::sdiv),
		Opcode::MOD => op2_u256_fn!(machine, self::arithmetic::rem),
		Opcode::SMOD => op2_u256_fn!(machine, self::arithmetic::srem),
		Opcode::ADDMOD => op3_u256_fn!(machine, self::arithmetic::addmod),
		Opcode::MULMOD => op3_u256_fn!(machine, self::arithmetic::mulmod),
		Opcode::EXP => op2_u256_fn!(machine, self::arithmetic::exp),
		Opcode::SIGNEXTEND => op2_u256_fn!(machine, self::arithmetic::signextend),

		Opcode::LT => op2_u256_bool_ref!(machine, lt),
		Opcode::GT => op2_u256_bool_ref!(machine, gt),
		Opcode::SLT => op2_u256_fn!(machine, self::bitwise::slt),
		Opcode::SGT => op2_u256_fn!(machine, self::bitwise::sgt),
		Opcode::EQ => op2_u256_bool_ref!(machine, eq),
		Opcode::ISZERO => op1_u256_fn!(machine, self::bitwise::iszero),
		Opcode::AND => op2_u256!(machine, bitand),
		Opcode::OR => op2_u256!(machine, bitor),
		Opcode::XOR => op2_u256!(machine, bitxor),
		Opcode::NOT => op1_u256_fn!(machine, self::bitwise::not),
		Opcode::BYTE => op2_u256_fn!(machine, self::bitwise::byte),

		Opcode::SHA3 => self::system::sha3(machine),

		Opcode::ADDRESS => self::system::address(machine),
		Opcode::BALANCE => self::system::balance(machine, handle),
		Opcode::ORIGIN => self::system::origin(machine),
		Opcode::CALLER => self::system::caller(machine),
		Opcode::CALLVALUE => self::system::callvalue(machine),
		Opcode::CALLDATALOAD => self::misc::calldataload(machine),
		Opcode::CALLDATASIZE => self::misc::calldatasize(machine),
		Opcode::CALLDATACOPY => self::misc::calldatacopy(machine),
		Opcode::CODESIZE => self::misc::codesize(machine),
		Opcode::CODECOPY => self::misc::codecopy(machine),
		Opcode::GASPRICE => self::system::gasprice(machine),
		Opcode::EXTCODESIZE => self::system::extcodesize(machine, handle),
		Opcode::EXTCODECOPY => self::system::extcodecopy(machine, handle),

		Opcode::BLOCKHASH => self::system::blockhash(machine, handle),
		Opcode::COINBASE => self::system::coinbase(machine, handle),
		Opcode::TIMESTAMP => self::system::timestamp(machine, handle),
		Opcode::NUMBER => self::system::number(machine, handle),
		Opcode::DIFFICULTY => self::system::difficulty(machine, handle),
		Opcode::GASLIMIT => self::system::gaslimit(machine, handle),

		Opcode::POP => self::misc::pop(machine),
		Opcode::MLOAD => self::misc::mload(machine),
		Opcode::MSTORE => self::misc::mstore(machine),
		Opcode::MSTORE8 => self::misc::mstore8(machine),
		Opcode::SLOAD => self::system::sload(machine, handle),
		Opcode::SSTORE => self::system::sstore(machine, handle),
		Opcode::JUMP => self::misc::jump(machine),
		Opcode::JUMPI => self::misc::jumpi(machine),
		Opcode::PC => self::misc::pc(machine, position),
		Opcode::MSIZE => self::misc::msize(machine),
		Opcode::GAS => self::system::gas(machine),
		Opcode::JUMPDEST => Control::Continue(1),

		Opcode(n @ 0x60..=0x7f) => self::misc::push(machine, (n - 0x5f) as usize, position),
		Opcode(n @ 0x80..=0x8f) => self::misc::dup(machine, (n - 0x7f) as usize),
		Opcode(n @ 0x90..=0x9f) => self::misc::swap(machine, (n - 0x8f) as usize),
		Opcode(n @ 0xa0..=0xa4) => self::system::log(machine, n - 0xa0, handle),

		Opcode::CREATE => Control::Trap(CallCreateTrap::Create),
		Opcode::CALL => Control::Trap(CallCreateTrap::Call),
		Opcode::CALLCODE => Control::Trap(CallCreateTrap::CallCode),
		Opcode::DELEGATECALL => Control::Trap(CallCreateTrap::DelegateCall),

		Opcode::RETURN => self::misc::ret(machine),
		Opcode::REVERT => self::misc::revert(machine),
		Opcode::INVALID => Control::Exit(ExitException::DesignatedInvalid.into()),
		Opcode::SUICIDE => self::system::suicide(machine, handle),

		_ => Control::Exit(ExitException::InvalidOpcode(opcode).into()),
	}
}

use crate::opcode::Opcode;

pub const G_ZERO: u64 = 0;
pub const G_BASE: u64 = 2;
pub const G_VERYLOW: u64 = 3;
pub const G_LOW: u64 = 5;
pub const G_MID: u64 = 8;
pub const G_HIGH: u64 = 10;
pub const G_EXTCODE: u64 = 700;
pub const G_BALANCE: u64 = 400;
pub const G_SLOAD: u64 = 50;
pub const G_JUMPDEST: u64 = 1;
pub const G_SSET: u64 = 20000;
pub const G_SRESET: u64 = 5000;
pub const R_SCLEAR: i64 = 15000;
pub const G_SUICIDE: u64 = 5000;
pub const R_SUICIDE: i64 = 24000;
pub const G_CREATE: u64 = 32000;
pub const G_CALL: u64 = 700;
pub const G_CALLVALUE: u64 = 9000;
pub const G_NEWACCOUNT: u64 = 25000;
pub const G_EXP: u64 = 10;
pub const G_EXPBYTE: u64 = 10;
pub const G_MEMORY: u64 = 3;
pub const G_LOG: u64 = 375;
pub const G_LOGDATA: u64 = 8;
pub const G_LOGTOPIC: u64 = 375;
pub const G_SHA3: u64 = 30;
pub const G_SHA3WORD: u64 = 6;
pub const G_COPY: u64 = 3;
pub const G_BLOCKHASH: u64 = 20;

/// Costs for every opcode whose charge depends neither on its arguments nor
/// on memory growth. Opcodes absent here go through the dynamic path.
pub static STATIC_COST_TABLE: [Option<u64>; 256] = static_cost_table();

const fn static_cost_table() -> [Option<u64>; 256] {
	let mut table: [Option<u64>; 256] = [None; 256];

	table[Opcode::STOP.as_usize()] = Some(G_ZERO);

	table[Opcode::ADDRESS.as_usize()] = Some(G_BASE);
	table[Opcode::ORIGIN.as_usize()] = Some(G_BASE);
	table[Opcode::CALLER.as_usize()] = Some(G_BASE);
	table[Opcode::CALLVALUE.as_usize()] = Some(G_BASE);
	table[Opcode::CALLDATASIZE.as_usize()] = Some(G_BASE);
	table[Opcode::CODESIZE.as_usize()] = Some(G_BASE);
	table[Opcode::GASPRICE.as_usize()] = Some(G_BASE);
	table[Opcode::COINBASE.as_usize()] = Some(G_BASE);
	table[Opcode::TIMESTAMP.as_usize()] = Some(G_BASE);
	table[Opcode::NUMBER.as_usize()] = Some(G_BASE);
	table[Opcode::DIFFICULTY.as_usize()] = Some(G_BASE);
	table[Opcode::GASLIMIT.as_usize()] = Some(G_BASE);
	table[Opcode::POP.as_usize()] = Some(G_BASE);
	table[Opcode::PC.as_usize()] = Some(G_BASE);
	table[Opcode::MSIZE.as_usize()] = Some(G_BASE);
	table[Opcode::GAS.as_usize()] = Some(G_BASE);

	table[Opcode::ADD.as_usize()] = Some(G_VERYLOW);
	table[Opcode::SUB.as_usize()] = Some(G_VERYLOW);
	table[Opcode::NOT.as_usize()] = Some(G_VERYLOW);
	table[Opcode::LT.as_usize()] = Some(G_VERYLOW);
	table[Opcode::GT.as_usize()] = Some(G_VERYLOW);
	table[Opcode::SLT.as_usize()] = Some(G_VERYLOW);
	table[Opcode::SGT.as_usize()] = Some(G_VERYLOW);
	table[Opcode::EQ.as_usize()] = Some(G_VERYLOW);
	table[Opcode::ISZERO.as_usize()] = Some(G_VERYLOW);
	table[Opcode::AND.as_usize()] = Some(G_VERYLOW);
	table[Opcode::OR.as_usize()] = Some(G_VERYLOW);
	table[Opcode::XOR.as_usize()] = Some(G_VERYLOW);
	table[Opcode::BYTE.as_usize()] = Some(G_VERYLOW);
	table[Opcode::CALLDATALOAD.as_usize()] = Some(G_VERYLOW);

	// PUSH1..PUSH32, DUP1..DUP16 and SWAP1..SWAP16 all share the very-low
	// tier and none of them touch memory.
	let mut i = 0x60;
	while i <= 0x9f {
		table[i] = Some(G_VERYLOW);
		i += 1;
	}

	table[Opcode::MUL.as_usize()] = Some(G_LOW);
	table[Opcode::DIV.as_usize()] = Some(G_LOW);
	table[Opcode::SDIV.as_usize()] = Some(G_LOW);
	table[Opcode::MOD.as_usize()] = Some(G_LOW);
	table[Opcode::SMOD.as_usize()] = Some(G_LOW);
	table[Opcode::SIGNEXTEND.as_usize()] = Some(G_LOW);

	table[Opcode::ADDMOD.as_usize()] = Some(G_MID);
	table[Opcode::MULMOD.as_usize()] = Some(G_MID);
	table[Opcode::JUMP.as_usize()] = Some(G_MID);

	table[Opcode::JUMPI.as_usize()] = Some(G_HIGH);

	table[Opcode::JUMPDEST.as_usize()] = Some(G_JUMPDEST);
	table[Opcode::SLOAD.as_usize()] = Some(G_SLOAD);
	table[Opcode::BALANCE.as_usize()] = Some(G_BALANCE);
	table[Opcode::EXTCODESIZE.as_usize()] = Some(G_EXTCODE);
	table[Opcode::BLOCKHASH.as_usize()] = Some(G_BLOCKHASH);

	// The designated invalid opcode halts in the body; it charges nothing.
	table[Opcode::INVALID.as_usize()] = Some(G_ZERO);

	table
}

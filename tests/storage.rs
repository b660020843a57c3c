use std::collections::BTreeMap;
use std::rc::Rc;

use evm_frame::{
	Capture, Context, ExitError, ExitException, ExitSucceed, InMemoryAccount, InMemoryBackend,
	InMemoryEnvironment, Machine, RuntimeBackend, RuntimeState, TransactionContext,
};
use primitive_types::{H160, H256, U256};

const STACK_LIMIT: usize = 1024;
const MEMORY_LIMIT: usize = 0x10000;

const ADDRESS: H160 = H160(*b"\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\x0a");

fn environment() -> InMemoryEnvironment {
	InMemoryEnvironment {
		block_number: U256::from(1000),
		block_coinbase: H160::default(),
		block_timestamp: U256::from(1_500_000_000u64),
		block_difficulty: U256::from(0x0200_0000u64),
		block_gas_limit: U256::from(8_000_000u64),
		block_hashes: BTreeMap::new(),
	}
}

fn state() -> RuntimeState {
	RuntimeState {
		context: Context {
			address: ADDRESS,
			caller: H160::default(),
			apparent_value: U256::zero(),
		},
		transaction_context: Rc::new(TransactionContext {
			gas_price: U256::zero(),
			origin: H160::default(),
		}),
		depth: 0,
	}
}

fn machine(code: &str, gas_limit: u64) -> Machine {
	Machine::new(
		Rc::new(hex::decode(code).unwrap()),
		Rc::new(Vec::new()),
		STACK_LIMIT,
		MEMORY_LIMIT,
		gas_limit,
		state(),
	)
}

fn backend_with(accounts: BTreeMap<H160, InMemoryAccount>) -> InMemoryBackend {
	InMemoryBackend::new(environment(), accounts)
}

fn account_with_storage(value: u64) -> BTreeMap<H160, InMemoryAccount> {
	let mut storage = BTreeMap::new();
	storage.insert(H256::default(), H256::from_low_u64_be(value));
	let mut accounts = BTreeMap::new();
	accounts.insert(
		ADDRESS,
		InMemoryAccount {
			storage,
			..Default::default()
		},
	);
	accounts
}

#[test]
fn sstore_to_a_fresh_slot_costs_a_set() {
	let mut backend = backend_with(BTreeMap::new());
	// PUSH1 1 (value), PUSH1 0 (key), SSTORE, STOP
	let mut vm = machine("600160005500", 30_000);

	assert_eq!(
		vm.run(&mut backend),
		Capture::Exit(Ok(ExitSucceed::Stopped))
	);
	assert_eq!(vm.gasometer.total_used_gas(), 3 + 3 + 20_000);
	assert_eq!(vm.gasometer.refunded_gas(), 0);
	assert_eq!(
		backend.storage(ADDRESS, H256::default()),
		H256::from_low_u64_be(1)
	);
}

#[test]
fn sstore_over_a_live_slot_costs_a_reset() {
	let mut backend = backend_with(account_with_storage(1));
	let mut vm = machine("600260005500", 30_000);

	assert_eq!(
		vm.run(&mut backend),
		Capture::Exit(Ok(ExitSucceed::Stopped))
	);
	assert_eq!(vm.gasometer.total_used_gas(), 3 + 3 + 5_000);
	assert_eq!(vm.gasometer.refunded_gas(), 0);
}

#[test]
fn sstore_clearing_a_slot_earns_the_refund() {
	let mut backend = backend_with(account_with_storage(1));
	let mut vm = machine("600060005500", 30_000);

	assert_eq!(
		vm.run(&mut backend),
		Capture::Exit(Ok(ExitSucceed::Stopped))
	);
	assert_eq!(vm.gasometer.total_used_gas(), 3 + 3 + 5_000);
	assert_eq!(vm.gasometer.refunded_gas(), 15_000);
	assert_eq!(
		vm.gasometer.effective_refund(),
		vm.gasometer.total_used_gas() / 2
	);
}

#[test]
fn sstore_without_gas_for_the_set_fails() {
	let mut backend = backend_with(BTreeMap::new());
	let mut vm = machine("600160005500", 10_000);

	assert_eq!(
		vm.run(&mut backend),
		Capture::Exit(Err(ExitError::Exception(ExitException::OutOfGas)))
	);
	assert_eq!(backend.storage(ADDRESS, H256::default()), H256::default());
}

#[test]
fn exceptional_frames_roll_back_through_the_snapshot() {
	let mut backend = backend_with(BTreeMap::new());
	// SSTORE a value, then hit the designated invalid opcode.
	let mut vm = machine("6001600055fe", 30_000);

	let snapshot = backend.snapshot();
	assert_eq!(
		vm.run(&mut backend),
		Capture::Exit(Err(ExitError::Exception(
			ExitException::DesignatedInvalid
		)))
	);
	assert_eq!(vm.gas_left(), U256::zero());
	assert_eq!(
		backend.storage(ADDRESS, H256::default()),
		H256::from_low_u64_be(1)
	);

	backend.revert_to(snapshot);
	assert_eq!(backend.storage(ADDRESS, H256::default()), H256::default());
}

#[test]
fn reverted_frames_roll_back_but_keep_return_data() {
	let mut backend = backend_with(BTreeMap::new());
	// SSTORE, then MSTORE a word and REVERT with it.
	let mut vm = machine("6001600055602a60005260206000fd", 30_000);

	let snapshot = backend.snapshot();
	assert_eq!(vm.run(&mut backend), Capture::Exit(Err(ExitError::Reverted)));
	assert!(vm.gas_left() > U256::zero());

	backend.revert_to(snapshot);
	assert_eq!(backend.storage(ADDRESS, H256::default()), H256::default());

	let mut expected = [0u8; 32];
	expected[31] = 0x2a;
	assert_eq!(vm.return_value(), expected.to_vec());
}

#[test]
fn sload_reads_what_sstore_wrote() {
	let mut backend = backend_with(BTreeMap::new());
	// PUSH1 5 (value), PUSH1 3 (key), SSTORE, PUSH1 3, SLOAD, STOP
	let mut vm = machine("600560035560035400", 30_000);

	assert_eq!(
		vm.run(&mut backend),
		Capture::Exit(Ok(ExitSucceed::Stopped))
	);
	assert_eq!(vm.stack.peek(0), Ok(U256::from(5)));
	assert_eq!(vm.gasometer.total_used_gas(), 3 + 3 + 20_000 + 3 + 50);
}

#[test]
fn log_records_topics_and_memory_data() {
	let mut backend = backend_with(BTreeMap::new());
	// MSTORE 0x2a at 0, then LOG1 over that word with topic 0xaa.
	let mut vm = machine("602a60005260aa60206000a100", 30_000);

	assert_eq!(
		vm.run(&mut backend),
		Capture::Exit(Ok(ExitSucceed::Stopped))
	);
	assert_eq!(backend.logs().len(), 1);
	let log = &backend.logs()[0];
	assert_eq!(log.address, ADDRESS);
	assert_eq!(log.topics, vec![H256::from_low_u64_be(0xaa)]);
	assert_eq!(log.data.len(), 32);
	assert_eq!(log.data[31], 0x2a);

	// MSTORE with its expansion, three pushes, and the log itself.
	let log_cost = 375 + 375 + 8 * 32;
	assert_eq!(
		vm.gasometer.total_used_gas(),
		3 + 3 + 6 + 3 + 3 + 3 + log_cost
	);
}

#[test]
fn suicide_moves_the_balance_and_earns_the_refund() {
	let mut accounts = BTreeMap::new();
	accounts.insert(
		ADDRESS,
		InMemoryAccount {
			balance: U256::from(100),
			..Default::default()
		},
	);
	let mut backend = backend_with(accounts);
	let target = H160::from_low_u64_be(0xbb);

	// PUSH1 0xbb, SUICIDE
	let mut vm = machine("60bbff", 50_000);
	assert_eq!(
		vm.run(&mut backend),
		Capture::Exit(Ok(ExitSucceed::Suicided))
	);
	// Base cost plus the new-account surcharge for a value-bearing topup.
	assert_eq!(vm.gasometer.total_used_gas(), 3 + 5_000 + 25_000);
	assert_eq!(vm.gasometer.refunded_gas(), 24_000);
	assert!(backend.deleted(ADDRESS));
	assert_eq!(backend.balance(target), U256::from(100));
	assert_eq!(backend.balance(ADDRESS), U256::zero());
}

#[test]
fn suicide_to_an_existing_account_skips_the_surcharge() {
	let mut accounts = BTreeMap::new();
	accounts.insert(
		ADDRESS,
		InMemoryAccount {
			balance: U256::from(100),
			..Default::default()
		},
	);
	accounts.insert(H160::from_low_u64_be(0xbb), InMemoryAccount::default());
	let mut backend = backend_with(accounts);

	let mut vm = machine("60bbff", 50_000);
	assert_eq!(
		vm.run(&mut backend),
		Capture::Exit(Ok(ExitSucceed::Suicided))
	);
	assert_eq!(vm.gasometer.total_used_gas(), 3 + 5_000);
}

#[test]
fn identical_frames_produce_identical_state_deltas() {
	let run_once = || {
		let mut backend = backend_with(BTreeMap::new());
		let mut vm = machine("6001600055600260015500", 50_000);
		let result = vm.run(&mut backend);
		let storage: Vec<(H256, H256)> = backend
			.accounts()
			.get(&ADDRESS)
			.map(|account| account.storage.iter().map(|(k, v)| (*k, *v)).collect())
			.unwrap_or_default();
		(result, vm.gasometer.total_used_gas(), storage)
	};

	assert_eq!(run_once(), run_once());
}

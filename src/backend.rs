//! Journaled in-memory world state, the reference collaborator for frames.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

use crate::error::ExitError;
use crate::runtime::{Log, RuntimeBackend, RuntimeEnvironment, Snapshot};

/// Account state in the in-memory world.
#[derive(Clone, Debug, Default)]
pub struct InMemoryAccount {
	/// Account balance.
	pub balance: U256,
	/// Account nonce.
	pub nonce: U256,
	/// Account code.
	pub code: Vec<u8>,
	/// Account storage.
	pub storage: BTreeMap<H256, H256>,
}

/// Block context served to frames.
#[derive(Clone, Debug)]
pub struct InMemoryEnvironment {
	/// Current block number.
	pub block_number: U256,
	/// Current block beneficiary.
	pub block_coinbase: H160,
	/// Current block timestamp.
	pub block_timestamp: U256,
	/// Current block difficulty.
	pub block_difficulty: U256,
	/// Current block gas limit.
	pub block_gas_limit: U256,
	/// Hashes of prior blocks, by number.
	pub block_hashes: BTreeMap<U256, H256>,
}

#[derive(Clone, Debug)]
enum JournalEntry {
	StorageSet {
		address: H160,
		index: H256,
		prior: H256,
	},
	BalanceSet {
		address: H160,
		prior: U256,
	},
	NonceSet {
		address: H160,
		prior: U256,
	},
	Deleted {
		address: H160,
	},
	LogAppended,
}

/// In-memory world state with an undo journal. Every write records its prior
/// value; [RuntimeBackend::revert_to] unwinds the journal back to a
/// snapshot, [RuntimeBackend::commit] accepts the writes made since one.
pub struct InMemoryBackend {
	environment: InMemoryEnvironment,
	accounts: BTreeMap<H160, InMemoryAccount>,
	logs: Vec<Log>,
	deleted: BTreeSet<H160>,
	journal: Vec<JournalEntry>,
}

impl InMemoryBackend {
	/// Create a new backend over the given environment and initial accounts.
	#[must_use]
	pub const fn new(
		environment: InMemoryEnvironment,
		accounts: BTreeMap<H160, InMemoryAccount>,
	) -> Self {
		Self {
			environment,
			accounts,
			logs: Vec::new(),
			deleted: BTreeSet::new(),
			journal: Vec::new(),
		}
	}

	/// Current account states.
	#[must_use]
	pub const fn accounts(&self) -> &BTreeMap<H160, InMemoryAccount> {
		&self.accounts
	}

	/// Logs appended so far.
	#[must_use]
	pub fn logs(&self) -> &[Log] {
		&self.logs
	}

	/// Addresses marked for deletion.
	#[must_use]
	pub const fn deletes(&self) -> &BTreeSet<H160> {
		&self.deleted
	}

	fn account_mut(&mut self, address: H160) -> &mut InMemoryAccount {
		self.accounts.entry(address).or_default()
	}
}

impl RuntimeEnvironment for InMemoryBackend {
	fn block_hash(&self, number: U256) -> H256 {
		if number >= self.environment.block_number
			|| self.environment.block_number - number > U256::from(256)
		{
			H256::default()
		} else {
			self.environment
				.block_hashes
				.get(&number)
				.copied()
				.unwrap_or_default()
		}
	}

	fn block_number(&self) -> U256 {
		self.environment.block_number
	}

	fn block_coinbase(&self) -> H160 {
		self.environment.block_coinbase
	}

	fn block_timestamp(&self) -> U256 {
		self.environment.block_timestamp
	}

	fn block_difficulty(&self) -> U256 {
		self.environment.block_difficulty
	}

	fn block_gas_limit(&self) -> U256 {
		self.environment.block_gas_limit
	}
}

impl RuntimeBackend for InMemoryBackend {
	fn balance(&self, address: H160) -> U256 {
		self.accounts
			.get(&address)
			.map(|account| account.balance)
			.unwrap_or_default()
	}

	fn code_size(&self, address: H160) -> U256 {
		self.accounts
			.get(&address)
			.map(|account| U256::from(account.code.len()))
			.unwrap_or_default()
	}

	fn code_hash(&self, address: H160) -> H256 {
		self.accounts
			.get(&address)
			.map(|account| H256::from_slice(Keccak256::digest(&account.code).as_slice()))
			.unwrap_or_default()
	}

	fn code(&self, address: H160) -> Vec<u8> {
		self.accounts
			.get(&address)
			.map(|account| account.code.clone())
			.unwrap_or_default()
	}

	fn storage(&self, address: H160, index: H256) -> H256 {
		self.accounts
			.get(&address)
			.and_then(|account| account.storage.get(&index).copied())
			.unwrap_or_default()
	}

	fn nonce(&self, address: H160) -> U256 {
		self.accounts
			.get(&address)
			.map(|account| account.nonce)
			.unwrap_or_default()
	}

	fn exists(&self, address: H160) -> bool {
		self.accounts.contains_key(&address)
	}

	fn deleted(&self, address: H160) -> bool {
		self.deleted.contains(&address)
	}

	fn set_storage(
		&mut self,
		address: H160,
		index: H256,
		value: H256,
	) -> Result<H256, ExitError> {
		let prior = self.storage(address, index);
		self.journal.push(JournalEntry::StorageSet {
			address,
			index,
			prior,
		});
		self.account_mut(address).storage.insert(index, value);
		Ok(prior)
	}

	fn log(&mut self, log: Log) -> Result<(), ExitError> {
		self.journal.push(JournalEntry::LogAppended);
		self.logs.push(log);
		Ok(())
	}

	fn mark_delete(&mut self, address: H160, target: H160) -> Result<(), ExitError> {
		let balance = self.balance(address);
		self.journal.push(JournalEntry::BalanceSet {
			address: target,
			prior: self.balance(target),
		});
		self.journal.push(JournalEntry::BalanceSet {
			address,
			prior: balance,
		});

		self.account_mut(target).balance += balance;
		self.account_mut(address).balance = U256::zero();
		if self.deleted.insert(address) {
			self.journal.push(JournalEntry::Deleted { address });
		}
		Ok(())
	}

	fn inc_nonce(&mut self, address: H160) -> Result<(), ExitError> {
		let prior = self.nonce(address);
		self.journal.push(JournalEntry::NonceSet { address, prior });
		self.account_mut(address).nonce = prior + U256::one();
		Ok(())
	}

	fn snapshot(&mut self) -> Snapshot {
		Snapshot(self.journal.len())
	}

	fn revert_to(&mut self, snapshot: Snapshot) {
		while self.journal.len() > snapshot.0 {
			match self.journal.pop() {
				Some(JournalEntry::StorageSet {
					address,
					index,
					prior,
				}) => {
					self.account_mut(address).storage.insert(index, prior);
				}
				Some(JournalEntry::BalanceSet { address, prior }) => {
					self.account_mut(address).balance = prior;
				}
				Some(JournalEntry::NonceSet { address, prior }) => {
					self.account_mut(address).nonce = prior;
				}
				Some(JournalEntry::Deleted { address }) => {
					self.deleted.remove(&address);
				}
				Some(JournalEntry::LogAppended) => {
					self.logs.pop();
				}
				None => (),
			}
		}
	}

	fn commit(&mut self, snapshot: Snapshot) {
		// Entries before a live outer snapshot must stay undoable; only the
		// outermost commit can forget the journal.
		if snapshot.0 == 0 {
			self.journal.clear();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn environment() -> InMemoryEnvironment {
		InMemoryEnvironment {
			block_number: U256::from(1000),
			block_coinbase: H160::default(),
			block_timestamp: U256::from(1_500_000_000u64),
			block_difficulty: U256::from(0x0200_0000u64),
			block_gas_limit: U256::from(8_000_000u64),
			block_hashes: {
				let mut hashes = BTreeMap::new();
				hashes.insert(U256::from(999), H256::from_low_u64_be(0x99));
				hashes.insert(U256::from(500), H256::from_low_u64_be(0x55));
				hashes
			},
		}
	}

	#[test]
	fn block_hash_window() {
		let backend = InMemoryBackend::new(environment(), BTreeMap::new());
		assert_eq!(
			backend.block_hash(U256::from(999)),
			H256::from_low_u64_be(0x99)
		);
		// Outside the 256-block window, and the current block itself, read
		// as zero.
		assert_eq!(backend.block_hash(U256::from(500)), H256::default());
		assert_eq!(backend.block_hash(U256::from(1000)), H256::default());
		assert_eq!(backend.block_hash(U256::from(2000)), H256::default());
	}

	#[test]
	fn revert_unwinds_storage_and_logs() {
		let mut backend = InMemoryBackend::new(environment(), BTreeMap::new());
		let address = H160::from_low_u64_be(1);
		let index = H256::from_low_u64_be(7);

		backend
			.set_storage(address, index, H256::from_low_u64_be(1))
			.unwrap();
		let snapshot = backend.snapshot();

		backend
			.set_storage(address, index, H256::from_low_u64_be(2))
			.unwrap();
		backend
			.log(Log {
				address,
				topics: Vec::new(),
				data: Vec::new(),
			})
			.unwrap();
		assert_eq!(backend.storage(address, index), H256::from_low_u64_be(2));
		assert_eq!(backend.logs().len(), 1);

		backend.revert_to(snapshot);
		assert_eq!(backend.storage(address, index), H256::from_low_u64_be(1));
		assert!(backend.logs().is_empty());
	}

	#[test]
	fn nested_snapshots_revert_independently() {
		let mut backend = InMemoryBackend::new(environment(), BTreeMap::new());
		let address = H160::from_low_u64_be(1);
		let index = H256::from_low_u64_be(7);

		let outer = backend.snapshot();
		backend
			.set_storage(address, index, H256::from_low_u64_be(1))
			.unwrap();

		let inner = backend.snapshot();
		backend
			.set_storage(address, index, H256::from_low_u64_be(2))
			.unwrap();
		backend.commit(inner);

		// The inner commit keeps its write, the outer revert undoes both.
		assert_eq!(backend.storage(address, index), H256::from_low_u64_be(2));
		backend.revert_to(outer);
		assert_eq!(backend.storage(address, index), H256::default());
	}

	#[test]
	fn suicide_moves_balance_and_reverts() {
		let mut backend = InMemoryBackend::new(environment(), BTreeMap::new());
		let address = H160::from_low_u64_be(1);
		let target = H160::from_low_u64_be(2);
		backend.account_mut(address).balance = U256::from(100);

		let snapshot = backend.snapshot();
		backend.mark_delete(address, target).unwrap();
		assert!(backend.deleted(address));
		assert_eq!(backend.balance(address), U256::zero());
		assert_eq!(backend.balance(target), U256::from(100));

		backend.revert_to(snapshot);
		assert!(!backend.deleted(address));
		assert_eq!(backend.balance(address), U256::from(100));
		assert_eq!(backend.balance(target), U256::zero());
	}
}

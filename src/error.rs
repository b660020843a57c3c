use crate::Opcode;

/// Capture represents the result of execution.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Capture<E, T> {
	/// The machine has exited. It cannot be executed again.
	Exit(E),
	/// The machine has trapped. It is waiting for external information, and can
	/// be executed again.
	Trap(T),
}

impl<E, T> Capture<E, T> {
	/// Exit value if it is [Capture::Exit].
	pub fn exit(self) -> Option<E> {
		match self {
			Self::Exit(e) => Some(e),
			Self::Trap(_) => None,
		}
	}

	/// Trap value if it is [Capture::Trap].
	pub fn trap(self) -> Option<T> {
		match self {
			Self::Exit(_) => None,
			Self::Trap(t) => Some(t),
		}
	}
}

/// Exit result.
pub type ExitResult = Result<ExitSucceed, ExitError>;

/// Exit reason for an unsuccessful frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitError {
	/// Machine halted exceptionally. All remaining gas is consumed and
	/// world-state writes of the frame must be rolled back.
	Exception(ExitException),
	/// Machine encountered an explicit revert. Unused gas is returned and
	/// world-state writes are rolled back, but the return data is kept.
	Reverted,
}

impl From<ExitError> for ExitResult {
	fn from(s: ExitError) -> Self {
		Err(s)
	}
}

#[cfg(feature = "std")]
impl std::error::Error for ExitError {}

#[cfg(feature = "std")]
impl std::fmt::Display for ExitError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{:?}", self)
	}
}

/// Exit succeed reason.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitSucceed {
	/// Machine encountered an explicit stop, or ran off the end of code.
	Stopped,
	/// Machine encountered an explicit return.
	Returned,
	/// Machine encountered an explicit suicide.
	Suicided,
}

impl From<ExitSucceed> for ExitResult {
	fn from(s: ExitSucceed) -> Self {
		Ok(s)
	}
}

/// Exceptional halt reason. Every variant consumes the frame's remaining gas.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitException {
	/// Insufficient gas for the cost of a cycle.
	OutOfGas,
	/// Operation requires more stack items than present.
	StackUnderflow,
	/// Operation would push the stack beyond its limit.
	StackOverflow,
	/// The byte at the program counter is undefined in the operation table.
	InvalidOpcode(Opcode),
	/// Encountered the designated invalid opcode.
	DesignatedInvalid,
	/// JUMP/JUMPI target is not a valid destination.
	BadJumpDestination,
	/// A memory offset or size exceeds what the implementation can address.
	InvalidMemoryAccess,
}

impl From<ExitException> for ExitResult {
	fn from(s: ExitException) -> Self {
		Err(ExitError::Exception(s))
	}
}

impl From<ExitException> for ExitError {
	fn from(s: ExitException) -> Self {
		Self::Exception(s)
	}
}

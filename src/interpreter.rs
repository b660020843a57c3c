//! The fetch/decode/cost/execute cycle.

use crate::error::{Capture, ExitError, ExitException, ExitResult, ExitSucceed};
use crate::eval::{eval, Control};
use crate::gasometer;
use crate::opcode::Opcode;
use crate::runtime::{CallCreateTrap, Handler};
use crate::Machine;

impl Machine {
	/// Step the machine, executing one cycle. It then returns.
	///
	/// A cycle either fully succeeds, or halts the frame: the opcode is
	/// fetched and decoded, its stack arity is validated, its full cost
	/// (including prospective memory growth) is charged, and only then does
	/// its body run and the program counter advance. Exceptional halts
	/// consume all remaining gas.
	pub fn step<H: Handler>(
		&mut self,
		handle: &mut H,
	) -> Result<(), Capture<ExitResult, CallCreateTrap>> {
		let position = *self
			.position
			.as_ref()
			.map_err(|reason| Capture::Exit(reason.clone()))?;

		let opcode = match self.code.get(position) {
			Some(opcode) => Opcode(*opcode),
			None => {
				// Running off the end of code is an implicit STOP.
				let reason: ExitResult = ExitSucceed::Stopped.into();
				self.position = Err(reason.clone());
				return Err(Capture::Exit(reason));
			}
		};

		#[cfg(feature = "force-debug")]
		log::trace!(target: "evm", "opcode: {:?}, position: {}", opcode, position);

		let info = match opcode.info() {
			Some(info) => info,
			None => return self.exception(ExitException::InvalidOpcode(opcode)),
		};

		if let Err(e) = self
			.stack
			.check_pop_push(info.inputs as usize, info.outputs as usize)
		{
			return self.exception(e);
		}

		if let Err(e) = gasometer::charge_opcode(
			&mut self.gasometer,
			self.state.context.address,
			opcode,
			&self.stack,
			handle,
		) {
			return self.exception(e);
		}

		match eval(self, handle, opcode, position) {
			Control::Continue(p) => {
				self.position = Ok(position + p);
				Ok(())
			}
			Control::Exit(reason) => {
				if matches!(reason, Err(ExitError::Exception(_))) {
					self.gasometer.oog();
				}
				self.position = Err(reason.clone());
				Err(Capture::Exit(reason))
			}
			Control::Jump(p) => {
				if self.valids.is_valid(p) {
					self.position = Ok(p);
					Ok(())
				} else {
					self.exception(ExitException::BadJumpDestination)
				}
			}
			Control::Trap(interrupt) => {
				self.position = Ok(position + 1);
				Err(Capture::Trap(interrupt))
			}
		}
	}

	/// Loop stepping the machine, until it exits or traps.
	pub fn run<H: Handler>(&mut self, handle: &mut H) -> Capture<ExitResult, CallCreateTrap> {
		loop {
			match self.step(handle) {
				Ok(()) => (),
				Err(capture) => return capture,
			}
		}
	}

	fn exception(
		&mut self,
		exception: ExitException,
	) -> Result<(), Capture<ExitResult, CallCreateTrap>> {
		self.gasometer.oog();
		let reason: ExitResult = exception.into();
		self.position = Err(reason.clone());
		Err(Capture::Exit(reason))
	}
}

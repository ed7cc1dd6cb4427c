use std::fmt;

use nix::sys::ptrace;
use nix::sys::signal::{Signal, kill};
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::Pid;
use tracing::{debug, trace};

use crate::error::{DebuggerError, Result};
use crate::process::registers::RegisterSnapshot;
use crate::process::stoppoint::VirtualAddress;

#[cfg(test)]
pub(crate) mod fake;
pub mod launch;
pub mod register_info;
pub mod registers;
pub mod stoppoint;

/// Why `wait_for_stop` returned.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StopStatus {
    /// The inferior is stopped (trap or other signal) and can be inspected.
    Stopped(Signal),
    /// The inferior exited normally with the given status.
    Exited(i32),
    /// The inferior was terminated by a signal.
    Killed(Signal),
}

impl StopStatus {
    /// Once the inferior has exited or been killed there is nothing left to trace.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StopStatus::Exited(_) | StopStatus::Killed(_))
    }
}

impl fmt::Display for StopStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopStatus::Stopped(sig) => write!(f, "stopped ({sig})"),
            StopStatus::Exited(code) => write!(f, "exited with status {code}"),
            StopStatus::Killed(sig) => write!(f, "killed by {sig}"),
        }
    }
}

/// The process-control operations the debugger needs from a traced inferior.
///
/// Every method other than `wait_for_stop` expects the inferior to already
/// be stopped; `wait_for_stop` is the only call that blocks.
pub trait Tracee {
    fn pid(&self) -> Pid;

    /// Reads the machine word starting at `address`.
    fn read_word(&self, address: VirtualAddress) -> Result<i64>;

    fn write_word(&mut self, address: VirtualAddress, word: i64) -> Result<()>;

    /// Transfers the whole general-purpose register file.
    fn get_registers(&self) -> Result<RegisterSnapshot>;

    fn set_registers(&mut self, snapshot: &RegisterSnapshot) -> Result<()>;

    /// Lets the inferior run. Does not block.
    fn resume(&mut self) -> Result<()>;

    /// Blocks until the inferior stops, exits, or is killed.
    fn wait_for_stop(&mut self) -> Result<StopStatus>;
}

/// A ptrace-controlled child process.
#[derive(Debug)]
pub struct TracedProcess {
    pid: Pid,
    /// Set once a wait reports exit or termination.
    exited: bool,
}

impl TracedProcess {
    /// Wraps a child that has already requested tracing.
    pub fn from_pid(pid: Pid) -> Self {
        Self { pid, exited: false }
    }

    pub fn has_exited(&self) -> bool {
        self.exited
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.exited {
            return Err(DebuggerError::ProcessExited);
        }
        Ok(())
    }

    /// Kills and reaps the inferior if it is still around.
    pub fn destroy(&mut self) -> Result<()> {
        if self.exited {
            return Ok(());
        }

        debug!(pid = %self.pid, "killing inferior");
        kill(self.pid, Some(Signal::SIGKILL)).map_err(DebuggerError::process_control("kill"))?;
        self.wait_for_stop()?;
        Ok(())
    }
}

impl Tracee for TracedProcess {
    fn pid(&self) -> Pid {
        self.pid
    }

    fn read_word(&self, address: VirtualAddress) -> Result<i64> {
        self.ensure_alive()?;
        let word = ptrace::read(self.pid, address.addr() as ptrace::AddressType)
            .map_err(DebuggerError::memory_access(address))?;
        trace!(%address, word, "peek");
        Ok(word)
    }

    fn write_word(&mut self, address: VirtualAddress, word: i64) -> Result<()> {
        self.ensure_alive()?;
        trace!(%address, word, "poke");
        ptrace::write(self.pid, address.addr() as ptrace::AddressType, word)
            .map_err(DebuggerError::memory_access(address))
    }

    fn get_registers(&self) -> Result<RegisterSnapshot> {
        self.ensure_alive()?;
        let regs = ptrace::getregs(self.pid).map_err(DebuggerError::process_control("getregs"))?;
        Ok(RegisterSnapshot::from(regs))
    }

    fn set_registers(&mut self, snapshot: &RegisterSnapshot) -> Result<()> {
        self.ensure_alive()?;
        ptrace::setregs(self.pid, libc::user_regs_struct::from(snapshot))
            .map_err(DebuggerError::process_control("setregs"))
    }

    fn resume(&mut self) -> Result<()> {
        self.ensure_alive()?;
        trace!(pid = %self.pid, "resuming inferior");
        ptrace::cont(self.pid, None).map_err(DebuggerError::process_control("cont"))
    }

    fn wait_for_stop(&mut self) -> Result<StopStatus> {
        self.ensure_alive()?;
        loop {
            let wait_status =
                waitpid(self.pid, None).map_err(DebuggerError::process_control("waitpid"))?;
            debug!(?wait_status, "inferior changed state");

            let status = match wait_status {
                WaitStatus::Stopped(_, sig) => StopStatus::Stopped(sig),
                WaitStatus::PtraceEvent(_, sig, _) => StopStatus::Stopped(sig),
                WaitStatus::PtraceSyscall(_) => StopStatus::Stopped(Signal::SIGTRAP),
                WaitStatus::Exited(_, code) => StopStatus::Exited(code),
                WaitStatus::Signaled(_, sig, _) => StopStatus::Killed(sig),
                // Continued/StillAlive: not a stop we can act on, keep waiting
                _ => continue,
            };

            if status.is_terminal() {
                self.exited = true;
            }
            return Ok(status);
        }
    }
}

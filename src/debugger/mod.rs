use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::error::{DebuggerError, Result};
use crate::history::CommandHistory;
use crate::process::register_info::Register;
use crate::process::registers::RegisterFile;
use crate::process::stoppoint::breakpoint_set::{BreakpointSet, SetOutcome};
use crate::process::{StopStatus, Tracee};

pub mod command;

use command::{BreakpointCommand, Command, HELP, MemoryCommand, RegisterCommand};

pub const PROMPT: &str = "minidbg> ";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionState {
    /// Just attached; the inferior's first stop has not been consumed yet.
    AwaitingStop,
    /// The inferior is stopped and we are reading commands.
    Interactive,
    /// Quit was requested, input ran out, or the inferior is gone.
    Terminated,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DispatchResult {
    Normal,
    Exit,
}

/// One debugging session over a single traced inferior.
pub struct Debugger<T: Tracee> {
    tracee: T,
    program: PathBuf,
    state: SessionState,
    breakpoints: BreakpointSet,
    /// A log of the commands executed in this session.
    history: CommandHistory,
}

impl<T: Tracee> Debugger<T> {
    pub fn new(tracee: T, program: impl Into<PathBuf>) -> Self {
        Debugger {
            tracee,
            program: program.into(),
            state: SessionState::AwaitingStop,
            breakpoints: BreakpointSet::new(),
            history: CommandHistory::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn tracee(&self) -> &T {
        &self.tracee
    }

    pub fn breakpoints(&self) -> &BreakpointSet {
        &self.breakpoints
    }

    /// Hands the inferior back, e.g. so the host can reap it.
    pub fn into_tracee(self) -> T {
        self.tracee
    }

    /// Drives the session until quit, end of input, or the inferior exits.
    ///
    /// Command failures are written to `output` and the loop carries on; only
    /// I/O errors and a failure to observe the first stop end the session early.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut output: W) -> anyhow::Result<()> {
        if self.state == SessionState::AwaitingStop {
            debug!(program = ?self.program, pid = %self.tracee.pid(), "waiting for first stop");
            self.wait_and_report(&mut output)?;
        }

        let mut line = String::new();
        while self.state == SessionState::Interactive {
            write!(output, "{PROMPT}")?;
            output.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                trace!("end of input, leaving session");
                writeln!(output)?;
                self.state = SessionState::Terminated;
                break;
            }

            match self.next(line.trim(), &mut output) {
                Ok(DispatchResult::Normal) => {}
                Ok(DispatchResult::Exit) => break,
                Err(e) => {
                    warn!(error = %e, command = line.trim(), "command failed");
                    writeln!(output, "error: {e}")?;
                }
            }
        }

        Ok(())
    }

    /// Executes one line of input. An empty line repeats the previous command.
    pub fn next<W: Write>(&mut self, command: &str, output: &mut W) -> Result<DispatchResult> {
        let command = if command.is_empty() {
            trace!("next command is empty line, will replay last command");
            match self.history.last_command() {
                Some(cmd) => cmd,
                None => return Ok(DispatchResult::Normal),
            }
        } else {
            self.history.add(command);
            command.to_string()
        };

        let cmd = Command::try_from(command.as_str())?;
        debug!(?cmd, "dispatching");
        self.dispatch_command(cmd, output)
    }

    fn dispatch_command<W: Write>(&mut self, command: Command, output: &mut W) -> Result<DispatchResult> {
        if self.state == SessionState::Terminated && command != Command::Quit {
            return Err(DebuggerError::ProcessExited);
        }

        let mut res = DispatchResult::Normal;
        match command {
            Command::Continue => {
                self.tracee.resume()?;
                self.wait_and_report(output)?;
            }
            Command::Breakpoint(cmd) => self.breakpoint_command(cmd, output)?,
            Command::Register(cmd) => self.register_command(cmd, output)?,
            Command::Memory(cmd) => self.memory_command(cmd, output)?,
            Command::Help => writeln!(output, "{HELP}")?,
            Command::Quit => {
                self.state = SessionState::Terminated;
                res = DispatchResult::Exit;
            }
        }

        Ok(res)
    }

    fn breakpoint_command<W: Write>(&mut self, command: BreakpointCommand, output: &mut W) -> Result<()> {
        match command {
            BreakpointCommand::Create(address) => {
                match self.breakpoints.set_at(&mut self.tracee, address)? {
                    SetOutcome::Created => writeln!(output, "Set breakpoint at address {address}")?,
                    SetOutcome::Existing => {
                        writeln!(output, "Breakpoint at address {address} already set")?
                    }
                }
            }
            BreakpointCommand::Delete(address) => {
                if self.breakpoints.clear_at(&mut self.tracee, address)? {
                    writeln!(output, "Deleting breakpoint at address {address}")?;
                } else {
                    writeln!(output, "Breakpoint at address {address} not found to delete.")?;
                }
            }
        }
        Ok(())
    }

    fn register_command<W: Write>(&mut self, command: RegisterCommand, output: &mut W) -> Result<()> {
        let mut registers = RegisterFile::new(&mut self.tracee);
        match command {
            RegisterCommand::Dump => {
                for (name, value) in registers.dump()? {
                    writeln!(output, "{name} 0x{value:016x}")?;
                }
            }
            RegisterCommand::Read(register) => {
                writeln!(output, "{}", registers.get(register)?)?;
            }
            RegisterCommand::Write(register, value) => registers.set(register, value)?,
        }
        Ok(())
    }

    fn memory_command<W: Write>(&mut self, command: MemoryCommand, output: &mut W) -> Result<()> {
        match command {
            MemoryCommand::Read(address) => {
                let word = self.breakpoints.read_word(&self.tracee, address)?;
                writeln!(output, "0x{:016x}", word as u64)?;
            }
            MemoryCommand::Write(address, word) => {
                self.breakpoints.write_word(&mut self.tracee, address, word)?
            }
        }
        Ok(())
    }

    /// Blocks until the inferior stops and moves the session accordingly.
    fn wait_and_report<W: Write>(&mut self, output: &mut W) -> Result<StopStatus> {
        let status = self.tracee.wait_for_stop()?;
        let pid = self.tracee.pid();

        if status.is_terminal() {
            debug!(%pid, %status, "inferior is gone");
            self.state = SessionState::Terminated;
            writeln!(output, "Process {pid} {status}")?;
            return Ok(status);
        }

        self.state = SessionState::Interactive;
        match RegisterFile::new(&mut self.tracee).get(Register::RIP) {
            Ok(rip) => writeln!(output, "Process {pid} {status} at rip 0x{rip:016x}")?,
            Err(e) => {
                warn!(error = %e, "could not read rip after stop");
                writeln!(output, "Process {pid} {status}")?;
            }
        }
        Ok(status)
    }
}

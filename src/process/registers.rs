use tracing::trace;

use crate::error::Result;
use crate::process::Tracee;
use crate::process::register_info::{Register, USER_REGS_WORDS};

/// Current state of the registers for the debugged process.
///
/// A fixed array of words overlaying `user_regs_struct`; each register's
/// slot comes from the descriptor table, so callers never deal in offsets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterSnapshot {
    words: [u64; USER_REGS_WORDS],
}

impl RegisterSnapshot {
    pub fn read(&self, register: Register) -> u64 {
        self.words[register.info().slot]
    }

    pub fn write(&mut self, register: Register, value: u64) {
        self.words[register.info().slot] = value;
    }
}

/// Register access for a stopped inferior.
///
/// ptrace only transfers the whole register file, so every write is a
/// read-modify-write of the full snapshot. That is safe only because the
/// inferior is stopped and this session is its sole tracer.
pub struct RegisterFile<'a, T: Tracee + ?Sized> {
    tracee: &'a mut T,
}

impl<'a, T: Tracee + ?Sized> RegisterFile<'a, T> {
    pub fn new(tracee: &'a mut T) -> Self {
        Self { tracee }
    }

    pub fn get(&self, register: Register) -> Result<u64> {
        let value = self.tracee.get_registers()?.read(register);
        trace!(register = register.name(), value, "read register");
        Ok(value)
    }

    pub fn set(&mut self, register: Register, value: u64) -> Result<()> {
        let mut snapshot = self.tracee.get_registers()?;
        snapshot.write(register, value);
        self.tracee.set_registers(&snapshot)?;
        trace!(register = register.name(), value, "wrote register");
        Ok(())
    }

    pub fn get_by_name(&self, name: &str) -> Result<u64> {
        self.get(Register::from_name(name)?)
    }

    pub fn get_by_dwarf(&self, dwarf_id: i32) -> Result<u64> {
        self.get(Register::from_dwarf(dwarf_id)?)
    }

    pub fn name_of(register: Register) -> &'static str {
        register.name()
    }

    /// Every register with its value, in snapshot order, from a single transfer.
    pub fn dump(&self) -> Result<Vec<(&'static str, u64)>> {
        let snapshot = self.tracee.get_registers()?;
        Ok(crate::process::register_info::registers_info_iter()
            .map(|info| (info.name, snapshot.read(info.register)))
            .collect())
    }
}

use tracing::debug;

use crate::error::Result;
use crate::process::Tracee;
use crate::process::stoppoint::{INTERRUPT_INSTRUCTION, VirtualAddress, with_low_byte};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StoppointState {
    /// `int3` is in place; `saved` is the instruction byte it replaced.
    Enabled { saved: u8 },
    Disabled,
}

/// A software breakpoint: one `int3` byte patched into the inferior's code.
#[derive(Clone, Debug)]
pub struct BreakpointSite {
    address: VirtualAddress,
    state: StoppointState,
}

impl BreakpointSite {
    pub fn new(address: VirtualAddress) -> Self {
        Self {
            address,
            state: StoppointState::Disabled,
        }
    }

    /// Saves the byte at the address and overwrites it with `int3`.
    ///
    /// No-op if already enabled, so the saved byte is never replaced by our
    /// own trap. On failure the site stays disabled.
    pub fn enable<T: Tracee + ?Sized>(&mut self, tracee: &mut T) -> Result<()> {
        if self.is_enabled() {
            return Ok(());
        }

        let instruction_line = tracee.read_word(self.address)?;
        let saved = (instruction_line & 0xFF) as u8;

        let new_instruction_line = with_low_byte(instruction_line, INTERRUPT_INSTRUCTION as u8);
        tracee.write_word(self.address, new_instruction_line)?;

        debug!(address = %self.address, saved, "breakpoint enabled");
        self.state = StoppointState::Enabled { saved };
        Ok(())
    }

    /// Puts the saved byte back. No-op if not enabled.
    pub fn disable<T: Tracee + ?Sized>(&mut self, tracee: &mut T) -> Result<()> {
        let StoppointState::Enabled { saved } = self.state else {
            return Ok(());
        };

        // re-read: only the low byte is ours, the rest may have changed
        let instruction_line = tracee.read_word(self.address)?;
        tracee.write_word(self.address, with_low_byte(instruction_line, saved))?;

        debug!(address = %self.address, "breakpoint disabled");
        self.state = StoppointState::Disabled;
        Ok(())
    }

    /// Records a new original byte for an enabled site, e.g. after the user
    /// wrote over the patched instruction. The trap stays in memory.
    pub(crate) fn replace_saved(&mut self, byte: u8) {
        if let StoppointState::Enabled { saved } = &mut self.state {
            *saved = byte;
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.state, StoppointState::Enabled { .. })
    }

    pub fn state(&self) -> StoppointState {
        self.state
    }

    pub fn address(&self) -> VirtualAddress {
        self.address
    }
}

use std::collections::HashMap;

use tracing::info;

use crate::error::Result;
use crate::process::Tracee;
use crate::process::stoppoint::breakpoint_site::{BreakpointSite, StoppointState};
use crate::process::stoppoint::{INTERRUPT_INSTRUCTION, VirtualAddress};

/// Byte index of `address` inside the word starting at `base`, if it is in it.
fn offset_in_word(base: VirtualAddress, address: VirtualAddress) -> Option<usize> {
    match address.addr().checked_sub(base.addr()) {
        Some(offset) if offset < 8 => Some(offset as usize),
        _ => None,
    }
}

/// What `set_at` did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SetOutcome {
    Created,
    /// A site already existed at the address; it is enabled now.
    Existing,
}

/// All breakpoint sites of one session, at most one per address.
///
/// Deleting disables the site in place; entries live as long as the session.
#[derive(Debug, Default)]
pub struct BreakpointSet {
    sites: HashMap<VirtualAddress, BreakpointSite>,
}

impl BreakpointSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_at<T: Tracee + ?Sized>(
        &mut self,
        tracee: &mut T,
        address: VirtualAddress,
    ) -> Result<SetOutcome> {
        if let Some(site) = self.sites.get_mut(&address) {
            site.enable(tracee)?;
            return Ok(SetOutcome::Existing);
        }

        // only record the site once the patch actually landed
        let mut site = BreakpointSite::new(address);
        site.enable(tracee)?;
        self.sites.insert(address, site);
        info!(%address, "breakpoint set");
        Ok(SetOutcome::Created)
    }

    /// Disables the site at `address`; `Ok(false)` if there is none.
    pub fn clear_at<T: Tracee + ?Sized>(
        &mut self,
        tracee: &mut T,
        address: VirtualAddress,
    ) -> Result<bool> {
        match self.sites.get_mut(&address) {
            Some(site) => {
                site.disable(tracee)?;
                info!(%address, "breakpoint cleared");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Reads the word at `address` as the program sees it: any `int3` of
    /// ours inside the word is replaced by the byte it hides.
    pub fn read_word<T: Tracee + ?Sized>(&self, tracee: &T, address: VirtualAddress) -> Result<i64> {
        let mut bytes = tracee.read_word(address)?.to_le_bytes();
        for site in self.sites.values() {
            if let (Some(offset), StoppointState::Enabled { saved }) =
                (offset_in_word(address, site.address()), site.state())
            {
                bytes[offset] = saved;
            }
        }
        Ok(i64::from_le_bytes(bytes))
    }

    /// Writes `word` at `address` without losing enabled breakpoints: bytes
    /// landing on a site become its saved byte and the trap stays in place.
    pub fn write_word<T: Tracee + ?Sized>(
        &mut self,
        tracee: &mut T,
        address: VirtualAddress,
        word: i64,
    ) -> Result<()> {
        let mut bytes = word.to_le_bytes();
        let mut covered = Vec::new();
        for site in self.sites.values().filter(|s| s.is_enabled()) {
            if let Some(offset) = offset_in_word(address, site.address()) {
                covered.push((site.address(), bytes[offset]));
                bytes[offset] = INTERRUPT_INSTRUCTION as u8;
            }
        }

        tracee.write_word(address, i64::from_le_bytes(bytes))?;

        // only once the poke landed, so a failed write keeps the old bytes
        for (site_address, byte) in covered {
            if let Some(site) = self.sites.get_mut(&site_address) {
                site.replace_saved(byte);
            }
        }
        Ok(())
    }

    pub fn get(&self, address: VirtualAddress) -> Option<&BreakpointSite> {
        self.sites.get(&address)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

//! Static description of the registers exposed by ptrace.
//!
//! The table itself is generated per architecture from a single register
//! list (see the arch module); this module builds the lookup indexes over it
//! once per process and never mutates them.
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::{DebuggerError, Result};

#[cfg(target_arch = "x86_64")]
mod x86_64;
#[cfg(target_arch = "x86_64")]
pub use x86_64::*;

/// Sentinel used in the register list for registers without a DWARF number.
pub const NO_DWARF_ID: i32 = -1;

/// Fully derived register information.
#[derive(Clone, Debug)]
pub struct RegisterInfo {
    pub register: Register,
    /// The name shown to (and typed by) the user. Case-sensitive.
    pub name: &'static str,
    /// DWARF register number, or [`NO_DWARF_ID`].
    pub dwarf_id: i32,
    /// Word index of this register inside `user_regs_struct`.
    pub slot: usize,
}

static BY_NAME: LazyLock<HashMap<&'static str, Register>> = LazyLock::new(|| {
    REGISTERS_INFO
        .iter()
        .map(|info| (info.name, info.register))
        .collect()
});

static BY_DWARF: LazyLock<HashMap<i32, Register>> = LazyLock::new(|| {
    REGISTERS_INFO
        .iter()
        .filter(|info| info.dwarf_id != NO_DWARF_ID)
        .map(|info| (info.dwarf_id, info.register))
        .collect()
});

impl Register {
    /// The table is declared in enum order, so this is a plain index.
    pub fn info(self) -> &'static RegisterInfo {
        &REGISTERS_INFO[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn from_name(name: &str) -> Result<Register> {
        BY_NAME
            .get(name)
            .copied()
            .ok_or_else(|| DebuggerError::UnknownRegister(name.to_string()))
    }

    pub fn from_dwarf(dwarf_id: i32) -> Result<Register> {
        BY_DWARF
            .get(&dwarf_id)
            .copied()
            .ok_or_else(|| DebuggerError::UnknownRegister(format!("dwarf register {dwarf_id}")))
    }
}

/// All registers, in snapshot order.
pub fn registers_info_iter() -> impl Iterator<Item = &'static RegisterInfo> {
    REGISTERS_INFO.iter()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use strum::{EnumCount, IntoEnumIterator};

    use super::*;

    #[test]
    fn table_matches_enum() {
        assert_eq!(REGISTERS_INFO.len(), Register::COUNT);
        assert_eq!(REGISTERS_INFO.len(), 27);
        for register in Register::iter() {
            assert_eq!(register.info().register, register);
        }
    }

    #[test]
    fn attributes_are_unique() {
        let names: HashSet<_> = registers_info_iter().map(|i| i.name).collect();
        let slots: HashSet<_> = registers_info_iter().map(|i| i.slot).collect();
        let dwarf: Vec<_> = registers_info_iter()
            .map(|i| i.dwarf_id)
            .filter(|id| *id != NO_DWARF_ID)
            .collect();
        let unique_dwarf: HashSet<_> = dwarf.iter().collect();

        assert_eq!(names.len(), REGISTERS_INFO.len());
        assert_eq!(slots.len(), REGISTERS_INFO.len());
        assert_eq!(unique_dwarf.len(), dwarf.len());
        assert!(registers_info_iter().all(|i| i.slot < USER_REGS_WORDS));
    }

    #[test]
    fn dwarf_lookup_agrees_with_identity() {
        for info in registers_info_iter().filter(|i| i.dwarf_id != NO_DWARF_ID) {
            let register = Register::from_dwarf(info.dwarf_id).unwrap();
            assert_eq!(register, info.register);
            assert_eq!(register.info().dwarf_id, info.dwarf_id);
        }
        assert_eq!(Register::from_dwarf(7).unwrap(), Register::RSP);
        assert_eq!(Register::from_dwarf(16).unwrap(), Register::RIP);
    }

    #[test]
    fn rip_uses_return_address_column() {
        // DWARF 16 is the return address column; rip is the only register on it
        assert_eq!(Register::RIP.info().dwarf_id, 16);
        assert_eq!(Register::from_dwarf(16).unwrap(), Register::RIP);
        let on_16: Vec<_> = registers_info_iter()
            .filter(|i| i.dwarf_id == 16)
            .map(|i| i.register)
            .collect();
        assert_eq!(on_16, vec![Register::RIP]);
        // orig_rax is the one register unwinders cannot name
        assert_eq!(Register::ORIG_RAX.info().dwarf_id, NO_DWARF_ID);
    }

    #[test]
    fn name_lookup() {
        assert_eq!(Register::from_name("rip").unwrap(), Register::RIP);
        assert_eq!(Register::from_name("eflags").unwrap(), Register::RFLAGS);
        assert_eq!(Register::RFLAGS.name(), "eflags");
        for info in registers_info_iter() {
            assert_eq!(Register::from_name(info.name).unwrap(), info.register);
        }
    }

    #[test]
    fn unknown_lookups_fail() {
        assert!(matches!(
            Register::from_name("RIP"),
            Err(DebuggerError::UnknownRegister(_))
        ));
        assert!(matches!(
            Register::from_name("xmm0"),
            Err(DebuggerError::UnknownRegister(_))
        ));
        assert!(matches!(
            Register::from_dwarf(NO_DWARF_ID),
            Err(DebuggerError::UnknownRegister(_))
        ));
        assert!(matches!(
            Register::from_dwarf(1000),
            Err(DebuggerError::UnknownRegister(_))
        ));
    }
}

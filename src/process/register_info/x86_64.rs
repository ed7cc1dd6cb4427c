//! Part of what makes this module weird is the intersection of
//! c structs, the `libc` crate, the `memoffset` crate, and the rust macro
//! system: one register list drives the enum, the descriptor table and the
//! conversions to and from `user_regs_struct`.
use std::mem::size_of;

use libc::user_regs_struct;
use memoffset::offset_of;
use strum::{EnumCount, EnumIter};

use super::RegisterInfo;
use crate::process::registers::RegisterSnapshot;

/// Number of 64-bit words in `user_regs_struct`.
pub const USER_REGS_WORDS: usize = size_of::<user_regs_struct>() / size_of::<u64>();

/// This is the single source of truth.
/// Edit *only* this list when adding/removing registers. Entries are in
/// `user_regs_struct` order.
macro_rules! REGISTER_LIST {
    ($macro:ident) => {
        $macro! {
            // (EnumVariant, struct_field, dwarf_regno, display name)
            (R15, r15, 15, "r15");
            (R14, r14, 14, "r14");
            (R13, r13, 13, "r13");
            (R12, r12, 12, "r12");
            (RBP, rbp, 6, "rbp");
            (RBX, rbx, 3, "rbx");
            (R11, r11, 11, "r11");
            (R10, r10, 10, "r10");
            (R9, r9, 9, "r9");
            (R8, r8, 8, "r8");
            (RAX, rax, 0, "rax");
            (RCX, rcx, 2, "rcx");
            (RDX, rdx, 1, "rdx");
            (RSI, rsi, 4, "rsi");
            (RDI, rdi, 5, "rdi");
            // ptrace exposes this as the way to get the ID of a syscall.
            // it has no dwarf id.
            (ORIG_RAX, orig_rax, -1, "orig_rax");
            // 16 is the return address column, which unwinders use for rip.
            (RIP, rip, 16, "rip");
            (CS, cs, 51, "cs");
            (RFLAGS, eflags, 49, "eflags");
            (RSP, rsp, 7, "rsp");
            (SS, ss, 52, "ss");
            (FS_BASE, fs_base, 58, "fs_base");
            (GS_BASE, gs_base, 59, "gs_base");
            (DS, ds, 53, "ds");
            (ES, es, 50, "es");
            (FS, fs, 54, "fs");
            (GS, gs, 55, "gs");
        }
    };
}

/// Central enum of supported registers.
macro_rules! DEFINE_ENUM {
    ( $( ($register:ident, $field:ident, $dwarf:expr, $name:expr); )* ) => {
        #[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, EnumCount, EnumIter)]
        #[allow(clippy::upper_case_acronyms, non_camel_case_types)]
        pub enum Register {
            $( $register, )*
        }
    };
}

macro_rules! DEFINE_INFO {
    ( $( ($register:ident, $field:ident, $dwarf:expr, $name:expr); )* ) => {
        pub const REGISTERS_INFO: &[RegisterInfo] = &[
            $(
                RegisterInfo {
                    register: Register::$register,
                    name: $name,
                    dwarf_id: $dwarf,
                    slot: offset_of!(user_regs_struct, $field) / size_of::<u64>(),
                },
            )*
        ];
    };
}

macro_rules! DEFINE_CONVERSIONS {
    ( $( ($register:ident, $field:ident, $dwarf:expr, $name:expr); )* ) => {
        impl From<user_regs_struct> for RegisterSnapshot {
            fn from(regs: user_regs_struct) -> Self {
                let mut snapshot = RegisterSnapshot::default();
                $( snapshot.write(Register::$register, regs.$field); )*
                snapshot
            }
        }

        impl From<&RegisterSnapshot> for user_regs_struct {
            fn from(snapshot: &RegisterSnapshot) -> Self {
                user_regs_struct {
                    $( $field: snapshot.read(Register::$register), )*
                }
            }
        }
    };
}

REGISTER_LIST!(DEFINE_ENUM);
REGISTER_LIST!(DEFINE_INFO);
REGISTER_LIST!(DEFINE_CONVERSIONS);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_follow_struct_layout() {
        assert_eq!(USER_REGS_WORDS, 27);
        assert_eq!(Register::R15.info().slot, 0);
        assert_eq!(Register::RIP.info().slot, 16);
        assert_eq!(Register::GS.info().slot, 26);
    }

    #[test]
    fn libc_struct_conversion_keeps_fields() {
        let mut snapshot = RegisterSnapshot::default();
        snapshot.write(Register::RIP, 0x401000);
        snapshot.write(Register::RFLAGS, 0x246);
        snapshot.write(Register::GS, 7);

        let regs = user_regs_struct::from(&snapshot);
        assert_eq!(regs.rip, 0x401000);
        assert_eq!(regs.eflags, 0x246);
        assert_eq!(regs.gs, 7);
        assert_eq!(regs.rax, 0);

        let back = RegisterSnapshot::from(regs);
        assert_eq!(back, snapshot);
    }
}

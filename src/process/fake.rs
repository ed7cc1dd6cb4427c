//! In-memory stand-in for a traced process, for unit tests.
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};

use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::unistd::Pid;

use crate::error::{DebuggerError, Result};
use crate::process::registers::RegisterSnapshot;
use crate::process::stoppoint::VirtualAddress;
use crate::process::{StopStatus, Tracee};

#[derive(Debug)]
pub(crate) struct FakeTracee {
    /// Byte-addressed memory; a word read fails unless all 8 bytes are mapped.
    pub memory: BTreeMap<u64, u8>,
    pub registers: RegisterSnapshot,
    /// Statuses handed out by `wait_for_stop`; SIGTRAP once exhausted.
    pub stops: VecDeque<StopStatus>,
    /// Name of every process-control call attempted, in order. Read-only
    /// calls log too, hence the cell.
    calls: RefCell<Vec<&'static str>>,
    pub fail_register_transfer: bool,
}

impl FakeTracee {
    pub fn new() -> Self {
        Self {
            memory: BTreeMap::new(),
            registers: RegisterSnapshot::default(),
            stops: VecDeque::new(),
            calls: RefCell::new(Vec::new()),
            fail_register_transfer: false,
        }
    }

    pub fn map(&mut self, address: u64, bytes: &[u8]) {
        for (i, b) in bytes.iter().enumerate() {
            self.memory.insert(address + i as u64, *b);
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    fn log(&self, call: &'static str) {
        self.calls.borrow_mut().push(call);
    }

    pub fn byte(&self, address: u64) -> u8 {
        self.memory[&address]
    }

    pub fn bytes(&self, address: u64, len: u64) -> Vec<u8> {
        (address..address + len).map(|a| self.byte(a)).collect()
    }
}

impl Tracee for FakeTracee {
    fn pid(&self) -> Pid {
        Pid::from_raw(4242)
    }

    fn read_word(&self, address: VirtualAddress) -> Result<i64> {
        self.log("read_word");
        let mut buf = [0u8; 8];
        for (i, b) in buf.iter_mut().enumerate() {
            *b = *self
                .memory
                .get(&(address.addr() + i as u64))
                .ok_or(DebuggerError::MemoryAccess {
                    address,
                    source: Errno::EIO,
                })?;
        }
        Ok(i64::from_le_bytes(buf))
    }

    fn write_word(&mut self, address: VirtualAddress, word: i64) -> Result<()> {
        self.log("write_word");
        let base = address.addr();
        if (base..base + 8).any(|a| !self.memory.contains_key(&a)) {
            return Err(DebuggerError::MemoryAccess {
                address,
                source: Errno::EIO,
            });
        }
        self.map(base, &word.to_le_bytes());
        Ok(())
    }

    fn get_registers(&self) -> Result<RegisterSnapshot> {
        self.log("get_registers");
        if self.fail_register_transfer {
            return Err(DebuggerError::ProcessControl {
                operation: "getregs",
                source: Errno::ESRCH,
            });
        }
        Ok(self.registers.clone())
    }

    fn set_registers(&mut self, snapshot: &RegisterSnapshot) -> Result<()> {
        self.log("set_registers");
        if self.fail_register_transfer {
            return Err(DebuggerError::ProcessControl {
                operation: "setregs",
                source: Errno::ESRCH,
            });
        }
        self.registers = snapshot.clone();
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.log("resume");
        Ok(())
    }

    fn wait_for_stop(&mut self) -> Result<StopStatus> {
        self.log("wait_for_stop");
        Ok(self
            .stops
            .pop_front()
            .unwrap_or(StopStatus::Stopped(Signal::SIGTRAP)))
    }
}

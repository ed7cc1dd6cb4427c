//! Errors raised while driving the inferior process.
//!
//! Every variant is local to the command that produced it; the session
//! reports it and keeps reading commands.

use thiserror::Error;

use crate::process::stoppoint::VirtualAddress;

pub type Result<T, E = DebuggerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DebuggerError {
    /// A ptrace/wait call (register transfer, resume, wait) failed.
    #[error("{operation} failed: {source}")]
    ProcessControl {
        operation: &'static str,
        #[source]
        source: nix::Error,
    },

    /// Peeking or poking inferior memory failed, usually an unmapped address.
    #[error("cannot access memory at {address}: {source}")]
    MemoryAccess {
        address: VirtualAddress,
        #[source]
        source: nix::Error,
    },

    #[error("unknown register: {0}")]
    UnknownRegister(String),

    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    #[error("malformed argument: {0}")]
    MalformedArgument(String),

    /// The inferior is gone; there is nothing left to control.
    #[error("process has already exited")]
    ProcessExited,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DebuggerError {
    pub(crate) fn process_control(operation: &'static str) -> impl FnOnce(nix::Error) -> Self {
        move |source| DebuggerError::ProcessControl { operation, source }
    }

    pub(crate) fn memory_access(address: VirtualAddress) -> impl FnOnce(nix::Error) -> Self {
        move |source| DebuggerError::MemoryAccess { address, source }
    }
}

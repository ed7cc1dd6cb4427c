use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use anyhow::{Result, anyhow};
use nix::sys::personality::{self, Persona};
use nix::sys::ptrace;
use nix::unistd::{ForkResult, execv, fork};
use tracing::debug;

use crate::options::Aslr;
use crate::process::TracedProcess;

/// Status the child exits with when it could not become the debuggee.
const EXEC_FAILED: i32 = 127;

impl TracedProcess {
    /// Forks and execs `path` as a traced child.
    ///
    /// The child stops on the exec trap before running any of its own code;
    /// the caller is expected to consume that stop with `wait_for_stop`.
    pub fn launch(path: &Path, args: &[String], aslr: Aslr) -> Result<TracedProcess> {
        // Build argv before forking; the child should do as little as possible.
        let filename = CString::new(path.as_os_str().as_bytes())?;
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(filename.clone());
        for arg in args {
            argv.push(CString::new(arg.as_str())?);
        }

        // SAFETY: the debugger is single threaded, and the child only makes
        // async-signal-safe calls before exec.
        match unsafe { fork() }.map_err(|e| anyhow!("fork failed: {e}"))? {
            ForkResult::Parent { child } => {
                debug!(pid = %child, ?path, "launched inferior");
                Ok(TracedProcess::from_pid(child))
            }
            ForkResult::Child => {
                let err = become_debuggee(&filename, &argv, aslr);
                // no tracing here: the subscriber's writer may be mid-write in the parent
                eprintln!("failed to exec {path:?}: {err}");
                std::process::exit(EXEC_FAILED);
            }
        }
    }
}

/// Runs in the child; only returns on failure.
fn become_debuggee(filename: &CString, argv: &[CString], aslr: Aslr) -> nix::Error {
    if let Err(e) = ptrace::traceme() {
        return e;
    }

    if matches!(aslr, Aslr::Disabled) {
        let disabled = personality::get().and_then(|p| personality::set(p | Persona::ADDR_NO_RANDOMIZE));
        if let Err(e) = disabled {
            return e;
        }
    }

    match execv(filename, argv) {
        Err(e) => e,
        Ok(infallible) => match infallible {},
    }
}

#[cfg(not(all(target_os = "linux", target_arch = "x86_64")))]
compile_error!("minidbg only supports x86_64 Linux");

pub mod debugger;
pub mod error;
pub mod history;
pub mod logging;
pub mod options;
pub mod process;

use std::io;

use anyhow::Result;
use clap::Parser;
use clap::error::ErrorKind;
use minidbg::{debugger::Debugger, logging, options::Options, process::TracedProcess, process::Tracee};
use tracing::warn;

/// Exit status for a missing or nonexistent program argument.
const BAD_PROGRAM: i32 = -1;

fn main() -> Result<()> {
    let options = match Options::try_parse() {
        Ok(options) => options,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(BAD_PROGRAM);
        }
    };
    if let Err(e) = options.validate() {
        eprintln!("Error: {e}");
        std::process::exit(BAD_PROGRAM);
    }

    let _log_guard = logging::init(options.log_file.as_deref())?;

    let process = TracedProcess::launch(&options.executable, &options.args, options.aslr)?;
    println!("Started debugging process {}", process.pid());

    let mut debugger = Debugger::new(process, options.executable.clone());
    let result = debugger.run(io::stdin().lock(), io::stdout().lock());

    // the session never detaches, so whatever is left of the inferior goes with us
    let mut process = debugger.into_tracee();
    if let Err(e) = process.destroy() {
        warn!(error = %e, "failed to reap inferior");
    }

    result
}

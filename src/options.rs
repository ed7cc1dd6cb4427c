use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};

/// Whether the inferior runs with address space randomization.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum Aslr {
    Enabled,
    /// Addresses are stable from run to run, so breakpoints can be reused.
    #[default]
    Disabled,
}

#[derive(Clone, Debug, Parser)]
#[command(version, about = "minidbg (a minimal ptrace debugger)")]
pub struct Options {
    /// Path to the executable to debug.
    pub executable: PathBuf,

    /// Arguments to the executable.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,

    #[arg(long, value_enum, default_value_t = Aslr::Disabled)]
    pub aslr: Aslr,

    /// Write logs to this file instead of stderr.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Options {
    pub fn validate(&self) -> Result<()> {
        if !self.executable.exists() {
            return Err(anyhow!(
                "program {:?} does not exist",
                self.executable
            ));
        }
        Ok(())
    }
}

//! Parsing of one input line into a [`Command`].
//!
//! Command words may be abbreviated to any prefix that names exactly one
//! command (`c`, `cont`, `del`, `reg d`); an ambiguous or unknown word is
//! an [`DebuggerError::UnknownCommand`].
use phf::phf_ordered_map;

use crate::error::{DebuggerError, Result};
use crate::process::register_info::Register;
use crate::process::stoppoint::{VirtualAddress, parse_hex};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum CommandKind {
    Continue,
    Break,
    Delete,
    Register,
    Memory,
    Help,
    Quit,
}

static COMMANDS: phf::OrderedMap<&'static str, CommandKind> = phf_ordered_map! {
    "continue" => CommandKind::Continue,
    "break" => CommandKind::Break,
    "delete" => CommandKind::Delete,
    "register" => CommandKind::Register,
    "memory" => CommandKind::Memory,
    "help" => CommandKind::Help,
    "quit" => CommandKind::Quit,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum RegisterAction {
    Dump,
    Read,
    Write,
}

static REGISTER_ACTIONS: phf::OrderedMap<&'static str, RegisterAction> = phf_ordered_map! {
    "dump" => RegisterAction::Dump,
    "read" => RegisterAction::Read,
    "write" => RegisterAction::Write,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum MemoryAction {
    Read,
    Write,
}

static MEMORY_ACTIONS: phf::OrderedMap<&'static str, MemoryAction> = phf_ordered_map! {
    "read" => MemoryAction::Read,
    "write" => MemoryAction::Write,
};

pub const HELP: &str = "\
continue                        resume the inferior and wait for it to stop
break 0xADDR                    set a breakpoint at ADDR
delete 0xADDR                   remove the breakpoint at ADDR
register dump                   print all registers
register read <name>            print one register (decimal)
register write <name> 0xVALUE   set one register
memory read 0xADDR              print the word at ADDR
memory write 0xADDR 0xVALUE     write one word at ADDR
help                            print this message
quit                            exit the debugger
Commands may be abbreviated to any unambiguous prefix. An empty line repeats the last command.";

/// Exact match first, otherwise the single entry `token` is a prefix of.
fn resolve<V: Copy>(table: &phf::OrderedMap<&'static str, V>, token: &str) -> Option<V> {
    if token.is_empty() {
        return None;
    }
    if let Some(v) = table.get(token) {
        return Some(*v);
    }

    let mut candidates = table
        .entries()
        .filter(|(name, _)| name.starts_with(token))
        .map(|(_, v)| *v);
    match (candidates.next(), candidates.next()) {
        (Some(v), None) => Some(v),
        _ => None,
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BreakpointCommand {
    Create(VirtualAddress),
    Delete(VirtualAddress),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RegisterCommand {
    Dump,
    Read(Register),
    Write(Register, u64),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MemoryCommand {
    Read(VirtualAddress),
    Write(VirtualAddress, i64),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    /// Resume the inferior and block until it stops again.
    Continue,
    Breakpoint(BreakpointCommand),
    Register(RegisterCommand),
    Memory(MemoryCommand),
    Help,
    /// Exit the debugger.
    Quit,
}

impl TryFrom<&str> for Command {
    type Error = DebuggerError;

    fn try_from(value: &str) -> Result<Command> {
        let mut words = value.split_whitespace();
        let cmd = words.next().unwrap_or("").to_lowercase();
        let args: Vec<&str> = words.collect();

        let kind = resolve(&COMMANDS, &cmd)
            .ok_or_else(|| DebuggerError::UnknownCommand(value.trim().to_string()))?;

        let command = match kind {
            CommandKind::Continue => {
                expect_args::<0>(&args, "continue")?;
                Command::Continue
            }
            CommandKind::Break => {
                let [addr] = expect_args::<1>(&args, "break 0xADDR")?;
                Command::Breakpoint(BreakpointCommand::Create(addr.parse()?))
            }
            CommandKind::Delete => {
                let [addr] = expect_args::<1>(&args, "delete 0xADDR")?;
                Command::Breakpoint(BreakpointCommand::Delete(addr.parse()?))
            }
            CommandKind::Register => Command::Register(parse_register_command(value, &args)?),
            CommandKind::Memory => Command::Memory(parse_memory_command(value, &args)?),
            CommandKind::Help => {
                expect_args::<0>(&args, "help")?;
                Command::Help
            }
            CommandKind::Quit => {
                expect_args::<0>(&args, "quit")?;
                Command::Quit
            }
        };

        Ok(command)
    }
}

fn parse_register_command(line: &str, args: &[&str]) -> Result<RegisterCommand> {
    let (action, rest) = args
        .split_first()
        .ok_or_else(|| DebuggerError::MalformedArgument("usage: register <dump|read|write>".into()))?;
    let action = resolve(&REGISTER_ACTIONS, &action.to_lowercase())
        .ok_or_else(|| DebuggerError::UnknownCommand(line.trim().to_string()))?;

    let command = match action {
        RegisterAction::Dump => {
            expect_args::<0>(rest, "register dump")?;
            RegisterCommand::Dump
        }
        RegisterAction::Read => {
            let [name] = expect_args::<1>(rest, "register read <name>")?;
            RegisterCommand::Read(Register::from_name(name)?)
        }
        RegisterAction::Write => {
            let [name, value] = expect_args::<2>(rest, "register write <name> 0xVALUE")?;
            RegisterCommand::Write(Register::from_name(name)?, parse_hex(value)?)
        }
    };
    Ok(command)
}

fn parse_memory_command(line: &str, args: &[&str]) -> Result<MemoryCommand> {
    let (action, rest) = args
        .split_first()
        .ok_or_else(|| DebuggerError::MalformedArgument("usage: memory <read|write>".into()))?;
    let action = resolve(&MEMORY_ACTIONS, &action.to_lowercase())
        .ok_or_else(|| DebuggerError::UnknownCommand(line.trim().to_string()))?;

    let command = match action {
        MemoryAction::Read => {
            let [addr] = expect_args::<1>(rest, "memory read 0xADDR")?;
            MemoryCommand::Read(addr.parse()?)
        }
        MemoryAction::Write => {
            let [addr, value] = expect_args::<2>(rest, "memory write 0xADDR 0xVALUE")?;
            // words are raw bits, so keep the full 64-bit pattern
            MemoryCommand::Write(addr.parse()?, parse_hex(value)? as i64)
        }
    };
    Ok(command)
}

fn expect_args<'a, const N: usize>(args: &[&'a str], usage: &str) -> Result<[&'a str; N]> {
    <[&str; N]>::try_from(args).map_err(|_| {
        DebuggerError::MalformedArgument(format!(
            "expected {N} argument(s), got {}: usage: {usage}",
            args.len()
        ))
    })
}

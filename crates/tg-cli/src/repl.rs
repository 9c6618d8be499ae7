//! Line-oriented interactive session over stdin.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tg_core::{EntityId, RenderState};
use tg_pipeline::Session;
use thiserror::Error;
use tracing::debug;

pub const HELP: &str = "\
Type `A -> B` to append a relationship. Commands:
  :on ID       enable an entity
  :off ID      disable an entity
  :toggle ID   flip an entity
  :del N       delete line N
  :reset       clear the document and all toggles
  :list        show lines and entities
  :source      print the diagram description
  :show        print the current diagram
  :wait        wait for the current render, then show it
  :help        this text
  :quit        leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Append(String),
    Enable(String),
    Disable(String),
    Toggle(String),
    Delete(usize),
    Reset,
    List,
    Source,
    Show,
    Wait,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command `{0}` (try :help)")]
    Unknown(String),
    #[error("`{command}` needs {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },
    #[error("`{0}` is not a line number")]
    InvalidLine(String),
}

impl SessionCommand {
    /// Parse one input line. Blank input yields `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let Some(command) = trimmed.strip_prefix(':') else {
            return Ok(Some(Self::Append(line.to_string())));
        };

        let (name, argument) = match command.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command, ""),
        };
        let needs_id = |name: &'static str| {
            if argument.is_empty() {
                Err(CommandError::MissingArgument {
                    command: name,
                    expected: "an entity label",
                })
            } else {
                Ok(argument.to_string())
            }
        };

        let parsed = match name {
            "on" => Self::Enable(needs_id(":on")?),
            "off" => Self::Disable(needs_id(":off")?),
            "toggle" | "t" => Self::Toggle(needs_id(":toggle")?),
            "del" | "d" => {
                if argument.is_empty() {
                    return Err(CommandError::MissingArgument {
                        command: ":del",
                        expected: "a line number",
                    });
                }
                let number = argument
                    .parse()
                    .map_err(|_| CommandError::InvalidLine(argument.to_string()))?;
                Self::Delete(number)
            }
            "reset" => Self::Reset,
            "list" | "l" => Self::List,
            "source" | "src" => Self::Source,
            "show" | "s" => Self::Show,
            "wait" | "w" => Self::Wait,
            "help" | "h" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            other => return Err(CommandError::Unknown(format!(":{other}"))),
        };
        Ok(Some(parsed))
    }
}

/// Drive `session` from `input` until EOF or `:quit`.
pub fn run<R: BufRead, W: Write>(
    session: &mut Session,
    input: R,
    out: &mut W,
    echo_source: bool,
) -> Result<()> {
    for line in input.lines() {
        let line = line.context("Failed to read session input")?;
        let command = match SessionCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(error) => {
                writeln!(out, "error: {error}")?;
                continue;
            }
        };
        debug!(?command, "session command");
        if command == SessionCommand::Quit {
            break;
        }

        let edited = execute(session, command, out)?;
        if edited && echo_source {
            writeln!(out, "{}", session.source())?;
        }
        if session.poll() {
            write_status(session.state(), out)?;
        }
    }
    session.wait_all();
    Ok(())
}

/// Run one command. Returns whether the document changed.
fn execute<W: Write>(session: &mut Session, command: SessionCommand, out: &mut W) -> Result<bool> {
    match command {
        SessionCommand::Append(line) => {
            let scan = session.append_line(&line);
            let number = session.document().text().lines().count();
            if let Some(skipped) = scan.skipped.iter().find(|skipped| skipped.line == number) {
                writeln!(out, "note: line {number} ignored: {}", skipped.reason.as_str())?;
            }
            Ok(true)
        }
        SessionCommand::Enable(label) => set_flag(session, &label, true, out),
        SessionCommand::Disable(label) => set_flag(session, &label, false, out),
        SessionCommand::Toggle(label) => match session.toggle(&label) {
            Some(enabled) => {
                writeln!(out, "{label}: {}", on_off(enabled))?;
                Ok(true)
            }
            None => {
                writeln!(out, "error: unknown entity `{label}`")?;
                Ok(false)
            }
        },
        SessionCommand::Delete(number) => match session.remove_line(number) {
            Some(removed) => {
                writeln!(out, "deleted line {number}: {removed}")?;
                Ok(true)
            }
            None => {
                writeln!(out, "error: no line {number}")?;
                Ok(false)
            }
        },
        SessionCommand::Reset => {
            session.reset();
            writeln!(out, "document reset")?;
            Ok(true)
        }
        SessionCommand::List => {
            write_listing(session, out)?;
            Ok(false)
        }
        SessionCommand::Source => {
            writeln!(out, "{}", session.source())?;
            Ok(false)
        }
        SessionCommand::Show => {
            write_diagram(session, out)?;
            Ok(false)
        }
        SessionCommand::Wait => {
            session.wait_current();
            write_diagram(session, out)?;
            Ok(false)
        }
        SessionCommand::Help => {
            writeln!(out, "{HELP}")?;
            Ok(false)
        }
        SessionCommand::Quit => Ok(false),
    }
}

fn set_flag<W: Write>(session: &mut Session, label: &str, enabled: bool, out: &mut W) -> Result<bool> {
    let Some(id) = EntityId::new(label) else {
        writeln!(out, "error: empty entity label")?;
        return Ok(false);
    };
    if session.set_enabled(id, enabled).is_none() {
        writeln!(out, "note: `{label}` is not in the document yet")?;
    }
    writeln!(out, "{label}: {}", on_off(enabled))?;
    Ok(true)
}

const fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

fn write_listing<W: Write>(session: &Session, out: &mut W) -> Result<()> {
    for (index, line) in session.document().text().lines().enumerate() {
        writeln!(out, "{:>3}  {line}", index + 1)?;
    }
    for entry in session.checklist() {
        let mark = if entry.enabled { 'x' } else { ' ' };
        let note = if entry.in_text { "" } else { "  (not in text)" };
        writeln!(out, "[{mark}] {}{note}", entry.id)?;
    }
    Ok(())
}

fn write_diagram<W: Write>(session: &Session, out: &mut W) -> Result<()> {
    match session.state() {
        RenderState::Ready { image, .. } => writeln!(out, "{image}")?,
        RenderState::Failed { error, .. } => {
            writeln!(out, "render failed: {error}")?;
            if let Some(image) = session.last_image() {
                writeln!(out, "last good diagram:\n{image}")?;
            }
        }
        state => write_status(state, out)?,
    }
    Ok(())
}

fn write_status<W: Write>(state: &RenderState, out: &mut W) -> Result<()> {
    match state {
        RenderState::Idle => writeln!(out, "[idle]")?,
        RenderState::Rendering { .. } => writeln!(out, "[rendering]")?,
        RenderState::Ready { image, .. } => {
            writeln!(out, "[ready {}x{}]", image.width(), image.height())?;
        }
        RenderState::Failed { error, .. } => writeln!(out, "[failed] {error}")?,
    }
    Ok(())
}

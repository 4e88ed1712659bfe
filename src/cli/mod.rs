use crate::app::HostCapabilities;
use crate::domain::{ContextKey, ResultKind, ResultRecord, parse_command_line};
use crate::infra::{Config, ConfigOverrides, HttpCommandClient};
use std::io::{self, Write};
use thiserror::Error;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliInvocation {
    PrintHelp,
    PrintVersion,
    Tui { overrides: ConfigOverrides },
    Command(CliCommand),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliCommand {
    Exec {
        overrides: ConfigOverrides,
        line: String,
    },
    Ping {
        overrides: ConfigOverrides,
    },
}

impl CliCommand {
    pub fn overrides(&self) -> &ConfigOverrides {
        match self {
            Self::Exec { overrides, .. } | Self::Ping { overrides } => overrides,
        }
    }
}

#[derive(Debug, Error)]
pub enum CliParseError {
    #[error("unknown subcommand: {0}")]
    UnknownSubcommand(String),

    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("missing value for flag: {0}")]
    MissingFlagValue(String),

    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),

    #[error("missing command for exec\nHint: `neobbs exec /who`")]
    MissingCommand,
}

pub fn parse_invocation(args: &[String]) -> Result<CliInvocation, CliParseError> {
    let mut iter = args.iter().skip(1).peekable();
    let mut overrides = ConfigOverrides::default();

    while let Some(arg) = iter.peek() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(CliInvocation::PrintHelp),
            "--version" | "-V" => return Ok(CliInvocation::PrintVersion),
            "--api-url" => {
                let _ = iter.next();
                let value = iter
                    .next()
                    .ok_or_else(|| CliParseError::MissingFlagValue("--api-url".to_string()))?;
                overrides.api_url = Some(value.to_string());
            }
            "--token" => {
                let _ = iter.next();
                let value = iter
                    .next()
                    .ok_or_else(|| CliParseError::MissingFlagValue("--token".to_string()))?;
                overrides.auth_token = Some(value.to_string());
            }
            "--" => {
                let _ = iter.next();
                break;
            }
            other if other.starts_with('-') => {
                return Err(CliParseError::UnknownFlag(other.to_string()));
            }
            _ => break,
        }
    }

    let Some(subcommand) = iter.next() else {
        return Ok(CliInvocation::Tui { overrides });
    };

    match subcommand.as_str() {
        "exec" => {
            // Everything after `exec` belongs to the command line, flags included.
            let words = iter.map(String::as_str).collect::<Vec<_>>();
            if words.is_empty() {
                return Err(CliParseError::MissingCommand);
            }
            Ok(CliInvocation::Command(CliCommand::Exec {
                overrides,
                line: words.join(" "),
            }))
        }
        "ping" => {
            if let Some(arg) = iter.next() {
                if arg.starts_with('-') {
                    return Err(CliParseError::UnknownFlag(arg.to_string()));
                }
                return Err(CliParseError::UnexpectedArgument(arg.to_string()));
            }
            Ok(CliInvocation::Command(CliCommand::Ping { overrides }))
        }
        other => Err(CliParseError::UnknownSubcommand(other.to_string())),
    }
}

#[derive(Debug, Error)]
pub enum CliRunError {
    #[error(transparent)]
    Config(#[from] crate::infra::ConfigError),

    #[error("server unreachable at {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error(transparent)]
    WriteOutput(#[from] io::Error),
}

/// Whether a one-shot command produced an error result.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CliStatus {
    Ok,
    Failed,
}

pub fn run(command: CliCommand, config: &Config) -> Result<CliStatus, CliRunError> {
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let client = HttpCommandClient::new(
        &config.api_url,
        config.auth_token.clone(),
        config.request_timeout,
    );

    match command {
        CliCommand::Exec { line, .. } => {
            let record = match parse_command_line(&line) {
                Some(command) => {
                    tracing::debug!(command = %command.name, "exec");
                    crate::app::dispatch(
                        command,
                        ContextKey::home(),
                        &client,
                        &mut HostCapabilities::none(),
                    )
                }
                None => return Ok(CliStatus::Ok),
            };
            write_record(&mut out, &record)?;
            out.flush()?;
            Ok(match record.kind {
                ResultKind::Error => CliStatus::Failed,
                ResultKind::Success | ResultKind::Info => CliStatus::Ok,
            })
        }
        CliCommand::Ping { .. } => match client.health() {
            Ok(()) => {
                writeln!(out, "ok\t{}", client.base_url())?;
                out.flush()?;
                Ok(CliStatus::Ok)
            }
            Err(error) => {
                tracing::warn!(%error, "health check failed");
                Err(CliRunError::Unreachable {
                    url: client.base_url().to_string(),
                    message: error.to_string(),
                })
            }
        },
    }
}

fn write_record(out: &mut impl Write, record: &ResultRecord) -> io::Result<()> {
    writeln!(out, "$ {}", record.command)?;
    for line in record.output.lines() {
        match writeln!(out, "{line}") {
            Ok(()) => {}
            Err(error) if error.kind() == io::ErrorKind::BrokenPipe => return Ok(()),
            Err(error) => return Err(error),
        }
    }
    Ok(())
}

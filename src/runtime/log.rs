use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use env_logger::{Builder, Target};
use log::LevelFilter;

use crate::utils::expand_and_resolve_path;

pub const DEFAULT_LOG_PATH: &str = "robtools.log";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogLevel(pub LevelFilter);
impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s.to_lowercase().as_str() {
            "trace" => LevelFilter::Trace,
            "debug" => LevelFilter::Debug,
            "info" => LevelFilter::Info,
            "warn" | "warning" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            "off" => LevelFilter::Off,
            _ => return Err(format!("Invalid log level: {}", s)),
        };
        Ok(LogLevel(level))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LogMode {
    Path,
    Terminal,
    Discard,
}
impl std::str::FromStr for LogMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mode = match s.to_lowercase().as_str() {
            "path" | "file" => LogMode::Path,
            "terminal" | "term" | "cli" => LogMode::Terminal,
            "discard" | "none" => LogMode::Discard,
            _ => return Err(format!("Invalid log mode: {}", s)),
        };
        Ok(mode)
    }
}

/// Install env_logger as the global logger. The log file is appended to, like a pipeline journal
pub fn setup_global_logger(
    log_level: LogLevel,
    log_mode: LogMode,
    log_path: PathBuf,
) -> anyhow::Result<()> {
    let mut builder = Builder::new();
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} {:<8} {}",
            buf.timestamp_seconds(),
            record.level(),
            record.args()
        )
    });

    match log_mode {
        LogMode::Discard => {
            builder.filter_level(LevelFilter::Off);
        }
        LogMode::Terminal => {
            builder.filter_level(log_level.0).target(Target::Stderr);
        }
        LogMode::Path => {
            let path = expand_and_resolve_path(&log_path)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;
            builder
                .filter_level(log_level.0)
                .target(Target::Pipe(Box::new(file)));
        }
    }

    builder
        .try_init()
        .context("A global logger was already installed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_and_mode() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel(LevelFilter::Debug));
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel(LevelFilter::Warn));
        assert!("loud".parse::<LogLevel>().is_err());

        assert_eq!("file".parse::<LogMode>().unwrap(), LogMode::Path);
        assert_eq!("none".parse::<LogMode>().unwrap(), LogMode::Discard);
        assert!("both".parse::<LogMode>().is_err());
    }
}

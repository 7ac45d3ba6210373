use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use env_logger::{Builder, Target, WriteStyle};
use log::{Level, LevelFilter};

fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,  // default: warnings and errors
        1 => LevelFilter::Info,  // -v: info and up
        2 => LevelFilter::Debug, // -vv: debug and up
        _ => LevelFilter::Trace, // -vvv: prompts and raw model output
    }
}

/// Install the global logger.
///
/// Terminal output gets colored level labels on stderr. With `log_file` the
/// records are appended to that file instead, with timestamps and at least
/// debug detail.
pub fn init_logger(verbosity: u8, log_file: Option<&Path>) -> Result<()> {
    let mut builder = Builder::new();

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {:?}", path))?;
            builder
                .filter_level(level_for(verbosity).max(LevelFilter::Debug))
                .target(Target::Pipe(Box::new(file)))
                .write_style(WriteStyle::Never)
                .format(|buf, record| {
                    writeln!(
                        buf,
                        "{} {:<5} {}",
                        buf.timestamp(),
                        record.level(),
                        record.args()
                    )
                });
        }
        None => {
            builder.filter_level(level_for(verbosity)).format(|buf, record| {
                let level_label = match record.level() {
                    Level::Error => "ERROR".red().bold(),
                    Level::Warn  => "WARN ".yellow().bold(),
                    Level::Info  => "INFO ".white().bold(),
                    Level::Debug => "DEBUG".bright_black(),
                    Level::Trace => "TRACE".bright_black(),
                };

                writeln!(buf, "{} {}", level_label, record.args())
            });
        }
    }

    builder.try_init().context("logger already initialized")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_for(0), LevelFilter::Warn);
        assert_eq!(level_for(1), LevelFilter::Info);
        assert_eq!(level_for(2), LevelFilter::Debug);
        assert_eq!(level_for(7), LevelFilter::Trace);
    }
}

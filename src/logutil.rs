//! Logging setup and helpers for keeping log records on one line.

use std::fmt::Write as _;
use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::config::LoggingConfig;

/// Escape a string for single-line logging:
/// - `\n` => `\\n`
/// - `\r` => `\\r`
/// - `\t` => `\\t`
/// - backslash => `\\\\`
///
/// Strings longer than 300 characters are cut with an ellipsis.
pub fn escape_log(s: &str) -> String {
    const MAX_PREVIEW: usize = 300;
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// `Name (id)` for log lines, escaped.
pub fn quest_label(name: &str, id: &str) -> String {
    format!("{} ({})", escape_log(name), escape_log(id))
}

fn level_for(config: Option<&LoggingConfig>, verbosity: u8) -> log::LevelFilter {
    match verbosity {
        0 => config
            .map(LoggingConfig::level_filter)
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

fn format_line(record: &log::Record<'_>) -> String {
    let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    format!("{} [{}] {}", ts, record.level(), record.args())
}

/// Open `path` for appending, creating it if needed.
fn open_log_file(path: &str) -> std::io::Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
}

/// Install the global logger. `-v` flags override the configured level.
///
/// With `logging.file` set, records are appended to that file and echoed to the
/// console only when stdout is a terminal. A file that cannot be opened is reported
/// as a warning and logging stays on the console.
pub fn init_logging(config: Option<&LoggingConfig>, verbosity: u8) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level_for(config, verbosity));

    let mut open_error = None;
    let log_file = match config.and_then(|cfg| cfg.file.as_deref()) {
        Some(path) => match open_log_file(path) {
            Ok(file) => Some(file),
            Err(e) => {
                open_error = Some((path.to_string(), e));
                None
            }
        },
        None => None,
    };

    match log_file {
        Some(file) => {
            let sink = Arc::new(Mutex::new(file));
            let is_tty = atty::is(atty::Stream::Stdout);
            builder.format(move |fmt, record| {
                let line = format_line(record);
                if let Ok(mut guard) = sink.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| writeln!(fmt, "{}", format_line(record)));
        }
    }

    let _ = builder.try_init();

    if let Some((path, e)) = open_error {
        log::warn!(
            "Cannot open log file {}: {}; logging to console only",
            escape_log(&path),
            e
        );
    }
}

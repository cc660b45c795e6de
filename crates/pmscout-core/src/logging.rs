//! Logging setup: env_logger backend, routed through indicatif on a TTY

use indicatif::MultiProgress;

/// Crates whose debug output `--debug` turns on. Dependencies stay at info.
const OWN_CRATES: &[&str] = &["pmscout", "pmscout_core", "pmscout_pubmed"];

/// ANSI color code and padded label for a log level.
fn level_style(level: log::Level, color: bool) -> (&'static str, &'static str, &'static str) {
    let label = match level {
        log::Level::Error => "ERROR",
        log::Level::Warn => "WARN ",
        log::Level::Info => "INFO ",
        log::Level::Debug => "DEBUG",
        log::Level::Trace => "TRACE",
    };
    if !color {
        return ("", label, "");
    }
    let ansi = match level {
        log::Level::Error => "\x1b[31m",
        log::Level::Warn => "\x1b[33m",
        log::Level::Info => "\x1b[32m",
        log::Level::Debug => "\x1b[36m",
        log::Level::Trace => "\x1b[35m",
    };
    (ansi, label, "\x1b[0m")
}

/// Default filter string when `RUST_LOG` is unset.
///
/// `debug` wins over `quiet`.
pub fn default_filter(quiet: bool, debug: bool) -> String {
    if debug {
        let own: Vec<String> = OWN_CRATES.iter().map(|c| format!("{c}=debug")).collect();
        format!("info,{}", own.join(","))
    } else if quiet {
        "warn".to_string()
    } else {
        "info".to_string()
    }
}

/// Logger that prints through indicatif MultiProgress so lines don't tear the record bar.
pub struct IndicatifLogger {
    inner: env_logger::Logger,
    multi: MultiProgress,
}

impl IndicatifLogger {
    pub fn new(inner: env_logger::Logger, multi: MultiProgress) -> Self {
        Self { inner, multi }
    }
}

impl log::Log for IndicatifLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        if self.inner.matches(record) {
            // Only installed on a TTY, so always colored
            let (pre, label, post) = level_style(record.level(), true);
            let line = format!("[{pre}{label}{post}] {}", record.args());
            self.multi.suspend(|| eprintln!("{line}"));
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Initialize logging.
///
/// With `multi` (TTY), log lines go through the progress bars. Without it,
/// plain uncolored lines go to stderr. Safe to call more than once; later
/// calls are ignored.
pub fn init_logging(quiet: bool, debug: bool, multi: Option<&MultiProgress>) {
    use std::io::Write;

    let filter = default_filter(quiet, debug);
    let env = env_logger::Env::default().default_filter_or(filter);

    if let Some(multi) = multi {
        let logger = env_logger::Builder::from_env(env)
            .format_timestamp_millis()
            .build();
        let max_level = logger.filter();

        if log::set_boxed_logger(Box::new(IndicatifLogger::new(logger, multi.clone()))).is_ok() {
            log::set_max_level(max_level);
        }
    } else {
        let _ = env_logger::Builder::from_env(env)
            .format(|buf, record| {
                let (_, label, _) = level_style(record.level(), false);
                writeln!(buf, "[{label}] {}", record.args())
            })
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_levels() {
        assert_eq!(default_filter(false, false), "info");
        assert_eq!(default_filter(true, false), "warn");
    }

    #[test]
    fn debug_scopes_to_own_crates() {
        let filter = default_filter(true, true);
        assert!(filter.starts_with("info,"));
        assert!(filter.contains("pmscout_pubmed=debug"));
        assert!(filter.contains("pmscout=debug"));
    }

    #[test]
    fn level_labels_uncolored() {
        let (pre, label, post) = level_style(log::Level::Warn, false);
        assert_eq!((pre, label, post), ("", "WARN ", ""));
    }
}

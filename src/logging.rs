use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error = 0,
    #[default]
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    /// Maps `-v` repetitions and `--debug` onto a level. Never goes below
    /// `base`.
    pub fn from_verbosity(base: LogLevel, verbose: u8, debug: bool) -> LogLevel {
        let requested = if debug {
            LogLevel::Debug
        } else {
            match verbose {
                0 => base,
                1 => LogLevel::Info,
                _ => LogLevel::Debug,
            }
        };
        requested.max(base)
    }

    fn from_u8(value: u8) -> LogLevel {
        match value {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }
}

static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Warn as u8);

pub fn init(level: LogLevel) {
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn level() -> LogLevel {
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

pub fn error(message: impl AsRef<str>) {
    log(LogLevel::Error, "error", message.as_ref());
}

pub fn warn(message: impl AsRef<str>) {
    log(LogLevel::Warn, "warn", message.as_ref());
}

pub fn info(message: impl AsRef<str>) {
    log(LogLevel::Info, "info", message.as_ref());
}

pub fn debug(message: impl AsRef<str>) {
    log(LogLevel::Debug, "debug", message.as_ref());
}

fn log(level: LogLevel, label: &str, message: &str) {
    let current = LOG_LEVEL.load(Ordering::Relaxed);
    if current >= level as u8 {
        eprintln!("[{}] {}", label, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_verbosity() {
        assert_eq!(LogLevel::from_verbosity(LogLevel::Warn, 0, false), LogLevel::Warn);
        assert_eq!(LogLevel::from_verbosity(LogLevel::Warn, 1, false), LogLevel::Info);
        assert_eq!(LogLevel::from_verbosity(LogLevel::Warn, 2, false), LogLevel::Debug);
        assert_eq!(LogLevel::from_verbosity(LogLevel::Error, 0, true), LogLevel::Debug);
        assert_eq!(LogLevel::from_verbosity(LogLevel::Debug, 1, false), LogLevel::Debug);
        assert_eq!(LogLevel::from_verbosity(LogLevel::Error, 0, false), LogLevel::Error);
    }

    #[test]
    fn test_deserialize_lowercase_names() {
        let level: LogLevel = serde_json::from_str("\"info\"").unwrap();
        assert_eq!(level, LogLevel::Info);
        assert!(serde_json::from_str::<LogLevel>("\"loud\"").is_err());
    }

    #[test]
    fn test_init_sets_level() {
        init(LogLevel::Error);
        assert_eq!(level(), LogLevel::Error);
        init(LogLevel::Warn);
        assert_eq!(level(), LogLevel::Warn);
    }

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Info < LogLevel::Debug);
        for level in [LogLevel::Error, LogLevel::Warn, LogLevel::Info, LogLevel::Debug] {
            assert_eq!(LogLevel::from_u8(level as u8), level);
        }
    }
}

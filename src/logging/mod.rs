//! Log stream setup
//!
//! The logger is built explicitly from config rather than from ambient
//! environment defaults. Output goes through the `log` facade; the format
//! is either one JSON object per record or a plain epoch-seconds line.

use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use env_logger::Builder;
use log::LevelFilter;

use crate::config::LoggingConfig;
use crate::errors::{ClaimerError, ClaimerResult};

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Build and install the process logger from config.
pub fn init(config: &LoggingConfig) -> ClaimerResult<()> {
    let level = match config.level.as_str() {
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        other => {
            return Err(ClaimerError::Config(format!(
                "unknown logging.level {:?}",
                other
            )))
        }
    };

    let mut builder = Builder::new();
    builder.filter(None, level);

    match config.format.as_str() {
        "json" => {
            builder.format(|buf, record| {
                let line = serde_json::json!({
                    "ts": epoch_secs(),
                    "level": record.level().to_string(),
                    "target": record.target(),
                    "msg": record.args().to_string(),
                });
                writeln!(buf, "{}", line)
            });
        }
        "text" => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{} [{}] - {}",
                    epoch_secs(),
                    record.level(),
                    record.args()
                )
            });
        }
        other => {
            return Err(ClaimerError::Config(format!(
                "unknown logging.format {:?}",
                other
            )))
        }
    }

    // try_init so tests that set up logging twice don't panic
    let _ = builder.try_init();
    Ok(())
}

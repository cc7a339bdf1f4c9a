//! `env_logger` set-up shared by the instill binaries.

use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

/// Maps a `-v` count to a log level, starting from `warn`.
#[must_use]
pub const fn level_for_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Initialises the global logger.
///
/// `RUST_LOG` overrides the level derived from `verbosity`. Calling this more
/// than once leaves the first logger in place.
pub fn init_logger(verbosity: u8) {
    let result = Builder::from_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .filter_level(level_for_verbosity(verbosity))
        .parse_default_env()
        .try_init();
    if result.is_err() {
        log::debug!("logger already initialised");
    }
}

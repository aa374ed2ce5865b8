//! env_logger setup. Lines look like `[2024-01-01 12:00:00] INFO tandem: message`.

use std::io::Write;

use chrono::Local;
use log::LevelFilter;

/// Install the global logger. `RUST_LOG` overrides the default level;
/// `quiet` lowers the default to warnings. Safe to call more than once.
pub fn init_logging(quiet: bool) {
    let default_level = if quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(default_level);
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }
    let _ = builder
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} {}: {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(true);
        init_logging(false);
        log::info!("logger installed");
    }
}

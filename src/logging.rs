//! Logger setup for the command line front end, using
//! https://docs.rs/log4rs

use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};

/// Send log records at `level` and above to stderr.
pub fn init_log(level: LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S)} {h({l:5})} {t} {m}{n}")))
        .build();
    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(level)))
                .build("stderr", Box::new(stderr)),
        )
        .build(Root::builder().appender("stderr").build(level))?;
    log4rs::init_config(config)?;
    Ok(())
}

/// Verbosity from the `-v`/`-q` counts, `warn` by default.
pub fn level_from_flags(verbose: u8, quiet: u8) -> LevelFilter {
    const LEVELS: [LevelFilter; 6] = [
        LevelFilter::Off,
        LevelFilter::Error,
        LevelFilter::Warn,
        LevelFilter::Info,
        LevelFilter::Debug,
        LevelFilter::Trace,
    ];
    let index = (2 + verbose as i32 - quiet as i32).clamp(0, LEVELS.len() as i32 - 1);
    LEVELS[index as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_flags() {
        assert_eq!(level_from_flags(0, 0), LevelFilter::Warn);
        assert_eq!(level_from_flags(1, 0), LevelFilter::Info);
        assert_eq!(level_from_flags(2, 0), LevelFilter::Debug);
        assert_eq!(level_from_flags(9, 0), LevelFilter::Trace);
        assert_eq!(level_from_flags(0, 1), LevelFilter::Error);
        assert_eq!(level_from_flags(0, 5), LevelFilter::Off);
        assert_eq!(level_from_flags(1, 1), LevelFilter::Warn);
    }
}

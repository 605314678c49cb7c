//! Tiered retrograde solving for finite two-player games.
//!
//! A game's position space is partitioned into tiers that form a DAG.
//! Tiers are solved bottom-up, each one by immediate transition (one pass
//! over solved child tiers), by backward induction (frontier percolation,
//! or level rescans when frontiers do not fit), or by value iteration.
pub mod database;
pub mod error;
pub mod game;
pub mod games;
pub mod graph;
pub mod manager;
pub mod solver;
pub mod worker;

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Identifier of a tier. Symmetric tiers share a canonical representative.
pub type Tier = u64;
/// Index of a position within its tier, in `0..tier_size`.
pub type Position = u64;
/// Game-specific move encoding.
pub type Move = u64;
/// Number of moves to the end of the game under optimal play.
pub type Remoteness = u16;

// ============================================================================
// SOLVER LIMITS
// ============================================================================
/// Largest remoteness a record can hold (10 bits).
pub const REMOTENESS_MAX: Remoteness = 1023;
/// Number of remoteness buckets in a frontier.
pub const FRONTIER_SIZE: usize = REMOTENESS_MAX as usize + 1;
/// Most child tiers a single tier may have, including itself as a frontier source.
pub const CHILD_TIERS_MAX: usize = u8::MAX as usize;
/// Default memory budget for a single tier solve (bytes).
pub const MEMORY_LIMIT_DEFAULT: usize = 1 << 32;

// ============================================================================
// TESTING AND DISTRIBUTION
// ============================================================================
/// Positions sampled per tier by the consistency checker.
pub const TEST_SAMPLE_MAX: usize = 1000;
/// Default seed for the consistency checker's sampler.
pub const TEST_SEED_DEFAULT: u64 = 0x7153;
/// Pause taken by an idle distributed worker before checking in again.
pub const WORKER_SLEEP: std::time::Duration = std::time::Duration::from_millis(25);
/// Interval between progress log messages while solving.
pub const SOLVING_LOG_INTERVAL: std::time::Duration = std::time::Duration::from_secs(30);
/// Directory of the DEBUG log files.
pub const LOG_DIR: &str = "logs";

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Install the terminal logger at `terminal` and, when `logs/` is writable,
/// a DEBUG file logger at `logs/tiersolver-<unix-seconds>.log`.
/// Only this crate's records are kept. Installing twice is a no-op.
#[cfg(feature = "server")]
pub fn log(terminal: log::LevelFilter) {
    use simplelog::ColorChoice;
    use simplelog::CombinedLogger;
    use simplelog::ConfigBuilder;
    use simplelog::SharedLogger;
    use simplelog::TermLogger;
    use simplelog::TerminalMode;
    use simplelog::WriteLogger;
    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .add_filter_allow_str("tiersolver")
        .build();
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        terminal,
        config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    let path = log_file(std::time::SystemTime::now());
    match std::fs::create_dir_all(LOG_DIR).and_then(|_| std::fs::File::create(&path)) {
        Ok(file) => loggers.push(WriteLogger::new(log::LevelFilter::Debug, config, file)),
        Err(e) => eprintln!("no log file at {}: {}", path.display(), e),
    }
    let _ = CombinedLogger::init(loggers);
}

/// Where a run started at `now` writes its DEBUG log.
pub fn log_file(now: std::time::SystemTime) -> std::path::PathBuf {
    let stamp = now
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    std::path::Path::new(LOG_DIR).join(format!("tiersolver-{}.log", stamp))
}

/// Global interrupt flag for graceful shutdown coordination.
static INTERRUPTED: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);
/// Check if graceful shutdown was requested. Tiers already dispatched still finish.
pub fn interrupted() -> bool {
    INTERRUPTED.load(std::sync::atomic::Ordering::Relaxed)
}
/// Register graceful Ctrl+C handler. Must be called inside a tokio runtime.
/// The scheduler stops handing out tiers once the flag is raised.
pub fn brb() {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!();
            log::warn!("graceful interrupt requested, finishing dispatched tiers...");
            INTERRUPTED.store(true, std::sync::atomic::Ordering::Relaxed);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use std::time::UNIX_EPOCH;

    #[test]
    fn log_files_are_named_by_start_time() {
        let path = log_file(UNIX_EPOCH + Duration::from_millis(1_700_000_000_999));
        assert!(path == std::path::Path::new("logs").join("tiersolver-1700000000.log"));
        assert!(log_file(UNIX_EPOCH - Duration::from_secs(1)).ends_with("tiersolver-0.log"));
    }
}

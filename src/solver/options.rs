use crate::MEMORY_LIMIT_DEFAULT;
use crate::TEST_SEED_DEFAULT;
use crate::worker::Method;
use serde::Deserialize;
use serde::Serialize;

/// Runtime knobs for a solver run.
///
/// Defaults come from the environment where set:
/// `TIER_MEMORY` (bytes, with optional K/M/G suffix), `TIER_THREADS`,
/// `TIER_WORKERS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Re-solve tiers the store already has.
    pub force: bool,
    /// Memory budget of a single tier solve, in bytes.
    pub memory: usize,
    /// Threads per worker.
    pub threads: usize,
    /// Concurrent workers in distributed mode.
    pub workers: usize,
    pub method: Method,
    /// Seed of the consistency checker's sampler.
    pub seed: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            force: false,
            memory: std::env::var("TIER_MEMORY")
                .ok()
                .and_then(|s| parse_bytes(&s))
                .unwrap_or(MEMORY_LIMIT_DEFAULT),
            threads: std::env::var("TIER_THREADS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or_else(num_cpus::get),
            workers: std::env::var("TIER_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(1),
            method: Method::default(),
            seed: TEST_SEED_DEFAULT,
        }
    }
}

/// Parse a byte count like "512", "64K", "8M", "4G".
pub fn parse_bytes(s: &str) -> Option<usize> {
    let s = s.trim();
    let (num, scale) = match s.chars().last()?.to_ascii_uppercase() {
        'K' => (&s[..s.len() - 1], 1 << 10),
        'M' => (&s[..s.len() - 1], 1 << 20),
        'G' => (&s[..s.len() - 1], 1 << 30),
        _ => (s, 1),
    };
    num.trim().parse::<usize>().ok()?.checked_mul(scale)
}

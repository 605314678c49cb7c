use crate::Tier;
use serde::Serialize;

/// Tally of a solver run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    /// Tiers solved in this run.
    pub solved: usize,
    /// Tiers already in the store.
    pub loaded: usize,
    /// Non-canonical tiers, never solved themselves.
    pub skipped: usize,
    pub failed: usize,
    /// Canonical tiers never dispatched because a dependency failed
    /// or the run was interrupted.
    pub blocked: usize,
    pub failures: Vec<(Tier, String)>,
    pub seconds: f64,
}

impl Summary {
    /// A run succeeds when no tier failed.
    pub fn ok(&self) -> bool {
        self.failed == 0
    }
}

/// Digits grouped by thousands.
pub(crate) fn commas(n: impl ToString) -> String {
    n.to_string()
        .as_bytes()
        .rchunks(3)
        .rev()
        .filter_map(|c| std::str::from_utf8(c).ok())
        .collect::<Vec<_>>()
        .join(",")
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "┌────────────┬───────────────┐")?;
        writeln!(f, "│ Tiers      │         Count │")?;
        writeln!(f, "├────────────┼───────────────┤")?;
        writeln!(f, "│ Solved     │ {:>13} │", commas(self.solved))?;
        writeln!(f, "│ Loaded     │ {:>13} │", commas(self.loaded))?;
        writeln!(f, "│ Skipped    │ {:>13} │", commas(self.skipped))?;
        writeln!(f, "│ Failed     │ {:>13} │", commas(self.failed))?;
        writeln!(f, "│ Blocked    │ {:>13} │", commas(self.blocked))?;
        writeln!(f, "├────────────┼───────────────┤")?;
        writeln!(f, "│ Seconds    │ {:>13.2} │", self.seconds)?;
        write!(f, "└────────────┴───────────────┘")?;
        for (tier, reason) in self.failures.iter() {
            write!(f, "\n  tier {}: {}", tier, reason)?;
        }
        Ok(())
    }
}

//! Tier Solver Binary
//!
//! Solves, analyzes, checks and queries the bundled games.
//!
//! Options: --game, --db, --force, --workers, --threads, --memory, --method, --json

use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use std::sync::Arc;
use tiersolver::database::DiskStore;
use tiersolver::database::MemoryStore;
use tiersolver::database::Store;
use tiersolver::game::TierGame;
use tiersolver::game::TierPosition;
use tiersolver::games::TicTacToe;
use tiersolver::solver::Options;
use tiersolver::solver::TierSolver;
use tiersolver::solver::parse_bytes;
use tiersolver::worker::Method;

#[derive(Parser)]
#[command(author, version, about = "Tiered retrograde solver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    #[arg(long, value_enum, default_value_t = Game::TicTacToe, global = true)]
    game: Game,
    /// Directory of the on-disk database. Solves in memory when absent.
    #[arg(long, global = true)]
    db: Option<std::path::PathBuf>,
    /// Report every tier as loopy.
    #[arg(long, global = true)]
    loopy: bool,
    /// Let the game enumerate parents instead of building a reverse graph.
    #[arg(long, global = true)]
    retrograde: bool,
    /// Per-tier memory budget, e.g. 512M or 4G.
    #[arg(long, global = true, value_parser = bytes)]
    memory: Option<usize>,
    #[arg(long, global = true)]
    threads: Option<usize>,
    /// Print results as JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,
    /// Log DEBUG records to the terminal too.
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Solve every reachable tier", alias = "s")]
    Solve {
        /// Re-solve tiers already in the database.
        #[arg(long)]
        force: bool,
        /// Concurrent workers. One worker solves in place.
        #[arg(long)]
        workers: Option<usize>,
        /// Per-tier algorithm.
        #[arg(long, value_enum, default_value_t = Algorithm::Auto)]
        method: Algorithm,
    },
    #[command(about = "Tally reachable positions by value", alias = "a")]
    Analyze,
    #[command(about = "Check the game implementation", alias = "t")]
    Test {
        #[arg(long)]
        seed: Option<u64>,
    },
    #[command(about = "Compare the database with a reference database", alias = "c")]
    Compare {
        /// Directory of the reference database.
        #[arg(required = true)]
        reference: std::path::PathBuf,
    },
    #[command(about = "Look up the value of a position", alias = "q")]
    Query {
        #[arg(required = true)]
        tier: u64,
        #[arg(required = true)]
        position: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Game {
    #[value(alias = "ttt")]
    TicTacToe,
}

#[derive(Clone, Copy, ValueEnum)]
enum Algorithm {
    /// Immediate transition where allowed, backward induction elsewhere.
    Auto,
    #[value(alias = "bi")]
    Induction,
    #[value(alias = "vi")]
    ValueIteration,
}

impl From<Algorithm> for Method {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Auto => Method::Auto,
            Algorithm::Induction => Method::Induction,
            Algorithm::ValueIteration => Method::ValueIteration,
        }
    }
}

fn bytes(s: &str) -> Result<usize, String> {
    parse_bytes(s).ok_or_else(|| format!("invalid byte count: {}", s))
}

impl Cli {
    fn game(&self) -> Arc<dyn TierGame> {
        match self.game {
            Game::TicTacToe => {
                let mut game = TicTacToe::new();
                if self.loopy {
                    game = game.loopy();
                }
                if self.retrograde {
                    game = game.with_retrograde();
                }
                Arc::new(game)
            }
        }
    }
    fn store(&self) -> anyhow::Result<Arc<dyn Store>> {
        match self.db {
            Some(ref root) => Ok(Arc::new(
                DiskStore::new(root.clone())
                    .with_context(|| format!("open database at {}", root.display()))?,
            )),
            None => Ok(Arc::new(MemoryStore::new())),
        }
    }
    fn options(&self) -> Options {
        let mut options = Options::default();
        options.memory = self.memory.unwrap_or(options.memory);
        options.threads = self.threads.unwrap_or(options.threads).max(1);
        match self.command {
            Command::Solve {
                force,
                workers,
                method,
            } => {
                options.force = force;
                options.workers = workers.unwrap_or(options.workers).max(1);
                options.method = method.into();
            }
            Command::Test { seed } => options.seed = seed.unwrap_or(options.seed),
            _ => {}
        }
        options
    }
}

fn print<T: serde::Serialize + std::fmt::Display>(json: bool, value: &T) -> anyhow::Result<()> {
    match json {
        true => println!("{}", serde_json::to_string_pretty(value)?),
        false => println!("{}", value),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tiersolver::log(match cli.verbose {
        true => log::LevelFilter::Debug,
        false => log::LevelFilter::Info,
    });
    tiersolver::brb();
    let options = cli.options();
    let solver = TierSolver::new(cli.game(), cli.store()?, options.clone());
    match cli.command {
        Command::Solve { .. } if options.workers > 1 => {
            let (summary, stats) = solver.solve_distributed().await?;
            for (i, stats) in stats.iter().enumerate() {
                log::info!("{:<32}{:<32}", format!("worker {}", i), format!("{:?}", stats));
            }
            print(cli.json, &summary)?;
            anyhow::ensure!(summary.ok(), "{} tiers failed", summary.failed);
        }
        Command::Solve { .. } => {
            let summary = tokio::task::block_in_place(|| solver.solve())?;
            print(cli.json, &summary)?;
            anyhow::ensure!(summary.ok(), "{} tiers failed", summary.failed);
        }
        Command::Analyze => {
            let analysis = tokio::task::block_in_place(|| solver.analyze())?;
            print(cli.json, &analysis)?;
        }
        Command::Test { .. } => {
            let tiers = tokio::task::block_in_place(|| solver.test())?;
            println!("{} tiers passed", tiers);
        }
        Command::Compare { ref reference } => {
            let reference = DiskStore::new(reference.clone())
                .with_context(|| format!("open reference database at {}", reference.display()))?;
            let compared = tokio::task::block_in_place(|| solver.compare(&reference))?;
            println!("{} positions agree", compared);
        }
        Command::Query { tier, position } => {
            let at = TierPosition::new(tier, position);
            let outcome = solver.probe(at)?;
            match cli.json {
                true => println!("{}", serde_json::to_string(&outcome)?),
                false => println!("{} {} in {}", at, outcome.value, outcome.remoteness),
            }
        }
    }
    Ok(())
}

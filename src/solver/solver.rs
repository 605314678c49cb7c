use super::*;
use crate::database::Records;
use crate::database::Store;
use crate::error::CheckError;
use crate::error::Error;
use crate::error::StoreError;
use crate::game::Api;
use crate::game::Outcome;
use crate::game::TierGame;
use crate::game::TierPosition;
use crate::graph::TierGraph;
use crate::manager::Analysis;
use crate::manager::Analyzer;
use crate::manager::Scheduler;
use crate::manager::Summary;
use crate::worker::Worker;
use crate::worker::WorkerStats;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rayon::prelude::*;
use std::sync::Arc;

/// Entry point: wires a game and a store to the tier manager and workers.
pub struct TierSolver {
    api: Api,
    store: Arc<dyn Store>,
    options: Options,
}

impl TierSolver {
    pub fn new(game: Arc<dyn TierGame>, store: Arc<dyn Store>, options: Options) -> Self {
        Self {
            api: Api::from(game),
            store,
            options,
        }
    }
    pub fn api(&self) -> &Api {
        &self.api
    }
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Build the tier graph and warn if its largest tier group cannot fit.
    fn graph(&self) -> Result<TierGraph, Error> {
        let graph = TierGraph::solving(&self.api)?;
        let (tier, size) = graph.stats().group;
        let needed = Records::usage(size);
        if needed > self.options.memory {
            log::warn!(
                "{:<32}{:<32}",
                format!("tier group {} needs", self.api.tier_name(tier)),
                format!("{} bytes > {} budget", needed, self.options.memory)
            );
        }
        Ok(graph)
    }

    /// Solve every reachable tier on this thread, one tier at a time.
    pub fn solve(&self) -> Result<Summary, Error> {
        let worker = Worker::new(self.api.clone(), self.store.clone(), &self.options)?;
        let mut scheduler = Scheduler::new(self.api.clone(), self.graph()?)?;
        let summary = scheduler.run(&worker, self.options.force)?;
        log::info!("solver finished\n{}", summary);
        Ok(summary)
    }

    /// Solve with `options.workers` concurrent workers, splitting threads between them.
    pub async fn solve_distributed(&self) -> Result<(Summary, Vec<WorkerStats>), Error> {
        let workers = self.options.workers.max(1);
        let options = Options {
            threads: (self.options.threads / workers).max(1),
            ..self.options.clone()
        };
        let workers = (0..workers)
            .map(|_| Worker::new(self.api.clone(), self.store.clone(), &options))
            .map(|w| w.map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;
        let scheduler = Scheduler::new(self.api.clone(), self.graph()?)?;
        let (summary, stats) =
            crate::manager::distribute(scheduler, workers, self.options.force).await?;
        log::info!("solver finished\n{}", summary);
        Ok((summary, stats))
    }

    /// Tally the reachable canonical positions by stored value.
    pub fn analyze(&self) -> Result<Analysis, Error> {
        let analysis = Analyzer::new(self.api.clone(), self.store.clone()).analyze()?;
        log::info!("analysis finished\n{}", analysis);
        Ok(analysis)
    }

    /// Check the game implementation on every reachable tier.
    /// Returns the number of tiers checked.
    pub fn test(&self) -> Result<usize, Error> {
        let worker = Worker::new(self.api.clone(), self.store.clone(), &self.options)?;
        let graph = TierGraph::solving(&self.api)?;
        let ref mut rng = SmallRng::seed_from_u64(self.options.seed);
        let mut tiers = graph.tiers().collect::<Vec<_>>();
        tiers.sort_unstable();
        for &tier in tiers.iter() {
            let parents = graph.parents(tier).to_vec();
            let checked = worker.check(tier, parents, rng)?;
            log::debug!(
                "{:<32}{:<32}",
                format!("checked     tier {}", self.api.tier_name(tier)),
                checked
            );
        }
        log::info!("{:<32}{:<32}", "checked tiers", tiers.len());
        Ok(tiers.len())
    }

    /// Compare every reachable canonical position with a reference database.
    /// Returns the number of positions compared.
    pub fn compare(&self, reference: &dyn Store) -> Result<usize, Error> {
        let graph = TierGraph::solving(&self.api)?;
        let mut tiers = graph
            .tiers()
            .filter(|&t| self.api.is_canonical_tier(t))
            .collect::<Vec<_>>();
        tiers.sort_unstable();
        let mut compared = 0;
        for tier in tiers {
            let size = self.api.tier_size(tier);
            let ref ours = self.store.load(tier, size)?;
            let ref theirs = reference.load(tier, size)?;
            let count: usize = (0..size)
                .into_par_iter()
                .map(|position| TierPosition::new(tier, position))
                .filter(|&at| self.api.is_legal(at) && self.api.is_canonical_position(at))
                .map(|at| {
                    let found = ours.get(at.position);
                    let expected = theirs.get(at.position);
                    match (found.value, found.remoteness) == (expected.value, expected.remoteness) {
                        true => Ok(1),
                        false => Err(CheckError::Mismatch { at, expected, found }),
                    }
                })
                .try_reduce(|| 0, |a, b| Ok(a + b))?;
            log::debug!(
                "{:<32}{:<32}",
                format!("compared    tier {}", self.api.tier_name(tier)),
                count
            );
            compared += count;
        }
        log::info!("{:<32}{:<32}", "compared positions", compared);
        Ok(compared)
    }

    /// Stored outcome of any position, looked up through its canonical form.
    pub fn probe(&self, at: TierPosition) -> Result<Outcome, Error> {
        let size = self.api.tier_size(at.tier);
        if at.position >= size {
            return Err(StoreError::OutOfRange { at, size }.into());
        }
        Ok(self.store.probe(self.api.canonical(at))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::error::GraphError;
    use crate::game::TierType;
    use crate::game::Value;
    use crate::games::ExplicitGame;
    use crate::games::TicTacToe;
    use crate::Position;
    use crate::Tier;

    fn solver(game: TicTacToe, workers: usize) -> TierSolver {
        let options = Options {
            threads: 2,
            workers,
            ..Options::default()
        };
        TierSolver::new(Arc::new(game), Arc::new(MemoryStore::new()), options)
    }

    #[test]
    fn tictactoe_is_a_tie() {
        let solver = solver(TicTacToe::new(), 1);
        let summary = solver.solve().unwrap();
        assert!(summary.ok());
        assert!(summary.solved == 10);
        let root = solver.probe(TierPosition::new(0, 0)).unwrap();
        assert!((root.value, root.remoteness) == (Value::Tie, 9));
    }

    #[test]
    fn probe_follows_symmetry() {
        let solver = solver(TicTacToe::new(), 1);
        solver.solve().unwrap();
        // X in the top-left and in the top-right corner
        let left = solver.probe(TierPosition::new(1, 1)).unwrap();
        let right = solver.probe(TierPosition::new(1, 9)).unwrap();
        assert!((left.value, left.remoteness) == (right.value, right.remoteness));
        assert!(matches!(
            solver.probe(TierPosition::new(1, 19683)),
            Err(Error::Store(StoreError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn analysis_after_solve() {
        let solver = solver(TicTacToe::new(), 1);
        solver.solve().unwrap();
        let analysis = solver.analyze().unwrap();
        assert!(analysis.tiers == 10);
        assert!(analysis.unsolved == 0);
        assert!(analysis.count(Value::Undecided) == 0);
        assert!(analysis.count(Value::Draw) == 0);
        assert!(analysis.longest(Value::Tie) == 9);
    }

    #[test]
    fn consistency_checks_pass() {
        let solver = solver(TicTacToe::new().with_retrograde(), 1);
        assert!(solver.test().unwrap() == 10);
    }

    #[test]
    fn cyclic_tier_graphs_do_not_solve() {
        let game = ExplicitGame::builder()
            .tier(0, 1, TierType::Loopy)
            .tier(1, 1, TierType::Loopy)
            .edge((0, 0), (1, 0))
            .edge((1, 0), (0, 0))
            .initial((0, 0))
            .build();
        let solver = TierSolver::new(
            Arc::new(game),
            Arc::new(MemoryStore::new()),
            Options::default(),
        );
        assert!(matches!(
            solver.solve(),
            Err(Error::Graph(GraphError::Cycle { .. }))
        ));
    }

    #[tokio::test]
    async fn distributed_matches_local() {
        let local = solver(TicTacToe::new(), 1);
        local.solve().unwrap();
        let distributed = solver(TicTacToe::new().loopy(), 3);
        let (summary, stats) = distributed.solve_distributed().await.unwrap();
        assert!(summary.ok());
        assert!(stats.len() == 3);
        for at in [(0, 0), (1, 1), (1, 81), (2, 1 + 2 * 81)] {
            let at = TierPosition::from(at);
            let a = local.probe(at).unwrap();
            let b = distributed.probe(at).unwrap();
            assert!((a.value, a.remoteness) == (b.value, b.remoteness));
        }
    }

    fn outcomes(solver: &TierSolver, tier: Tier) -> Vec<(Value, crate::Remoteness)> {
        (0..solver.api().tier_size(tier))
            .map(|p| TierPosition::new(tier, p))
            .filter(|&at| solver.api().is_legal(at))
            .map(|at| solver.probe(at).unwrap())
            .map(|o| (o.value, o.remoteness))
            .collect()
    }

    #[test]
    fn every_method_agrees() {
        let immediate = solver(TicTacToe::new(), 1);
        let induction = solver(TicTacToe::new().loopy(), 1);
        let retrograde = solver(TicTacToe::new().loopy().with_retrograde(), 1);
        let forced = TierSolver::new(
            Arc::new(TicTacToe::new()),
            Arc::new(MemoryStore::new()),
            Options {
                threads: 2,
                method: crate::worker::Method::Induction,
                ..Options::default()
            },
        );
        for solver in [&immediate, &induction, &retrograde, &forced] {
            assert!(solver.solve().unwrap().ok());
        }
        for tier in 0..=9 {
            let expected = outcomes(&immediate, tier);
            assert!(outcomes(&induction, tier) == expected);
            assert!(outcomes(&retrograde, tier) == expected);
            assert!(outcomes(&forced, tier) == expected);
        }
    }

    #[test]
    fn resolving_without_force_loads() {
        let solver = solver(TicTacToe::new(), 1);
        let first = solver.solve().unwrap();
        let before = (0..=9).map(|t| outcomes(&solver, t)).collect::<Vec<_>>();
        let again = solver.solve().unwrap();
        let after = (0..=9).map(|t| outcomes(&solver, t)).collect::<Vec<_>>();
        assert!(first.solved == 10);
        assert!(again.solved == 0);
        assert!(again.loaded == 10);
        assert!(before == after);
        assert!(before[0][0] == (Value::Tie, 9));
    }

    #[test]
    fn compare_finds_the_first_disagreement() {
        let reference = Arc::new(MemoryStore::new());
        let immediate = TierSolver::new(
            Arc::new(TicTacToe::new()),
            reference.clone(),
            Options {
                threads: 2,
                ..Options::default()
            },
        );
        let iterated = TierSolver::new(
            Arc::new(TicTacToe::new()),
            Arc::new(MemoryStore::new()),
            Options {
                threads: 2,
                method: crate::worker::Method::ValueIteration,
                ..Options::default()
            },
        );
        assert!(immediate.solve().unwrap().ok());
        assert!(iterated.solve().unwrap().ok());
        let compared = iterated.compare(reference.as_ref()).unwrap();
        let ref api = iterated.api();
        let canonical = (0..=9)
            .flat_map(|t| (0..api.tier_size(t)).map(move |p| TierPosition::new(t, p)))
            .filter(|&at| api.is_legal(at) && api.is_canonical_position(at))
            .count();
        assert!(compared == canonical);

        let records = reference.load(0, 19683).unwrap();
        records.set(0, Outcome::new(Value::Win, 3));
        reference.save(0, &records).unwrap();
        match iterated.compare(reference.as_ref()) {
            Err(Error::Check(CheckError::Mismatch { at, expected, found })) => {
                assert!(at == TierPosition::new(0, 0));
                assert!((expected.value, expected.remoteness) == (Value::Win, 3));
                assert!((found.value, found.remoteness) == (Value::Tie, 9));
            }
            _ => panic!("expected a mismatch"),
        }
    }

    /// Remoteness-layered solve of a win/lose/draw move graph.
    fn layered(edges: &[Vec<Position>]) -> Vec<(Value, crate::Remoteness)> {
        let mut known = edges
            .iter()
            .map(|children| match children.is_empty() {
                true => (Value::Lose, 0),
                false => (Value::Undecided, 0),
            })
            .collect::<Vec<_>>();
        for remoteness in 1.. {
            let previous = known.clone();
            for (p, children) in edges.iter().enumerate() {
                if previous[p].0 != Value::Undecided {
                    continue;
                }
                let values = children.iter().map(|&c| previous[c as usize]);
                if values.clone().any(|v| v == (Value::Lose, remoteness - 1)) {
                    known[p] = (Value::Win, remoteness);
                } else if values.clone().all(|(v, _)| v == Value::Win) {
                    known[p] = (Value::Lose, remoteness);
                }
            }
            if known == previous {
                break;
            }
        }
        known
            .into_iter()
            .map(|(v, r)| match v {
                Value::Undecided => (Value::Draw, 0),
                _ => (v, r),
            })
            .collect()
    }

    #[test]
    fn loopy_tiers_match_layered_search() {
        use rand::Rng;
        const SIZE: u64 = 60;
        let ref mut rng = SmallRng::seed_from_u64(crate::TEST_SEED_DEFAULT);
        for _ in 0..20 {
            let edges = (0..SIZE)
                .map(|p| {
                    let mut children = (0..rng.random_range(0..4))
                        .map(|_| rng.random_range(0..SIZE))
                        .filter(|&c| c != p)
                        .collect::<Vec<_>>();
                    children.sort_unstable();
                    children.dedup();
                    children
                })
                .collect::<Vec<_>>();
            let mut builder = ExplicitGame::builder()
                .tier(0, SIZE, TierType::Loopy)
                .initial((0, 0));
            for (p, children) in edges.iter().enumerate() {
                let p = p as Position;
                if children.is_empty() {
                    builder = builder.primitive((0, p), Value::Lose);
                }
                for &c in children {
                    builder = builder.edge((0, p), (0, c));
                }
            }
            let solver = TierSolver::new(
                Arc::new(builder.build()),
                Arc::new(MemoryStore::new()),
                Options {
                    threads: 2,
                    ..Options::default()
                },
            );
            assert!(solver.solve().unwrap().ok());
            let expected = layered(&edges);
            let found = (0..SIZE)
                .map(|p| solver.probe(TierPosition::new(0, p)).unwrap())
                .map(|o| match o.value {
                    Value::Draw => (Value::Draw, 0),
                    _ => (o.value, o.remoteness),
                })
                .collect::<Vec<_>>();
            assert!(found == expected);
        }
    }

    #[test]
    fn mirrored_tiers_are_solved_once() {
        // tier 2 moves into tier 1 and into its mirror 11
        let game = ExplicitGame::builder()
            .tier(0, 1, TierType::ImmediateTransition)
            .tier(1, 2, TierType::ImmediateTransition)
            .tier(2, 1, TierType::ImmediateTransition)
            .primitive((0, 0), Value::Lose)
            .edge((1, 0), (0, 0))
            .edge((1, 1), (0, 0))
            .edge((2, 0), (1, 0))
            .edge((2, 0), (11, 1))
            .mirror(11, 1)
            .children(2, vec![1, 11])
            .initial((2, 0))
            .build();
        let solver = TierSolver::new(
            Arc::new(game),
            Arc::new(MemoryStore::new()),
            Options::default(),
        );
        let summary = solver.solve().unwrap();
        assert!(summary.ok());
        assert!(summary.solved == 3);
        assert!(summary.skipped == 1);
        let root = solver.probe(TierPosition::new(2, 0)).unwrap();
        assert!((root.value, root.remoteness) == (Value::Lose, 2));
        let mirrored = solver.probe(TierPosition::new(11, 1)).unwrap();
        assert!((mirrored.value, mirrored.remoteness) == (Value::Win, 1));
    }

    /// Tier 2 reaches tier 1 only through its mirror 11, which renumbers
    /// positions: position p of 11 is position [2, 0, 1][p] of 1.
    fn permuted(tier_type: TierType, retrograde: bool) -> ExplicitGame {
        let builder = ExplicitGame::builder()
            .tier(0, 1, tier_type)
            .tier(1, 3, tier_type)
            .tier(2, 3, tier_type)
            .primitive((0, 0), Value::Lose)
            .edge((1, 0), (0, 0))
            .primitive((1, 1), Value::Lose)
            .primitive((1, 2), Value::Tie)
            .mirror_with(11, 1, vec![2, 0, 1])
            .edge((2, 0), (11, 0))
            .edge((2, 1), (11, 1))
            .edge((2, 2), (11, 2))
            .initial((2, 0));
        match retrograde {
            true => builder.retrograde().build(),
            false => builder.build(),
        }
    }

    #[test]
    fn permuted_mirrors_solve_under_every_method() {
        use crate::worker::Method;
        let cases = [
            (TierType::ImmediateTransition, false, Method::Auto),
            (TierType::Loopy, false, Method::Auto),
            (TierType::Loopy, true, Method::Auto),
            (TierType::Loopy, false, Method::ValueIteration),
        ];
        for (tier_type, retrograde, method) in cases {
            let solver = TierSolver::new(
                Arc::new(permuted(tier_type, retrograde)),
                Arc::new(MemoryStore::new()),
                Options {
                    threads: 2,
                    method,
                    ..Options::default()
                },
            );
            assert!(solver.solve().unwrap().ok());
            assert!(solver.test().is_ok());
            let at = |tier: Tier, position: Position| {
                let outcome = solver.probe(TierPosition::new(tier, position)).unwrap();
                (outcome.value, outcome.remoteness)
            };
            assert!(at(2, 0) == (Value::Tie, 1));
            assert!(at(2, 1) == (Value::Lose, 2));
            assert!(at(2, 2) == (Value::Win, 1));
            for (p, q) in [(0, 2), (1, 0), (2, 1)] {
                assert!(at(11, p) == at(1, q));
            }
        }
    }

    #[test]
    fn disk_databases_survive_restarts() {
        let root = std::env::temp_dir().join(format!("tiersolver-{}", std::process::id()));
        let options = Options {
            threads: 2,
            ..Options::default()
        };
        let open = || {
            let store = crate::database::DiskStore::new(root.clone()).unwrap();
            TierSolver::new(Arc::new(TicTacToe::new()), Arc::new(store), options.clone())
        };
        let first = open().solve().unwrap();
        assert!(first.solved == 10);
        let reopened = open();
        let again = reopened.solve().unwrap();
        assert!(again.loaded == 10);
        let root_outcome = reopened.probe(TierPosition::new(0, 0)).unwrap();
        assert!((root_outcome.value, root_outcome.remoteness) == (Value::Tie, 9));
        std::fs::remove_dir_all(&root).unwrap();
    }
}

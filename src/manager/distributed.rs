use super::*;
use crate::WORKER_SLEEP;
use crate::error::GraphError;
use crate::worker::Solved;
use crate::worker::Worker;
use crate::worker::WorkerStats;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Answers worker requests from a shared [`Scheduler`] until every
/// worker has said farewell.
pub struct Manager {
    scheduler: Scheduler,
    force: bool,
    inbox: mpsc::Receiver<Envelope>,
    outboxes: Vec<mpsc::Sender<Command>>,
    farewells: Vec<WorkerStats>,
}

impl Manager {
    pub fn new(
        scheduler: Scheduler,
        force: bool,
        inbox: mpsc::Receiver<Envelope>,
        outboxes: Vec<mpsc::Sender<Command>>,
    ) -> Self {
        Self {
            scheduler,
            force,
            inbox,
            outboxes,
            farewells: Vec::new(),
        }
    }

    /// Serve until all workers are gone. A tier-graph error aborts the run;
    /// dropping the outboxes then tells every worker to stop.
    pub async fn serve(mut self) -> Result<(Summary, Vec<WorkerStats>), GraphError> {
        let mut active = self.outboxes.len();
        while active > 0 {
            let Some(Envelope { worker, request }) = self.inbox.recv().await else {
                break;
            };
            match request {
                Request::Check => {}
                Request::ReportSolved(tier) => self.scheduler.complete(tier, Solved::Solved)?,
                Request::ReportLoaded(tier) => self.scheduler.complete(tier, Solved::Loaded)?,
                Request::ReportError(tier, reason) => self.scheduler.fail(tier, reason),
                Request::Farewell(stats) => {
                    log::debug!("{:<32}{:<32}", format!("worker {} farewell", worker), format!("{:?}", stats));
                    self.farewells.push(stats);
                    active -= 1;
                    continue;
                }
            }
            let command = self.command();
            if let Err(mpsc::error::SendError(command)) = self.outboxes[worker].send(command).await {
                log::warn!("worker {} hung up", worker);
                if let Command::Solve { tier, .. } = command {
                    self.scheduler.fail(tier, format!("worker {} hung up", worker));
                }
                active -= 1;
            }
        }
        Ok((self.scheduler.summary(), self.farewells))
    }

    fn command(&mut self) -> Command {
        match self.scheduler.next() {
            Some(tier) => Command::Solve {
                tier,
                force: self.force,
            },
            None if self.scheduler.is_running() => Command::Sleep,
            None => Command::Terminate,
        }
    }
}

/// Worker side of the protocol: ask for work, solve it off the async
/// runtime, report, repeat until told to stop.
pub async fn serve(
    id: usize,
    worker: Arc<Worker>,
    outbox: mpsc::Sender<Envelope>,
    mut inbox: mpsc::Receiver<Command>,
) {
    let mut request = Request::Check;
    loop {
        let envelope = Envelope {
            worker: id,
            request,
        };
        if outbox.send(envelope).await.is_err() {
            return;
        }
        request = match inbox.recv().await {
            Some(Command::Solve { tier, force }) => {
                let solver = worker.clone();
                match tokio::task::spawn_blocking(move || solver.solve(tier, force)).await {
                    Ok(Ok(Solved::Solved)) => Request::ReportSolved(tier),
                    Ok(Ok(Solved::Loaded)) => Request::ReportLoaded(tier),
                    Ok(Err(e)) => Request::ReportError(tier, e.to_string()),
                    Err(e) => Request::ReportError(tier, e.to_string()),
                }
            }
            Some(Command::Sleep) => {
                tokio::time::sleep(WORKER_SLEEP).await;
                Request::Check
            }
            Some(Command::Terminate) | None => break,
        };
    }
    let farewell = Envelope {
        worker: id,
        request: Request::Farewell(worker.stats()),
    };
    let _ = outbox.send(farewell).await;
}

/// Run a manager and `workers` in-process workers over channels.
pub async fn distribute(
    scheduler: Scheduler,
    workers: Vec<Arc<Worker>>,
    force: bool,
) -> Result<(Summary, Vec<WorkerStats>), GraphError> {
    let (outbox, inbox) = mpsc::channel(workers.len().max(1) * 2);
    let mut outboxes = Vec::with_capacity(workers.len());
    let mut handles = Vec::with_capacity(workers.len());
    for (id, worker) in workers.into_iter().enumerate() {
        let (tx, rx) = mpsc::channel(1);
        outboxes.push(tx);
        handles.push(tokio::spawn(serve(id, worker, outbox.clone(), rx)));
    }
    drop(outbox);
    let result = Manager::new(scheduler, force, inbox, outboxes)
        .serve()
        .await;
    futures::future::join_all(handles).await;
    result
}

// Live refresh loop - Polls a machine's shift report on a fixed cadence
use crate::application::clock::Clock;
use crate::application::shift_report_service::ShiftReportService;
use crate::domain::report::MachineReport;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

pub type Snapshot = Option<Arc<MachineReport>>;

/// Last-write-wins gate over sequence-numbered refresh results.
#[derive(Debug, Default)]
struct LatestWins {
    published: u64,
}

impl LatestWins {
    fn accept(&mut self, seq: u64) -> bool {
        if seq > self.published {
            self.published = seq;
            true
        } else {
            false
        }
    }
}

/// Handle to a running refresh loop. Dropping it stops the loop.
pub struct LiveRefresh {
    snapshot: watch::Receiver<Snapshot>,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl LiveRefresh {
    pub fn spawn(
        service: ShiftReportService,
        machine_code: String,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        let (snapshot_tx, snapshot_rx) = watch::channel(None);
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let (result_tx, mut result_rx) = mpsc::channel::<(u64, MachineReport)>(16);
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let mut in_flight = JoinSet::new();
            let mut gate = LatestWins::default();
            let mut next_seq: u64 = 0;

            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        next_seq += 1;
                        let seq = next_seq;
                        let service = service.clone();
                        let machine_code = machine_code.clone();
                        let result_tx = result_tx.clone();
                        let now = clock.now();

                        in_flight.spawn(async move {
                            match service.build_report(&machine_code, now).await {
                                Ok(report) => {
                                    let _ = result_tx.send((seq, report)).await;
                                }
                                Err(e) => {
                                    tracing::error!("Refresh {} for machine {} failed: {:#}", seq, machine_code, e);
                                }
                            }
                        });
                    }
                    Some((seq, report)) = result_rx.recv() => {
                        if gate.accept(seq) {
                            snapshot_tx.send_replace(Some(Arc::new(report)));
                        } else {
                            tracing::debug!("Discarding stale refresh {} for machine {}", seq, machine_code);
                        }
                    }
                    Some(_) = in_flight.join_next() => {}
                }
            }

            in_flight.abort_all();
            tracing::debug!("Live refresh for machine {} stopped", machine_code);
        });

        Self {
            snapshot: snapshot_rx,
            stop: stop_tx,
            task,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.clone()
    }

    pub fn latest(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for LiveRefresh {
    fn drop(&mut self) {
        self.task.abort();
    }
}

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use shellsv_core::error::Result;
use shellsv_core::{ChildRun, Probe, ProbeSource, RunTag, ShellSvError, SignalKind};
use shellsv_log::LogStore;
use tokio::sync::{Mutex, watch};

use crate::slot::{ExitOutcome, RunningSlot, Slot};

/// Fixed settle delay `/start` sleeps before sampling state (spec §4.4,
/// §9 "Settle delay in /start" — a product decision, not a user parameter).
pub const SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Bound on how long `kill` waits for an exit before escalating or giving up
/// (spec §4.4, §5 suspension points: "kill ≤ 5s").
const KILL_WAIT: Duration = Duration::from_secs(5);

/// Bound on how long termination waits for the output pump to drain once the
/// child has been reaped (spec §2 lifecycle glue, §8 scenario 6: the log
/// file must hold a complete suffix of the child's output by the time
/// termination is observed). Kept short: the pump's remaining work at this
/// point is just the bytes already sitting in the closed pipe.
const PUMP_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Owns at most one child and enforces the single-child invariant through
/// start/status/kill/restart (spec §4.4). `SupervisorState` is a process-wide
/// singleton in spec terms, but this type is an explicit, injectable
/// dependency rather than global state (spec §9 design notes) so it can be
/// constructed fresh in tests.
pub struct Supervisor {
    slot: Arc<Mutex<Slot>>,
    log_store: Arc<LogStore>,
    probe_source: Arc<dyn ProbeSource>,
    generation: AtomicU64,
    cwd: PathBuf,
}

/// `status()`'s result: the current run snapshot plus a best-effort resource
/// probe (spec §4.4 "enrich... attach a Probe").
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub run: ChildRun,
    pub probe: Probe,
}

impl Supervisor {
    pub fn new(log_store: Arc<LogStore>, probe_source: Arc<dyn ProbeSource>, cwd: PathBuf) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::Empty)),
            log_store,
            probe_source,
            generation: AtomicU64::new(0),
            cwd,
        }
    }

    /// The `LogStore` backing this supervisor's log files, shared so the
    /// HTTP surface's `/logs` reads go through the same instance (spec §5:
    /// reads never block on the slot lock).
    pub fn log_store(&self) -> Arc<LogStore> {
        self.log_store.clone()
    }

    /// `start(command)` (spec §4.4). Fails `Conflict` if a child is already
    /// running; otherwise spawns, attaches the pump and waiter, then blocks
    /// for the settle delay before returning the sampled state.
    pub async fn start(&self, command: impl Into<String>) -> Result<ChildRun> {
        let command = command.into();
        let trimmed = command.trim();
        if trimmed.is_empty() {
            return Err(ShellSvError::bad_request("command must not be empty"));
        }
        let trimmed = trimmed.to_string();

        let mut guard = self.slot.lock().await;
        if matches!(&*guard, Slot::Running(_)) {
            return Err(ShellSvError::conflict("a child is already running"));
        }

        self.spawn_and_settle(&mut guard, trimmed).await
    }

    /// `status()` (spec §4.4). The non-blocking reap check is the
    /// `exit_rx.borrow()` read below: it can never block because the waiter
    /// publishes to the channel before it ever tries to acquire the slot
    /// lock this call is holding.
    pub async fn status(&self) -> Result<StatusSnapshot> {
        let mut guard = self.slot.lock().await;
        let run = match &mut *guard {
            Slot::Empty => {
                return Err(ShellSvError::not_found("no child has ever been started"));
            }
            Slot::Running(running) => {
                if let Some(outcome) = *running.exit_rx.borrow() {
                    running
                        .run
                        .mark_terminated(RunTag::Exited, outcome.exit_code, outcome.at);
                    let finished = running.run.clone();
                    *guard = Slot::Terminated(finished.clone());
                    finished
                } else {
                    running.run.clone()
                }
            }
            Slot::Terminated(run) => run.clone(),
        };
        let probe = self.probe_source.probe(run.pid);
        Ok(StatusSnapshot { run, probe })
    }

    /// `kill(signalKind)` (spec §4.4). Sends the signal to the child's
    /// process group, waits up to 5s, escalating `GracefulTerminate` to
    /// `ForceKill` on timeout, then drains the child's output pump (bounded)
    /// before reporting the terminal snapshot. A child that was already dead
    /// when the signal would have been sent is reported as success with its
    /// observed exit code, per the kill/self-exit race in spec §4.4.
    pub async fn kill(&self, signal: SignalKind) -> Result<ChildRun> {
        let mut guard = self.slot.lock().await;
        if matches!(&*guard, Slot::Empty) {
            return Err(ShellSvError::not_found("no child has ever been started"));
        }
        if matches!(&*guard, Slot::Terminated(_)) {
            return Err(ShellSvError::bad_request("child has already terminated"));
        }
        let running = match std::mem::replace(&mut *guard, Slot::Empty) {
            Slot::Running(running) => running,
            _ => unreachable!("checked Running above"),
        };

        match self.terminate_running(running, signal, KILL_WAIT).await {
            Ok(finished) => {
                *guard = Slot::Terminated(finished.clone());
                Ok(finished)
            }
            Err((running, error)) => {
                *guard = Slot::Running(running);
                Err(error)
            }
        }
    }

    /// `restart(timeout)` (spec §4.4): terminate the current child (if any)
    /// within `timeout` seconds, escalating to `ForceKill` and draining its
    /// output pump, then start the remembered command fresh. Both phases run
    /// under one lock acquisition so there is no window in which a caller
    /// observes the old run as current after restart returns (spec §5).
    pub async fn restart(&self, timeout_secs: u64) -> Result<ChildRun> {
        let mut guard = self.slot.lock().await;
        let command = match &*guard {
            Slot::Empty => {
                return Err(ShellSvError::not_found(
                    "no command remembered; nothing to restart",
                ));
            }
            Slot::Running(running) => running.run.command.clone(),
            Slot::Terminated(run) => run.command.clone(),
        };

        if matches!(&*guard, Slot::Running(_)) {
            let running = match std::mem::replace(&mut *guard, Slot::Empty) {
                Slot::Running(running) => running,
                _ => unreachable!("checked Running above"),
            };
            match self
                .terminate_running(
                    running,
                    SignalKind::GracefulTerminate,
                    Duration::from_secs(timeout_secs),
                )
                .await
            {
                Ok(finished) => *guard = Slot::Terminated(finished),
                Err((running, error)) => {
                    *guard = Slot::Running(running);
                    return Err(error);
                }
            }
        }

        self.spawn_and_settle(&mut guard, command).await
    }

    /// Signal `running`'s child, wait up to `wait` for it to exit (escalating
    /// a `GracefulTerminate` to `ForceKill` on timeout), then drain its
    /// output pump before returning the terminal snapshot.
    ///
    /// On a signal-send failure, `running` is handed back unconsumed (along
    /// with the error) so the caller can restore the slot instead of losing
    /// the run record.
    async fn terminate_running(
        &self,
        mut running: RunningSlot,
        signal: SignalKind,
        wait: Duration,
    ) -> std::result::Result<ChildRun, (RunningSlot, ShellSvError)> {
        let pid = running.run.pid;

        if let Err(error) = shellsv_process::send_signal_to_group(pid, signal) {
            return Err((running, ShellSvError::from(error)));
        }
        let mut used_signal = signal;
        let mut outcome = wait_for_exit(&mut running.exit_rx, wait).await;
        if outcome.is_none() && signal == SignalKind::GracefulTerminate {
            used_signal = SignalKind::ForceKill;
            if let Err(error) = shellsv_process::send_signal_to_group(pid, SignalKind::ForceKill) {
                return Err((running, ShellSvError::from(error)));
            }
            outcome = wait_for_exit(&mut running.exit_rx, KILL_WAIT).await;
        }
        let outcome = outcome.unwrap_or_else(|| ExitOutcome {
            exit_code: -(used_signal.as_raw()),
            at: Utc::now(),
        });

        if tokio::time::timeout(PUMP_DRAIN_TIMEOUT, running.pump_handle)
            .await
            .is_err()
        {
            tracing::warn!(pid, "output pump did not drain within the bound after termination");
        }

        let mut finished = running.run;
        finished.kill_type = Some(used_signal);
        finished.mark_terminated(RunTag::Killed, outcome.exit_code, outcome.at);
        Ok(finished)
    }

    /// Lifecycle glue for process shutdown (spec §4.4 "on shutdown ...").
    /// Terminates the current child gracefully-then-forcefully if one is
    /// running; a no-op otherwise. Errors are logged, not propagated — the
    /// process is going down regardless.
    pub async fn shutdown(&self) {
        let is_running = matches!(&*self.slot.lock().await, Slot::Running(_));
        if !is_running {
            return;
        }
        if let Err(error) = self.kill(SignalKind::GracefulTerminate).await {
            tracing::warn!(%error, "error stopping child during supervisor shutdown");
        }
    }

    /// Spawn a fresh child for `command` into `slot` (which must not
    /// currently be `Running`), attach its pump and waiter, then sleep the
    /// settle delay and sample the result once (spec §4.4 step 5).
    async fn spawn_and_settle(&self, slot: &mut Slot, command: String) -> Result<ChildRun> {
        let created_at = Utc::now();
        let log_path = self.log_store.create(created_at).await?;

        let mut spawned = shellsv_process::spawn_shell_command(&command, &self.cwd)
            .map_err(ShellSvError::from)?;
        let pid = spawned.pid;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let run = ChildRun {
            command,
            pid,
            created_at,
            stopped_at: None,
            exit_code: None,
            kill_type: None,
            log_path: log_path.clone(),
            tag: RunTag::Running,
            generation,
        };

        let stdout = spawned
            .child
            .stdout
            .take()
            .ok_or_else(|| anyhow::anyhow!("spawned child missing stdout pipe"))?;
        let stderr = spawned
            .child
            .stderr
            .take()
            .ok_or_else(|| anyhow::anyhow!("spawned child missing stderr pipe"))?;
        let pump_handle =
            shellsv_process::OutputPump::spawn(stdout, stderr, self.log_store.clone(), log_path);

        let (exit_tx, exit_rx) = watch::channel(None);
        let slot_handle = self.slot.clone();
        let mut child = spawned.child;
        tokio::spawn(async move {
            let status = child.wait().await;
            let at = Utc::now();
            let exit_code = shellsv_process::encode_exit_status(status);
            let _ = exit_tx.send(Some(ExitOutcome { exit_code, at }));

            let mut guard = slot_handle.lock().await;
            if let Slot::Running(running) = &mut *guard {
                if running.run.generation == generation {
                    running.run.mark_terminated(RunTag::Exited, exit_code, at);
                    *guard = Slot::Terminated(running.run.clone());
                }
            }
        });

        *slot = Slot::Running(RunningSlot {
            run: run.clone(),
            exit_rx,
            pump_handle,
        });

        tokio::time::sleep(SETTLE_DELAY).await;

        let running = match std::mem::replace(slot, Slot::Empty) {
            Slot::Running(running) => running,
            _ => unreachable!("slot was just set to Running immediately above"),
        };

        if let Some(outcome) = *running.exit_rx.borrow() {
            // Fast exit within the settle window: drain the pump (bounded)
            // before reporting terminal, same as kill/restart, so the log
            // file already holds the child's complete output by the time a
            // synchronous caller sees "exited".
            if tokio::time::timeout(PUMP_DRAIN_TIMEOUT, running.pump_handle)
                .await
                .is_err()
            {
                tracing::warn!(pid, "output pump did not drain within the bound after a fast exit");
            }
            let mut finished = running.run;
            finished.mark_terminated(RunTag::Exited, outcome.exit_code, outcome.at);
            let snapshot = finished.clone();
            *slot = Slot::Terminated(finished);
            Ok(snapshot)
        } else {
            let snapshot = running.run.clone();
            *slot = Slot::Running(running);
            Ok(snapshot)
        }
    }
}

/// Wait up to `timeout` for the waiter to publish an exit outcome. Checks
/// the already-observed value first so a child that exited before this call
/// started waiting is reported immediately rather than timing out.
async fn wait_for_exit(
    exit_rx: &mut watch::Receiver<Option<ExitOutcome>>,
    timeout: Duration,
) -> Option<ExitOutcome> {
    if let Some(outcome) = *exit_rx.borrow() {
        return Some(outcome);
    }
    match tokio::time::timeout(timeout, exit_rx.changed()).await {
        Ok(Ok(())) => *exit_rx.borrow(),
        _ => None,
    }
}

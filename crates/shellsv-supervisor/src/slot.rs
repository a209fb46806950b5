use chrono::{DateTime, Utc};
use shellsv_core::ChildRun;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// The outcome a waiter task observed when the child it owns exited.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ExitOutcome {
    pub(crate) exit_code: i32,
    pub(crate) at: DateTime<Utc>,
}

/// A `Running` slot's bookkeeping: the current snapshot, a channel the
/// background waiter publishes to the moment it observes the child exit,
/// and the output pump's task handle.
///
/// `exit_rx.borrow()` is the "non-blocking reap check" spec §4.4 calls for —
/// checking it never blocks and never contends with the waiter's own
/// attempt to acquire the slot lock afterwards. `pump_handle` is awaited
/// (bounded) once the child has been reaped, so termination drains the pump
/// before reporting the run terminal — spec §2 lifecycle glue and §8
/// scenario 6 both require the log file hold a complete suffix of the
/// child's output by the time termination is observed.
pub(crate) struct RunningSlot {
    pub(crate) run: ChildRun,
    pub(crate) exit_rx: watch::Receiver<Option<ExitOutcome>>,
    pub(crate) pump_handle: JoinHandle<()>,
}

/// The supervisor's single "current child" position (spec §3 SupervisorState,
/// §4.4 state machine).
pub(crate) enum Slot {
    Empty,
    Running(RunningSlot),
    Terminated(ChildRun),
}

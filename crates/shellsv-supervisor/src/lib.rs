//! The supervisor state machine: enforces "at most one live child" and
//! drives start/status/kill/restart (spec §4.4).

mod slot;
mod supervisor;

pub use supervisor::{SETTLE_DELAY, StatusSnapshot, Supervisor};

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use shellsv_core::{Probe, ProbeSource, RunTag, SignalKind};
    use shellsv_log::{LogFilter, LogStore};
    use tempfile::tempdir;

    use super::*;

    struct NoopProbe;
    impl ProbeSource for NoopProbe {
        fn probe(&self, _pid: u32) -> Probe {
            Probe::default()
        }
    }

    fn new_supervisor(dir: &std::path::Path) -> Supervisor {
        Supervisor::new(
            Arc::new(LogStore::new(dir)),
            Arc::new(NoopProbe),
            dir.to_path_buf(),
        )
    }

    #[tokio::test]
    async fn start_fast_exit_settles_to_exited() {
        let dir = tempdir().unwrap();
        let sup = new_supervisor(dir.path());

        let run = sup.start("echo hello").await.unwrap();
        assert_eq!(run.tag, RunTag::Exited);
        assert_eq!(run.exit_code, Some(0));

        let log_store = sup.log_store();
        let read = log_store.read(&run.log_path, LogFilter::All).await.unwrap();
        assert!(read.text_body.contains("hello"));
    }

    #[tokio::test]
    async fn double_start_is_conflict() {
        let dir = tempdir().unwrap();
        let sup = new_supervisor(dir.path());

        sup.start("sleep 30").await.unwrap();
        let err = sup.start("echo x").await.unwrap_err();
        assert_eq!(err.kind(), "CONFLICT");

        sup.kill(SignalKind::ForceKill).await.unwrap();
    }

    #[tokio::test]
    async fn whitespace_only_command_is_bad_request() {
        let dir = tempdir().unwrap();
        let sup = new_supervisor(dir.path());

        let err = sup.start("   ").await.unwrap_err();
        assert_eq!(err.kind(), "BAD_REQUEST");
    }

    #[tokio::test]
    async fn status_before_any_start_is_not_found() {
        let dir = tempdir().unwrap();
        let sup = new_supervisor(dir.path());

        let err = sup.status().await.unwrap_err();
        assert_eq!(err.kind(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn kill_on_long_running_child_reports_killed() {
        let dir = tempdir().unwrap();
        let sup = new_supervisor(dir.path());

        let started = sup.start("sleep 30").await.unwrap();
        assert_eq!(started.tag, RunTag::Running);

        let killed = sup.kill(SignalKind::GracefulTerminate).await.unwrap();
        assert_eq!(killed.tag, RunTag::Killed);
        assert_eq!(killed.kill_type, Some(SignalKind::GracefulTerminate));

        let status = sup.status().await.unwrap();
        assert_eq!(status.run.tag, RunTag::Killed);
    }

    #[tokio::test]
    async fn kill_already_terminated_is_bad_request() {
        let dir = tempdir().unwrap();
        let sup = new_supervisor(dir.path());

        sup.start("echo done").await.unwrap();
        let err = sup.kill(SignalKind::GracefulTerminate).await.unwrap_err();
        assert_eq!(err.kind(), "BAD_REQUEST");
    }

    #[tokio::test]
    async fn kill_without_any_start_is_not_found() {
        let dir = tempdir().unwrap();
        let sup = new_supervisor(dir.path());

        let err = sup.kill(SignalKind::GracefulTerminate).await.unwrap_err();
        assert_eq!(err.kind(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn restart_keeps_command_and_gets_new_pid_and_log() {
        let dir = tempdir().unwrap();
        let sup = new_supervisor(dir.path());

        let first = sup
            .start("while true; do echo tick; sleep 1; done")
            .await
            .unwrap();
        assert_eq!(first.tag, RunTag::Running);

        let restarted = sup.restart(1).await.unwrap();
        assert_eq!(restarted.command, first.command);
        assert_ne!(restarted.pid, first.pid);
        assert_ne!(restarted.log_path, first.log_path);
        assert_eq!(restarted.tag, RunTag::Running);

        sup.kill(SignalKind::ForceKill).await.unwrap();
    }

    #[tokio::test]
    async fn restart_with_zero_timeout_escalates_to_force_kill() {
        let dir = tempdir().unwrap();
        let sup = new_supervisor(dir.path());

        sup.start("sleep 30").await.unwrap();
        let restarted = sup.restart(0).await.unwrap();
        assert_eq!(restarted.tag, RunTag::Running);

        sup.kill(SignalKind::ForceKill).await.unwrap();
    }

    #[tokio::test]
    async fn restart_without_any_start_is_not_found() {
        let dir = tempdir().unwrap();
        let sup = new_supervisor(dir.path());

        let err = sup.restart(5).await.unwrap_err();
        assert_eq!(err.kind(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn shutdown_terminates_a_running_child() {
        let dir = tempdir().unwrap();
        let sup = new_supervisor(dir.path());

        sup.start("sleep 30").await.unwrap();
        sup.shutdown().await;

        let status = sup.status().await.unwrap();
        assert_eq!(status.run.tag, RunTag::Killed);
    }

    #[tokio::test]
    async fn shutdown_with_no_child_is_a_no_op() {
        let dir = tempdir().unwrap();
        let sup = new_supervisor(dir.path());
        sup.shutdown().await;
    }

    #[tokio::test]
    async fn self_exit_is_observed_without_any_status_poll() {
        let dir = tempdir().unwrap();
        let sup = new_supervisor(dir.path());

        sup.start("sleep 0.2").await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;

        let status = sup.status().await.unwrap();
        assert_eq!(status.run.tag, RunTag::Exited);
    }
}

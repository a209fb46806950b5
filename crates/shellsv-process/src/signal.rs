//! Sends signals to the supervised child's whole process group (spec §4.4,
//! §6: the child is spawned as its own group leader precisely so this works).

use anyhow::{Context, Result};
use shellsv_core::SignalKind;

/// Send `signal` to the process group led by `pid` (i.e. `kill(-pid, sig)`).
///
/// A child that has already exited and been reaped yields `ESRCH`, which is
/// treated as success: spec §4.4 requires a kill racing a self-exit to
/// report success with the observed exit code, not an error.
pub fn send_signal_to_group(pid: u32, signal: SignalKind) -> Result<()> {
    // SAFETY: kill() is async-signal-safe and has no preconditions beyond a
    // valid signal number; a negative pid targets the whole process group.
    let ret = unsafe { libc::kill(-(pid as i32), signal.as_raw()) };
    if ret == 0 {
        return Ok(());
    }
    let err = std::io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        return Ok(());
    }
    Err(err).with_context(|| format!("failed to send {} to pid {pid}", signal.as_str()))
}

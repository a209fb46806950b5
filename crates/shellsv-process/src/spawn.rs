//! Spawns the supervised child through the system shell, as its own process
//! group leader (spec §4.4, §6 "Shell execution").

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;

/// A freshly spawned child, still holding its piped stdout/stderr handles.
pub struct SpawnedChild {
    pub child: tokio::process::Child,
    pub pid: u32,
}

/// Spawn `command` through `/bin/sh -c` so shell features (`cd`, `&&`, pipes,
/// `VAR=val prog`) work, in `cwd`, as its own process group leader so a
/// signal to `-pid` reaches the shell and every descendant it forked.
pub fn spawn_shell_command(command: &str, cwd: &Path) -> Result<SpawnedChild> {
    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c").arg(command);
    cmd.current_dir(cwd);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    // We manage the child's lifecycle explicitly via signals to its process
    // group; kill_on_drop would race with that on supervisor shutdown.
    cmd.kill_on_drop(false);

    #[cfg(unix)]
    unsafe {
        cmd.pre_exec(|| {
            // SAFETY: setsid() is async-signal-safe and runs before exec in
            // the forked child; it has no preconditions.
            if libc::setsid() == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }

    let child = cmd.spawn().context("failed to spawn child command")?;
    let pid = child
        .id()
        .context("spawned child has no pid (already reaped)")?;

    Ok(SpawnedChild { child, pid })
}

/// Convert a completed child's wait result into the signed exit-code
/// encoding spec §3 requires: a normal exit keeps its code, a signal death
/// is encoded as `-signal_number`, consistent with shell/`$?` convention.
pub fn encode_exit_status(status: std::io::Result<std::process::ExitStatus>) -> i32 {
    match status {
        Ok(status) => {
            #[cfg(unix)]
            {
                use std::os::unix::process::ExitStatusExt;
                status
                    .code()
                    .or_else(|| status.signal().map(|sig| -sig))
                    .unwrap_or(-1)
            }
            #[cfg(not(unix))]
            {
                status.code().unwrap_or(-1)
            }
        }
        Err(_) => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawns_via_shell_and_reports_pid() {
        let spawned = spawn_shell_command("exit 0", Path::new("/tmp")).unwrap();
        assert!(spawned.pid > 0);
        let mut child = spawned.child;
        let status = child.wait().await.unwrap();
        assert_eq!(encode_exit_status(Ok(status)), 0);
    }

    #[tokio::test]
    async fn nonzero_exit_code_is_preserved() {
        let spawned = spawn_shell_command("exit 7", Path::new("/tmp")).unwrap();
        let mut child = spawned.child;
        let status = child.wait().await.unwrap();
        assert_eq!(encode_exit_status(Ok(status)), 7);
    }

    #[tokio::test]
    async fn cd_and_shell_operators_are_supported() {
        let spawned = spawn_shell_command("cd /tmp && pwd", Path::new("/")).unwrap();
        let mut child = spawned.child;
        let stdout = child.stdout.take().unwrap();
        let mut out = String::new();
        use tokio::io::AsyncReadExt;
        tokio::io::BufReader::new(stdout)
            .read_to_string(&mut out)
            .await
            .unwrap();
        assert_eq!(out.trim(), "/tmp");
        child.wait().await.unwrap();
    }
}

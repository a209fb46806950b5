//! Best-effort `/proc` reads for the fields `sysinfo` does not expose:
//! open file descriptor count, environment size, and the set of listening
//! TCP ports together with a live connection count. Every failure degrades
//! to `None`/empty rather than propagating, matching spec §4.3's per-field
//! best-effort contract.

use std::collections::HashSet;
use std::fs;

const TCP_LISTEN_STATE: &str = "0A";

#[derive(Debug, Default)]
pub(crate) struct LinuxProbe {
    pub open_files: Option<u64>,
    pub connections: Option<u64>,
    pub ports: Vec<u16>,
    pub env_count: Option<u64>,
}

pub(crate) fn read(pid: u32) -> LinuxProbe {
    let (connections, ports) = socket_probe(pid).unwrap_or_default();
    LinuxProbe {
        open_files: open_file_count(pid),
        connections,
        ports,
        env_count: environ_count(pid),
    }
}

fn open_file_count(pid: u32) -> Option<u64> {
    fs::read_dir(format!("/proc/{pid}/fd"))
        .ok()
        .map(|entries| entries.count() as u64)
}

fn environ_count(pid: u32) -> Option<u64> {
    let bytes = fs::read(format!("/proc/{pid}/environ")).ok()?;
    Some(bytes.split(|&b| b == 0).filter(|s| !s.is_empty()).count() as u64)
}

/// Cross-reference the pid's open socket inodes (from `/proc/{pid}/fd`)
/// against the system-wide TCP tables to count live connections and collect
/// distinct listening ports, the same technique `ss`/`lsof` use internally.
fn socket_probe(pid: u32) -> Option<(Option<u64>, Vec<u16>)> {
    let entries = fs::read_dir(format!("/proc/{pid}/fd")).ok()?;

    let mut inodes = HashSet::new();
    for entry in entries.flatten() {
        if let Ok(target) = fs::read_link(entry.path()) {
            if let Some(inode) = target.to_str().and_then(parse_socket_inode) {
                inodes.insert(inode);
            }
        }
    }
    if inodes.is_empty() {
        return Some((Some(0), Vec::new()));
    }

    let mut connections = 0u64;
    let mut ports = Vec::new();
    for table in ["/proc/net/tcp", "/proc/net/tcp6"] {
        let Ok(contents) = fs::read_to_string(table) else {
            continue;
        };
        for line in contents.lines().skip(1) {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let (Some(local), Some(state), Some(inode)) = (fields.get(1), fields.get(3), fields.get(9))
            else {
                continue;
            };
            let Ok(inode) = inode.parse::<u64>() else {
                continue;
            };
            if !inodes.contains(&inode) {
                continue;
            }
            connections += 1;
            if *state == TCP_LISTEN_STATE {
                if let Some(port) = parse_port(local) {
                    ports.push(port);
                }
            }
        }
    }
    ports.sort_unstable();
    ports.dedup();
    Some((Some(connections), ports))
}

fn parse_socket_inode(link_target: &str) -> Option<u64> {
    link_target
        .strip_prefix("socket:[")?
        .strip_suffix(']')?
        .parse()
        .ok()
}

fn parse_port(local_address: &str) -> Option<u16> {
    let port_hex = local_address.split(':').nth(1)?;
    u16::from_str_radix(port_hex, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_socket_inode_from_link_target() {
        assert_eq!(parse_socket_inode("socket:[12345]"), Some(12345));
        assert_eq!(parse_socket_inode("pipe:[99]"), None);
        assert_eq!(parse_socket_inode("/dev/null"), None);
    }

    #[test]
    fn parses_port_from_hex_local_address() {
        assert_eq!(parse_port("0100007F:1F90"), Some(8080));
        assert_eq!(parse_port("00000000:0050"), Some(80));
        assert_eq!(parse_port("bogus"), None);
    }

    #[test]
    fn unknown_pid_reports_none() {
        assert_eq!(open_file_count(u32::MAX), None);
        assert_eq!(environ_count(u32::MAX), None);
    }

    #[test]
    fn self_pid_reports_some_open_files() {
        let pid = std::process::id();
        assert!(open_file_count(pid).unwrap_or_default() > 0);
    }
}

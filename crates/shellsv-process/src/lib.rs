//! Child process spawning, signaling, and merged-output capture.
//!
//! This crate owns everything that touches the OS process directly: the
//! shell spawn (spec §4.4, §6), the process-group signal delivery used by
//! kill/restart, and the output pump (spec §4.2). `shellsv-supervisor` owns
//! the lifecycle state machine built on top of these primitives.

mod pump;
mod signal;
mod spawn;

pub use pump::OutputPump;
pub use signal::send_signal_to_group;
pub use spawn::{SpawnedChild, encode_exit_status, spawn_shell_command};

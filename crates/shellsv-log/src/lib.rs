//! Append-only structured log files, one per supervised run.
//!
//! Mirrors the teacher workspace's `csa-process` output-capture idiom, but
//! persists each line to disk as a JSON record instead of buffering it in a
//! `String`, since this system serves log reads from the file rather than
//! from memory (see spec §4.1).

mod filter;
mod store;

pub use filter::LogFilter;
pub use store::{LogStore, ReadResult};

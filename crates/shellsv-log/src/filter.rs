/// Which slice of a log file to return. At most one of `lines`/`seconds` is
/// ever active; enforcing that exclusivity is the HTTP surface's job (it
/// owns request-parameter validation), not this crate's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFilter {
    All,
    LastN(usize),
    SinceSeconds(u64),
}

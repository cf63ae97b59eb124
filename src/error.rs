use std::{
    collections::TryReserveError,
    error::Error,
    fmt, io,
    num::ParseIntError,
    path::PathBuf,
};

/// The result type used throughout the crate.
pub type Result<T> = std::result::Result<T, ScanError>;

/// All errors that can occur while loading, scanning or storing an array.
#[derive(Debug)]
pub enum ScanError {
    /// The array to scan has no elements.
    EmptyInput,
    /// A run was requested with zero workers.
    NoWorkers,
    /// The loader supplied fewer values than the run accepts (`expected - 1`).
    ShortInput { expected: usize, found: usize },
    /// A token in the input could not be parsed as an integer.
    Parse {
        index: usize,
        token: String,
        source: ParseIntError,
    },
    /// One of the shared buffers could not be allocated.
    Allocation {
        elements: usize,
        source: TryReserveError,
    },
    /// The OS refused to start a worker thread.
    Spawn { worker: usize, source: io::Error },
    /// A worker thread panicked before finishing its rounds.
    WorkerPanicked { worker: usize },
    /// A barrier wait ran past the configured deadline.
    BarrierTimeout {
        worker: usize,
        round: usize,
        observed: usize,
        expected: usize,
    },
    /// A worker found the counter moved past its registration slot.
    BarrierOutOfTurn {
        worker: usize,
        round: usize,
        observed: usize,
        expected: usize,
    },
    /// Another participant gave up on the barrier.
    BarrierAbandoned { worker: usize, round: usize },
    /// Reading an input stream failed.
    Read(io::Error),
    /// Reading or writing an array file failed.
    Io { path: PathBuf, source: io::Error },
}

impl ScanError {
    /// Whether this error only reports that some other participant failed first.
    pub fn is_secondary(&self) -> bool {
        matches!(self, Self::BarrierAbandoned { .. })
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => f.write_str("the array to scan is empty"),
            Self::NoWorkers => f.write_str("at least one worker is required"),
            Self::ShortInput { expected, found } => write!(
                f,
                "input supplied {found} values, at least {} of {expected} are required",
                expected.saturating_sub(1)
            ),
            Self::Parse { index, token, source } => {
                write!(f, "value #{index} ({token:?}) is not an integer: {source}")
            }
            Self::Allocation { elements, source } => {
                write!(f, "cannot allocate a buffer of {elements} elements: {source}")
            }
            Self::Spawn { worker, source } => {
                write!(f, "failed to spawn worker {worker}: {source}")
            }
            Self::WorkerPanicked { worker } => write!(f, "worker {worker} panicked"),
            Self::BarrierTimeout {
                worker,
                round,
                observed,
                expected,
            } => write!(
                f,
                "worker {worker} timed out in round {round}: barrier counter at {observed}, waiting for {expected}"
            ),
            Self::BarrierOutOfTurn {
                worker,
                round,
                observed,
                expected,
            } => write!(
                f,
                "worker {worker} lost its turn in round {round}: barrier counter at {observed}, expected {expected}"
            ),
            Self::BarrierAbandoned { worker, round } => {
                write!(f, "worker {worker} saw the barrier abandoned in round {round}")
            }
            Self::Read(source) => write!(f, "cannot read input: {source}"),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl Error for ScanError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse { source, .. } => Some(source),
            Self::Allocation { source, .. } => Some(source),
            Self::Spawn { source, .. } | Self::Io { source, .. } | Self::Read(source) => {
                Some(source)
            }
            _ => None,
        }
    }
}

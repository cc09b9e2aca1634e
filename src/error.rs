use std::io;

/// An error produced while loading, clustering, or rendering basic block vectors.
#[derive(Debug)]
pub enum Error {
    /// Input could not be read or output could not be written.
    Io(io::Error),
    /// There were no interval vectors to operate on.
    EmptyInput,
    /// Requested cluster count is zero or exceeds the number of samples.
    InvalidClusterCount { k: usize, samples: usize },
    /// Requested projection dimensionality is zero.
    InvalidDimensions(usize),
    /// Malformed argument or input record.
    InvalidArgument(String),
    /// A dense matrix of `rows` vectors with block ids up to `max_id` cannot be allocated.
    DenseTooLarge { rows: usize, max_id: u64 },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::EmptyInput => write!(f, "no interval vectors in input"),
            Self::InvalidClusterCount { k, samples } => write!(
                f,
                "cannot partition {samples} samples into {k} clusters; need 0 < k <= {samples}"
            ),
            Self::InvalidDimensions(d) => write!(f, "invalid projection dimensions {d}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::DenseTooLarge { rows, max_id } => write!(
                f,
                "dense matrix of {rows} rows with block ids up to {max_id} does not fit in \
                 memory; use --metric sparse_symmetric"
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<Error> for io::Error {
    fn from(value: Error) -> Self {
        match value {
            Error::Io(e) => e,
            e => io::Error::new(io::ErrorKind::InvalidInput, e),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod test {
    use std::io;

    use super::Error;

    #[test]
    fn io_error_round_trips_kind() {
        let e: io::Error = Error::from(io::Error::from(io::ErrorKind::NotFound)).into();
        assert_eq!(e.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn validation_errors_are_invalid_input() {
        let e: io::Error = Error::InvalidClusterCount { k: 5, samples: 3 }.into();
        assert_eq!(e.kind(), io::ErrorKind::InvalidInput);
        assert!(e.to_string().contains("3 samples into 5 clusters"));
    }

    #[test]
    fn dense_too_large_suggests_sparse() {
        let e = Error::DenseTooLarge {
            rows: 2,
            max_id: u64::MAX,
        };
        assert!(e.to_string().contains("sparse_symmetric"));
        assert_eq!(io::Error::from(e).kind(), io::ErrorKind::InvalidInput);
    }
}

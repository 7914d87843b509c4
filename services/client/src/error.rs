//! services/client/src/error.rs
//!
//! Defines the primary error type for the quiz client service.

use crate::config::ConfigError;
use study_helper_core::ports::PortError;

/// The primary error type for the `client` service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error while building or using the HTTP client.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Represents a standard Input/Output error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdout closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn print_to(out: &mut impl Write) -> Result<(), ClientError> {
        writeln!(out, "Quiz 7 (5 questions)")?;
        Ok(())
    }

    #[test]
    fn write_failures_surface_as_io_errors() {
        let err = print_to(&mut ClosedPipe).unwrap_err();
        assert!(matches!(&err, ClientError::Io(e) if e.kind() == std::io::ErrorKind::BrokenPipe));
        assert_eq!(err.to_string(), "IO error: stdout closed");
    }
}

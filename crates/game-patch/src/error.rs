use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to open process {pid}: {message}")]
    ProcessOpenFailed { pid: u32, message: String },

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Failed to write process memory at address {address:#x}: {message}")]
    MemoryWriteFailed { address: u64, message: String },

    #[error("Invalid signature pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid game info record: {0}")]
    InvalidGameInfo(String),

    #[error("Argument table is full ({0} entries)")]
    ArgumentTableFull(usize),

    #[error("Invalid argument record: {0}")]
    InvalidArgumentRecord(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.is_not_found());

        let other_io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err2 = Error::Io(other_io_err);
        assert!(!err2.is_not_found());
    }

    #[test]
    fn test_memory_error_formats_hex_address() {
        let err = Error::MemoryWriteFailed {
            address: 0x1000,
            message: "denied".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to write process memory at address 0x1000: denied"
        );
    }
}

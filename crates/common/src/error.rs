use thiserror::Error;

/// Errors that cross layer boundaries in the storage core.
///
/// Structural violations found while decoding (bad magic, truncated
/// varint, restart point with a nonzero shared prefix) are `Corruption`.
/// A file too short to hold a table footer is `InvalidArgument`, as is a
/// bad magic number. Feature gaps (compression codecs, checksum
/// verification) are `NotSupported` and reported at first use, never
/// silently ignored.
///
/// `NotFound` plays a double role: a memtable or table deletion entry is
/// reported as *found* with a `NotFound` error, which tells the caller
/// this layer is authoritative — do not consult older layers.
///
/// All variants carry plain message strings (I/O errors are flattened to
/// their display form) so the enum is `Clone` and iterators can latch a
/// status and hand it back on every `status()` call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The key does not exist at this layer (authoritatively).
    #[error("not found: {0}")]
    NotFound(String),

    /// On-disk or in-memory structure failed to decode.
    #[error("corruption: {0}")]
    Corruption(String),

    /// A recognized but unimplemented feature was requested.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// The caller handed us something that cannot be a valid table.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The storage collaborator failed.
    #[error("io error: {0}")]
    Io(String),
}

impl Error {
    /// True iff this is the `NotFound` kind.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// True iff this is the `Corruption` kind.
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::Corruption(_))
    }

    /// True iff this is the `NotSupported` kind.
    #[must_use]
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Error::NotSupported(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

//! Error taxonomy shared by the server and client.

/// Result type for trove operations
pub type Result<T> = std::result::Result<T, Error>;

/// Malformed frames and requests.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("length prefix is not a number: {0:?}")]
    BadLength(String),

    #[error("zero-length token")]
    ZeroLength,

    #[error("frame truncated: token declared {expected} bytes, only {got} available")]
    Truncated { expected: usize, got: usize },

    #[error("missing delimiter after length prefix")]
    MissingDelimiter,

    #[error("frame contains no tokens")]
    EmptyFrame,

    #[error("frame exceeds {limit} bytes")]
    Oversize { limit: usize },

    #[error("command name is not valid UTF-8")]
    BadCommand,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("{command}: expected {expected} parameters, got {got}")]
    Arity {
        command: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("invalid project name: {0:?}")]
    InvalidProjectName(String),

    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    #[error("bad batch entry: {0}")]
    BadEntry(String),

    #[error("bad batch count: {0:?}")]
    BadCount(String),

    #[error("content hash mismatch for {0}")]
    HashMismatch(String),

    #[error("malformed reply: {0}")]
    BadReply(String),

    /// A protocol error reported by the peer, reconstructed from an error
    /// reply frame.
    #[error("{0}")]
    Remote(String),
}

/// Errors that can occur while serving or issuing commands
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("manifest corrupt: {0}")]
    ManifestCorrupt(String),

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("project already exists: {0}")]
    ProjectExists(String),

    #[error("no prior version to roll back: {0}")]
    NoHistory(String),

    #[error("nothing staged for commit: {0}")]
    NothingStaged(String),

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable code token carried in error reply frames.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Protocol(_) => "protocol",
            Error::ManifestCorrupt(_) => "manifest_corrupt",
            Error::ProjectNotFound(_) => "project_not_found",
            Error::ProjectExists(_) => "project_exists",
            Error::NoHistory(_) => "no_history",
            Error::NothingStaged(_) => "nothing_staged",
            Error::ConnectionFailed(_) => "connection_failed",
            Error::Io(_) => "io",
        }
    }

    /// The detail token carried alongside the code in error reply frames.
    /// Codes and details round-trip through [`Error::from_wire`].
    pub fn detail(&self) -> String {
        match self {
            Error::Protocol(e) => e.to_string(),
            Error::ManifestCorrupt(m)
            | Error::ProjectNotFound(m)
            | Error::ProjectExists(m)
            | Error::NoHistory(m)
            | Error::NothingStaged(m)
            | Error::ConnectionFailed(m) => m.clone(),
            Error::Io(e) => e.to_string(),
        }
    }

    /// Rebuild an error from the code and detail tokens of an error reply.
    pub fn from_wire(code: &str, detail: &str) -> Self {
        let detail = detail.to_string();
        match code {
            "manifest_corrupt" => Error::ManifestCorrupt(detail),
            "project_not_found" => Error::ProjectNotFound(detail),
            "project_exists" => Error::ProjectExists(detail),
            "no_history" => Error::NoHistory(detail),
            "nothing_staged" => Error::NothingStaged(detail),
            "connection_failed" => Error::ConnectionFailed(detail),
            "io" => Error::Io(std::io::Error::other(detail)),
            _ => Error::Protocol(ProtocolError::Remote(detail)),
        }
    }
}

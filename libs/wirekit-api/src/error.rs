use std::fmt;

/// Category of a codec error. None of these conditions is transient,
/// so callers never retry on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A different descriptor is already registered under the same name.
    SchemaConflict,
    /// Unknown schema name or field name.
    NotFound,
    /// Truncated or structurally invalid wire bytes.
    MalformedInput,
    /// Value kind or shape does not match the field descriptor.
    TypeMismatch,
    /// Descriptor failed validation (duplicate number, bad name, ...).
    InvalidSchema,
    /// Registration attempted after the registry was sealed.
    Sealed,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::SchemaConflict => f.write_str("schema conflict"),
            ErrorKind::NotFound => f.write_str("not found"),
            ErrorKind::MalformedInput => f.write_str("malformed input"),
            ErrorKind::TypeMismatch => f.write_str("type mismatch"),
            ErrorKind::InvalidSchema => f.write_str("invalid schema"),
            ErrorKind::Sealed => f.write_str("registry sealed"),
        }
    }
}

/// Error returned by descriptor construction, the codec, the accessor
/// and the registry.
///
/// Carries an `ErrorKind` for matching and a human-readable message.
#[derive(Clone, PartialEq, Eq)]
pub struct WireError {
    kind: ErrorKind,
    message: String,
}

impl WireError {
    pub fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self { kind, message: msg.into() }
    }

    pub fn schema_conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::SchemaConflict, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedInput, msg)
    }

    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeMismatch, msg)
    }

    pub fn invalid_schema(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidSchema, msg)
    }

    pub fn sealed(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Sealed, msg)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Add context to the error, preserving the original ErrorKind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl fmt::Debug for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for WireError {}

// ---------------------------------------------------------------------------
// From impls: standard error types → WireError with correct ErrorKind
// ---------------------------------------------------------------------------

impl From<std::str::Utf8Error> for WireError {
    fn from(e: std::str::Utf8Error) -> Self {
        Self::malformed(e.to_string())
    }
}

impl From<std::string::FromUtf8Error> for WireError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self::malformed(e.to_string())
    }
}

impl From<serde_json::Error> for WireError {
    fn from(e: serde_json::Error) -> Self {
        Self::malformed(e.to_string())
    }
}

use wirekit_api::error::WireError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Wire(#[from] WireError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Add context to the error.
    ///
    /// For `Wire` variant, context is added to the inner `WireError`.
    /// For other variants, context is prepended to the message.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            EngineError::Wire(e) => EngineError::Wire(e.with_context(ctx)),
            EngineError::Config(msg) => EngineError::Config(format!("{ctx}: {msg}")),
            other => other,
        }
    }

    /// Kind of the underlying codec error, if any.
    pub fn wire_kind(&self) -> Option<wirekit_api::error::ErrorKind> {
        match self {
            EngineError::Wire(e) => Some(e.kind()),
            _ => None,
        }
    }
}

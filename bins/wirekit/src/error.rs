use wirekit_api::error::WireError;
use wirekit_engine::error::EngineError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Engine(#[from] EngineError),

    #[error("{0}")]
    Wire(#[from] WireError),

    #[error("invalid hex input: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

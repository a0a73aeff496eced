use wirekit_engine::config::{ConfigParser, SchemaConfig};
use wirekit_engine::error::EngineError;

/// Schema definitions written in HCL attribute syntax:
/// `messages = [ { name = "...", fields = [ { ... } ] } ]`.
///
/// Block syntax (`messages { ... }`) is not accepted: a single block does
/// not deserialize as a list.
pub struct HclParser;

impl ConfigParser for HclParser {
    fn extensions(&self) -> &[&str] {
        &["hcl"]
    }

    fn parse(&self, content: &str) -> Result<SchemaConfig, EngineError> {
        hcl::from_str(content).map_err(|e| EngineError::Config(e.to_string()))
    }
}

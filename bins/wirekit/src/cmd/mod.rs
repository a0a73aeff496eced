pub mod decode;
pub mod describe;
pub mod encode;
pub mod schemas;

use std::io::Read;
use std::path::{Path, PathBuf};

use wirekit_config_hcl::HclParser;
use wirekit_engine::config::{load_all, ConfigParser, TomlParser};
use wirekit_engine::{init_registry, SchemaRegistry};

use crate::error::CliError;

/// Load extra schema files and initialize the process registry with them.
pub fn registry(schemas: &[PathBuf]) -> Result<&'static SchemaRegistry, CliError> {
    let parsers: [&dyn ConfigParser; 2] = [&TomlParser, &HclParser];
    let extra = load_all(schemas, &parsers)?;
    Ok(init_registry(extra)?)
}

/// Whole input from `path`, or stdin when absent or `-`.
pub fn read_input(path: Option<&Path>) -> Result<Vec<u8>, CliError> {
    match path {
        Some(p) if p != Path::new("-") => Ok(std::fs::read(p)?),
        _ => {
            let mut buf = Vec::new();
            std::io::stdin().lock().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

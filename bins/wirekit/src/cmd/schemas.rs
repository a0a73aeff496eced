use std::io::Write;
use std::path::PathBuf;

use crate::error::CliError;

pub fn run(schemas: &[PathBuf]) -> Result<(), CliError> {
    let registry = super::registry(schemas)?;
    let mut out = std::io::stdout().lock();
    for name in registry.names() {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

use std::io::Write;
use std::path::PathBuf;

use crate::config::DescribeArgs;
use crate::error::CliError;

pub fn run(schemas: &[PathBuf], args: DescribeArgs) -> Result<(), CliError> {
    let registry = super::registry(schemas)?;
    let descriptor = registry.lookup(&args.message)?;
    writeln!(std::io::stdout().lock(), "{descriptor}")?;
    Ok(())
}

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use wirekit_api::format::FormatSerializer;
use wirekit_api::schema::MessageDescriptor;
use wirekit_engine::BinaryFormat;
use wirekit_format_json::JsonFormat;

use crate::config::EncodeArgs;
use crate::error::CliError;

pub fn run(schemas: &[PathBuf], args: EncodeArgs) -> Result<(), CliError> {
    let registry = super::registry(schemas)?;
    let descriptor = registry.lookup(&args.message)?;
    let input = super::read_input(args.input.as_deref())?;

    let output = encode(&input, &descriptor, args.hex)?;
    tracing::debug!(schema = %args.message, bytes = output.len(), "encoded");

    let mut out = std::io::stdout().lock();
    out.write_all(&output)?;
    out.flush()?;
    Ok(())
}

/// JSON text to wire bytes, or to a hex line when `hex` is set.
fn encode(
    json: &[u8],
    descriptor: &Arc<MessageDescriptor>,
    hex: bool,
) -> Result<Vec<u8>, CliError> {
    let instance = JsonFormat::new().deserialize(json, descriptor)?;
    let bytes = BinaryFormat.serialize(&instance)?;
    if hex {
        let mut line = hex::encode(bytes).into_bytes();
        line.push(b'\n');
        Ok(line)
    } else {
        Ok(bytes)
    }
}

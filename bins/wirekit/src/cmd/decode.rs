use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use wirekit_api::format::FormatSerializer;
use wirekit_api::message::MessageInstance;
use wirekit_api::schema::MessageDescriptor;
use wirekit_engine::BinaryFormat;
use wirekit_format_json::JsonFormat;

use crate::config::{DecodeArgs, OutputFormat};
use crate::error::CliError;

pub fn run(schemas: &[PathBuf], args: DecodeArgs) -> Result<(), CliError> {
    let registry = super::registry(schemas)?;
    let descriptor = registry.lookup(&args.message)?;
    let input = super::read_input(args.input.as_deref())?;

    let instance = decode(&input, &descriptor, args.hex)?;
    let unknown = instance.unknown_fields();
    if !unknown.is_empty() {
        tracing::info!(
            schema = %args.message,
            len = unknown.len(),
            bytes = %hex::encode(unknown.as_bytes()),
            "message carries unknown fields"
        );
    }

    let mut out = std::io::stdout().lock();
    out.write_all(&render(&instance, args.output)?)?;
    out.flush()?;
    Ok(())
}

fn decode(
    input: &[u8],
    descriptor: &Arc<MessageDescriptor>,
    hex: bool,
) -> Result<MessageInstance, CliError> {
    let bytes = if hex {
        let text: String = String::from_utf8_lossy(input)
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        hex::decode(text)?
    } else {
        input.to_vec()
    };
    Ok(BinaryFormat.deserialize(&bytes, descriptor)?)
}

fn render(instance: &MessageInstance, output: OutputFormat) -> Result<Vec<u8>, CliError> {
    let mut rendered = match output {
        OutputFormat::Json => JsonFormat::pretty().serialize(instance)?,
        OutputFormat::Text => instance.to_string().into_bytes(),
    };
    rendered.push(b'\n');
    Ok(rendered)
}

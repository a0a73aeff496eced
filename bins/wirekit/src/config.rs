use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "wirekit", about = "Inspect and convert schema-described wire messages")]
pub struct Cli {
    /// Extra schema definition file (.toml or .hcl), repeatable
    #[arg(long = "schema", env = "WIREKIT_SCHEMA", value_delimiter = ',', global = true)]
    pub schemas: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List registered message names
    Schemas,
    /// Print a message's field layout
    Describe(DescribeArgs),
    /// Read JSON, write wire bytes
    Encode(EncodeArgs),
    /// Read wire bytes, write JSON or text
    Decode(DecodeArgs),
}

#[derive(Args, Clone, Debug)]
pub struct DescribeArgs {
    /// Fully-qualified message name
    pub message: String,
}

#[derive(Args, Clone, Debug)]
pub struct EncodeArgs {
    pub message: String,

    /// Input file, stdin when omitted or `-`
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Write hex instead of raw bytes
    #[arg(long)]
    pub hex: bool,
}

#[derive(Args, Clone, Debug)]
pub struct DecodeArgs {
    pub message: String,

    /// Input file, stdin when omitted or `-`
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Input is hex text
    #[arg(long)]
    pub hex: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Text,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decode_flags() {
        let cli = Cli::parse_from([
            "wirekit",
            "--schema",
            "a.toml,b.hcl",
            "decode",
            "test.Msg",
            "--hex",
            "--output",
            "text",
        ]);
        assert_eq!(cli.schemas, vec![PathBuf::from("a.toml"), PathBuf::from("b.hcl")]);
        match cli.command {
            Commands::Decode(args) => {
                assert_eq!(args.message, "test.Msg");
                assert!(args.hex);
                assert_eq!(args.output, OutputFormat::Text);
                assert!(args.input.is_none());
            }
            _ => panic!("expected decode"),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

//! kiln cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; kiln ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render all documents found in the given folders
    ///
    /// Picks up `*.yaml` files directly inside each folder and one level below.
    /// Documents without `output` are resolved and validated but not written.
    Render(RenderCommand),

    /// Print the resolved payload of a single document
    Resolve(ResolveCommand),
}

#[derive(Parser, Debug)]
pub struct RenderCommand {
    /// Folder rendered files are written to
    #[clap(short = 'o', long = "output", default_value = ".")]
    pub output: PathBuf,

    /// Folders to process
    #[clap(required = true)]
    pub folders: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ResolveCommand {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,

    /// Document to resolve
    pub file: PathBuf,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}

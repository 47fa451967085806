mod cli;

use kiln::{normalize, Loader, OsFs, Parameters, Resolver, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("KILN_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Render(render_cli) => render(render_cli),
        cli::Command::Resolve(resolve_cli) => resolve(resolve_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

fn resolver() -> Resolver {
    Resolver::new(Loader::new(Arc::new(OsFs)))
}

pub fn render(cli: cli::RenderCommand) -> anyhow::Result<()> {
    let files = find_files(&cli.folders)?;
    for file in &files {
        println!("{}", file.display());
    }

    let resolver = resolver();
    for file in &files {
        let document = resolver.open(file, &Parameters::new())?;

        match document.save_to(&OsFs, &cli.output) {
            Ok(report) => print!("{report}"),
            Err(err) => {
                eprint!("{}", err.report);
                return Err(err.into());
            }
        }
    }

    Ok(())
}

/// `*.yaml` files directly in each folder and one level below, sorted per folder
fn find_files(folders: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for folder in folders {
        anyhow::ensure!(folder.is_dir(), "{} is not a directory", folder.display());

        let mut found = Vec::new();
        for entry in walkdir::WalkDir::new(folder).min_depth(1).max_depth(2) {
            let entry = entry?;
            if entry.file_type().is_file() && is_yaml(entry.path()) {
                found.push(entry.into_path());
            }
        }

        found.sort();
        files.extend(found);
    }

    anyhow::ensure!(!files.is_empty(), "No files found");
    Ok(files)
}

fn is_yaml(path: &Path) -> bool {
    path.extension().is_some_and(|extension| extension == "yaml")
}

pub fn resolve(cli: cli::ResolveCommand) -> anyhow::Result<()> {
    let document = resolver().open(&cli.file, &Parameters::new())?;
    let value: Value = normalize(document.config);

    match cli.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), &value)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), &value)?,
    };

    Ok(())
}

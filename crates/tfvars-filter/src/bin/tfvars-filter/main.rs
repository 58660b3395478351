mod cli;

use anyhow::Context;
use std::io::{Read, Write};
use std::path::Path;
use tfvars_filter::diagnostics::Origin;
use tfvars_filter::filter::{DeclaredSet, Filtered};
use tfvars_filter::module::Module;
use tfvars_filter::report::Report;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("TFVARS_FILTER_LOG"))
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
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    match run(cli) {
        Ok(Outcome::Unchanged) => {}
        Ok(Outcome::Neutralized) => std::process::exit(2),
        Err(e) => {
            for error in e.chain() {
                eprintln!("{error}")
            }
            std::process::exit(1);
        }
    }
}

enum Outcome {
    Unchanged,
    /// Only reported with `--check`
    Neutralized,
}

fn run(cli: cli::Cli) -> anyhow::Result<Outcome> {
    anyhow::ensure!(
        !cli.tfvars_file.to_string_lossy().ends_with(".json"),
        "JSON-encoded tfvars files are not supported: {}",
        cli.tfvars_file.display()
    );

    // the module must be valid before the document is touched
    let module = Module::load(&cli.config_dir)?;
    let declared = module.declared();
    tracing::debug!(declared = declared.len(), "variables declared");

    let (source, bytes) = read_input(&cli.tfvars_file)?;
    let filtered = tfvars_filter::filter::filter(&bytes, &Origin::new(source), &declared)?;

    // the result is written even if the report fails afterwards
    write_output(&cli.output, &filtered.bytes)?;

    if let Some(format) = cli.report {
        report(format, &declared, &filtered).context("Failed to write the report")?;
    }

    if cli.check && !filtered.neutralized.is_empty() {
        return Ok(Outcome::Neutralized);
    }
    Ok(Outcome::Unchanged)
}

fn read_input(path: &Path) -> anyhow::Result<(String, Vec<u8>)> {
    if cli::is_stdio(path) {
        let mut bytes = vec![];
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read tfvars from stdin")?;
        return Ok(("<stdin>".to_string(), bytes));
    }

    let bytes = std::fs::read(path)
        .with_context(|| format!("Cannot read tfvars from {}", path.display()))?;
    Ok((path.display().to_string(), bytes))
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if cli::is_stdio(path) {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(bytes)
            .and_then(|()| stdout.flush())
            .context("failed to write result to stdout")?;
        return Ok(());
    }

    std::fs::write(path, bytes)
        .with_context(|| format!("failed to write result to {}", path.display()))
}

fn report(format: cli::ReportFormat, declared: &DeclaredSet, filtered: &Filtered) -> anyhow::Result<()> {
    let report = Report::new(declared, filtered);
    match format {
        cli::ReportFormat::Yaml => serde_yaml::to_writer(std::io::stderr(), &report)?,
        cli::ReportFormat::Json => {
            serde_json::to_writer_pretty(std::io::stderr(), &report)?;
            eprintln!();
        }
    };

    Ok(())
}

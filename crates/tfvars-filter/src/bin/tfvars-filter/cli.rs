//! tfvars-filter cli interface

use clap::{Parser, ValueEnum};
use std::fmt::Formatter;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; tfvars-filter ... }
    #[clap(short = 'C', long = "directory")]
    pub directory: Vec<PathBuf>,

    /// File to write to, "-" for stdout
    #[clap(short = 'o', long = "output", default_value = "-")]
    pub output: PathBuf,

    /// Print which attributes were kept and neutralized to stderr
    #[arg(short = 'r', long = "report")]
    pub report: Option<ReportFormat>,

    /// Exit with status 2 if any attribute was neutralized
    ///
    /// The result is written nevertheless.
    #[clap(long = "check")]
    pub check: bool,

    /// Module directory declaring the accepted variables
    pub config_dir: PathBuf,

    /// tfvars file to filter, "-" for stdin
    pub tfvars_file: PathBuf,
}

#[derive(ValueEnum, Clone, Copy, Default, Debug)]
pub enum ReportFormat {
    Json,
    #[default]
    Yaml,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Json => f.write_str("json"),
            ReportFormat::Yaml => f.write_str("yaml"),
        }
    }
}

/// Whether `path` refers to a standard stream
pub fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::ownership::GRAIN_PACKAGE;
use crate::resolve::GRAIN_APPLICATION;

#[derive(Debug, Clone, Parser)]
#[command(name = "main-class-finder")]
#[command(about = "Find the annotated entry-point class in a build output directory and write its JAR manifest")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Compiled output directory (default: $MAIN_CLASS_FINDER_ROOT or target/classes)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Extra directory or jar consulted when reading class bytes
    #[arg(long = "classpath", value_name = "PATH")]
    pub classpath: Vec<PathBuf>,

    #[arg(long, value_name = "DESCRIPTOR", default_value = GRAIN_APPLICATION)]
    pub marker: String,

    #[arg(long, value_name = "PACKAGE", default_value = GRAIN_PACKAGE)]
    pub framework_package: String,

    /// Additional package whose classes are never candidates
    #[arg(long = "exclude", value_name = "PACKAGE")]
    pub exclude: Vec<String>,

    /// Take the first of several annotated classes instead of failing
    #[arg(long)]
    pub allow_ambiguous: bool,

    #[arg(short = 'j', long, value_name = "N")]
    pub jobs: Option<usize>,

    #[arg(long)]
    pub sequential: bool,

    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    #[arg(short = 'v', long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// List candidate classes after ownership filtering
    List,
    /// Show the declared name and annotations of one class file
    Inspect { file: PathBuf },
    /// Resolve the entry point without writing the manifest
    Resolve,
    /// Resolve the entry point and write META-INF/MANIFEST.MF
    Emit {
        /// Group id of the project being built
        #[arg(long, value_name = "GROUP")]
        group_id: Option<String>,
    },
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

use anyhow::{Context, Result};
use clap::Parser;
use main_class_finder::classfile::{ParsedClass, parse_class};
use main_class_finder::cli::{Cli, Commands, OutputFormat};
use main_class_finder::config::{
    byte_source, configure_thread_pool, ownership_filter, resolve_options, resolve_root,
};
use main_class_finder::manifest::manifest_path;
use main_class_finder::resolve::{resolve, resolve_and_emit};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::Path;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    configure_thread_pool(&cli)?;

    match cli.command.clone() {
        Commands::List => {
            let root = resolve_root(&cli);
            let filter = ownership_filter(&cli);
            let classes = main_class_finder::scan::find_classes(&root, |n| filter.allows(n))
                .with_context(|| format!("Failed to scan {}", root.display()))?;
            write_output(
                &ListResult {
                    root: root.to_string_lossy().to_string(),
                    classes: classes.into_iter().collect(),
                },
                cli.format,
            )?;
        }
        Commands::Inspect { file } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let parsed = parse_class(&bytes)
                .with_context(|| format!("Failed to parse {}", file.display()))?;
            write_output(&InspectResult(parsed), cli.format)?;
        }
        Commands::Resolve => {
            let start = Instant::now();
            let root = resolve_root(&cli);
            let filter = ownership_filter(&cli);
            let resolution = resolve(
                &root,
                &byte_source(&cli),
                |n| filter.allows(n),
                &resolve_options(&cli),
            )?;
            write_output(
                &ResolveResult {
                    main_class: resolution.entry_point.class_name,
                    annotations: resolution.entry_point.annotations,
                    candidates: resolution.candidates.len(),
                    duration_ms: start.elapsed().as_millis() as u64,
                },
                cli.format,
            )?;
        }
        Commands::Emit { group_id } => {
            let root = resolve_root(&cli);
            let filter = ownership_filter(&cli);
            let result = match group_id.as_deref() {
                Some(g) if filter.is_framework_project(g) => EmitResult::skipped(&root),
                _ => {
                    let record = resolve_and_emit(
                        &root,
                        &byte_source(&cli),
                        |n| filter.allows(n),
                        &resolve_options(&cli),
                    )?;
                    EmitResult {
                        skipped: false,
                        main_class: Some(record.main_class().to_string()),
                        manifest_path: manifest_path(&root).to_string_lossy().to_string(),
                        manifest_sha256: Some(record.digest()),
                    }
                }
            };
            write_output(&result, cli.format)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "main_class_finder=info"
    } else {
        "main_class_finder=warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(std::io::stderr().is_terminal())
                .with_writer(std::io::stderr),
        )
        .init();
}

trait Report: Serialize {
    fn text(&self) -> String;
}

#[derive(Debug, Serialize)]
struct ListResult {
    root: String,
    classes: Vec<String>,
}

impl Report for ListResult {
    fn text(&self) -> String {
        self.classes.iter().map(|c| format!("{c}\n")).collect()
    }
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
struct InspectResult(ParsedClass);

impl Report for InspectResult {
    fn text(&self) -> String {
        let mut out = format!(
            "class_name: {}\nversion: {}.{}\n",
            self.0.class_name, self.0.major_version, self.0.minor_version
        );
        for a in &self.0.annotations {
            out.push_str(&format!("- {a}\n"));
        }
        out
    }
}

#[derive(Debug, Serialize)]
struct ResolveResult {
    main_class: String,
    annotations: Vec<String>,
    candidates: usize,
    duration_ms: u64,
}

impl Report for ResolveResult {
    fn text(&self) -> String {
        format!(
            "main_class: {}\ncandidates: {}\nduration_ms: {}\n",
            self.main_class, self.candidates, self.duration_ms
        )
    }
}

#[derive(Debug, Serialize)]
struct EmitResult {
    skipped: bool,
    main_class: Option<String>,
    manifest_path: String,
    manifest_sha256: Option<String>,
}

impl EmitResult {
    fn skipped(root: &Path) -> Self {
        Self {
            skipped: true,
            main_class: None,
            manifest_path: manifest_path(root).to_string_lossy().to_string(),
            manifest_sha256: None,
        }
    }
}

impl Report for EmitResult {
    fn text(&self) -> String {
        match &self.main_class {
            Some(main_class) => format!(
                "main_class: {main_class}\nmanifest: {}\nsha256: {}\n",
                self.manifest_path,
                self.manifest_sha256.as_deref().unwrap_or("")
            ),
            None => "skipped: framework project\n".to_string(),
        }
    }
}

fn write_output<R: Report>(report: &R, format: OutputFormat) -> Result<()> {
    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)?,
        OutputFormat::Text => report.text(),
    };
    print!("{content}");
    if !content.ends_with('\n') {
        println!();
    }
    Ok(())
}

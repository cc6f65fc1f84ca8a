use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use tracing::debug;

use crate::cli::Cli;
use crate::ownership::OwnershipFilter;
use crate::resolve::{ResolveOptions, SelectionPolicy};
use crate::source::ClasspathSource;

pub const ROOT_ENV: &str = "MAIN_CLASS_FINDER_ROOT";
pub const CLASSPATH_ENV: &str = "MAIN_CLASS_FINDER_CLASSPATH";
pub const DEFAULT_ROOT: &str = "target/classes";

pub fn resolve_root(cli: &Cli) -> PathBuf {
    if let Some(p) = cli.root.clone() {
        return p;
    }

    if let Ok(p) = env::var(ROOT_ENV)
        && !p.is_empty()
    {
        return PathBuf::from(p);
    }

    PathBuf::from(DEFAULT_ROOT)
}

pub fn resolve_classpath(cli: &Cli) -> Vec<PathBuf> {
    if !cli.classpath.is_empty() {
        return cli.classpath.clone();
    }

    match env::var_os(CLASSPATH_ENV) {
        Some(raw) => env::split_paths(&raw)
            .filter(|p| !p.as_os_str().is_empty())
            .collect(),
        None => Vec::new(),
    }
}

pub fn byte_source(cli: &Cli) -> ClasspathSource {
    let source = resolve_classpath(cli)
        .iter()
        .fold(ClasspathSource::new(resolve_root(cli)), |source, element| {
            source.with_element(element)
        });
    debug!(elements = source.element_count(), "classpath assembled");
    source
}

pub fn ownership_filter(cli: &Cli) -> OwnershipFilter {
    cli.exclude
        .iter()
        .fold(OwnershipFilter::new(cli.framework_package.clone()), |filter, p| {
            filter.exclude(p.clone())
        })
}

pub fn resolve_options(cli: &Cli) -> ResolveOptions {
    ResolveOptions {
        marker: cli.marker.clone(),
        policy: if cli.allow_ambiguous {
            SelectionPolicy::FirstMatch
        } else {
            SelectionPolicy::Strict
        },
        parallel: !cli.sequential,
    }
}

pub fn configure_thread_pool(cli: &Cli) -> Result<()> {
    if let Some(jobs) = cli.jobs.filter(|j| *j > 0) {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("Failed to configure worker pool")?;
    }
    Ok(())
}

//! Picking the single annotated entry point among discovered classes.

use rayon::prelude::*;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::classfile::{ParsedClass, parse_class};
use crate::error::{Error, Result};
use crate::manifest::ManifestRecord;
use crate::scan::find_classes;
use crate::source::ByteSource;

/// Descriptor of `com._7aske.grain.core.configuration.GrainApplication`.
pub const GRAIN_APPLICATION: &str = "Lcom/_7aske/grain/core/configuration/GrainApplication;";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// More than one annotated class is an error.
    #[default]
    Strict,
    /// Take the smallest class name among several matches.
    FirstMatch,
}

#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub marker: String,
    pub policy: SelectionPolicy,
    pub parallel: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            marker: GRAIN_APPLICATION.to_string(),
            policy: SelectionPolicy::Strict,
            parallel: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub candidates: BTreeSet<String>,
    pub entry_point: ParsedClass,
}

/// Parses every candidate. Failures are reported for the smallest failing
/// class name no matter which worker hit it first.
pub fn parse_candidates<S>(
    candidates: &BTreeSet<String>,
    source: &S,
    parallel: bool,
) -> Result<Vec<ParsedClass>>
where
    S: ByteSource + ?Sized,
{
    let load = |class_name: &String| -> Result<ParsedClass> {
        let bytes = source.read_class(class_name)?;
        let parsed = parse_class(&bytes).map_err(|source| Error::Parse {
            class_name: class_name.clone(),
            path: bytes.origin().map(Path::to_path_buf),
            source,
        })?;
        debug!(
            class = %class_name,
            declared = %parsed.class_name,
            annotations = parsed.annotations.len(),
            "parsed candidate"
        );
        Ok(parsed)
    };

    let ordered: Vec<&String> = candidates.iter().collect();
    let results: Vec<Result<ParsedClass>> = if parallel {
        ordered.par_iter().map(|name| load(*name)).collect()
    } else {
        ordered.iter().map(|name| load(*name)).collect()
    };
    results.into_iter().collect()
}

pub fn select_entry_point(parsed: Vec<ParsedClass>, options: &ResolveOptions) -> Result<ParsedClass> {
    let examined = parsed.len();
    let mut matches: Vec<ParsedClass> = parsed
        .into_iter()
        .filter(|c| c.has_annotation(&options.marker))
        .collect();
    matches.sort_by(|a, b| a.class_name.cmp(&b.class_name));

    match (matches.len(), options.policy) {
        (0, _) => Err(Error::NoEntryPoint {
            examined,
            marker: options.marker.clone(),
        }),
        (1, _) | (_, SelectionPolicy::FirstMatch) => {
            if matches.len() > 1 {
                warn!(
                    chosen = %matches[0].class_name,
                    matches = ?matches.iter().map(|c| c.class_name.as_str()).collect::<Vec<_>>(),
                    "several entry points found, taking the first"
                );
            }
            Ok(matches.swap_remove(0))
        }
        (_, SelectionPolicy::Strict) => Err(Error::Ambiguous {
            marker: options.marker.clone(),
            candidates: matches.into_iter().map(|c| c.class_name).collect(),
        }),
    }
}

pub fn resolve_entry_point<S>(
    candidates: &BTreeSet<String>,
    source: &S,
    options: &ResolveOptions,
) -> Result<ParsedClass>
where
    S: ByteSource + ?Sized,
{
    let parsed = parse_candidates(candidates, source, options.parallel)?;
    select_entry_point(parsed, options)
}

/// Discovery, ownership filtering and selection, without writing anything.
pub fn resolve<S, F>(root: &Path, source: &S, filter: F, options: &ResolveOptions) -> Result<Resolution>
where
    S: ByteSource + ?Sized,
    F: Fn(&str) -> bool,
{
    let candidates = find_classes(root, filter)?;
    let entry_point = resolve_entry_point(&candidates, source, options)?;
    info!(
        main_class = %entry_point.class_name,
        candidates = candidates.len(),
        "entry point resolved"
    );
    Ok(Resolution {
        candidates,
        entry_point,
    })
}

/// Resolves the entry point under `root` and writes its manifest there.
/// Nothing is written unless resolution succeeds.
pub fn resolve_and_emit<S, F>(
    root: &Path,
    source: &S,
    filter: F,
    options: &ResolveOptions,
) -> Result<ManifestRecord>
where
    S: ByteSource + ?Sized,
    F: Fn(&str) -> bool,
{
    let resolution = resolve(root, source, filter, options)?;
    let record = ManifestRecord::new(resolution.entry_point.class_name);
    record.write_to(root)?;
    Ok(record)
}

use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::{debug, info};

use crate::error::{Error, Result};

pub const CLASS_EXTENSION: &str = "class";

/// Every compiled class file under `root`, sorted.
pub fn scan_class_files(root: &Path) -> Result<Vec<PathBuf>> {
    let meta = std::fs::metadata(root).map_err(|e| Error::io(root, e))?;
    if !meta.is_dir() {
        return Err(Error::io(
            root,
            std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
        ));
    }

    let (tx, rx) = mpsc::channel();

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .ignore(false)
        .parents(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build_parallel();

    walker.run(|| {
        let tx = tx.clone();
        Box::new(move |entry| match entry {
            Ok(entry) => {
                let path = entry.path();
                if entry.file_type().is_some_and(|t| !t.is_dir())
                    && path.extension().is_some_and(|e| e == CLASS_EXTENSION)
                {
                    debug!(path = %path.display(), "class file");
                    let _ = tx.send(Ok(path.to_path_buf()));
                }
                ignore::WalkState::Continue
            }
            Err(err) => {
                let _ = tx.send(Err(err));
                ignore::WalkState::Quit
            }
        })
    });

    drop(tx);
    let mut files = rx
        .into_iter()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|source| Error::Walk {
            root: root.to_path_buf(),
            source,
        })?;
    files.sort();
    Ok(files)
}

/// Class names found under `root` that pass `predicate`.
pub fn find_classes<F>(root: &Path, predicate: F) -> Result<BTreeSet<String>>
where
    F: Fn(&str) -> bool,
{
    let files = scan_class_files(root)?;
    let total = files.len();

    let classes: BTreeSet<String> = files
        .iter()
        .filter_map(|p| class_name_for_path(root, p))
        .filter(|name| {
            let keep = predicate(name);
            if !keep {
                debug!(class = %name, "excluded by ownership filter");
            }
            keep
        })
        .collect();

    info!(
        root = %root.display(),
        class_files = total,
        candidates = classes.len(),
        "discovered classes"
    );
    Ok(classes)
}

pub fn class_name_for_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    Some(class_name_from_relative(&relative.to_string_lossy()))
}

/// `a/b/C.class` -> `a.b.C`
pub fn class_name_from_relative(relative: &str) -> String {
    let dotted = relative.replace(['/', '\\'], ".");
    let name = dotted
        .strip_suffix(".class")
        .unwrap_or(dotted.as_str());
    name.strip_prefix('.').unwrap_or(name).to_string()
}

pub fn class_name_to_class_path(class_name: &str) -> String {
    format!("{}.class", class_name.replace('.', "/"))
}

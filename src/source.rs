//! Byte sources that hand the resolver raw class-file contents by name.
//!
//! Each lookup opens and maps its file independently; the mapping lives
//! in the returned [`ClassBytes`] and is released when that is dropped,
//! whether or not the parse succeeds.

use memmap2::Mmap;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{Error, Result};
use crate::scan::class_name_to_class_path;

/// Upper bound on the buffer reserved up front for a jar entry.
const MAX_PREALLOCATION: u64 = 1 << 20;

/// Raw class-file contents plus the file or archive entry they came from.
pub struct ClassBytes {
    data: Data,
    origin: Option<PathBuf>,
}

enum Data {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl ClassBytes {
    pub fn owned(bytes: Vec<u8>) -> Self {
        Self {
            data: Data::Owned(bytes),
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<PathBuf>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// `None` for bytes that never lived on disk.
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }
}

impl Deref for ClassBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match &self.data {
            Data::Mapped(mmap) => &mmap[..],
            Data::Owned(bytes) => bytes,
        }
    }
}

pub trait ByteSource: Sync {
    /// `Ok(None)` when this source has no such class.
    fn find_class(&self, class_name: &str) -> Result<Option<ClassBytes>>;

    fn read_class(&self, class_name: &str) -> Result<ClassBytes> {
        self.find_class(class_name)?
            .ok_or_else(|| Error::ClassNotFound {
                class_name: class_name.to_string(),
            })
    }
}

/// A directory laid out as `a/b/C.class`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ByteSource for DirectorySource {
    fn find_class(&self, class_name: &str) -> Result<Option<ClassBytes>> {
        let path = self.root.join(class_name_to_class_path(class_name));
        if !path.is_file() {
            return Ok(None);
        }
        let bytes = match map_file(&path)? {
            Some(mmap) => ClassBytes {
                data: Data::Mapped(mmap),
                origin: None,
            },
            None => ClassBytes::owned(Vec::new()),
        };
        Ok(Some(bytes.with_origin(path)))
    }
}

#[derive(Debug, Clone)]
pub struct JarSource {
    jar_path: PathBuf,
}

impl JarSource {
    pub fn new(jar_path: impl Into<PathBuf>) -> Self {
        Self {
            jar_path: jar_path.into(),
        }
    }
}

impl ByteSource for JarSource {
    fn find_class(&self, class_name: &str) -> Result<Option<ClassBytes>> {
        let Some(mmap) = map_file(&self.jar_path)? else {
            return Ok(None);
        };
        let archive_err = |source| Error::Archive {
            path: self.jar_path.clone(),
            source,
        };
        let mut archive = ZipArchive::new(Cursor::new(&mmap[..])).map_err(archive_err)?;

        let entry_name = class_name_to_class_path(class_name);
        let mut entry = match archive.by_name(&entry_name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(archive_err(e)),
        };
        let mut bytes = Vec::with_capacity(initial_capacity(entry.size()));
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| Error::io(&self.jar_path, e))?;
        let origin = format!("{}!/{}", self.jar_path.display(), entry_name);
        Ok(Some(ClassBytes::owned(bytes).with_origin(origin)))
    }
}

#[derive(Debug, Clone)]
enum ClasspathEntry {
    Directory(DirectorySource),
    Jar(JarSource),
}

/// Output directory first, then classpath elements in order; the first
/// element holding the class wins.
#[derive(Debug, Clone)]
pub struct ClasspathSource {
    entries: Vec<ClasspathEntry>,
}

impl ClasspathSource {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            entries: vec![ClasspathEntry::Directory(DirectorySource::new(output_dir))],
        }
    }

    pub fn with_element(mut self, element: &Path) -> Self {
        if element.is_dir() {
            self.entries
                .push(ClasspathEntry::Directory(DirectorySource::new(element)));
        } else if element.is_file()
            && element
                .extension()
                .is_some_and(|e| e == "jar" || e == "zip")
        {
            self.entries.push(ClasspathEntry::Jar(JarSource::new(element)));
        } else {
            debug!(element = %element.display(), "skipping classpath element");
        }
        self
    }

    /// Number of elements consulted, the output directory included.
    pub fn element_count(&self) -> usize {
        self.entries.len()
    }
}

impl ByteSource for ClasspathSource {
    fn find_class(&self, class_name: &str) -> Result<Option<ClassBytes>> {
        for entry in &self.entries {
            let found = match entry {
                ClasspathEntry::Directory(dir) => dir.find_class(class_name)?,
                ClasspathEntry::Jar(jar) => jar.find_class(class_name)?,
            };
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }
}

/// Bytes already held in memory, keyed by dotted class name.
impl ByteSource for BTreeMap<String, Vec<u8>> {
    fn find_class(&self, class_name: &str) -> Result<Option<ClassBytes>> {
        Ok(self
            .get(class_name)
            .map(|bytes| ClassBytes::owned(bytes.clone())))
    }
}

/// The declared size comes from the archive header and is not trusted.
fn initial_capacity(declared: u64) -> usize {
    declared.min(MAX_PREALLOCATION) as usize
}

/// `Ok(None)` for an empty file, which cannot be mapped.
fn map_file(path: &Path) -> Result<Option<Mmap>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let len = file.metadata().map_err(|e| Error::io(path, e))?.len();
    if len == 0 {
        return Ok(None);
    }
    // SAFETY: The file is opened read-only and the mapping is owned by the
    // returned value, which outlives no longer than a single parse.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::io(path, e))?;
    Ok(Some(mmap))
}

//! The `META-INF/MANIFEST.MF` record naming the entry point.
//!
//! Output follows the JAR manifest rules: `Name: value` headers, CRLF
//! line endings, lines no longer than 72 bytes with continuation lines
//! starting with a single space, and a blank line closing the main
//! section.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Error, Result};

pub const MANIFEST_DIR: &str = "META-INF";
pub const MANIFEST_FILE: &str = "MANIFEST.MF";
pub const MANIFEST_VERSION: &str = "1.0";

const MANIFEST_VERSION_HEADER: &str = "Manifest-Version";
const MAIN_CLASS_HEADER: &str = "Main-Class";
const MAX_LINE_BYTES: usize = 72;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestRecord {
    manifest_version: String,
    main_class: String,
}

impl ManifestRecord {
    pub fn new(main_class: impl Into<String>) -> Self {
        Self::with_version(MANIFEST_VERSION, main_class)
    }

    pub fn with_version(manifest_version: impl Into<String>, main_class: impl Into<String>) -> Self {
        Self {
            manifest_version: manifest_version.into(),
            main_class: main_class.into(),
        }
    }

    pub fn manifest_version(&self) -> &str {
        &self.manifest_version
    }

    pub fn main_class(&self) -> &str {
        &self.main_class
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        write_header(&mut out, MANIFEST_VERSION_HEADER, &self.manifest_version);
        write_header(&mut out, MAIN_CLASS_HEADER, &self.main_class);
        out.push_str("\r\n");
        out
    }

    /// Reads the main section; `None` if either header is missing.
    pub fn parse(content: &str) -> Option<Self> {
        let mut headers: Vec<String> = Vec::new();
        for line in content.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if let Some(continued) = line.strip_prefix(' ') {
                if let Some(last) = headers.last_mut() {
                    last.push_str(continued);
                }
                continue;
            }
            if line.is_empty() {
                break;
            }
            headers.push(line.to_string());
        }

        let mut manifest_version = None;
        let mut main_class = None;
        for header in &headers {
            let Some((name, value)) = header.split_once(": ") else {
                continue;
            };
            if name.eq_ignore_ascii_case(MANIFEST_VERSION_HEADER) {
                manifest_version = Some(value.to_string());
            } else if name.eq_ignore_ascii_case(MAIN_CLASS_HEADER) {
                main_class = Some(value.to_string());
            }
        }

        Some(Self {
            manifest_version: manifest_version?,
            main_class: main_class?,
        })
    }

    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.render().as_bytes()))
    }

    /// Writes `META-INF/MANIFEST.MF` under `output_root`, replacing any
    /// existing file.
    pub fn write_to(&self, output_root: &Path) -> Result<PathBuf> {
        let path = manifest_path(output_root);
        let dir = output_root.join(MANIFEST_DIR);
        std::fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

        let mut tmp_os = path.as_os_str().to_os_string();
        tmp_os.push(".tmp");
        let tmp = PathBuf::from(tmp_os);
        std::fs::write(&tmp, self.render()).map_err(|e| Error::io(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(Error::io(&path, e));
        }

        info!(path = %path.display(), main_class = %self.main_class, "manifest written");
        Ok(path)
    }

    pub fn read_from(output_root: &Path) -> Result<Option<Self>> {
        let path = manifest_path(output_root);
        debug!(path = %path.display(), "reading manifest");
        let content = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        Ok(Self::parse(&content))
    }
}

pub fn manifest_path(output_root: &Path) -> PathBuf {
    output_root.join(MANIFEST_DIR).join(MANIFEST_FILE)
}

fn write_header(out: &mut String, name: &str, value: &str) {
    let line = format!("{name}: {value}");
    let mut rest = line.as_str();
    let mut limit = MAX_LINE_BYTES;
    while rest.len() > limit {
        let mut cut = limit;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        out.push_str(&rest[..cut]);
        out.push_str("\r\n ");
        rest = &rest[cut..];
        limit = MAX_LINE_BYTES - 1;
    }
    out.push_str(rest);
    out.push_str("\r\n");
}

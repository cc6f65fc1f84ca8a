//! # main-class-finder
//!
//! Finds the one class in a compiled output directory that carries the
//! framework's entry-point annotation and records it as `Main-Class` in
//! `META-INF/MANIFEST.MF`.
//!
//! ## Architecture
//!
//! - **scan**: Class file discovery and class-name derivation from paths
//! - **ownership**: Excludes framework-owned packages from the candidate set
//! - **classfile**: Class-file reader for declared names and type annotations
//! - **source**: Byte sources over output directories, jars and classpaths
//! - **resolve**: Entry-point selection and the resolve-and-emit pass
//! - **manifest**: JAR manifest rendering, parsing and writing
//! - **error**: Error taxonomy surfaced to the calling build step

pub mod classfile;
pub mod cli;
pub mod config;
pub mod error;
pub mod manifest;
pub mod ownership;
pub mod resolve;
pub mod scan;
pub mod source;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Error, ErrorKind, Result};

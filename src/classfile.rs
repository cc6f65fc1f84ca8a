//! Minimal reader for the JVM class-file format.
//!
//! Only what entry-point resolution needs is decoded: the header, the
//! constant pool, `this_class`, and the type-level annotation tables.
//! Fields and methods are stepped over without looking inside their
//! attributes, and annotation element values are skipped rather than
//! resolved.

use serde::Serialize;
use std::borrow::Cow;
use thiserror::Error;

pub const MAGIC: u32 = 0xCAFE_BABE;

/// JDK 1.0.2 through Java 26.
pub const MIN_MAJOR_VERSION: u16 = 45;
pub const MAX_MAJOR_VERSION: u16 = 70;

const MAX_ANNOTATION_DEPTH: usize = 64;

const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";
const RUNTIME_INVISIBLE_ANNOTATIONS: &str = "RuntimeInvisibleAnnotations";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassFileError {
    #[error("bad magic 0x{0:08X}, not a class file")]
    BadMagic(u32),

    #[error("unsupported class file version {major}.{minor}")]
    UnsupportedVersion { major: u16, minor: u16 },

    #[error("truncated at offset {offset}: {needed} more bytes needed")]
    Truncated { offset: usize, needed: usize },

    #[error("unknown constant pool tag {tag} at index {index}")]
    BadConstantTag { index: u16, tag: u8 },

    #[error("constant pool index {index} is not a {expected} entry")]
    BadConstantIndex { index: u16, expected: &'static str },

    #[error("constant pool entry {index} is not valid modified UTF-8")]
    InvalidUtf8 { index: u16 },

    #[error("unknown annotation element tag 0x{0:02X}")]
    BadElementTag(u8),

    #[error("annotation values nested deeper than {0} levels")]
    NestingTooDeep(usize),
}

/// What a class file says about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedClass {
    /// Dotted binary name read from `this_class`, e.g. `com.app.Main`.
    pub class_name: String,
    pub major_version: u16,
    pub minor_version: u16,
    /// Type-level annotation descriptors (`Lcom/app/Marker;`), visible
    /// ones first, each group in stored order.
    pub annotations: Vec<String>,
}

impl ParsedClass {
    pub fn has_annotation(&self, descriptor: &str) -> bool {
        self.annotations.iter().any(|a| a == descriptor)
    }
}

pub fn parse_class(bytes: &[u8]) -> Result<ParsedClass, ClassFileError> {
    let mut r = Reader::new(bytes);

    let magic = r.u32()?;
    if magic != MAGIC {
        return Err(ClassFileError::BadMagic(magic));
    }
    let minor_version = r.u16()?;
    let major_version = r.u16()?;
    if !(MIN_MAJOR_VERSION..=MAX_MAJOR_VERSION).contains(&major_version) {
        return Err(ClassFileError::UnsupportedVersion {
            major: major_version,
            minor: minor_version,
        });
    }

    let pool = ConstantPool::read(&mut r)?;

    r.skip(2)?; // access_flags
    let this_class = r.u16()?;
    let class_name = pool.class_name(this_class)?.replace('/', ".");
    r.skip(2)?; // super_class
    let interfaces = r.u16()? as usize;
    r.skip(interfaces * 2)?;

    skip_members(&mut r)?; // fields
    skip_members(&mut r)?; // methods

    let mut visible = Vec::new();
    let mut invisible = Vec::new();
    let attributes = r.u16()?;
    for _ in 0..attributes {
        let name_index = r.u16()?;
        let len = r.u32()? as usize;
        let body = r.take(len)?;
        match &*pool.utf8(name_index)? {
            RUNTIME_VISIBLE_ANNOTATIONS => read_annotation_table(body, &pool, &mut visible)?,
            RUNTIME_INVISIBLE_ANNOTATIONS => {
                read_annotation_table(body, &pool, &mut invisible)?
            }
            _ => {}
        }
    }
    visible.append(&mut invisible);

    Ok(ParsedClass {
        class_name,
        major_version,
        minor_version,
        annotations: visible,
    })
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ClassFileError> {
        let buf = self.buf;
        let rest = &buf[self.pos..];
        if rest.len() < n {
            return Err(ClassFileError::Truncated {
                offset: self.pos,
                needed: n - rest.len(),
            });
        }
        self.pos += n;
        Ok(&rest[..n])
    }

    fn skip(&mut self, n: usize) -> Result<(), ClassFileError> {
        self.take(n).map(|_| ())
    }

    fn u8(&mut self) -> Result<u8, ClassFileError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, ClassFileError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, ClassFileError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

enum Constant<'a> {
    Unusable,
    Utf8(&'a [u8]),
    Class { name_index: u16 },
    Other,
}

struct ConstantPool<'a> {
    entries: Vec<Constant<'a>>,
}

impl<'a> ConstantPool<'a> {
    fn read(r: &mut Reader<'a>) -> Result<Self, ClassFileError> {
        let count = r.u16()?;
        let mut entries = Vec::with_capacity(count as usize);
        entries.push(Constant::Unusable);

        let mut index = 1u16;
        while index < count {
            let tag = r.u8()?;
            let entry = match tag {
                1 => {
                    let len = r.u16()? as usize;
                    Constant::Utf8(r.take(len)?)
                }
                7 => Constant::Class {
                    name_index: r.u16()?,
                },
                // Integer, Float
                3 | 4 => {
                    r.skip(4)?;
                    Constant::Other
                }
                // Long and Double take two slots.
                5 | 6 => {
                    r.skip(8)?;
                    entries.push(Constant::Other);
                    entries.push(Constant::Unusable);
                    index = index.saturating_add(2);
                    continue;
                }
                // String, MethodType, Module, Package
                8 | 16 | 19 | 20 => {
                    r.skip(2)?;
                    Constant::Other
                }
                // Field/Method/InterfaceMethod refs, NameAndType, Dynamic, InvokeDynamic
                9 | 10 | 11 | 12 | 17 | 18 => {
                    r.skip(4)?;
                    Constant::Other
                }
                // MethodHandle
                15 => {
                    r.skip(3)?;
                    Constant::Other
                }
                _ => return Err(ClassFileError::BadConstantTag { index, tag }),
            };
            entries.push(entry);
            index += 1;
        }

        Ok(Self { entries })
    }

    fn utf8(&self, index: u16) -> Result<Cow<'a, str>, ClassFileError> {
        match self.entries.get(index as usize) {
            Some(Constant::Utf8(bytes)) => {
                decode_modified_utf8(*bytes).ok_or(ClassFileError::InvalidUtf8 { index })
            }
            _ => Err(ClassFileError::BadConstantIndex {
                index,
                expected: "Utf8",
            }),
        }
    }

    fn class_name(&self, index: u16) -> Result<Cow<'a, str>, ClassFileError> {
        match self.entries.get(index as usize) {
            Some(Constant::Class { name_index }) => self.utf8(*name_index),
            _ => Err(ClassFileError::BadConstantIndex {
                index,
                expected: "Class",
            }),
        }
    }
}

fn skip_members(r: &mut Reader<'_>) -> Result<(), ClassFileError> {
    let count = r.u16()?;
    for _ in 0..count {
        r.skip(6)?; // access_flags, name_index, descriptor_index
        let attributes = r.u16()?;
        for _ in 0..attributes {
            r.skip(2)?;
            let len = r.u32()? as usize;
            r.skip(len)?;
        }
    }
    Ok(())
}

fn read_annotation_table(
    body: &[u8],
    pool: &ConstantPool<'_>,
    out: &mut Vec<String>,
) -> Result<(), ClassFileError> {
    let mut r = Reader::new(body);
    let count = r.u16()?;
    for _ in 0..count {
        let type_index = r.u16()?;
        out.push(pool.utf8(type_index)?.into_owned());
        skip_element_pairs(&mut r, 0)?;
    }
    Ok(())
}

fn skip_element_pairs(r: &mut Reader<'_>, depth: usize) -> Result<(), ClassFileError> {
    let pairs = r.u16()?;
    for _ in 0..pairs {
        r.skip(2)?; // element_name_index
        skip_element_value(r, depth)?;
    }
    Ok(())
}

fn skip_element_value(r: &mut Reader<'_>, depth: usize) -> Result<(), ClassFileError> {
    if depth >= MAX_ANNOTATION_DEPTH {
        return Err(ClassFileError::NestingTooDeep(MAX_ANNOTATION_DEPTH));
    }
    match r.u8()? {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' | b'c' => r.skip(2),
        b'e' => r.skip(4),
        b'@' => {
            r.skip(2)?;
            skip_element_pairs(r, depth + 1)
        }
        b'[' => {
            let values = r.u16()?;
            for _ in 0..values {
                skip_element_value(r, depth + 1)?;
            }
            Ok(())
        }
        tag => Err(ClassFileError::BadElementTag(tag)),
    }
}

/// Class files store strings as "modified UTF-8": NUL is `C0 80` and
/// supplementary characters are encoded surrogate by surrogate.
fn decode_modified_utf8(bytes: &[u8]) -> Option<Cow<'_, str>> {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return Some(Cow::Borrowed(s));
    }

    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i] as u16;
        if b & 0x80 == 0 {
            units.push(b);
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            let b2 = continuation(bytes, i + 1)?;
            units.push(((b & 0x1F) << 6) | b2);
            i += 2;
        } else if b & 0xF0 == 0xE0 {
            let b2 = continuation(bytes, i + 1)?;
            let b3 = continuation(bytes, i + 2)?;
            units.push(((b & 0x0F) << 12) | (b2 << 6) | b3);
            i += 3;
        } else {
            return None;
        }
    }
    String::from_utf16(&units).ok().map(Cow::Owned)
}

fn continuation(bytes: &[u8], i: usize) -> Option<u16> {
    let b = *bytes.get(i)?;
    (b & 0xC0 == 0x80).then_some((b & 0x3F) as u16)
}

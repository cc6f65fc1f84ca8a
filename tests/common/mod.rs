#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const MARKER: &str = "Lcom/_7aske/grain/core/configuration/GrainApplication;";

pub fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!(
        "main_class_finder_it_{}_{}_{}",
        std::process::id(),
        nanos,
        name
    ))
}

/// Minimal class file declaring `class_name` with marker annotations.
pub fn class_bytes(class_name: &str, annotations: &[&str]) -> Vec<u8> {
    let mut pool: Vec<u8> = Vec::new();
    let mut next = 1u16;
    let mut utf8 = |pool: &mut Vec<u8>, s: &str| {
        pool.push(1);
        pool.extend_from_slice(&(s.len() as u16).to_be_bytes());
        pool.extend_from_slice(s.as_bytes());
        next += 1;
        next - 1
    };

    let this_name = utf8(&mut pool, &class_name.replace('.', "/"));
    let super_name = utf8(&mut pool, "java/lang/Object");
    let attr_name = utf8(&mut pool, "RuntimeVisibleAnnotations");
    let types: Vec<u16> = annotations.iter().map(|a| utf8(&mut pool, a)).collect();

    let this_class = next;
    pool.push(7);
    pool.extend_from_slice(&this_name.to_be_bytes());
    let super_class = next + 1;
    pool.push(7);
    pool.extend_from_slice(&super_name.to_be_bytes());
    let count = next + 2;

    let mut out = Vec::new();
    out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&61u16.to_be_bytes());
    out.extend_from_slice(&count.to_be_bytes());
    out.extend_from_slice(&pool);
    out.extend_from_slice(&0x0021u16.to_be_bytes());
    out.extend_from_slice(&this_class.to_be_bytes());
    out.extend_from_slice(&super_class.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // interfaces
    out.extend_from_slice(&0u16.to_be_bytes()); // fields
    out.extend_from_slice(&0u16.to_be_bytes()); // methods

    if types.is_empty() {
        out.extend_from_slice(&0u16.to_be_bytes());
        return out;
    }
    let mut body = Vec::new();
    body.extend_from_slice(&(types.len() as u16).to_be_bytes());
    for t in &types {
        body.extend_from_slice(&t.to_be_bytes());
        body.extend_from_slice(&0u16.to_be_bytes());
    }
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&attr_name.to_be_bytes());
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(&body);
    out
}

pub fn write_class(root: &Path, class_name: &str, bytes: &[u8]) {
    let path = root.join(format!("{}.class", class_name.replace('.', "/")));
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, bytes).unwrap();
}

pub fn write_jar(path: &Path, entries: &[(&str, &[u8])]) {
    use std::io::Write;
    use zip::write::FileOptions;

    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap();
}

//! Synthetic class files for unit tests.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) struct ClassFileBuilder {
    constants: Vec<u8>,
    next_index: u16,
    major: u16,
    this_class: u16,
    super_class: u16,
    fields: Vec<Vec<u8>>,
    visible: Vec<Vec<u8>>,
    invisible: Vec<Vec<u8>>,
    attributes: Vec<(u16, Vec<u8>)>,
}

impl ClassFileBuilder {
    pub(crate) fn new(class_name: &str) -> Self {
        let mut builder = Self {
            constants: Vec::new(),
            next_index: 1,
            major: 52,
            this_class: 0,
            super_class: 0,
            fields: Vec::new(),
            visible: Vec::new(),
            invisible: Vec::new(),
            attributes: Vec::new(),
        };
        builder.this_class = builder.class_constant(&class_name.replace('.', "/"));
        builder.super_class = builder.class_constant("java/lang/Object");
        builder
    }

    pub(crate) fn major(mut self, major: u16) -> Self {
        self.major = major;
        self
    }

    pub(crate) fn long_constant(mut self, value: i64) -> Self {
        self.constants.push(5);
        self.constants.extend_from_slice(&value.to_be_bytes());
        self.next_index += 2;
        self
    }

    pub(crate) fn field(mut self, name: &str, descriptor: &str) -> Self {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        let synthetic = self.utf8("Synthetic");
        let mut field = Vec::new();
        field.extend_from_slice(&0x0002u16.to_be_bytes());
        field.extend_from_slice(&name.to_be_bytes());
        field.extend_from_slice(&descriptor.to_be_bytes());
        field.extend_from_slice(&1u16.to_be_bytes());
        field.extend_from_slice(&synthetic.to_be_bytes());
        field.extend_from_slice(&0u32.to_be_bytes());
        self.fields.push(field);
        self
    }

    pub(crate) fn annotation(mut self, descriptor: &str) -> Self {
        let annotation = self.marker(descriptor);
        self.visible.push(annotation);
        self
    }

    pub(crate) fn invisible_annotation(mut self, descriptor: &str) -> Self {
        let annotation = self.marker(descriptor);
        self.invisible.push(annotation);
        self
    }

    /// Annotation carrying a string, an array of int/enum values and a
    /// nested annotation.
    pub(crate) fn annotation_with_values(mut self, descriptor: &str) -> Self {
        let type_index = self.utf8(descriptor);
        let value_name = self.utf8("value");
        let text = self.utf8("main");
        let tags_name = self.utf8("tags");
        let enum_type = self.utf8("Lcom/app/Mode;");
        let enum_const = self.utf8("FAST");
        let nested_name = self.utf8("nested");
        let nested_type = self.utf8("Lcom/app/Nested;");
        let flag_name = self.utf8("enabled");

        let mut a = Vec::new();
        a.extend_from_slice(&type_index.to_be_bytes());
        a.extend_from_slice(&3u16.to_be_bytes());

        a.extend_from_slice(&value_name.to_be_bytes());
        a.push(b's');
        a.extend_from_slice(&text.to_be_bytes());

        a.extend_from_slice(&tags_name.to_be_bytes());
        a.push(b'[');
        a.extend_from_slice(&2u16.to_be_bytes());
        a.push(b'I');
        a.extend_from_slice(&text.to_be_bytes());
        a.push(b'e');
        a.extend_from_slice(&enum_type.to_be_bytes());
        a.extend_from_slice(&enum_const.to_be_bytes());

        a.extend_from_slice(&nested_name.to_be_bytes());
        a.push(b'@');
        a.extend_from_slice(&nested_type.to_be_bytes());
        a.extend_from_slice(&1u16.to_be_bytes());
        a.extend_from_slice(&flag_name.to_be_bytes());
        a.push(b'Z');
        a.extend_from_slice(&text.to_be_bytes());

        self.visible.push(a);
        self
    }

    /// Constant-pool entry written verbatim, tag byte included.
    pub(crate) fn raw_constant(mut self, entry: &[u8]) -> Self {
        self.constants.extend_from_slice(entry);
        self.bump();
        self
    }

    /// Visible annotation whose `num_element_value_pairs` and pairs are
    /// written verbatim.
    pub(crate) fn raw_annotation(mut self, descriptor: &str, element_pairs: &[u8]) -> Self {
        let mut a = self.marker(descriptor);
        a.truncate(2);
        a.extend_from_slice(element_pairs);
        self.visible.push(a);
        self
    }

    pub(crate) fn raw_attribute(mut self, name: &str, body: &[u8]) -> Self {
        let name = self.utf8(name);
        self.attributes.push((name, body.to_vec()));
        self
    }

    pub(crate) fn build(mut self) -> Vec<u8> {
        if !self.visible.is_empty() {
            let name = self.utf8("RuntimeVisibleAnnotations");
            let body = annotation_table(&self.visible);
            self.attributes.push((name, body));
        }
        if !self.invisible.is_empty() {
            let name = self.utf8("RuntimeInvisibleAnnotations");
            let body = annotation_table(&self.invisible);
            self.attributes.push((name, body));
        }

        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&self.major.to_be_bytes());
        out.extend_from_slice(&self.next_index.to_be_bytes());
        out.extend_from_slice(&self.constants);
        out.extend_from_slice(&0x0021u16.to_be_bytes());
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // interfaces
        out.extend_from_slice(&(self.fields.len() as u16).to_be_bytes());
        for field in &self.fields {
            out.extend_from_slice(field);
        }
        out.extend_from_slice(&0u16.to_be_bytes()); // methods
        out.extend_from_slice(&(self.attributes.len() as u16).to_be_bytes());
        for (name, body) in &self.attributes {
            out.extend_from_slice(&name.to_be_bytes());
            out.extend_from_slice(&(body.len() as u32).to_be_bytes());
            out.extend_from_slice(body);
        }
        out
    }

    fn marker(&mut self, descriptor: &str) -> Vec<u8> {
        let type_index = self.utf8(descriptor);
        let mut a = Vec::new();
        a.extend_from_slice(&type_index.to_be_bytes());
        a.extend_from_slice(&0u16.to_be_bytes());
        a
    }

    fn utf8(&mut self, value: &str) -> u16 {
        self.constants.push(1);
        self.constants
            .extend_from_slice(&(value.len() as u16).to_be_bytes());
        self.constants.extend_from_slice(value.as_bytes());
        self.bump()
    }

    fn class_constant(&mut self, internal_name: &str) -> u16 {
        let name_index = self.utf8(internal_name);
        self.constants.push(7);
        self.constants.extend_from_slice(&name_index.to_be_bytes());
        self.bump()
    }

    fn bump(&mut self) -> u16 {
        let index = self.next_index;
        self.next_index += 1;
        index
    }
}

fn annotation_table(annotations: &[Vec<u8>]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&(annotations.len() as u16).to_be_bytes());
    for a in annotations {
        body.extend_from_slice(a);
    }
    body
}

pub(crate) fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!(
        "main_class_finder_test_{}_{}_{}",
        std::process::id(),
        nanos,
        name
    ))
}

pub(crate) fn write_class(root: &Path, class_name: &str, bytes: &[u8]) -> PathBuf {
    let path = root.join(format!("{}.class", class_name.replace('.', "/")));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, bytes).unwrap();
    path
}

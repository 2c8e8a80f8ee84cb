//! Resolution of fully-qualified schema type references to Rust paths.
//!
//! `.shop.Order` declared in the file being generated renders as `Order`;
//! the same type seen from another package renders through an import alias
//! (`shop::Order`). Nested messages follow the usual module convention:
//! `.shop.Order.Line` -> `order::Line`.

use std::collections::HashMap;

use crate::ir::{FileDescriptor, MessageDescriptor};
use crate::names::{camel_case, snake_case, symbol_case};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    /// Package the type is declared in.
    pub package: String,
    /// Name path inside the package, outermost first.
    pub path: Vec<String>,
}

impl TypeEntry {
    /// Name as seen from inside its own package, nested segments joined
    /// with `_` (`Order_Line`). This is the form enum `api` members use, so
    /// declared capitals are kept (`HTTPLoginReq`).
    pub fn schema_name(&self) -> String {
        self.path
            .iter()
            .map(|s| symbol_case(s))
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Rust path relative to the package module.
    pub fn rust_path(&self) -> String {
        let mut segments: Vec<String> = Vec::with_capacity(self.path.len());
        if let Some((last, parents)) = self.path.split_last() {
            segments.extend(parents.iter().map(|p| snake_case(p)));
            segments.push(camel_case(last));
        }
        segments.join("::")
    }

    /// First segment of [`rust_path`](Self::rust_path): the type name for a
    /// top-level type, the parent module for a nested one.
    pub fn root_name(&self) -> String {
        match self.path.as_slice() {
            [only] => camel_case(only),
            [outer, ..] => snake_case(outer),
            [] => String::new(),
        }
    }

    /// Module path of the package under `root` (`crate::shop::v1`).
    pub fn package_module(&self, root: &str) -> String {
        let mut module = root.to_string();
        for segment in self.package.split('.').filter(|s| !s.is_empty()) {
            module.push_str("::");
            module.push_str(&snake_case(segment));
        }
        module
    }
}

/// Every message and enum declared across the request, keyed by
/// fully-qualified name with a leading dot.
#[derive(Debug, Default)]
pub struct TypeIndex {
    entries: HashMap<String, TypeEntry>,
}

impl TypeIndex {
    pub fn build(files: &[FileDescriptor]) -> Self {
        let mut index = TypeIndex::default();
        for file in files {
            let prefix = if file.package.is_empty() {
                String::new()
            } else {
                format!(".{}", file.package)
            };
            for message in &file.message_type {
                index.insert_message(&file.package, &prefix, &[], message);
            }
            for en in &file.enum_type {
                index.insert(&file.package, &prefix, vec![en.name.clone()]);
            }
        }
        index
    }

    fn insert_message(
        &mut self,
        package: &str,
        prefix: &str,
        parents: &[String],
        message: &MessageDescriptor,
    ) {
        let mut path = parents.to_vec();
        path.push(message.name.clone());

        for nested in &message.nested_type {
            self.insert_message(package, prefix, &path, nested);
        }
        for en in &message.enum_type {
            let mut enum_path = path.clone();
            enum_path.push(en.name.clone());
            self.insert(package, prefix, enum_path);
        }
        self.insert(package, prefix, path);
    }

    fn insert(&mut self, package: &str, prefix: &str, path: Vec<String>) {
        let key = format!("{}.{}", prefix, path.join("."));
        self.entries.insert(
            key,
            TypeEntry {
                package: package.to_string(),
                path,
            },
        );
    }

    pub fn lookup(&self, fq_name: &str) -> Option<&TypeEntry> {
        self.entries.get(fq_name)
    }

    /// Every type declared in `package`, in no particular order.
    pub fn in_package<'s>(&'s self, package: &'s str) -> impl Iterator<Item = &'s TypeEntry> + 's {
        self.entries.values().filter(move |e| e.package == package)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

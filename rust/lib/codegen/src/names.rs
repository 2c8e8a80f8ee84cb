//! Identifier allocation for one generated file.
//!
//! Import aliases are allocated on demand and are stable per import path.
//! Derived symbol names (handlers, descriptors, registration functions) are
//! deterministic; claiming one twice is an error rather than a silent
//! overwrite.

use std::collections::{BTreeMap, HashMap};

use heck::{ToSnakeCase, ToUpperCamelCase};

use crate::error::{GenError, Result};

/// Per-file registry of every identifier the generator introduces.
#[derive(Debug)]
pub struct NameAllocator {
    file: String,
    /// import path -> alias
    aliases: BTreeMap<String, String>,
    /// identifier -> what it was allocated for
    taken: HashMap<String, String>,
}

impl NameAllocator {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            aliases: BTreeMap::new(),
            taken: HashMap::new(),
        }
    }

    /// Alias for `import_path`, derived from its last segment.
    pub fn alias_for(&mut self, import_path: &str) -> String {
        let base = alias_base(import_path);
        self.alias_with(import_path, &base)
    }

    /// Alias for `import_path`, preferring `preferred`. Idempotent: asking for
    /// a path that already has an alias returns that alias.
    pub fn alias_with(&mut self, import_path: &str, preferred: &str) -> String {
        if let Some(alias) = self.aliases.get(import_path) {
            return alias.clone();
        }

        let mut alias = preferred.to_string();
        let mut n = 1;
        while self.taken.contains_key(&alias) {
            alias = format!("{}{}", preferred, n);
            n += 1;
        }

        self.taken
            .insert(alias.clone(), format!("import {}", import_path));
        self.aliases.insert(import_path.to_string(), alias.clone());
        alias
    }

    /// Reserve a derived identifier. Fails if anything else in this file
    /// already uses the name.
    pub fn claim(&mut self, name: impl Into<String>, owner: impl Into<String>) -> Result<String> {
        let name = name.into();
        if let Some(existing) = self.taken.get(&name) {
            return Err(GenError::NameCollision {
                file: self.file.clone(),
                name,
                existing: existing.clone(),
            });
        }
        self.taken.insert(name.clone(), owner.into());
        Ok(name)
    }

    /// Mark a name the file already uses (a local type or module) so later
    /// aliases avoid it and later claims collide with it. Reserving an
    /// already-taken name keeps the first owner.
    pub fn reserve(&mut self, name: impl Into<String>, owner: impl Into<String>) {
        self.taken.entry(name.into()).or_insert_with(|| owner.into());
    }

    /// Registered imports as `(alias, path)`, ordered by alias.
    pub fn imports(&self) -> Vec<(&str, &str)> {
        let mut imports: Vec<(&str, &str)> = self
            .aliases
            .iter()
            .map(|(path, alias)| (alias.as_str(), path.as_str()))
            .collect();
        imports.sort();
        imports
    }
}

fn alias_base(import_path: &str) -> String {
    let last = import_path
        .trim_start_matches("::")
        .rsplit("::")
        .next()
        .unwrap_or_default();
    match last {
        "" | "crate" | "self" | "super" => "pkg".to_string(),
        other => {
            let snake = other.to_snake_case();
            if is_keyword(&snake) {
                format!("{}_", snake)
            } else {
                snake
            }
        }
    }
}

/// Rust type name for a schema message or enum (`HTTPStatus` -> `HttpStatus`).
pub fn camel_case(name: &str) -> String {
    let camel = name.to_upper_camel_case();
    if camel.is_empty() || camel.starts_with(|c: char| c.is_ascii_digit()) {
        format!("X{}", camel)
    } else {
        camel
    }
}

/// Upper camel case for derived symbols. Only the first letter of each
/// word is raised and existing capitals stay as written, so `get_url`
/// becomes `GetUrl` while `GetURL` and `HTTPLoginReq` are unchanged. A
/// leading underscore becomes `X`.
pub fn symbol_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 1);
    let mut i = 0;
    if chars.first() == Some(&'_') {
        out.push('X');
        i = 1;
    }
    while i < chars.len() {
        let c = chars[i];
        if c == '_' && chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase()) {
            i += 1;
            continue;
        }
        if c.is_ascii_digit() {
            out.push(c);
            i += 1;
            continue;
        }
        out.push(c.to_ascii_uppercase());
        while chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase()) {
            i += 1;
            out.push(chars[i]);
        }
        i += 1;
    }
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, 'X');
    }
    out
}

/// Schema name as a Rust function or module name.
pub fn snake_case(name: &str) -> String {
    rust_ident(&name.to_snake_case())
}

/// Escape Rust keywords. Keywords that cannot be raw identifiers get a
/// trailing underscore instead.
pub fn rust_ident(name: &str) -> String {
    match name {
        "self" | "Self" | "super" | "crate" => format!("{}_", name),
        _ if is_keyword(name) => format!("r#{}", name),
        _ => name.to_string(),
    }
}

fn is_keyword(s: &str) -> bool {
    matches!(
        s,
        "as" | "async"
            | "await"
            | "break"
            | "const"
            | "continue"
            | "crate"
            | "dyn"
            | "else"
            | "enum"
            | "extern"
            | "false"
            | "fn"
            | "for"
            | "gen"
            | "if"
            | "impl"
            | "in"
            | "let"
            | "loop"
            | "match"
            | "mod"
            | "move"
            | "mut"
            | "pub"
            | "ref"
            | "return"
            | "self"
            | "Self"
            | "static"
            | "struct"
            | "super"
            | "trait"
            | "true"
            | "try"
            | "type"
            | "unsafe"
            | "use"
            | "where"
            | "while"
            | "abstract"
            | "become"
            | "box"
            | "do"
            | "final"
            | "macro"
            | "override"
            | "priv"
            | "typeof"
            | "unsized"
            | "virtual"
            | "yield"
    )
}

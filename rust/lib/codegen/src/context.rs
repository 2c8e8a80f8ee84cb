use crate::config::GeneratorConfig;
use crate::error::{GenError, Result};
use crate::ir::FileDescriptor;
use crate::names::NameAllocator;
use crate::types::{TypeEntry, TypeIndex};

/// State for compiling one schema file. Created per file and dropped once
/// the file's text is produced; nothing here outlives the file.
pub struct FileContext<'a> {
    pub file: &'a FileDescriptor,
    pub config: &'a GeneratorConfig,
    pub names: NameAllocator,
    types: &'a TypeIndex,
    runtime: String,
}

impl<'a> FileContext<'a> {
    pub fn new(file: &'a FileDescriptor, config: &'a GeneratorConfig, types: &'a TypeIndex) -> Self {
        let mut names = NameAllocator::new(file.name.clone());
        // Same-package types render unqualified, so their names and the
        // modules of their nested types belong to this file too.
        for entry in types.in_package(&file.package) {
            names.reserve(entry.root_name(), format!("type {}", entry.path.join(".")));
        }
        let runtime = names.alias_with(config.runtime(), config.variant.runtime_alias());
        Self {
            file,
            config,
            names,
            types,
            runtime,
        }
    }

    /// Alias the runtime module is imported under in this file.
    pub fn runtime(&self) -> &str {
        &self.runtime
    }

    pub fn namespace(&self) -> &str {
        &self.file.package
    }

    fn entry(&self, fq_name: &str) -> Result<&'a TypeEntry> {
        self.types
            .lookup(fq_name)
            .ok_or_else(|| GenError::UnknownType {
                file: self.file.name.clone(),
                type_name: fq_name.to_string(),
            })
    }

    /// Rust path of a schema type as written in this file, importing the
    /// declaring package when it is not the file's own.
    pub fn rust_type(&mut self, fq_name: &str) -> Result<String> {
        let entry = self.entry(fq_name)?;
        if entry.package == self.file.package {
            return Ok(entry.rust_path());
        }
        let module = entry.package_module(&self.config.extern_root);
        let alias = self.names.alias_for(&module);
        Ok(format!("{}::{}", alias, entry.rust_path()))
    }

    /// Bare type name used to derive enum `api` member names.
    pub fn schema_name(&self, fq_name: &str) -> Result<String> {
        Ok(self.entry(fq_name)?.schema_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Variant;

    fn files() -> Vec<FileDescriptor> {
        serde_json::from_value(serde_json::json!([
            {"name": "shop.proto", "package": "shop", "message_type": [{"name": "Order"}]},
            {"name": "common.proto", "package": "common", "message_type": [{"name": "Empty"}]},
            {"name": "other.proto", "package": "billing.common", "message_type": [{"name": "Empty"}]}
        ]))
        .unwrap()
    }

    #[test]
    fn test_runtime_alias() {
        let files = files();
        let types = TypeIndex::build(&files);
        let config = GeneratorConfig::for_variant(Variant::Message);
        let ctx = FileContext::new(&files[0], &config, &types);
        assert_eq!(ctx.runtime(), "msg");
        assert_eq!(ctx.names.imports(), vec![("msg", "::protorpc::message")]);
    }

    #[test]
    fn test_rust_type_local_and_foreign() {
        let files = files();
        let types = TypeIndex::build(&files);
        let config = GeneratorConfig::default();
        let mut ctx = FileContext::new(&files[0], &config, &types);

        assert_eq!(ctx.rust_type(".shop.Order").unwrap(), "Order");
        assert_eq!(ctx.rust_type(".common.Empty").unwrap(), "common::Empty");
        assert_eq!(ctx.rust_type(".billing.common.Empty").unwrap(), "common1::Empty");
        assert_eq!(ctx.rust_type(".common.Empty").unwrap(), "common::Empty");
        assert_eq!(
            ctx.names.imports(),
            vec![
                ("common", "crate::common"),
                ("common1", "crate::billing::common"),
                ("rpc", "::protorpc::rpc"),
            ]
        );
    }

    #[test]
    fn test_local_nested_module_not_shadowed_by_alias() {
        let files: Vec<FileDescriptor> = serde_json::from_value(serde_json::json!([
            {"name": "shop.proto", "package": "shop",
             "message_type": [{"name": "Order", "nested_type": [{"name": "Line"}]}]},
            {"name": "order.proto", "package": "order", "message_type": [{"name": "Ack"}]}
        ]))
        .unwrap();
        let types = TypeIndex::build(&files);
        let config = GeneratorConfig::default();
        let mut ctx = FileContext::new(&files[0], &config, &types);

        assert_eq!(ctx.runtime(), "rpc");
        assert_eq!(ctx.rust_type(".shop.Order.Line").unwrap(), "order::Line");
        assert_eq!(ctx.rust_type(".order.Ack").unwrap(), "order1::Ack");
        assert_eq!(
            ctx.names.imports(),
            vec![("order1", "crate::order"), ("rpc", "::protorpc::rpc")]
        );
    }

    #[test]
    fn test_runtime_alias_avoids_local_module() {
        let files: Vec<FileDescriptor> = serde_json::from_value(serde_json::json!([
            {"name": "game.proto", "package": "game",
             "message_type": [{"name": "Msg", "nested_type": [{"name": "Body"}]}]}
        ]))
        .unwrap();
        let types = TypeIndex::build(&files);
        let config = GeneratorConfig::for_variant(Variant::Message);
        let ctx = FileContext::new(&files[0], &config, &types);
        assert_eq!(ctx.runtime(), "msg1");
    }

    #[test]
    fn test_unknown_type() {
        let files = files();
        let types = TypeIndex::build(&files);
        let config = GeneratorConfig::default();
        let mut ctx = FileContext::new(&files[0], &config, &types);
        assert!(matches!(
            ctx.rust_type(".shop.Missing"),
            Err(GenError::UnknownType { .. })
        ));
    }
}

//! Service-stub generator for schema-described RPC services.
//!
//! Takes a descriptor set (the plugin request) and produces one Rust source
//! file per input file that declares services. Four transport variants share
//! the same pipeline:
//!
//! 1. [`binding`] resolves each method to a message id or an HTTP route.
//! 2. [`table`] assembles the ordered dispatch table and rejects duplicates.
//! 3. [`emit`] writes handlers, registration functions and descriptors.
//!
//! Identifiers and imports for a file are allocated by a single
//! [`names::NameAllocator`], owned by the file's [`context::FileContext`].

pub mod binding;
pub mod config;
pub mod context;
pub mod emit;
pub mod error;
pub mod ir;
pub mod names;
pub mod table;
pub mod types;
pub mod writer;

use tracing::{debug, info};

pub use config::{GeneratorConfig, Variant};
pub use error::{GenError, Result};
pub use ir::{CodeGeneratorRequest, CodeGeneratorResponse, FileDescriptor, GeneratedFile};

use context::FileContext;
use types::TypeIndex;

/// Run one plugin invocation.
///
/// A parameter carried by the request is applied on top of `config`. Any
/// failure is reported through the response's `error` field, in which case
/// no files are returned.
pub fn generate(request: &CodeGeneratorRequest, config: &GeneratorConfig) -> CodeGeneratorResponse {
    match try_generate(request, config) {
        Ok(files) => CodeGeneratorResponse::success(files),
        Err(e) => {
            debug!(error = %e, "generation failed");
            CodeGeneratorResponse::failure(e.to_string())
        }
    }
}

/// Like [`generate`], but keeps the typed error.
pub fn try_generate(request: &CodeGeneratorRequest, config: &GeneratorConfig) -> Result<Vec<GeneratedFile>> {
    let mut config = config.clone();
    if let Some(parameter) = request.parameter.as_deref() {
        config.apply_parameter(parameter)?;
    }

    let types = TypeIndex::build(&request.proto_file);
    debug!(types = types.len(), variant = %config.variant, "indexed descriptor set");

    let mut files = Vec::new();
    for name in &request.file_to_generate {
        let file = request
            .file(name)
            .ok_or_else(|| GenError::UnknownFile(name.clone()))?;
        if let Some(generated) = generate_file(file, &config, &types)? {
            files.push(generated);
        }
    }

    info!(variant = %config.variant, files = files.len(), "generated");
    Ok(files)
}

/// Generate the output for one file, or `None` if it declares no services.
pub fn generate_file(
    file: &FileDescriptor,
    config: &GeneratorConfig,
    types: &TypeIndex,
) -> Result<Option<GeneratedFile>> {
    if file.service.is_empty() {
        debug!(file = %file.name, "no services, skipping");
        return Ok(None);
    }

    let mut ctx = FileContext::new(file, config, types);
    let services = file
        .service
        .iter()
        .map(|service| table::build(&mut ctx, service))
        .collect::<Result<Vec<_>>>()?;

    let content = emit::emit_file(&ctx, &services)?;
    let name = config.output_name(&file.name);
    debug!(file = %file.name, output = %name, services = services.len(), "emitted");

    Ok(Some(GeneratedFile { name, content }))
}

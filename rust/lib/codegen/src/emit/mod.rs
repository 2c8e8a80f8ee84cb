//! Handler and service-surface emission, one generator per transport variant.

pub mod http;
pub mod message;
pub mod proxy;

use std::fmt;

use crate::config::Variant;
use crate::context::FileContext;
use crate::error::Result;
use crate::table::GeneratedService;
use crate::writer::CodeWriter;

/// Emits the code for one already-built service.
pub trait Generator {
    fn name(&self) -> &str;

    /// `runtime` is the alias the runtime module is imported under.
    fn generate_service(
        &self,
        w: &mut CodeWriter,
        runtime: &str,
        service: &GeneratedService,
    ) -> fmt::Result;
}

pub fn generator_for(ctx: &FileContext<'_>) -> Box<dyn Generator> {
    match ctx.config.variant {
        Variant::Rpc | Variant::Message => Box::new(message::MessageIdGenerator),
        Variant::Http => Box::new(http::HttpGenerator {
            tracing: ctx.config.tracing,
        }),
        Variant::Proxy => Box::new(proxy::ProxyGenerator),
    }
}

/// Assemble the whole file: header, imports, then every service in order.
///
/// Must run after all services are built, since building is what registers
/// the imports.
pub fn emit_file(ctx: &FileContext<'_>, services: &[GeneratedService]) -> Result<String> {
    let generator = generator_for(ctx);
    let mut w = CodeWriter::new();

    w.comment(&format!(
        "Code generated by protorpc-gen ({}). DO NOT EDIT.",
        generator.name()
    ))?;
    w.comment(&format!("source: {}", ctx.file.name))?;
    w.blank()?;

    for (alias, path) in ctx.names.imports() {
        w.line("#[allow(unused_imports)]")?;
        if path.rsplit("::").next() == Some(alias) {
            w.line(&format!("use {};", path))?;
        } else {
            w.line(&format!("use {} as {};", path, alias))?;
        }
    }

    for service in services {
        w.blank()?;
        generator.generate_service(&mut w, ctx.runtime(), service)?;
    }

    Ok(w.into_string())
}

/// Rust string literal for `s`.
pub(crate) fn quote(s: &str) -> String {
    format!("{:?}", s)
}

/// Method signature shared by the generated server traits.
pub(crate) fn trait_method(
    w: &mut CodeWriter,
    runtime: &str,
    rust_name: &str,
    input: &str,
    output: &str,
) -> fmt::Result {
    w.line(&format!(
        "fn {}(&self, ctx: {}::Context, req: {}) -> Result<{}, {}::Error>;",
        rust_name, runtime, input, output, runtime
    ))
}

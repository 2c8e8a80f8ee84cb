use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GenError, Result};

/// Transport flavour the generator emits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Numeric message ids declared directly on each method.
    #[default]
    Rpc,
    /// Numeric message ids looked up in the file's `api` enum.
    Message,
    /// Plain HTTP server, one route per method.
    Http,
    /// HTTP entry point forwarding to a typed client.
    #[serde(alias = "grpc_http_proxy")]
    Proxy,
}

impl Variant {
    pub fn name(self) -> &'static str {
        match self {
            Variant::Rpc => "rpc",
            Variant::Message => "message",
            Variant::Http => "http",
            Variant::Proxy => "grpc_http_proxy",
        }
    }

    /// Module path of the runtime the generated code is written against.
    pub fn default_runtime(self) -> &'static str {
        match self {
            Variant::Rpc => "::protorpc::rpc",
            Variant::Message => "::protorpc::message",
            Variant::Http => "::protorpc::web",
            Variant::Proxy => "::protorpc::grpc_http_proxy",
        }
    }

    /// Alias the runtime module is imported under.
    pub fn runtime_alias(self) -> &'static str {
        match self {
            Variant::Rpc => "rpc",
            Variant::Message => "msg",
            Variant::Http => "web",
            Variant::Proxy => "proxy",
        }
    }

    pub fn default_suffix(self) -> &'static str {
        match self {
            Variant::Rpc => "rpc",
            Variant::Message => "message",
            Variant::Http => "http",
            Variant::Proxy => "proxy",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rpc" => Ok(Variant::Rpc),
            "message" | "msg" => Ok(Variant::Message),
            "http" => Ok(Variant::Http),
            "proxy" | "grpc_http_proxy" => Ok(Variant::Proxy),
            other => Err(GenError::InvalidParameter(format!(
                "unknown variant '{}' (expected rpc, message, http or proxy)",
                other
            ))),
        }
    }
}

/// Generator configuration.
///
/// Layered from lowest to highest precedence: defaults, a TOML file, the
/// plugin parameter string, then command-line flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub variant: Variant,

    /// Runtime module path. Defaults to the variant's own module.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_path: Option<String>,

    /// Module under which other packages' types live (`<root>::<pkg>::<Type>`).
    pub extern_root: String,

    /// Output file suffix. Defaults to the variant's short name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_suffix: Option<String>,

    /// Emit `tracing::debug!` events inside generated HTTP handlers.
    pub tracing: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            runtime_path: None,
            extern_root: "crate".to_string(),
            file_suffix: None,
            tracing: false,
        }
    }
}

impl GeneratorConfig {
    pub fn for_variant(variant: Variant) -> Self {
        Self {
            variant,
            ..Default::default()
        }
    }

    /// Parse a TOML config document.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply a plugin parameter string.
    ///
    /// Supported keys:
    /// - `variant=rpc|message|http|proxy`
    /// - `runtime=PATH`
    /// - `extern_root=PATH`
    /// - `suffix=SUFFIX`
    /// - `tracing=true|false`
    pub fn apply_parameter(&mut self, parameter: &str) -> Result<()> {
        for pair in parameter.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| GenError::InvalidParameter(format!("expected key=value, got '{}'", pair)))?;
            let value = value.trim();
            match key.trim() {
                "variant" => self.variant = value.parse()?,
                "runtime" => self.runtime_path = Some(value.to_string()),
                "extern_root" => self.extern_root = value.to_string(),
                "suffix" => self.file_suffix = Some(value.to_string()),
                "tracing" => {
                    self.tracing = value.parse().map_err(|_| {
                        GenError::InvalidParameter(format!("tracing expects true or false, got '{}'", value))
                    })?
                }
                other => {
                    return Err(GenError::InvalidParameter(format!("unknown key '{}'", other)));
                }
            }
        }
        Ok(())
    }

    pub fn runtime(&self) -> &str {
        self.runtime_path
            .as_deref()
            .unwrap_or_else(|| self.variant.default_runtime())
    }

    pub fn suffix(&self) -> &str {
        self.file_suffix
            .as_deref()
            .unwrap_or_else(|| self.variant.default_suffix())
    }

    /// `shop/order.proto` -> `shop/order.rpc.rs`.
    pub fn output_name(&self, input: &str) -> String {
        let (dir, file) = match input.rfind('/') {
            Some(idx) => input.split_at(idx + 1),
            None => ("", input),
        };
        let stem = match file.rfind('.') {
            Some(idx) if idx > 0 => &file[..idx],
            _ => file,
        };
        format!("{}{}.{}.rs", dir, stem, self.suffix())
    }
}

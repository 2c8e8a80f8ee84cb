/// Plugin protocol - the schema tree handed to the generator and the files it
/// hands back.
///
/// The shapes follow the host compiler's descriptor model closely enough that a
/// schema reader can serialize straight into them. Every collection defaults to
/// empty so hand-written fixtures stay short.

use serde::{Deserialize, Serialize};

/// Name of the companion enumeration that carries indirect message ids.
pub const API_ENUM: &str = "api";

/// One invocation of the generator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeGeneratorRequest {
    /// Files the caller asked for. Everything else in `proto_file` is a dependency.
    pub file_to_generate: Vec<String>,
    /// Raw plugin parameter string (`key=value,key=value`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    /// Every parsed file, dependencies included.
    pub proto_file: Vec<FileDescriptor>,
}

impl CodeGeneratorRequest {
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    /// Look up a parsed file by its name.
    pub fn file(&self, name: &str) -> Option<&FileDescriptor> {
        self.proto_file.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDescriptor {
    pub name: String,
    /// Namespace shared by every type and service declared in the file.
    pub package: String,
    pub message_type: Vec<MessageDescriptor>,
    pub enum_type: Vec<EnumDescriptor>,
    pub service: Vec<ServiceDescriptor>,
}

impl FileDescriptor {
    /// The top-level `api` enumeration, if the file declares one.
    pub fn api_enum(&self) -> Option<&EnumDescriptor> {
        self.enum_type.iter().find(|e| e.name == API_ENUM)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageDescriptor {
    pub name: String,
    pub nested_type: Vec<MessageDescriptor>,
    pub enum_type: Vec<EnumDescriptor>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumDescriptor {
    pub name: String,
    pub value: Vec<EnumValue>,
}

impl EnumDescriptor {
    pub fn member(&self, name: &str) -> Option<&EnumValue> {
        self.value.iter().find(|v| v.name == name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceDescriptor {
    pub name: String,
    /// Methods in declaration order.
    pub method: Vec<MethodDescriptor>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodDescriptor {
    pub name: String,
    /// Fully-qualified request type, e.g. `.shop.CreateOrderReq`.
    pub input_type: String,
    /// Fully-qualified response type.
    pub output_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<MethodOptions>,
}

impl MethodDescriptor {
    pub fn http_rule(&self) -> Option<&HttpRule> {
        self.options.as_ref().and_then(|o| o.http.as_ref())
    }

    pub fn declared_id(&self) -> Option<u32> {
        self.options.as_ref().and_then(|o| o.id)
    }

    pub fn is_notify(&self) -> bool {
        self.options.as_ref().is_some_and(|o| o.notify)
    }
}

/// Transport metadata attached to a method by the annotation step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    /// One-way server push; excluded from the request table.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub notify: bool,
}

/// Verb-to-path-template fields. Empty means unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpRule {
    pub get: String,
    pub put: String,
    pub post: String,
    pub delete: String,
    pub patch: String,
}

/// Result of one invocation: either files or an error, never both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeGeneratorResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub file: Vec<GeneratedFile>,
}

impl CodeGeneratorResponse {
    pub fn success(file: Vec<GeneratedFile>) -> Self {
        Self { error: None, file }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            file: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub name: String,
    pub content: String,
}

use thiserror::Error;

/// Fatal generation error. Any of these aborts the whole request; nothing is
/// emitted for any file.
///
/// `method` fields use the `<Service>.<Method>` form and `file` fields the
/// schema file name, so the rendered message is a one-line diagnostic.
#[derive(Error, Debug)]
pub enum GenError {
    #[error("{file}: {method}: no http method matches")]
    NoHttpMethod { file: String, method: String },

    #[error("{file}: {method}: missing message id")]
    MissingMessageId { file: String, method: String },

    #[error("{file}: {method}: cannot find bind inType {type_name}'s id (expected member E_{type_name} in enum api)")]
    UnknownApiId {
        file: String,
        method: String,
        type_name: String,
    },

    #[error("{file}: enum api member {member} has invalid id {number}")]
    InvalidApiId {
        file: String,
        member: String,
        number: i32,
    },

    #[error("{file}: unknown type {type_name}")]
    UnknownType { file: String, type_name: String },

    #[error("{file}: generated name {name} is already used by {existing}")]
    NameCollision {
        file: String,
        name: String,
        existing: String,
    },

    #[error("{file}: service {service}: {route} is bound by both {first} and {second}")]
    DuplicateRoute {
        file: String,
        service: String,
        route: String,
        first: String,
        second: String,
    },

    #[error("file to generate not found in request: {0}")]
    UnknownFile(String),

    #[error("invalid plugin parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to write generated code")]
    Format(#[from] std::fmt::Error),
}

pub type Result<T> = std::result::Result<T, GenError>;

use ducktype_types::error::InvocationError;
use thiserror::Error;

/// Structural mismatch found while building a proxy type. Any of these aborts the build.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    #[error("Shape type '{0}' is not visible to the proxy assembly")]
    ShapeNotVisible(String),
    #[error("Type '{0}' cannot be used as a shape")]
    InvalidShapeKind(String),
    #[error("No target member on '{target}' matches the shape member '{member}'")]
    TargetMemberNotFound { member: String, target: String },
    #[error("Target method '{target_member}' is missing the parameter '{parameter}' declared by the shape")]
    TargetParameterMissing {
        target_member: String,
        parameter: String,
    },
    #[error("Shape method '{shape_member}' is missing the parameter '{parameter}' required by the target")]
    ShapeParameterMissing {
        shape_member: String,
        parameter: String,
    },
    #[error("Parameter passing modes of '{shape_member}' and '{target_member}' do not match")]
    SignatureMismatch {
        shape_member: String,
        target_member: String,
    },
    #[error("Generic shape method '{member}' cannot be bound on '{target}' because the target type is not accessible")]
    UnsupportedGenericOnInaccessibleType { member: String, target: String },
    #[error("Target field '{0}' is read-only and cannot back a setter")]
    FieldIsReadonly(String),
    #[error("Target property '{0}' has no getter")]
    PropertyCantBeRead(String),
    #[error("Target property '{0}' has no setter")]
    PropertyCantBeWritten(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DuckTypeError {
    #[error("Cannot create a '{shape}' proxy over a null instance")]
    ArgumentNull { shape: String },
    #[error("Values of type '{actual}' cannot be wrapped")]
    UnsupportedTarget { actual: String },
    #[error("Shape '{shape}' is a struct; wrap it to obtain a copy instead of a proxy")]
    CopyShape { shape: String },
    #[error("Failed to copy '{shape}' from the target instance: {source}")]
    CopyFailed {
        shape: String,
        #[source]
        source: InvocationError,
    },
    #[error("Failed to build a '{shape}' proxy over '{target}': {source}")]
    BuildAborted {
        shape: String,
        target: String,
        #[source]
        source: BuildError,
    },
}

impl DuckTypeError {
    pub fn build_error(&self) -> Option<&BuildError> {
        match self {
            DuckTypeError::BuildAborted { source, .. } => Some(source),
            _ => None,
        }
    }
}

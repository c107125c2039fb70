use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvocationError {
    #[error("Unable to cast object of type '{actual}' to type '{expected}'")]
    InvalidCast { expected: String, actual: String },
    #[error("Null cannot be assigned to a slot of value type '{0}'")]
    NullValueType(String),
    #[error("Null instance while accessing '{0}'")]
    NullReference(String),
    #[error("'{member}' expects {expected} arguments but received {actual}")]
    ArgumentCount {
        member: String,
        expected: usize,
        actual: usize,
    },
    #[error("No member '{member}' on '{owner}' accepts the supplied arguments")]
    MemberNotFound { owner: String, member: String },
    #[error("'{0}' has no implementation")]
    NoImplementation(String),
    #[error("Duck chaining failed: {0}")]
    DuckChain(String),
    #[error("{0}")]
    Exception(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypeDefinitionError {
    #[error("Type '{0}' has already been defined")]
    AlreadyDefined(String),
}

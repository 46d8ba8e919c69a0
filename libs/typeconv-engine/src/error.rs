use typeconv_api::error::LeafError;
use typeconv_api::value::TypeKey;

/// Failure of a single conversion call. Never leaves the registry in a changed state.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("type not registered: no conversions from {0}")]
    TypeNotRegistered(TypeKey),

    #[error("conversion not defined from {from} to {to}")]
    ConversionNotDefined { from: TypeKey, to: TypeKey },

    #[error("conversion failed to {to} from {from} for value [{value}]: {cause}")]
    ConversionFailed {
        to: TypeKey,
        from: TypeKey,
        value: String,
        #[source]
        cause: LeafError,
    },

    #[error("conversion to {expected} produced a value of type {actual}")]
    UnexpectedResult { expected: TypeKey, actual: TypeKey },
}

/// Rejected type registration. The table is untouched when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("bridge type {0} is not registered")]
    BridgeNotRegistered(TypeKey),

    #[error("bridge type {bridge} has {actual} of {expected} conversions")]
    BridgeIncomplete { bridge: TypeKey, actual: usize, expected: usize },

    #[error("type {0} is already registered")]
    AlreadyRegistered(TypeKey),
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("registration error: {0}")]
    Registration(#[from] RegistrationError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Add context to the error.
    ///
    /// For `Config`, context is prepended to the message; other variants pass through.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            EngineError::Config(msg) => EngineError::Config(format!("{ctx}: {msg}")),
            other => other,
        }
    }
}

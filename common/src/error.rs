use crate::amount::AmountError;
use crate::field::Field;
use crate::operation::Operation;
use crate::store::StoreError;
use crate::terms::Signal;
use thiserror::Error;

/// Why an operation was rejected. Every variant is detected before any write
/// is committed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("expected {expected} argument(s), got {got}")]
    InvalidArgumentCount { expected: usize, got: usize },

    #[error("invalid decimal for {field}: {source}")]
    InvalidDecimal { field: Field, source: AmountError },

    #[error("{field} must be strictly positive, got `{value}`")]
    NonPositiveQuantity { field: Field, value: String },

    #[error("contract terms are already initialized")]
    AlreadyInitialized,

    #[error("contract is not initialized: {field} is absent")]
    NotInitialized { field: Field },

    #[error("quantity mismatch: expected {expected}, got {got}")]
    QuantityMismatch { expected: String, got: String },

    #[error("first period has already been delivered")]
    AlreadyDelivered,

    #[error("first period has not been delivered yet")]
    FirstPeriodNotDelivered,

    #[error("unsupported signal value `{0}`, expected 0 or 1")]
    InvalidSignalValue(String),

    #[error("signal is already set to {0}")]
    SignalAlreadySet(Signal),

    #[error("signal has not been recorded")]
    SignalNotSet,

    #[error("second period has already been realized")]
    AlreadyRealized,

    #[error("unknown field `{0}`")]
    UnknownField(String),

    #[error("arithmetic overflow while updating {field}")]
    ArithmeticOverflow { field: Field },

    #[error("stored value for `{key}` is corrupt: {reason}")]
    CorruptState { key: String, reason: String },

    #[error("store failure on `{key}`: {reason}")]
    StoreFailure { key: String, reason: String },
}

impl From<StoreError> for ErrorKind {
    fn from(err: StoreError) -> Self {
        ErrorKind::StoreFailure {
            key: err.key().to_string(),
            reason: err.to_string(),
        }
    }
}

/// The structured failure returned to whoever submitted an invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvocationError {
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("{operation} failed: {kind}")]
    Failed { operation: Operation, kind: ErrorKind },
}

impl InvocationError {
    pub fn kind(&self) -> Option<&ErrorKind> {
        match self {
            InvocationError::UnsupportedOperation(_) => None,
            InvocationError::Failed { kind, .. } => Some(kind),
        }
    }

    pub fn operation(&self) -> Option<Operation> {
        match self {
            InvocationError::UnsupportedOperation(_) => None,
            InvocationError::Failed { operation, .. } => Some(*operation),
        }
    }
}

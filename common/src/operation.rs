use crate::error::InvocationError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Initialize,
    DeliverFirstPeriod,
    RecordSignal,
    RealizeSecondPeriod,
    QueryField,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Initialize,
        Operation::DeliverFirstPeriod,
        Operation::RecordSignal,
        Operation::RealizeSecondPeriod,
        Operation::QueryField,
    ];

    /// Wire name used when submitting an invocation.
    pub fn name(self) -> &'static str {
        match self {
            Operation::Initialize => "initialize",
            Operation::DeliverFirstPeriod => "deliverFirstPeriod",
            Operation::RecordSignal => "recordSignal",
            Operation::RealizeSecondPeriod => "realizeSecondPeriod",
            Operation::QueryField => "queryField",
        }
    }

    /// Accepts the wire names plus the command names used by the first
    /// deployment of this contract (`deploy`, `sendGoods`, `signal`,
    /// `realize`, `query`).
    pub fn from_name(name: &str) -> Option<Operation> {
        let operation = match name {
            "deploy" => Operation::Initialize,
            "sendGoods" => Operation::DeliverFirstPeriod,
            "signal" => Operation::RecordSignal,
            "realize" => Operation::RealizeSecondPeriod,
            "query" => Operation::QueryField,
            other => return Operation::ALL.into_iter().find(|op| op.name() == other),
        };
        Some(operation)
    }

    pub fn arity(self) -> usize {
        match self {
            Operation::Initialize => 6,
            Operation::DeliverFirstPeriod | Operation::RecordSignal | Operation::QueryField => 1,
            Operation::RealizeSecondPeriod => 0,
        }
    }

    pub fn is_mutating(self) -> bool {
        !matches!(self, Operation::QueryField)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A function name plus positional string arguments, as submitted to the
/// ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub function: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new<I, A>(function: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            function: function.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds an invocation from an argv-style list whose first element is the
    /// function name. Returns `None` for an empty list.
    pub fn from_argv<I, A>(argv: I) -> Option<Self>
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        let mut argv = argv.into_iter().map(Into::into);
        let function = argv.next()?;
        Some(Self {
            function,
            args: argv.collect(),
        })
    }

    pub fn initialize(terms: [&str; 6]) -> Self {
        Self::new(Operation::Initialize.name(), terms)
    }

    pub fn deliver_first_period(quantity: &str) -> Self {
        Self::new(Operation::DeliverFirstPeriod.name(), [quantity])
    }

    pub fn record_signal(value: &str) -> Self {
        Self::new(Operation::RecordSignal.name(), [value])
    }

    pub fn realize_second_period() -> Self {
        Self::new(Operation::RealizeSecondPeriod.name(), Vec::<String>::new())
    }

    pub fn query_field(name: &str) -> Self {
        Self::new(Operation::QueryField.name(), [name])
    }

    pub fn operation(&self) -> Result<Operation, InvocationError> {
        Operation::from_name(&self.function)
            .ok_or_else(|| InvocationError::UnsupportedOperation(self.function.clone()))
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.function)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

use crate::output::{print_output, OutputFormat};
use crate::storage::Storage;
use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use std::fmt;
use supply_core::{Invocation, Operation};
use tracing::debug;

/// Commands that submit an invocation to the contract.
#[derive(Subcommand)]
pub enum ContractCommands {
    /// Record the six contract terms and open the balances
    Init {
        /// First-period quantity
        #[arg(allow_hyphen_values = true)]
        quantity_1: String,
        /// First-period payment
        #[arg(allow_hyphen_values = true)]
        payment_1: String,
        /// Second-period quantity when the signal is 0
        #[arg(allow_hyphen_values = true)]
        quantity_2s0: String,
        /// Second-period payment when the signal is 0
        #[arg(allow_hyphen_values = true)]
        payment_2s0: String,
        /// Second-period quantity when the signal is 1
        #[arg(allow_hyphen_values = true)]
        quantity_2s1: String,
        /// Second-period payment when the signal is 1
        #[arg(allow_hyphen_values = true)]
        payment_2s1: String,
    },
    /// Deliver the first-period goods
    Deliver {
        /// Delivered quantity, must equal quantity_1
        #[arg(allow_hyphen_values = true)]
        quantity: String,
    },
    /// Record the binary signal (0 or 1)
    Signal {
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Settle the second period according to the recorded signal
    Realize,
    /// Read one stored field
    Query { field: String },
    /// Submit a raw invocation by function name
    Invoke {
        /// Function name, e.g. deliverFirstPeriod
        function: String,
        /// Positional string arguments
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

impl ContractCommands {
    fn into_invocation(self) -> Invocation {
        match self {
            ContractCommands::Init {
                quantity_1,
                payment_1,
                quantity_2s0,
                payment_2s0,
                quantity_2s1,
                payment_2s1,
            } => Invocation::new(
                Operation::Initialize.name(),
                [
                    quantity_1,
                    payment_1,
                    quantity_2s0,
                    payment_2s0,
                    quantity_2s1,
                    payment_2s1,
                ],
            ),
            ContractCommands::Deliver { quantity } => Invocation::deliver_first_period(&quantity),
            ContractCommands::Signal { value } => Invocation::record_signal(&value),
            ContractCommands::Realize => Invocation::realize_second_period(),
            ContractCommands::Query { field } => Invocation::query_field(&field),
            ContractCommands::Invoke { function, args } => Invocation::new(function, args),
        }
    }
}

#[derive(Serialize)]
struct InvocationResult {
    operation: &'static str,
    args: Vec<String>,
    result: String,
}

impl fmt::Display for InvocationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.result)
    }
}

pub fn execute(command: ContractCommands, storage: &Storage, format: OutputFormat) -> Result<()> {
    let invocation = command.into_invocation();
    let operation = invocation.operation()?;

    let mut state = storage.load()?;
    let result = state.apply(&invocation)?;
    if operation.is_mutating() {
        storage.save(&state)?;
    } else {
        debug!(%operation, "read-only, state not rewritten");
    }

    let output = InvocationResult {
        operation: operation.name(),
        args: invocation.args,
        result,
    };
    print_output(&output, format)
}

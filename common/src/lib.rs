pub mod amount;
pub mod contract_state;
pub mod error;
pub mod field;
pub mod ledger;
pub mod machine;
pub mod operation;
pub mod snapshot;
pub mod store;
pub mod terms;

pub use amount::Amount;
pub use contract_state::{ContractParameters, ContractState, ContractSummary};
pub use error::{ErrorKind, InvocationError};
pub use field::Field;
pub use operation::{Invocation, Operation};
pub use snapshot::{ContractSnapshot, Stage};
pub use store::{LedgerStore, MemoryStore};
pub use terms::{ContractTerms, Signal};

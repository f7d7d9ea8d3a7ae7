//! Hosts the state machine on top of a [`LedgerStore`].
//!
//! An invocation runs against a [`Transaction`]; its write set is then applied
//! to a copy of the store, which replaces the original only once every `put`
//! has succeeded.

use crate::error::{ErrorKind, InvocationError};
use crate::field::Field;
use crate::machine;
use crate::operation::{Invocation, Operation};
use crate::store::{LedgerStore, StoreError, Transaction, WriteSet};
use tracing::{debug, info, warn};

pub fn invoke<S: LedgerStore + Clone>(
    store: &mut S,
    invocation: &Invocation,
) -> Result<String, InvocationError> {
    let operation = invocation.operation().inspect_err(|_| {
        warn!(function = %invocation.function, "unsupported operation");
    })?;
    debug!(%operation, args = ?invocation.args, "invoking");

    let reject = |kind: ErrorKind| {
        warn!(%operation, error = %kind, "invocation rejected");
        InvocationError::Failed { operation, kind }
    };

    let mut tx = Transaction::new(&*store);
    let result = machine::execute(&mut tx, operation, &invocation.args).map_err(reject)?;
    let writes = tx.into_writes();

    if !writes.is_empty() {
        let written = writes.len();
        commit(store, writes).map_err(|e| reject(e.into()))?;
        info!(%operation, written, "invocation committed");
    }
    Ok(result)
}

/// Read-only access to a single field; never touches the store.
pub fn query<S: LedgerStore + ?Sized>(store: &S, field: Field) -> Result<String, InvocationError> {
    let mut tx = Transaction::new(store);
    machine::execute(&mut tx, Operation::QueryField, &[field.key().to_string()]).map_err(|kind| {
        InvocationError::Failed {
            operation: Operation::QueryField,
            kind,
        }
    })
}

fn commit<S: LedgerStore + Clone>(store: &mut S, writes: WriteSet) -> Result<(), StoreError> {
    let mut next = store.clone();
    for (key, value) in writes {
        next.put(&key, value)?;
    }
    *store = next;
    Ok(())
}

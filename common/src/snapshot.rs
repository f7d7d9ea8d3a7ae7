use crate::amount::Amount;
use crate::error::ErrorKind;
use crate::field::Field;
use crate::machine::{load_terms, read_amount, read_flag, read_signal};
use crate::store::{LedgerStore, Transaction};
use crate::terms::{ContractTerms, Signal};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Where a contract stands in its lifecycle.
///
/// Delivery and signal recording may happen in either order; both are needed
/// before the second period can be realized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Uninitialized,
    Created,
    Delivered,
    SignalRecorded,
    ReadyToRealize,
    Realized,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Uninitialized => "uninitialized",
            Stage::Created => "created",
            Stage::Delivered => "delivered",
            Stage::SignalRecorded => "signal recorded",
            Stage::ReadyToRealize => "ready to realize",
            Stage::Realized => "realized",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("contract data is present without contract terms")]
    MissingTerms,

    #[error("{0} is missing")]
    MissingBalance(Field),

    #[error("{field} is {actual}, expected {expected}")]
    BalanceMismatch {
        field: Field,
        expected: Amount,
        actual: Amount,
    },

    #[error("second period realized before {0}")]
    RealizedOutOfOrder(&'static str),

    #[error("arithmetic overflow while recomputing balances")]
    Overflow,
}

/// A typed view of every field in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractSnapshot {
    pub terms: Option<ContractTerms>,
    pub buyer_balance: Option<Amount>,
    pub supplier_balance: Option<Amount>,
    pub signal: Option<Signal>,
    pub delivered_1: bool,
    pub realized_2: bool,
}

impl ContractSnapshot {
    pub fn load<S: LedgerStore + ?Sized>(store: &S) -> Result<Self, ErrorKind> {
        let tx = Transaction::new(store);
        let terms = match tx.get(Field::Quantity1.key())? {
            Some(_) => Some(load_terms(&tx)?),
            None => None,
        };
        Ok(Self {
            terms,
            buyer_balance: read_amount(&tx, Field::BuyerBalance)?,
            supplier_balance: read_amount(&tx, Field::SupplierBalance)?,
            signal: read_signal(&tx)?,
            delivered_1: read_flag(&tx, Field::Delivered1)?,
            realized_2: read_flag(&tx, Field::Realized2)?,
        })
    }

    pub fn stage(&self) -> Stage {
        if self.terms.is_none() {
            return Stage::Uninitialized;
        }
        match (self.realized_2, self.delivered_1, self.signal.is_some()) {
            (true, _, _) => Stage::Realized,
            (false, true, true) => Stage::ReadyToRealize,
            (false, true, false) => Stage::Delivered,
            (false, false, true) => Stage::SignalRecorded,
            (false, false, false) => Stage::Created,
        }
    }

    /// Recomputes both balances from the terms and the lifecycle flags and
    /// checks them against the stored values.
    pub fn audit(&self) -> Result<(), AuditError> {
        let Some(terms) = &self.terms else {
            let untouched = self.buyer_balance.is_none()
                && self.supplier_balance.is_none()
                && self.signal.is_none()
                && !self.delivered_1
                && !self.realized_2;
            return if untouched {
                Ok(())
            } else {
                Err(AuditError::MissingTerms)
            };
        };

        let mut supplier_expected = Amount::ZERO;
        if self.delivered_1 {
            supplier_expected = terms.payment_1;
        }
        if self.realized_2 {
            if !self.delivered_1 {
                return Err(AuditError::RealizedOutOfOrder("first-period delivery"));
            }
            let signal = self
                .signal
                .ok_or(AuditError::RealizedOutOfOrder("signal recording"))?;
            supplier_expected = supplier_expected
                .checked_add(terms.payment_for(signal))
                .ok_or(AuditError::Overflow)?;
        }
        let buyer_expected = terms
            .committed_outflow()
            .and_then(|outflow| outflow.checked_sub(supplier_expected))
            .ok_or(AuditError::Overflow)?;

        check_balance(Field::BuyerBalance, buyer_expected, self.buyer_balance)?;
        check_balance(Field::SupplierBalance, supplier_expected, self.supplier_balance)
    }
}

fn check_balance(field: Field, expected: Amount, actual: Option<Amount>) -> Result<(), AuditError> {
    let actual = actual.ok_or(AuditError::MissingBalance(field))?;
    if actual != expected {
        return Err(AuditError::BalanceMismatch {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::invoke;
    use crate::operation::Invocation;
    use crate::store::MemoryStore;

    fn initialized() -> MemoryStore {
        let mut store = MemoryStore::new();
        invoke(&mut store, &Invocation::initialize(["10", "100", "5", "50", "8", "80"])).unwrap();
        store
    }

    #[test]
    fn test_stage_progression() {
        let mut store = MemoryStore::new();
        assert_eq!(ContractSnapshot::load(&store).unwrap().stage(), Stage::Uninitialized);

        store = initialized();
        assert_eq!(ContractSnapshot::load(&store).unwrap().stage(), Stage::Created);

        invoke(&mut store, &Invocation::record_signal("0")).unwrap();
        assert_eq!(ContractSnapshot::load(&store).unwrap().stage(), Stage::SignalRecorded);

        invoke(&mut store, &Invocation::deliver_first_period("10")).unwrap();
        assert_eq!(ContractSnapshot::load(&store).unwrap().stage(), Stage::ReadyToRealize);

        invoke(&mut store, &Invocation::realize_second_period()).unwrap();
        let snapshot = ContractSnapshot::load(&store).unwrap();
        assert_eq!(snapshot.stage(), Stage::Realized);
        assert_eq!(snapshot.signal, Some(Signal::Zero));
        assert!(snapshot.audit().is_ok());
    }

    #[test]
    fn test_delivered_before_signal() {
        let mut store = initialized();
        invoke(&mut store, &Invocation::deliver_first_period("10")).unwrap();
        let snapshot = ContractSnapshot::load(&store).unwrap();
        assert_eq!(snapshot.stage(), Stage::Delivered);
        assert!(snapshot.audit().is_ok());
    }

    #[test]
    fn test_audit_detects_tampered_balance() {
        let mut store = initialized();
        invoke(&mut store, &Invocation::deliver_first_period("10")).unwrap();
        store.put(Field::SupplierBalance.key(), b"1000".to_vec()).unwrap();

        let err = ContractSnapshot::load(&store).unwrap().audit().unwrap_err();
        assert_eq!(
            err,
            AuditError::BalanceMismatch {
                field: Field::SupplierBalance,
                expected: Amount::parse("100").unwrap(),
                actual: Amount::parse("1000").unwrap(),
            }
        );
    }

    #[test]
    fn test_audit_detects_out_of_order_realization() {
        let mut store = initialized();
        store.put(Field::Realized2.key(), b"true".to_vec()).unwrap();
        assert_eq!(
            ContractSnapshot::load(&store).unwrap().audit(),
            Err(AuditError::RealizedOutOfOrder("first-period delivery"))
        );
    }

    #[test]
    fn test_audit_rejects_orphan_balances() {
        let mut store = MemoryStore::new();
        store.put(Field::BuyerBalance.key(), b"5".to_vec()).unwrap();
        assert_eq!(
            ContractSnapshot::load(&store).unwrap().audit(),
            Err(AuditError::MissingTerms)
        );
    }
}

//! The contract state machine.
//!
//! Each operation is a function of the prior state (read through a
//! [`Transaction`]) and its arguments. All validation happens before the first
//! `put`, and the writes only reach the store when the host commits them, so a
//! rejected operation leaves no trace.

use crate::amount::Amount;
use crate::error::ErrorKind;
use crate::field::Field;
use crate::operation::Operation;
use crate::store::{LedgerStore, Transaction};
use crate::terms::{ContractTerms, Signal};

const TRUE: &str = "true";
const FALSE: &str = "false";

pub fn execute<S: LedgerStore + ?Sized>(
    tx: &mut Transaction<'_, S>,
    operation: Operation,
    args: &[String],
) -> Result<String, ErrorKind> {
    if args.len() != operation.arity() {
        return Err(ErrorKind::InvalidArgumentCount {
            expected: operation.arity(),
            got: args.len(),
        });
    }
    match operation {
        Operation::Initialize => initialize(tx, args),
        Operation::DeliverFirstPeriod => deliver_first_period(tx, &args[0]),
        Operation::RecordSignal => record_signal(tx, &args[0]),
        Operation::RealizeSecondPeriod => realize_second_period(tx),
        Operation::QueryField => query_field(tx, &args[0]),
    }
}

fn initialize<S: LedgerStore + ?Sized>(
    tx: &mut Transaction<'_, S>,
    args: &[String],
) -> Result<String, ErrorKind> {
    for field in Field::TERMS {
        if tx.get(field.key())?.is_some() {
            return Err(ErrorKind::AlreadyInitialized);
        }
    }
    let terms = ContractTerms::parse(args)?;
    let buyer_balance = terms
        .committed_outflow()
        .ok_or(ErrorKind::ArithmeticOverflow {
            field: Field::BuyerBalance,
        })?;

    for (field, value) in terms.entries() {
        write_amount(tx, field, value);
    }
    write_amount(tx, Field::BuyerBalance, buyer_balance);
    write_amount(tx, Field::SupplierBalance, Amount::ZERO);
    write_flag(tx, Field::Delivered1, false);
    write_flag(tx, Field::Realized2, false);
    Ok("contract initialized".to_string())
}

fn deliver_first_period<S: LedgerStore + ?Sized>(
    tx: &mut Transaction<'_, S>,
    raw_quantity: &str,
) -> Result<String, ErrorKind> {
    let terms = load_terms(tx)?;
    if read_flag(tx, Field::Delivered1)? {
        return Err(ErrorKind::AlreadyDelivered);
    }
    let quantity = Amount::parse(raw_quantity).map_err(|source| ErrorKind::InvalidDecimal {
        field: Field::Quantity1,
        source,
    })?;
    if quantity != terms.quantity_1 {
        return Err(ErrorKind::QuantityMismatch {
            expected: terms.quantity_1.to_string(),
            got: raw_quantity.to_string(),
        });
    }

    transfer_to_supplier(tx, terms.payment_1)?;
    write_flag(tx, Field::Delivered1, true);
    Ok("first period delivered".to_string())
}

fn record_signal<S: LedgerStore + ?Sized>(
    tx: &mut Transaction<'_, S>,
    raw_signal: &str,
) -> Result<String, ErrorKind> {
    load_terms(tx)?;
    let signal = Signal::from_wire(raw_signal)
        .ok_or_else(|| ErrorKind::InvalidSignalValue(raw_signal.to_string()))?;
    if let Some(existing) = read_signal(tx)? {
        return Err(ErrorKind::SignalAlreadySet(existing));
    }

    tx.put_str(Field::Signal.key(), signal.as_str());
    Ok("signal recorded".to_string())
}

fn realize_second_period<S: LedgerStore + ?Sized>(
    tx: &mut Transaction<'_, S>,
) -> Result<String, ErrorKind> {
    let terms = load_terms(tx)?;
    if read_flag(tx, Field::Realized2)? {
        return Err(ErrorKind::AlreadyRealized);
    }
    let signal = read_signal(tx)?.ok_or(ErrorKind::SignalNotSet)?;
    if !read_flag(tx, Field::Delivered1)? {
        return Err(ErrorKind::FirstPeriodNotDelivered);
    }

    let payment_2 = terms.payment_for(signal);
    transfer_to_supplier(tx, payment_2)?;
    write_flag(tx, Field::Realized2, true);
    Ok("second period realized".to_string())
}

fn query_field<S: LedgerStore + ?Sized>(
    tx: &Transaction<'_, S>,
    name: &str,
) -> Result<String, ErrorKind> {
    let field = Field::from_key(name).ok_or_else(|| ErrorKind::UnknownField(name.to_string()))?;
    if tx.get(Field::Quantity1.key())?.is_none() {
        return Err(ErrorKind::NotInitialized { field });
    }
    match tx.get(field.key())? {
        Some(bytes) => decode_utf8(field, bytes),
        // terms exist, so an absent field is one the lifecycle has not reached
        None => match field {
            Field::Signal => Err(ErrorKind::SignalNotSet),
            Field::Delivered1 | Field::Realized2 => Ok(FALSE.to_string()),
            _ => Err(ErrorKind::NotInitialized { field }),
        },
    }
}

/// Moves `amount` from the buyer's balance to the supplier's, keeping their
/// sum unchanged.
fn transfer_to_supplier<S: LedgerStore + ?Sized>(
    tx: &mut Transaction<'_, S>,
    amount: Amount,
) -> Result<(), ErrorKind> {
    let buyer = require_amount(tx, Field::BuyerBalance)?;
    let supplier = require_amount(tx, Field::SupplierBalance)?;
    let buyer = buyer
        .checked_sub(amount)
        .ok_or(ErrorKind::ArithmeticOverflow {
            field: Field::BuyerBalance,
        })?;
    let supplier = supplier
        .checked_add(amount)
        .ok_or(ErrorKind::ArithmeticOverflow {
            field: Field::SupplierBalance,
        })?;
    write_amount(tx, Field::BuyerBalance, buyer);
    write_amount(tx, Field::SupplierBalance, supplier);
    Ok(())
}

pub(crate) fn load_terms<S: LedgerStore + ?Sized>(
    tx: &Transaction<'_, S>,
) -> Result<ContractTerms, ErrorKind> {
    Ok(ContractTerms {
        quantity_1: require_amount(tx, Field::Quantity1)?,
        payment_1: require_amount(tx, Field::Payment1)?,
        quantity_2s0: require_amount(tx, Field::Quantity2s0)?,
        payment_2s0: require_amount(tx, Field::Payment2s0)?,
        quantity_2s1: require_amount(tx, Field::Quantity2s1)?,
        payment_2s1: require_amount(tx, Field::Payment2s1)?,
    })
}

pub(crate) fn read_amount<S: LedgerStore + ?Sized>(
    tx: &Transaction<'_, S>,
    field: Field,
) -> Result<Option<Amount>, ErrorKind> {
    let Some(bytes) = tx.get(field.key())? else {
        return Ok(None);
    };
    let raw = decode_utf8(field, bytes)?;
    Amount::parse(&raw)
        .map(Some)
        .map_err(|e| corrupt(field, e.to_string()))
}

fn require_amount<S: LedgerStore + ?Sized>(
    tx: &Transaction<'_, S>,
    field: Field,
) -> Result<Amount, ErrorKind> {
    read_amount(tx, field)?.ok_or(ErrorKind::NotInitialized { field })
}

/// Absent flags read as `false`.
pub(crate) fn read_flag<S: LedgerStore + ?Sized>(
    tx: &Transaction<'_, S>,
    field: Field,
) -> Result<bool, ErrorKind> {
    let Some(bytes) = tx.get(field.key())? else {
        return Ok(false);
    };
    match decode_utf8(field, bytes)?.as_str() {
        TRUE => Ok(true),
        FALSE => Ok(false),
        other => Err(corrupt(field, format!("`{other}` is not a flag"))),
    }
}

pub(crate) fn read_signal<S: LedgerStore + ?Sized>(
    tx: &Transaction<'_, S>,
) -> Result<Option<Signal>, ErrorKind> {
    let Some(bytes) = tx.get(Field::Signal.key())? else {
        return Ok(None);
    };
    let raw = decode_utf8(Field::Signal, bytes)?;
    Signal::from_wire(&raw)
        .map(Some)
        .ok_or_else(|| corrupt(Field::Signal, format!("`{raw}` is not a signal")))
}

fn write_amount<S: LedgerStore + ?Sized>(tx: &mut Transaction<'_, S>, field: Field, value: Amount) {
    tx.put_str(field.key(), &value.to_string());
}

fn write_flag<S: LedgerStore + ?Sized>(tx: &mut Transaction<'_, S>, field: Field, value: bool) {
    tx.put_str(field.key(), if value { TRUE } else { FALSE });
}

fn decode_utf8(field: Field, bytes: Vec<u8>) -> Result<String, ErrorKind> {
    String::from_utf8(bytes).map_err(|e| corrupt(field, e.to_string()))
}

fn corrupt(field: Field, reason: String) -> ErrorKind {
    ErrorKind::CorruptState {
        key: field.key().to_string(),
        reason,
    }
}

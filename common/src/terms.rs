use crate::amount::Amount;
use crate::error::ErrorKind;
use crate::field::Field;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The binary indicator revealed before the second settlement period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    Zero,
    One,
}

impl Signal {
    /// Only the literal strings `"0"` and `"1"` are signals.
    pub fn from_wire(raw: &str) -> Option<Signal> {
        match raw {
            "0" => Some(Signal::Zero),
            "1" => Some(Signal::One),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Signal::Zero => "0",
            Signal::One => "1",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The six immutable terms agreed at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContractTerms {
    pub quantity_1: Amount,
    pub payment_1: Amount,
    pub quantity_2s0: Amount,
    pub payment_2s0: Amount,
    pub quantity_2s1: Amount,
    pub payment_2s1: Amount,
}

impl ContractTerms {
    /// Validates the six `initialize` arguments, in [`Field::TERMS`] order.
    ///
    /// Every term must be a non-negative decimal and the quantities must be
    /// strictly positive. The caller checks the argument count.
    pub fn parse(args: &[String]) -> Result<Self, ErrorKind> {
        let mut values = [Amount::ZERO; 6];
        for ((field, raw), slot) in Field::TERMS.iter().zip(args).zip(values.iter_mut()) {
            let value = Amount::parse_non_negative(raw).map_err(|source| {
                ErrorKind::InvalidDecimal {
                    field: *field,
                    source,
                }
            })?;
            if field.is_quantity() && !value.is_positive() {
                return Err(ErrorKind::NonPositiveQuantity {
                    field: *field,
                    value: raw.clone(),
                });
            }
            *slot = value;
        }
        let [quantity_1, payment_1, quantity_2s0, payment_2s0, quantity_2s1, payment_2s1] = values;
        Ok(ContractTerms {
            quantity_1,
            payment_1,
            quantity_2s0,
            payment_2s0,
            quantity_2s1,
            payment_2s1,
        })
    }

    pub fn payment_for(&self, signal: Signal) -> Amount {
        match signal {
            Signal::Zero => self.payment_2s0,
            Signal::One => self.payment_2s1,
        }
    }

    pub fn quantity_for(&self, signal: Signal) -> Amount {
        match signal {
            Signal::Zero => self.quantity_2s0,
            Signal::One => self.quantity_2s1,
        }
    }

    /// The buyer's opening balance. The period-two provision is always the
    /// signal-1 payment, whatever signal is eventually recorded.
    pub fn committed_outflow(&self) -> Option<Amount> {
        self.payment_1.checked_add(self.payment_2s1)
    }

    pub fn entries(&self) -> [(Field, Amount); 6] {
        [
            (Field::Quantity1, self.quantity_1),
            (Field::Payment1, self.payment_1),
            (Field::Quantity2s0, self.quantity_2s0),
            (Field::Payment2s0, self.payment_2s0),
            (Field::Quantity2s1, self.quantity_2s1),
            (Field::Payment2s1, self.payment_2s1),
        ]
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named scalar entry in the ledger state store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    Quantity1,
    Payment1,
    Quantity2s0,
    Payment2s0,
    Quantity2s1,
    Payment2s1,
    BuyerBalance,
    SupplierBalance,
    Signal,
    Delivered1,
    Realized2,
}

impl Field {
    /// The six contract terms, in argument order for `initialize`.
    pub const TERMS: [Field; 6] = [
        Field::Quantity1,
        Field::Payment1,
        Field::Quantity2s0,
        Field::Payment2s0,
        Field::Quantity2s1,
        Field::Payment2s1,
    ];

    /// Every queryable field. The two lifecycle flags are readable alongside
    /// the terms, balances and signal.
    pub const ALL: [Field; 11] = [
        Field::Quantity1,
        Field::Payment1,
        Field::Quantity2s0,
        Field::Payment2s0,
        Field::Quantity2s1,
        Field::Payment2s1,
        Field::BuyerBalance,
        Field::SupplierBalance,
        Field::Signal,
        Field::Delivered1,
        Field::Realized2,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Field::Quantity1 => "quantity_1",
            Field::Payment1 => "payment_1",
            Field::Quantity2s0 => "quantity_2s0",
            Field::Payment2s0 => "payment_2s0",
            Field::Quantity2s1 => "quantity_2s1",
            Field::Payment2s1 => "payment_2s1",
            Field::BuyerBalance => "buyer_balance",
            Field::SupplierBalance => "supplier_balance",
            Field::Signal => "signal",
            Field::Delivered1 => "delivered_1",
            Field::Realized2 => "realized_2",
        }
    }

    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.key() == key)
    }

    pub fn is_quantity(self) -> bool {
        matches!(
            self,
            Field::Quantity1 | Field::Quantity2s0 | Field::Quantity2s1
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_key_matches_store_keys() {
        assert_eq!(Field::from_key("payment_2s1"), Some(Field::Payment2s1));
        assert_eq!(Field::from_key("supplier_balance"), Some(Field::SupplierBalance));
        assert_eq!(Field::from_key("Payment_2s1"), None);
        assert_eq!(Field::from_key("payment_2"), None);
    }

    #[test]
    fn test_terms_come_first_in_all() {
        assert_eq!(&Field::ALL[..6], &Field::TERMS[..]);
        assert_eq!(
            Field::TERMS.iter().filter(|f| f.is_quantity()).count(),
            3
        );
    }
}

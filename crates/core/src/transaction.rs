//! Transaction type and field validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when building a transaction.
#[derive(Debug, Error, PartialEq)]
pub enum TransactionError {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("amount must be a finite, non-negative number (got {0})")]
    InvalidAmount(f64),
}

/// A value transfer waiting to be, or already, recorded in a block.
///
/// There are no signatures or balances: a transaction is only a claim that
/// `sender` moved `amount` to `recipient`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender's address.
    pub sender: String,
    /// Recipient's address.
    pub recipient: String,
    /// Amount transferred.
    pub amount: f64,
}

impl Transaction {
    /// Sender used for mining reward transactions.
    pub const REWARD_SENDER: &'static str = "0";

    /// Create a new transaction, rejecting empty parties and bad amounts.
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: f64,
    ) -> Result<Self, TransactionError> {
        let tx = Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        };
        tx.validate()?;
        Ok(tx)
    }

    /// Create the reward transaction paid to a miner.
    pub fn reward(recipient: impl Into<String>, amount: f64) -> Self {
        Self {
            sender: Self::REWARD_SENDER.to_string(),
            recipient: recipient.into(),
            amount,
        }
    }

    /// Check that every field is present and the amount is usable.
    pub fn validate(&self) -> Result<(), TransactionError> {
        if self.sender.trim().is_empty() {
            return Err(TransactionError::MissingField("sender"));
        }
        if self.recipient.trim().is_empty() {
            return Err(TransactionError::MissingField("recipient"));
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(TransactionError::InvalidAmount(self.amount));
        }
        Ok(())
    }

    /// Check if this transaction pays a mining reward.
    pub fn is_reward(&self) -> bool {
        self.sender == Self::REWARD_SENDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transaction() {
        let tx = Transaction::new("A", "B", 5.0).unwrap();
        assert_eq!(tx.sender, "A");
        assert_eq!(tx.recipient, "B");
        assert_eq!(tx.amount, 5.0);
        assert!(!tx.is_reward());
    }

    #[test]
    fn test_zero_amount_allowed() {
        assert!(Transaction::new("A", "B", 0.0).is_ok());
    }

    #[test]
    fn test_missing_fields_rejected() {
        assert_eq!(
            Transaction::new("", "B", 1.0),
            Err(TransactionError::MissingField("sender"))
        );
        assert_eq!(
            Transaction::new("A", "  ", 1.0),
            Err(TransactionError::MissingField("recipient"))
        );
    }

    #[test]
    fn test_bad_amounts_rejected() {
        assert!(matches!(
            Transaction::new("A", "B", -1.0),
            Err(TransactionError::InvalidAmount(_))
        ));
        assert!(Transaction::new("A", "B", f64::NAN).is_err());
        assert!(Transaction::new("A", "B", f64::INFINITY).is_err());
    }

    #[test]
    fn test_reward_transaction() {
        let tx = Transaction::reward("node-1", 1.0);
        assert!(tx.is_reward());
        assert!(tx.validate().is_ok());
    }

    #[test]
    fn test_json_shape() {
        let tx = Transaction::new("A", "B", 5.0).unwrap();
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["sender"], "A");
        assert_eq!(json["recipient"], "B");
        assert_eq!(json["amount"], 5.0);

        let missing: Result<Transaction, _> =
            serde_json::from_str(r#"{"sender":"A","recipient":"B"}"#);
        assert!(missing.is_err());
    }
}

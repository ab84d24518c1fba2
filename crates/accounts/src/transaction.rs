use chrono::{DateTime, Utc};
use core::str::FromStr;

use creditline_core::{AccountId, LedgerError, LedgerResult, TransactionId};

/// Longest accepted description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 10;

/// Direction of a balance movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl TransactionKind {
    /// Wire code (`"c"` / `"d"`).
    pub fn code(self) -> &'static str {
        match self {
            TransactionKind::Credit => "c",
            TransactionKind::Debit => "d",
        }
    }
}

impl core::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TransactionKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "c" => Ok(TransactionKind::Credit),
            "d" => Ok(TransactionKind::Debit),
            other => Err(LedgerError::invalid(format!(
                "kind must be \"c\" or \"d\", got {other:?}"
            ))),
        }
    }
}

/// Strictly positive amount in the smallest currency unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Amount(i64);

impl Amount {
    pub fn new(value: i64) -> LedgerResult<Self> {
        if value <= 0 {
            return Err(LedgerError::invalid("amount must be a positive integer"));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Amount {
    type Error = LedgerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for i64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

/// Non-empty free text of at most [`MAX_DESCRIPTION_CHARS`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Description(String);

impl Description {
    pub fn new(value: impl Into<String>) -> LedgerResult<Self> {
        let value = value.into();
        let chars = value.chars().count();
        if chars == 0 || chars > MAX_DESCRIPTION_CHARS {
            return Err(LedgerError::invalid(format!(
                "description must be 1 to {MAX_DESCRIPTION_CHARS} characters"
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Description {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Description> for String {
    fn from(value: Description) -> Self {
        value.0
    }
}

/// A validated submission, not yet applied to any account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub amount: Amount,
    pub kind: TransactionKind,
    pub description: Description,
}

impl NewTransaction {
    /// Validate raw submission fields.
    ///
    /// Description is checked first so an out-of-range description is always
    /// reported, whatever the other fields hold.
    pub fn new(amount: i64, kind: &str, description: impl Into<String>) -> LedgerResult<Self> {
        let description = Description::new(description)?;
        let amount = Amount::new(amount)?;
        let kind = kind.parse()?;
        Ok(Self {
            amount,
            kind,
            description,
        })
    }

    pub fn credit(amount: Amount, description: Description) -> Self {
        Self {
            amount,
            kind: TransactionKind::Credit,
            description,
        }
    }

    pub fn debit(amount: Amount, description: Description) -> Self {
        Self {
            amount,
            kind: TransactionKind::Debit,
            description,
        }
    }
}

/// Accepted ledger entry (immutable, append-only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub amount: Amount,
    pub kind: TransactionKind,
    pub description: Description,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Stamp an accepted submission with its id and acceptance time.
    pub fn accept(account_id: AccountId, tx: NewTransaction, created_at: DateTime<Utc>) -> Self {
        Self {
            id: TransactionId::new(),
            account_id,
            amount: tx.amount,
            kind: tx.kind,
            description: tx.description,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_submission_is_accepted() {
        let tx = NewTransaction::new(500, "d", "rent").unwrap();
        assert_eq!(tx.amount.get(), 500);
        assert_eq!(tx.kind, TransactionKind::Debit);
        assert_eq!(tx.description.as_str(), "rent");
    }

    #[test]
    fn description_length_is_bounded() {
        assert!(NewTransaction::new(1, "c", "0123456789").is_ok());
        assert!(matches!(
            NewTransaction::new(1, "c", "01234567890"),
            Err(LedgerError::InvalidInput(_))
        ));
        assert!(matches!(
            NewTransaction::new(1, "c", ""),
            Err(LedgerError::InvalidInput(_))
        ));
    }

    #[test]
    fn description_counts_characters_not_bytes() {
        // 10 characters, 20 bytes.
        assert!(Description::new("ãããããããããã").is_ok());
    }

    #[test]
    fn description_is_rejected_regardless_of_other_fields() {
        let err = NewTransaction::new(-5, "x", "far too long text").unwrap_err();
        match err {
            LedgerError::InvalidInput(msg) => assert!(msg.contains("description")),
            other => panic!("expected invalid input, got {other:?}"),
        }
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        for amount in [0, -1, i64::MIN] {
            assert!(matches!(
                NewTransaction::new(amount, "c", "x"),
                Err(LedgerError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn only_wire_codes_are_valid_kinds() {
        assert_eq!("c".parse::<TransactionKind>().unwrap(), TransactionKind::Credit);
        assert_eq!("d".parse::<TransactionKind>().unwrap(), TransactionKind::Debit);
        for bad in ["", "C", "credit", "x", " d"] {
            assert!(bad.parse::<TransactionKind>().is_err(), "{bad:?} should be rejected");
        }
    }
}

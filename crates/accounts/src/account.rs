use chrono::{DateTime, Utc};

use creditline_core::{AccountId, LedgerError, LedgerResult};

use crate::transaction::{NewTransaction, Transaction, TransactionKind};

/// How many entries a statement carries.
pub const RECENT_TRANSACTIONS: usize = 10;

/// Provisioning record for one account (balance starts at zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountSeed {
    pub id: AccountId,
    pub limit: i64,
}

impl AccountSeed {
    pub const fn new(id: i32, limit: i64) -> Self {
        Self {
            id: AccountId::new(id),
            limit,
        }
    }

    /// Accounts of the reference deployment.
    pub fn reference() -> Vec<AccountSeed> {
        vec![
            AccountSeed::new(1, 100_000),
            AccountSeed::new(2, 80_000),
            AccountSeed::new(3, 1_000_000),
            AccountSeed::new(4, 10_000_000),
            AccountSeed::new(5, 500_000),
        ]
    }
}

/// `{limit, balance}` pair as observed at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    pub limit: i64,
    pub balance: i64,
}

/// Account state: a balance that may go negative by at most `limit`.
///
/// Invariant: `balance >= -limit`. Every constructor checks it and
/// [`Account::apply`] never produces a state that breaks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    limit: i64,
    balance: i64,
}

impl Account {
    /// Fresh account with a zero balance.
    pub fn provision(seed: AccountSeed) -> LedgerResult<Self> {
        Self::restore(seed.id, seed.limit, 0)
    }

    /// Rebuild an account from stored state.
    pub fn restore(id: AccountId, limit: i64, balance: i64) -> LedgerResult<Self> {
        if limit < 0 {
            return Err(LedgerError::invalid(format!(
                "account {id}: limit must not be negative"
            )));
        }
        if balance < -limit {
            return Err(LedgerError::invalid(format!(
                "account {id}: balance {balance} is below -{limit}"
            )));
        }
        Ok(Self { id, limit, balance })
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    pub fn snapshot(&self) -> Balance {
        Balance {
            limit: self.limit,
            balance: self.balance,
        }
    }

    /// Balance the account would hold after `tx`, or why `tx` is inadmissible.
    pub fn balance_after(&self, tx: &NewTransaction) -> LedgerResult<i64> {
        let amount = tx.amount.get();
        match tx.kind {
            TransactionKind::Credit => self
                .balance
                .checked_add(amount)
                .ok_or_else(|| LedgerError::invalid("credit would overflow the balance")),
            TransactionKind::Debit => {
                let next = self.balance.checked_sub(amount);
                match next {
                    Some(next) if next >= -self.limit => Ok(next),
                    _ => Err(LedgerError::LimitExceeded {
                        balance: self.balance,
                        limit: self.limit,
                        amount,
                    }),
                }
            }
        }
    }

    /// Apply `tx` if admissible; on rejection the account is left untouched.
    pub fn apply(&mut self, tx: &NewTransaction) -> LedgerResult<Balance> {
        self.balance = self.balance_after(tx)?;
        Ok(self.snapshot())
    }
}

/// Point-in-time view of an account and its latest entries (newest first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub account_id: AccountId,
    pub limit: i64,
    pub balance: i64,
    pub as_of: DateTime<Utc>,
    pub recent_transactions: Vec<Transaction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{Amount, Description};
    use proptest::prelude::*;

    fn account(limit: i64) -> Account {
        Account::provision(AccountSeed::new(1, limit)).unwrap()
    }

    fn debit(amount: i64) -> NewTransaction {
        NewTransaction::debit(Amount::new(amount).unwrap(), Description::new("d").unwrap())
    }

    fn credit(amount: i64) -> NewTransaction {
        NewTransaction::credit(Amount::new(amount).unwrap(), Description::new("c").unwrap())
    }

    #[test]
    fn credit_adds_exact_amount() {
        let mut acc = account(0);
        let b = acc.apply(&credit(250)).unwrap();
        assert_eq!(b, Balance { limit: 0, balance: 250 });
    }

    #[test]
    fn debit_may_reach_exactly_minus_limit() {
        let mut acc = account(1000);
        assert_eq!(acc.apply(&debit(1000)).unwrap().balance, -1000);
        assert!(matches!(
            acc.apply(&debit(1)),
            Err(LedgerError::LimitExceeded { balance: -1000, limit: 1000, amount: 1 })
        ));
        assert_eq!(acc.balance(), -1000);
    }

    #[test]
    fn rejected_debit_leaves_balance_unchanged() {
        let mut acc = account(1000);
        acc.apply(&debit(500)).unwrap();
        let err = acc.apply(&debit(600)).unwrap_err();
        assert!(matches!(err, LedgerError::LimitExceeded { .. }));
        assert_eq!(acc.balance(), -500);
        assert_eq!(acc.limit(), 1000);
    }

    #[test]
    fn overflowing_credit_is_rejected() {
        let mut acc = Account::restore(AccountId::new(1), 0, i64::MAX - 1).unwrap();
        assert!(matches!(acc.apply(&credit(2)), Err(LedgerError::InvalidInput(_))));
        assert_eq!(acc.balance(), i64::MAX - 1);
    }

    #[test]
    fn huge_debit_does_not_wrap() {
        let mut acc = Account::restore(AccountId::new(1), i64::MAX, 0).unwrap();
        assert!(acc.apply(&debit(i64::MAX)).is_ok());
        assert!(matches!(acc.apply(&debit(i64::MAX)), Err(LedgerError::LimitExceeded { .. })));
    }

    #[test]
    fn restore_refuses_broken_invariant() {
        assert!(Account::restore(AccountId::new(1), 100, -101).is_err());
        assert!(Account::restore(AccountId::new(1), -1, 0).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: whatever sequence of credits and debits is submitted,
        /// the balance never drops below `-limit`, accepted movements change it
        /// by exactly their amount and rejected ones leave it untouched.
        #[test]
        fn balance_never_breaches_limit(
            limit in 0i64..1_000_000i64,
            ops in prop::collection::vec((any::<bool>(), 1i64..500_000i64), 1..64)
        ) {
            let mut acc = account(limit);

            for (is_debit, amount) in ops {
                let before = acc.balance();
                let tx = if is_debit { debit(amount) } else { credit(amount) };

                match acc.apply(&tx) {
                    Ok(b) if is_debit => prop_assert_eq!(b.balance, before - amount),
                    Ok(b) => prop_assert_eq!(b.balance, before + amount),
                    Err(LedgerError::LimitExceeded { .. }) => {
                        prop_assert!(is_debit);
                        prop_assert!(before - amount < -limit);
                        prop_assert_eq!(acc.balance(), before);
                    }
                    Err(e) => prop_assert!(false, "unexpected error: {e:?}"),
                }

                prop_assert!(acc.balance() >= -limit);
            }
        }
    }
}

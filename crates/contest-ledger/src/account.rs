//! The shared bot account.
//!
//! All automated participants in a run share a single economic identity.
//! Entry fees are debited from, and prizes credited to, one running balance
//! that may go negative. Lifetime totals are kept alongside the balance for
//! the end-of-run summary and the balance-trail audit.

use rust_decimal::Decimal;
use tracing::trace;

use crate::LedgerError;

/// Running balance and lifetime totals for the automated-participant pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BotAccount {
    /// Balance at the start of the run.
    opening_balance: Decimal,
    /// Current running balance.
    balance: Decimal,
    /// Sum of every entry fee debited.
    fees_paid: Decimal,
    /// Sum of every prize credited.
    winnings: Decimal,
    /// Number of entry fees debited.
    entries: u64,
    /// Number of prizes credited.
    wins: u64,
}

impl BotAccount {
    /// Create an account with a zero opening balance.
    pub const fn new() -> Self {
        Self::with_opening_balance(Decimal::ZERO)
    }

    /// Create an account with the given opening balance.
    pub const fn with_opening_balance(opening_balance: Decimal) -> Self {
        Self {
            opening_balance,
            balance: opening_balance,
            fees_paid: Decimal::ZERO,
            winnings: Decimal::ZERO,
            entries: 0,
            wins: 0,
        }
    }

    /// Current running balance.
    pub const fn balance(&self) -> Decimal {
        self.balance
    }

    /// Balance at the start of the run.
    pub const fn opening_balance(&self) -> Decimal {
        self.opening_balance
    }

    /// Total entry fees debited so far.
    pub const fn fees_paid(&self) -> Decimal {
        self.fees_paid
    }

    /// Total prizes credited so far.
    pub const fn winnings(&self) -> Decimal {
        self.winnings
    }

    /// Number of contests the pool has entered.
    pub const fn entries(&self) -> u64 {
        self.entries
    }

    /// Number of paid finishes.
    pub const fn wins(&self) -> u64 {
        self.wins
    }

    /// Net result of the run: winnings minus fees.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::BalanceOverflow`] if the subtraction overflows.
    pub fn net(&self) -> Result<Decimal, LedgerError> {
        self.winnings
            .checked_sub(self.fees_paid)
            .ok_or(LedgerError::BalanceOverflow)
    }

    /// Debit an entry fee. Returns the balance after the debit.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NegativeAmount`] for a negative fee and
    /// [`LedgerError::BalanceOverflow`] if the balance leaves the decimal range.
    pub fn debit_fee(&mut self, fee: Decimal) -> Result<Decimal, LedgerError> {
        if fee < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount {
                field: "entry fee",
                amount: fee,
            });
        }
        let balance = self
            .balance
            .checked_sub(fee)
            .ok_or(LedgerError::BalanceOverflow)?;
        let fees_paid = self
            .fees_paid
            .checked_add(fee)
            .ok_or(LedgerError::BalanceOverflow)?;

        self.balance = balance;
        self.fees_paid = fees_paid;
        self.entries = self.entries.saturating_add(1);
        trace!(%fee, %balance, "bot entry fee debited");
        Ok(balance)
    }

    /// Credit a prize. Returns the balance after the credit.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NegativeAmount`] for a negative prize and
    /// [`LedgerError::BalanceOverflow`] if the balance leaves the decimal range.
    pub fn credit_winnings(&mut self, amount: Decimal) -> Result<Decimal, LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount {
                field: "win amount",
                amount,
            });
        }
        let balance = self
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow)?;
        let winnings = self
            .winnings
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow)?;

        self.balance = balance;
        self.winnings = winnings;
        self.wins = self.wins.saturating_add(1);
        trace!(%amount, %balance, "bot prize credited");
        Ok(balance)
    }
}

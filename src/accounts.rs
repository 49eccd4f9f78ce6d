// Bank accounts: balance-bearing records with a lifecycle status gating
// mutability. This is the only module with business rules.
//
// Status lifecycle:
//   ACTIVE  -> BLOCKED (block)
//   BLOCKED -> ACTIVE  (unblock)
//   ACTIVE  -> CLOSED  (close, terminal)
//
// CLOSED rejects every transition and every balance mutation.
// Balance mutates only while ACTIVE, and never goes below zero.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::ApiError;
use crate::store::{get_record, put_record, scan_records, KvStore};

const KEY_PREFIX: &str = "account:";

fn account_key(id: &str) -> String {
    format!("{}{}", KEY_PREFIX, id)
}

// ============================================================================
// Status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BankAccountStatus {
    Active,
    Blocked,
    Closed,
}

impl BankAccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BankAccountStatus::Active => "ACTIVE",
            BankAccountStatus::Blocked => "BLOCKED",
            BankAccountStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for BankAccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Entity
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    /// Server-generated UUID, never changes.
    pub id: String,

    /// Owning holder. Stored as given, not validated against the holder
    /// records.
    pub account_holder_id: String,

    /// 5-digit agency number, assigned at creation.
    pub agency: String,

    /// 7-digit account number, assigned at creation.
    pub account_number: String,

    pub balance: f64,
    pub status: BankAccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BankAccount {
    /// New account: zero balance, ACTIVE, random agency/account numbers.
    pub fn new(account_holder_id: String) -> Self {
        let mut rng = rand::thread_rng();
        let now = Utc::now();

        BankAccount {
            id: uuid::Uuid::new_v4().to_string(),
            account_holder_id,
            agency: rng.gen_range(10_000..=99_999).to_string(),
            account_number: rng.gen_range(1_000_000..=9_999_999).to_string(),
            balance: 0.0,
            status: BankAccountStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn require_active(&self) -> Result<(), ApiError> {
        if self.status != BankAccountStatus::Active {
            return Err(ApiError::NotActive(self.status));
        }
        Ok(())
    }

    fn require_positive(amount: f64) -> Result<(), ApiError> {
        // NaN is rejected as well
        if amount.is_nan() || amount <= 0.0 {
            return Err(ApiError::NonPositiveAmount);
        }
        Ok(())
    }

    /// Add `amount` to the balance. Requires ACTIVE and amount > 0.
    pub fn deposit(&mut self, amount: f64) -> Result<(), ApiError> {
        self.require_active()?;
        Self::require_positive(amount)?;

        self.balance += amount;
        self.touch();
        Ok(())
    }

    /// Subtract `amount` from the balance. Requires ACTIVE, amount > 0 and
    /// sufficient funds. A rejected withdrawal leaves the balance untouched.
    pub fn withdraw(&mut self, amount: f64) -> Result<(), ApiError> {
        self.require_active()?;
        Self::require_positive(amount)?;

        if self.balance < amount {
            return Err(ApiError::InsufficientFunds {
                balance: self.balance,
                requested: amount,
            });
        }

        self.balance -= amount;
        self.touch();
        Ok(())
    }

    fn transition(
        &mut self,
        from: BankAccountStatus,
        to: BankAccountStatus,
    ) -> Result<(), ApiError> {
        if self.status != from {
            return Err(ApiError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.touch();
        Ok(())
    }

    /// ACTIVE -> BLOCKED.
    pub fn block(&mut self) -> Result<(), ApiError> {
        self.transition(BankAccountStatus::Active, BankAccountStatus::Blocked)
    }

    /// BLOCKED -> ACTIVE.
    pub fn unblock(&mut self) -> Result<(), ApiError> {
        self.transition(BankAccountStatus::Blocked, BankAccountStatus::Active)
    }

    /// ACTIVE -> CLOSED. Terminal: a closed account accepts no further
    /// transitions or balance mutations.
    pub fn close(&mut self) -> Result<(), ApiError> {
        self.transition(BankAccountStatus::Active, BankAccountStatus::Closed)
    }
}

// ============================================================================
// Payloads
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBankAccount {
    pub account_holder_id: String,
}

/// Partial update of status/balance. Bypasses the guarded transition
/// methods; the holder reference and identity fields are not updatable.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBankAccount {
    pub status: Option<BankAccountStatus>,
    pub balance: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct AmountPayload {
    pub amount: f64,
}

// ============================================================================
// Service
// ============================================================================

/// CRUD plus the guarded balance/status operations. Every operation is a
/// read-modify-write against the store with no compare-and-swap: concurrent
/// callers on the same id can lose updates.
#[derive(Clone)]
pub struct BankAccountService {
    store: Arc<dyn KvStore>,
}

impl BankAccountService {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn create(&self, data: CreateBankAccount) -> Result<BankAccount, ApiError> {
        let account = BankAccount::new(data.account_holder_id);

        put_record(self.store.as_ref(), &account_key(&account.id), &account)?;
        tracing::info!(
            account_id = %account.id,
            holder_id = %account.account_holder_id,
            agency = %account.agency,
            "bank account created"
        );
        Ok(account)
    }

    pub fn get(&self, id: &str) -> Result<BankAccount, ApiError> {
        get_record(self.store.as_ref(), &account_key(id))?
            .ok_or_else(|| ApiError::AccountNotFound(id.to_string()))
    }

    pub fn list(&self) -> Result<Vec<BankAccount>, ApiError> {
        Ok(scan_records(self.store.as_ref(), KEY_PREFIX)?)
    }

    pub fn update(&self, id: &str, data: UpdateBankAccount) -> Result<BankAccount, ApiError> {
        let mut account = self.get(id)?;

        if let Some(status) = data.status {
            account.status = status;
        }
        if let Some(balance) = data.balance {
            account.balance = balance;
        }
        account.touch();

        self.save(&account)?;
        Ok(account)
    }

    pub fn deposit(&self, id: &str, amount: f64) -> Result<BankAccount, ApiError> {
        self.mutate(id, |account| account.deposit(amount))
    }

    pub fn withdraw(&self, id: &str, amount: f64) -> Result<BankAccount, ApiError> {
        self.mutate(id, |account| account.withdraw(amount))
    }

    pub fn block(&self, id: &str) -> Result<BankAccount, ApiError> {
        self.mutate(id, BankAccount::block)
    }

    pub fn unblock(&self, id: &str) -> Result<BankAccount, ApiError> {
        self.mutate(id, BankAccount::unblock)
    }

    pub fn close(&self, id: &str) -> Result<BankAccount, ApiError> {
        let account = self.mutate(id, BankAccount::close)?;
        tracing::info!(account_id = %id, "bank account closed");
        Ok(account)
    }

    /// Read-modify-write helper: loads the account, applies `op`, persists
    /// only when `op` succeeds.
    fn mutate<F>(&self, id: &str, op: F) -> Result<BankAccount, ApiError>
    where
        F: FnOnce(&mut BankAccount) -> Result<(), ApiError>,
    {
        let mut account = self.get(id)?;
        op(&mut account)?;
        self.save(&account)?;
        Ok(account)
    }

    fn save(&self, account: &BankAccount) -> Result<(), ApiError> {
        put_record(self.store.as_ref(), &account_key(&account.id), account)?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

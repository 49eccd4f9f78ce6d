// Contabank - Account Management API
// Exposes all modules for use in the server binary and tests

pub mod accounts;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod holders;
pub mod store;

// Re-export commonly used types
pub use accounts::{
    AmountPayload, BankAccount, BankAccountService, BankAccountStatus, CreateBankAccount,
    UpdateBankAccount,
};
pub use api::{router, AppState};
pub use config::Config;
pub use error::ApiError;
pub use holders::{AccountHolder, AccountHolderService, CreateAccountHolder, UpdateAccountHolder};
pub use store::{KvStore, MemoryStore, SqliteStore, StoreError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Accounts module: domain types, the repository abstraction, its in-memory
//! implementation, and the service that fronts it.

pub mod domain;
pub mod in_memory;
pub mod repository;
pub mod service;

pub use domain::{Account, Transfer};
pub use in_memory::InMemoryAccountsRepository;
pub use repository::AccountsRepository;
pub use service::AccountsService;

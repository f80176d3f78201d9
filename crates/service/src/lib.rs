//! Service layer for the ledger.
//! - Holds every account and applies create/read/transfer operations.
//! - Independent of the HTTP framework; the server crate only maps requests onto it.

pub mod accounts;
pub mod errors;
pub mod observability;

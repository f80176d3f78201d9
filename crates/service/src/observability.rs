use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

// Prometheus metrics (default registry)
pub static ACCOUNTS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "ledger_accounts_created_total",
        "Total accounts created"
    )
    .expect("register accounts_created_total")
});

pub static TRANSFERS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "ledger_transfers_total",
        "Total transfers applied"
    )
    .expect("register transfers_total")
});

pub static TRANSFERS_REJECTED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "ledger_transfers_rejected_total",
        "Total transfers rejected, by reason",
        &["reason"]
    )
    .expect("register transfers_rejected_total")
});

/// Register every ledger metric up front so `/metrics` lists them before first use.
pub fn register() {
    Lazy::force(&ACCOUNTS_CREATED_TOTAL);
    Lazy::force(&TRANSFERS_TOTAL);
    Lazy::force(&TRANSFERS_REJECTED_TOTAL);
}

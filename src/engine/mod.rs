pub mod aggregator;
pub mod config_store;
pub mod ledger;
pub mod monitor;

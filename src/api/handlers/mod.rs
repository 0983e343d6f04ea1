pub mod analytics;
pub mod copy_trading;
pub mod internal;
pub mod monitor;
pub mod ops;
pub mod positions;

pub mod error;
pub mod fsname;
pub mod logger;
pub mod monitor;
pub mod validation;

pub mod http;
pub mod units;

pub mod fund;
pub mod lbo;
pub mod scenarios;
pub mod waterfall;

pub mod registry;
pub mod traits;

pub mod frankfurter;
pub mod yahoo_finance;

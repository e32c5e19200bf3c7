pub mod comparison;
pub mod deposit;
pub mod metric;
pub mod price;
pub mod report;
pub mod settings;
pub mod valuation;

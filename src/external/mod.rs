pub mod alphavantage;
pub mod provider;
pub mod yahoo;

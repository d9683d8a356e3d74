mod bar;
mod fundamentals;
mod report;

pub use bar::PriceBar;
pub use fundamentals::FundamentalsSnapshot;
pub use report::IndicatorReport;

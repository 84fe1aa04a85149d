pub mod chart;
pub mod history;
pub mod indicator;
pub mod limiter;
pub mod locks;
pub mod performance;
pub mod warmer;

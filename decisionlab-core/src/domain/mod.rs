//! Domain types for DecisionLab

pub mod candle;
pub mod order;
pub mod portfolio;
pub mod signal;

pub use candle::{series_for, Candle, CandleData};
pub use order::{OrderSide, TradeOrder};
pub use portfolio::{PortfolioState, Position};
pub use signal::{Contribution, PredictedAction, Signal};

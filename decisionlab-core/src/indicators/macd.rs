//! Moving Average Convergence Divergence (MACD).
//!
//! Three lines (separate Indicator instances):
//! - Line: EMA(close, fast) - EMA(close, slow)
//! - Signal: EMA(line, signal)
//! - Diff: line - signal (histogram)
//!
//! Lookback: slow - 1 for the line, slow + signal - 2 for signal and diff.

use super::ema::ema_of_series;
use super::{closes, Indicator};
use crate::domain::Candle;

/// Which MACD line to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Line,
    Signal,
    Diff,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, line: MacdLine) -> Self {
        assert!(fast >= 1 && slow >= 1 && signal >= 1, "MACD periods must be >= 1");
        let name = match line {
            MacdLine::Line => "macd",
            MacdLine::Signal => "macd_signal",
            MacdLine::Diff => "macd_diff",
        };
        Self {
            fast,
            slow,
            signal,
            line,
            name: name.to_string(),
        }
    }

    /// Standard 12/26/9 configuration.
    pub fn standard(line: MacdLine) -> Self {
        Self::new(12, 26, 9, line)
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        let line_lookback = self.fast.max(self.slow) - 1;
        match self.line {
            MacdLine::Line => line_lookback,
            MacdLine::Signal | MacdLine::Diff => line_lookback + self.signal - 1,
        }
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let lines = macd_lines(&closes(candles), self.fast, self.slow, self.signal);
        match self.line {
            MacdLine::Line => lines.line,
            MacdLine::Signal => lines.signal,
            MacdLine::Diff => lines.diff,
        }
    }
}

/// All three MACD series computed in one pass.
#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub diff: Vec<f64>,
}

pub fn macd_lines(values: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let fast_ema = ema_of_series(values, fast);
    let slow_ema = ema_of_series(values, slow);
    let line: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema_of_series(&line, signal);
    let diff = line.iter().zip(&signal_line).map(|(l, s)| l - s).collect();
    MacdSeries {
        line,
        signal: signal_line,
        diff,
    }
}

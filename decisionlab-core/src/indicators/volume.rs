//! Volume ratio: current volume over its rolling mean.
//!
//! Lookback: period - 1. A zero rolling mean (no traded volume in the window)
//! yields the neutral ratio 1.0.

use super::sma::sma_of_series;
use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct VolumeRatio {
    period: usize,
    name: String,
}

impl VolumeRatio {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "VolumeRatio period must be >= 1");
        Self {
            period,
            name: "volume_ratio".to_string(),
        }
    }
}

impl Indicator for VolumeRatio {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();
        let means = sma_of_series(&volumes, self.period);
        volumes
            .iter()
            .zip(&means)
            .map(|(&v, &m)| {
                if m.is_nan() || v.is_nan() {
                    f64::NAN
                } else if m == 0.0 {
                    1.0
                } else {
                    v / m
                }
            })
            .collect()
    }
}

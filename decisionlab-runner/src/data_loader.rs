//! Request and candle loading for the runner.
//!
//! Two sources:
//! 1. A JSON file holding a complete `AgentContextRequest`
//! 2. A CSV of candles (`symbol,timestamp,open,high,low,close,volume`),
//!    assembled into a request around a caller-supplied portfolio
//!
//! Rows are returned in file order. Sorting per symbol is the pipeline's job.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use decisionlab_core::domain::{CandleData, PortfolioState};
use decisionlab_core::AgentContextRequest;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid request JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid candle CSV at record {record}: {source}")]
    Csv {
        record: usize,
        #[source]
        source: csv::Error,
    },
}

/// One CSV row. Column order matches `write_candles_csv`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CandleRow {
    symbol: String,
    timestamp: DateTime<Utc>,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
}

impl From<CandleRow> for CandleData {
    fn from(row: CandleRow) -> Self {
        Self {
            symbol: row.symbol,
            timestamp: row.timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        }
    }
}

impl From<&CandleData> for CandleRow {
    fn from(c: &CandleData) -> Self {
        Self {
            symbol: c.symbol.clone(),
            timestamp: c.timestamp,
            open: c.open,
            high: c.high,
            low: c.low,
            close: c.close,
            volume: c.volume,
        }
    }
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read the raw body of a request file without parsing it.
pub fn read_request_body(path: &Path) -> Result<String, LoadError> {
    read_file(path)
}

/// Load and parse a request file.
pub fn load_request(path: &Path) -> Result<AgentContextRequest, LoadError> {
    let json = read_file(path)?;
    serde_json::from_str(&json).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse candles from any CSV reader with a header row.
pub fn read_candles_csv<R: Read>(reader: R) -> Result<Vec<CandleData>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    rdr.deserialize::<CandleRow>()
        .enumerate()
        .map(|(i, row)| {
            row.map(CandleData::from)
                .map_err(|source| LoadError::Csv { record: i + 1, source })
        })
        .collect()
}

pub fn load_candles_csv(path: &Path) -> Result<Vec<CandleData>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_candles_csv(file)
}

/// Write candles in the CSV layout `read_candles_csv` accepts.
pub fn write_candles_csv<W: std::io::Write>(writer: W, candles: &[CandleData]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for candle in candles {
        wtr.serialize(CandleRow::from(candle))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Build a request from a candle CSV and an all-cash portfolio.
pub fn request_from_csv(path: &Path, agent_id: &str, cash: Decimal) -> Result<AgentContextRequest, LoadError> {
    let candles = load_candles_csv(path)?;
    Ok(AgentContextRequest::new(
        agent_id,
        PortfolioState::cash_only(cash),
        candles,
    ))
}

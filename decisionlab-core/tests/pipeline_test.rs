//! End-to-end tests for the decision pipeline.
//!
//! Tests:
//! 1. Thirty days of BTC oscillating +/- 2% produce a sized rule-based order
//! 2. Empty candles yield no orders and the fallback reasoning
//! 3. Seven candles or fewer per symbol contribute nothing
//! 4. Deep oversold history produces a rule-based BUY with a sized order
//! 5. Identical requests give identical orders and signals

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use decisionlab_core::domain::{CandleData, OrderSide, PortfolioState};
use decisionlab_core::orchestrator::NO_SIGNALS_REASONING;
use decisionlab_core::{
    AgentContextRequest, DecisionOrchestrator, OrchestratorConfig, Predictor,
};

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

/// Deterministic daily walk with moves inside +/- 2%.
fn walk(symbol: &str, days: usize, start: f64) -> Vec<CandleData> {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let mut price = start;
    (0..days)
        .map(|i| {
            let seed = (i as u64 + 1).wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let step = ((seed >> 33) % 401) as f64 / 10_000.0 - 0.02;
            let open = price;
            price *= 1.0 + step;
            let close = price;
            candle(symbol, base + Duration::days(i as i64), open, close)
        })
        .collect()
}

fn candle(symbol: &str, timestamp: chrono::DateTime<Utc>, open: f64, close: f64) -> CandleData {
    let d = |v: f64| Decimal::from_f64_retain(v).unwrap_or_default().round_dp(2);
    CandleData {
        symbol: symbol.to_string(),
        timestamp,
        open: d(open),
        high: d(open.max(close) * 1.005),
        low: d(open.min(close) * 0.995),
        close: d(close),
        volume: dec!(1500),
    }
}

/// Closes alternating between `base` and `base` + 2%.
fn oscillating(symbol: &str, days: usize, base: f64) -> Vec<CandleData> {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let high = base * 1.02;
    (0..days)
        .map(|i| {
            let (open, close) = if i % 2 == 0 { (high, base) } else { (base, high) };
            candle(symbol, start + Duration::days(i as i64), open, close)
        })
        .collect()
}

fn falling(symbol: &str, days: usize) -> Vec<CandleData> {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    (0..days)
        .map(|i| {
            let open = 100.0 * 0.97_f64.powi(i as i32);
            candle(symbol, base + Duration::days(i as i64), open, open * 0.97)
        })
        .collect()
}

fn request(candles: Vec<CandleData>) -> AgentContextRequest {
    AgentContextRequest::new("e2e-agent", PortfolioState::cash_only(dec!(10000)), candles)
}

fn orchestrator() -> DecisionOrchestrator {
    DecisionOrchestrator::new(OrchestratorConfig::default(), Predictor::rule_based())
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[test]
fn thirty_day_btc_oscillation_places_rule_based_order() {
    let mut req = request(oscillating("BTC", 30, 42_000.0));
    req.schema_version = "1.1-beta".to_string();
    let response = orchestrator().decide(&req);

    assert_eq!(response.schema_version, "1.1-beta");
    assert_eq!(response.request_id, req.request_id);
    assert_eq!(response.agent_id, "e2e-agent");
    // Every standard rule applies to a full feature row.
    assert_eq!(response.signals.len(), 9);

    assert_eq!(response.orders.len(), 1);
    let order = &response.orders[0];
    assert_eq!(order.asset_symbol, "BTC");
    assert_eq!(order.side, OrderSide::Buy);
    // 10000 * 0.1 * 0.55 / 42840, banker's rounding to 8 places
    assert_eq!(order.quantity, dec!(0.01283847));
    assert!(order.limit_price.is_none());
    assert!(response.reasoning.contains("BTC:"));
    assert_eq!(response.reasoning, "BTC: BUY (confidence: 55%)");
}

#[test]
fn empty_candles_no_orders() {
    let response = orchestrator().decide(&request(Vec::new()));
    assert!(response.orders.is_empty());
    assert!(response.signals.is_empty());
    assert_eq!(response.reasoning, NO_SIGNALS_REASONING);
}

#[test]
fn six_candles_contribute_nothing() {
    let mut candles = walk("BTC", 6, 42_000.0);
    candles.extend(walk("ETH", 6, 2_500.0));
    let response = orchestrator().decide(&request(candles));
    assert!(response.orders.is_empty());
    assert!(response.signals.is_empty());
    assert_eq!(response.reasoning, NO_SIGNALS_REASONING);
}

#[test]
fn seven_candles_are_skipped() {
    // Enough observations, but returns_7 has no base row yet.
    let response = orchestrator().decide(&request(oscillating("BTC", 7, 42_000.0)));
    assert!(response.orders.is_empty());
    assert!(response.signals.is_empty());
    assert_eq!(response.reasoning, NO_SIGNALS_REASONING);
}

#[test]
fn eight_candles_are_enough() {
    let response = orchestrator().decide(&request(walk("ETH", 8, 2_500.0)));
    assert_eq!(response.signals.len(), 9);
}

#[test]
fn oversold_history_buys() {
    let response = orchestrator().decide(&request(falling("ETH", 20)));
    assert_eq!(response.orders.len(), 1);
    let order = &response.orders[0];
    assert_eq!(order.side, OrderSide::Buy);
    assert_eq!(response.reasoning, "ETH: BUY (confidence: 70%)");
    // RSI bottoms out, so the oversold rule fired.
    assert!(response
        .signals
        .iter()
        .any(|s| s.feature == "rsi_14" && s.fired && s.rule.starts_with("<40")));
}

#[test]
fn identical_requests_identical_decisions() {
    let mut candles = walk("BTC", 40, 42_000.0);
    candles.extend(walk("ETH", 40, 2_500.0));
    let req = request(candles);
    let orch = orchestrator();
    let a = orch.decide(&req);
    let b = orch.decide(&req);
    assert_eq!(a.orders, b.orders);
    assert_eq!(a.signals, b.signals);
    assert_eq!(a.reasoning, b.reasoning);
}

#[test]
fn zero_value_portfolio_places_no_orders() {
    let mut req = request(falling("BTC", 20));
    req.portfolio = PortfolioState::cash_only(Decimal::ZERO);
    let response = orchestrator().decide(&req);
    assert!(response.orders.is_empty());
    assert!(!response.signals.is_empty());
    assert_eq!(response.reasoning, NO_SIGNALS_REASONING);
}

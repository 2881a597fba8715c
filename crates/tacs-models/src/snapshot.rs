use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One symbol's market view inside a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketData {
    pub symbol: String,
    pub price: Decimal,
    pub volume: u64,
    /// Percent change over the snapshot's reference window.
    pub change_percent: Decimal,
    /// Realized volatility if the caller computed it.
    pub volatility: Option<Decimal>,
}

/// An open position supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub current_price: Decimal,
    pub unrealized_pnl: Decimal,
}

/// The caller-supplied, point-in-time view used to produce a decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketSnapshot {
    pub market_data: Vec<MarketData>,
    /// None means "positions unknown" and disqualifies the fast path.
    pub positions: Option<Vec<Position>>,
    /// Cumulative daily P&L. None disqualifies the fast path.
    pub daily_pnl: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

impl MarketSnapshot {
    /// The fast path requires market data, positions, and daily P&L.
    pub fn fast_path_eligible(&self) -> bool {
        !self.market_data.is_empty() && self.positions.is_some() && self.daily_pnl.is_some()
    }

    pub fn has_open_positions(&self) -> bool {
        self.positions.as_ref().is_some_and(|p| !p.is_empty())
    }

    /// The symbol the snapshot leads with.
    pub fn primary(&self) -> Option<&MarketData> {
        self.market_data.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn spy_data() -> MarketData {
        MarketData {
            symbol: "SPY".to_string(),
            price: dec!(445.50),
            volume: 2_500_000,
            change_percent: dec!(0.35),
            volatility: None,
        }
    }

    #[test]
    fn roundtrip_full_snapshot() {
        let snapshot = MarketSnapshot {
            market_data: vec![spy_data()],
            positions: Some(vec![Position {
                symbol: "SPY".to_string(),
                quantity: dec!(10),
                entry_price: dec!(440.00),
                current_price: dec!(445.50),
                unrealized_pnl: dec!(55.00),
            }]),
            daily_pnl: Some(dec!(55.00)),
            timestamp: Utc::now(),
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        let deserialized: MarketSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot, deserialized);
        assert!(deserialized.fast_path_eligible());
        assert!(deserialized.has_open_positions());
    }

    #[test]
    fn missing_daily_pnl_disqualifies_fast_path() {
        let snapshot = MarketSnapshot {
            market_data: vec![spy_data()],
            positions: Some(vec![]),
            daily_pnl: None,
            timestamp: Utc::now(),
        };
        assert!(!snapshot.fast_path_eligible());
    }

    #[test]
    fn missing_positions_disqualifies_fast_path() {
        let snapshot = MarketSnapshot {
            market_data: vec![spy_data()],
            positions: None,
            daily_pnl: Some(dec!(0)),
            timestamp: Utc::now(),
        };
        assert!(!snapshot.fast_path_eligible());
        assert!(!snapshot.has_open_positions());
    }

    #[test]
    fn empty_market_data_disqualifies_fast_path() {
        let snapshot = MarketSnapshot {
            market_data: vec![],
            positions: Some(vec![]),
            daily_pnl: Some(dec!(0)),
            timestamp: Utc::now(),
        };
        assert!(!snapshot.fast_path_eligible());
        assert!(snapshot.primary().is_none());
    }
}

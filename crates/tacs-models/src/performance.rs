use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-coordinator performance singleton. Mutated only through the
/// coordinator's own operations and persisted across restarts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceState {
    pub daily_pnl: Decimal,
    pub daily_target: Decimal,
    /// Always derived as daily_pnl / daily_target; recomputed by every
    /// mutator, never set independently.
    pub target_progress: Decimal,
    pub total_trades: u32,
    pub winning_trades: u32,
    pub losing_trades: u32,
    pub consecutive_losses: u32,
    pub last_loss_at: Option<DateTime<Utc>>,
    pub current_drawdown: Decimal,
    pub should_stop: bool,
    pub stop_reason: Option<String>,
}

/// Payload shape accepted from performance-update messages.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PerformanceUpdate {
    /// Replace the cumulative daily P&L outright.
    pub daily_pnl: Option<Decimal>,
    /// Record one closed trade with this P&L.
    pub trade_pnl: Option<Decimal>,
    pub current_drawdown: Option<Decimal>,
}

impl PerformanceState {
    pub fn new(daily_target: Decimal) -> Self {
        Self {
            daily_pnl: Decimal::ZERO,
            daily_target,
            target_progress: Decimal::ZERO,
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            consecutive_losses: 0,
            last_loss_at: None,
            current_drawdown: Decimal::ZERO,
            should_stop: false,
            stop_reason: None,
        }
    }

    /// Record one closed trade and keep all derived counters consistent.
    pub fn record_trade(&mut self, pnl: Decimal, at: DateTime<Utc>) {
        self.total_trades += 1;
        if pnl >= Decimal::ZERO {
            self.winning_trades += 1;
            self.consecutive_losses = 0;
        } else {
            self.losing_trades += 1;
            self.consecutive_losses += 1;
            self.last_loss_at = Some(at);
        }
        self.daily_pnl += pnl;
        if self.daily_pnl < Decimal::ZERO && -self.daily_pnl > self.current_drawdown {
            self.current_drawdown = -self.daily_pnl;
        }
        self.recompute_progress();
    }

    /// Merge a performance-update message payload.
    pub fn apply_update(&mut self, update: &PerformanceUpdate, at: DateTime<Utc>) {
        if let Some(pnl) = update.trade_pnl {
            self.record_trade(pnl, at);
        }
        if let Some(daily) = update.daily_pnl {
            self.daily_pnl = daily;
        }
        if let Some(drawdown) = update.current_drawdown {
            self.current_drawdown = drawdown;
        }
        self.recompute_progress();
    }

    /// The midnight job: zero the trade counters and clear the stop flag.
    pub fn daily_reset(&mut self) {
        self.daily_pnl = Decimal::ZERO;
        self.total_trades = 0;
        self.winning_trades = 0;
        self.losing_trades = 0;
        self.consecutive_losses = 0;
        self.last_loss_at = None;
        self.current_drawdown = Decimal::ZERO;
        self.should_stop = false;
        self.stop_reason = None;
        self.recompute_progress();
    }

    pub fn stop(&mut self, reason: impl Into<String>) {
        self.should_stop = true;
        self.stop_reason = Some(reason.into());
    }

    fn recompute_progress(&mut self) {
        self.target_progress = if self.daily_target.is_zero() {
            Decimal::ZERO
        } else {
            self.daily_pnl / self.daily_target
        };
    }
}

impl Default for PerformanceState {
    fn default() -> Self {
        Self::new(Decimal::from(500))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn record_winning_trade() {
        let mut state = PerformanceState::new(dec!(500));
        state.record_trade(dec!(125), Utc::now());

        assert_eq!(state.total_trades, 1);
        assert_eq!(state.winning_trades, 1);
        assert_eq!(state.consecutive_losses, 0);
        assert_eq!(state.daily_pnl, dec!(125));
        assert_eq!(state.target_progress, dec!(0.25));
    }

    #[test]
    fn consecutive_losses_track_and_reset() {
        let mut state = PerformanceState::new(dec!(500));
        let now = Utc::now();
        state.record_trade(dec!(-50), now);
        state.record_trade(dec!(-30), now);
        state.record_trade(dec!(-20), now);
        assert_eq!(state.consecutive_losses, 3);
        assert_eq!(state.losing_trades, 3);
        assert!(state.last_loss_at.is_some());
        assert_eq!(state.current_drawdown, dec!(100));

        state.record_trade(dec!(10), now);
        assert_eq!(state.consecutive_losses, 0);
        assert_eq!(state.winning_trades, 1);
    }

    #[test]
    fn apply_update_payload() {
        let mut state = PerformanceState::new(dec!(500));
        let update = PerformanceUpdate {
            daily_pnl: Some(dec!(250)),
            trade_pnl: None,
            current_drawdown: None,
        };
        state.apply_update(&update, Utc::now());
        assert_eq!(state.daily_pnl, dec!(250));
        assert_eq!(state.target_progress, dec!(0.5));
    }

    #[test]
    fn daily_reset_zeroes_everything() {
        let mut state = PerformanceState::new(dec!(500));
        state.record_trade(dec!(-100), Utc::now());
        state.stop("daily loss limit");

        state.daily_reset();
        assert_eq!(state.daily_pnl, Decimal::ZERO);
        assert_eq!(state.total_trades, 0);
        assert_eq!(state.consecutive_losses, 0);
        assert!(!state.should_stop);
        assert!(state.stop_reason.is_none());
        assert_eq!(state.target_progress, Decimal::ZERO);
    }

    #[test]
    fn zero_target_avoids_division() {
        let mut state = PerformanceState::new(Decimal::ZERO);
        state.record_trade(dec!(100), Utc::now());
        assert_eq!(state.target_progress, Decimal::ZERO);
    }
}

use std::time::Instant;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use tacs_models::{
    clamp_confidence, AgentCapability, ExpectedOutcome, FastPathConfig, MarketSnapshot,
    PerformanceState, RiskAssessment, Signal, SignalDirection, TradeAction, TradingDecision,
};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum FastPathError {
    #[error("snapshot missing {0}")]
    MissingInput(&'static str),

    #[error("position sizing arithmetic overflowed")]
    Arithmetic,
}

/// Synchronous, bounded-latency decision engine.
///
/// Operates only on the snapshot and the performance singleton; never calls
/// hosted inference, never suspends, and by contract never raises: internal
/// faults degrade to a conservative WAIT.
pub struct FastPathEngine {
    config: FastPathConfig,
}

impl FastPathEngine {
    pub fn new(config: FastPathConfig) -> Self {
        Self { config }
    }

    /// Infallible entry point: any internal fault becomes WAIT with
    /// confidence <= 0.1.
    pub fn decide(
        &self,
        snapshot: &MarketSnapshot,
        performance: &PerformanceState,
        now: DateTime<Utc>,
    ) -> TradingDecision {
        match self.try_decide(snapshot, performance, now) {
            Ok(decision) => decision,
            Err(e) => {
                warn!(error = %e, "Fast path degraded to WAIT");
                TradingDecision::wait(
                    Decimal::new(5, 2),
                    format!("Fast path degraded: {e}"),
                )
            }
        }
    }

    /// Fallible variant for callers configured to fall through to the
    /// consensus path on fault.
    pub fn try_decide(
        &self,
        snapshot: &MarketSnapshot,
        performance: &PerformanceState,
        now: DateTime<Utc>,
    ) -> Result<TradingDecision, FastPathError> {
        let start = Instant::now();
        let result = self.evaluate(snapshot, performance, now);
        let elapsed_ms = start.elapsed().as_millis() as u64;
        if elapsed_ms > self.config.latency_budget_ms {
            warn!(
                elapsed_ms,
                budget_ms = self.config.latency_budget_ms,
                "Fast path exceeded its latency budget"
            );
        } else {
            debug!(elapsed_ms, "Fast path completed");
        }
        result
    }

    fn evaluate(
        &self,
        snapshot: &MarketSnapshot,
        performance: &PerformanceState,
        now: DateTime<Utc>,
    ) -> Result<TradingDecision, FastPathError> {
        let primary = snapshot
            .primary()
            .ok_or(FastPathError::MissingInput("market data"))?;
        let daily_pnl = snapshot
            .daily_pnl
            .ok_or(FastPathError::MissingInput("daily P&L"))?;
        if snapshot.positions.is_none() {
            return Err(FastPathError::MissingInput("positions"));
        }
        let has_exposure = snapshot.has_open_positions();

        // Gate 0: an explicit stop overrides everything.
        if performance.should_stop {
            let reason = performance
                .stop_reason
                .as_deref()
                .unwrap_or("stop flag set");
            return Ok(TradingDecision::wait(
                Decimal::new(2, 1),
                format!("Trading stopped: {reason}"),
            ));
        }

        // Gate 1: hard daily-loss limit. Block entries, prefer exiting.
        if daily_pnl <= -self.config.daily_loss_limit {
            return Ok(if has_exposure {
                let mut decision = TradingDecision::new(
                    TradeAction::ExitPosition,
                    Decimal::new(8, 1),
                    format!(
                        "Daily loss limit breached ({daily_pnl} <= -{}); reducing exposure",
                        self.config.daily_loss_limit
                    ),
                );
                decision.risk_assessment = Some(RiskAssessment {
                    max_loss: Decimal::ZERO,
                    position_size: Decimal::ZERO,
                    notes: vec!["loss limit active, no new entries".to_string()],
                });
                decision
            } else {
                TradingDecision::wait(
                    Decimal::new(3, 1),
                    format!(
                        "Daily loss limit breached ({daily_pnl} <= -{}); no new entries",
                        self.config.daily_loss_limit
                    ),
                )
            });
        }

        // Gate 2: soft profit target shrinks entry sizing, never halts.
        let mut size_factor = Decimal::ONE;
        let mut notes: Vec<String> = Vec::new();
        if daily_pnl >= self.config.daily_profit_target {
            size_factor *= Decimal::new(5, 1);
            notes.push("daily target met, entry sizing halved".to_string());
        }

        // Gate 3: consecutive-loss cool-down blocks new entries.
        // An unrepresentable window counts as still cooling down.
        let cooling_down = performance.consecutive_losses >= self.config.max_consecutive_losses
            && performance.last_loss_at.is_some_and(|at| {
                ChronoDuration::try_minutes(self.config.loss_cooldown_minutes)
                    .and_then(|window| at.checked_add_signed(window))
                    .map_or(true, |until| now < until)
            });

        // Gate 4: volatility-scaled sizing. Realized |change| stands in
        // when the caller supplied no volatility figure.
        let volatility = primary.volatility.unwrap_or_else(|| primary.change_percent.abs());
        let low_volatility = volatility <= self.config.low_volatility_threshold;
        if volatility >= self.config.high_volatility_threshold {
            size_factor *= Decimal::new(5, 1);
            notes.push("sizing halved under elevated volatility".to_string());
        } else if low_volatility {
            size_factor *= Decimal::new(125, 2);
            notes.push("sizing grown modestly under low volatility".to_string());
        }

        // Momentum signal over the primary symbol.
        let change = primary.change_percent;
        let volume_ok = primary.volume >= self.config.min_volume;
        let long_signal = change >= self.config.entry_change_threshold && volume_ok;
        let short_signal = change <= -self.config.entry_change_threshold;

        if short_signal {
            return Ok(if has_exposure {
                TradingDecision::new(
                    TradeAction::ExitPosition,
                    Decimal::new(6, 1),
                    format!("Downward momentum on {} ({change}%)", primary.symbol),
                )
            } else {
                TradingDecision::wait(
                    Decimal::new(4, 1),
                    format!("Downward momentum on {}, no exposure to reduce", primary.symbol),
                )
            });
        }

        if long_signal {
            if cooling_down {
                return Ok(TradingDecision::wait(
                    Decimal::new(3, 1),
                    format!(
                        "Cooling down after {} consecutive losses",
                        performance.consecutive_losses
                    ),
                ));
            }

            let mut confidence = Decimal::new(55, 2);
            let strong_change = self
                .config
                .entry_change_threshold
                .checked_mul(Decimal::TWO)
                .is_some_and(|threshold| change >= threshold);
            if strong_change {
                confidence += Decimal::new(15, 2);
            }
            if low_volatility {
                confidence += Decimal::new(10, 2);
            }
            let confidence = clamp_confidence(confidence.min(Decimal::new(9, 1)));

            // Checked arithmetic: an unrepresentable price or size must
            // degrade, never unwind the actor task.
            let position_size = self
                .config
                .base_position_size
                .checked_mul(size_factor)
                .ok_or(FastPathError::Arithmetic)?;
            let max_loss = primary
                .price
                .checked_mul(position_size)
                .and_then(|exposure| exposure.checked_mul(Decimal::new(2, 2)))
                .ok_or(FastPathError::Arithmetic)?;

            let mut decision = TradingDecision::new(
                TradeAction::EnterPosition,
                confidence,
                format!(
                    "Upward momentum on {} ({change}% on volume {})",
                    primary.symbol, primary.volume
                ),
            );
            decision.signals.push(Signal {
                symbol: primary.symbol.clone(),
                direction: SignalDirection::Long,
                strength: confidence,
                source: AgentCapability::MarketAnalysis,
                rationale: "momentum above entry threshold".to_string(),
            });
            decision.risk_assessment = Some(RiskAssessment {
                max_loss,
                position_size,
                notes,
            });
            decision.expected_outcome = Some(ExpectedOutcome {
                expected_return: confidence * Decimal::new(2, 2),
                win_probability: confidence,
                holding_period: if confidence > Decimal::new(7, 1) {
                    "1d".to_string()
                } else {
                    "4h".to_string()
                },
            });
            return Ok(decision);
        }

        // No actionable momentum.
        Ok(if has_exposure {
            TradingDecision::new(
                TradeAction::Hold,
                Decimal::new(4, 1),
                format!("No actionable momentum on {}; holding exposure", primary.symbol),
            )
        } else {
            TradingDecision::wait(
                Decimal::new(3, 1),
                format!("No actionable momentum on {}", primary.symbol),
            )
        })
    }
}

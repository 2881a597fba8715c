use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::AgentError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Order description handed to the execution collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    /// Limit price; None = market.
    pub limit_price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionStatus {
    pub order_id: String,
    pub status: String,
    pub filled_quantity: Option<Decimal>,
}

/// Order-execution collaborator. Invoked only by the execution-capability
/// agent, never directly by the coordinator.
#[async_trait]
pub trait ExecutionClient: Send + Sync {
    async fn execute(&self, order: &OrderRequest) -> Result<ExecutionStatus, AgentError>;
}

/// Simulated execution backend: fills every order immediately without
/// touching a brokerage. The default until a live client is wired in.
#[derive(Default)]
pub struct PaperExecutionClient;

impl PaperExecutionClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExecutionClient for PaperExecutionClient {
    async fn execute(&self, order: &OrderRequest) -> Result<ExecutionStatus, AgentError> {
        info!(
            symbol = %order.symbol,
            side = ?order.side,
            quantity = %order.quantity,
            "Paper execution fill"
        );
        Ok(ExecutionStatus {
            order_id: Uuid::new_v4().to_string(),
            status: "filled".to_string(),
            filled_quantity: Some(order.quantity),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn roundtrip_order_request() {
        let order = OrderRequest {
            symbol: "SPY".to_string(),
            side: OrderSide::Buy,
            quantity: dec!(10),
            limit_price: Some(dec!(445.25)),
        };
        let json = serde_json::to_string(&order).unwrap();
        let deserialized: OrderRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(order, deserialized);
    }

    #[tokio::test]
    async fn paper_client_fills_in_full() {
        let client = PaperExecutionClient::new();
        let status = client
            .execute(&OrderRequest {
                symbol: "QQQ".to_string(),
                side: OrderSide::Sell,
                quantity: dec!(5),
                limit_price: None,
            })
            .await
            .unwrap();
        assert_eq!(status.status, "filled");
        assert_eq!(status.filled_quantity, Some(dec!(5)));
    }
}

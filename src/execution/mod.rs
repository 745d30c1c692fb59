// Order execution.
//
// Planning is pure: it turns a decision plus balances into an order plan (or
// a rejection) without touching the exchange. Execution performs at most one
// exchange call per cycle and never retries.

use crate::api::upbit::{Balances, OrderResponse, UpbitClient};
use crate::models::{Decision, TradeAction};
use crate::Result;

/// Why an order was not placed. These are business-rule rejections: the
/// cycle carries on to ledger logging.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RejectReason {
    #[error("invalid percentage: {0} (must be 0-100)")]
    InvalidPercentage(i64),
    #[error("buy notional {notional:.0} KRW is below the {minimum:.0} KRW minimum")]
    BuyBelowMinimum { notional: f64, minimum: f64 },
    #[error("sell value {value:.0} KRW is below the {minimum:.0} KRW minimum")]
    SellBelowMinimum { value: f64, minimum: f64 },
    #[error("no ask price available to value the sell order")]
    MissingAskPrice,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderPlan {
    /// Market buy spending `notional` KRW
    Buy { notional: f64 },
    /// Market sell of `volume` BTC, valued at `value` KRW at the best ask
    Sell { volume: f64, value: f64 },
    Hold,
    Reject(RejectReason),
}

#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    Submitted(OrderResponse),
    Held,
    NotPlaced(RejectReason),
}

pub struct OrderExecutor {
    market: String,
    min_order_krw: f64,
    fee_buffer: f64,
}

impl OrderExecutor {
    pub fn new(market: String, min_order_krw: f64, fee_buffer: f64) -> Self {
        Self {
            market,
            min_order_krw,
            fee_buffer,
        }
    }

    /// Turn a decision into an order plan. Pure: no exchange call happens
    /// here, so a rejected decision provably never reaches the exchange.
    pub fn plan(&self, decision: &Decision, balances: &Balances, best_ask: Option<f64>) -> OrderPlan {
        match decision.decision {
            TradeAction::Hold => OrderPlan::Hold,
            TradeAction::Buy | TradeAction::Sell
                if !(0..=100).contains(&decision.percentage) =>
            {
                OrderPlan::Reject(RejectReason::InvalidPercentage(decision.percentage))
            }
            TradeAction::Buy => {
                let fraction = decision.percentage as f64 / 100.0;
                let notional = balances.krw_balance * fraction * self.fee_buffer;
                if notional > self.min_order_krw {
                    OrderPlan::Buy { notional }
                } else {
                    OrderPlan::Reject(RejectReason::BuyBelowMinimum {
                        notional,
                        minimum: self.min_order_krw,
                    })
                }
            }
            TradeAction::Sell => {
                let fraction = decision.percentage as f64 / 100.0;
                let volume = balances.btc_balance * fraction;
                let ask = match best_ask {
                    Some(ask) => ask,
                    None => return OrderPlan::Reject(RejectReason::MissingAskPrice),
                };
                let value = volume * ask;
                if value > self.min_order_krw {
                    OrderPlan::Sell { volume, value }
                } else {
                    OrderPlan::Reject(RejectReason::SellBelowMinimum {
                        value,
                        minimum: self.min_order_krw,
                    })
                }
            }
        }
    }

    /// Carry out a plan. Exactly one exchange call for a submitted order;
    /// exchange errors propagate to the scheduler unretried.
    pub async fn execute(
        &self,
        exchange: &UpbitClient,
        plan: &OrderPlan,
    ) -> Result<ExecutionOutcome> {
        match plan {
            OrderPlan::Buy { notional } => {
                tracing::info!(
                    "Submitting market buy: {:.0} KRW of {}",
                    notional,
                    self.market
                );
                let order = exchange.buy_market_order(&self.market, *notional).await?;
                tracing::info!("Buy order accepted: {} ({})", order.uuid, order.state);
                Ok(ExecutionOutcome::Submitted(order))
            }
            OrderPlan::Sell { volume, value } => {
                tracing::info!(
                    "Submitting market sell: {:.8} BTC (~{:.0} KRW) on {}",
                    volume,
                    value,
                    self.market
                );
                let order = exchange.sell_market_order(&self.market, *volume).await?;
                tracing::info!("Sell order accepted: {} ({})", order.uuid, order.state);
                Ok(ExecutionOutcome::Submitted(order))
            }
            OrderPlan::Hold => {
                tracing::info!("Hold: no order this cycle");
                Ok(ExecutionOutcome::Held)
            }
            OrderPlan::Reject(reason) => {
                tracing::warn!("Order not placed: {}", reason);
                Ok(ExecutionOutcome::NotPlaced(reason.clone()))
            }
        }
    }
}

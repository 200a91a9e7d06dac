// src/models.rs
// Core types for the dashboard state client

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Holder count as reported by the bot: a real number, or a textual
/// placeholder ("?") when the upstream metrics provider has no figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HolderCount {
    Count(u64),
    Placeholder(String),
}

impl fmt::Display for HolderCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HolderCount::Count(n) => write!(f, "{}", n),
            HolderCount::Placeholder(s) => f.write_str(s),
        }
    }
}

impl Default for HolderCount {
    fn default() -> Self {
        HolderCount::Placeholder("?".to_string())
    }
}

/// Flat snapshot of the bot's cumulative view of one token.
///
/// Serialized in the client schema (camelCase). The bot's own stream and
/// flat files use snake_case, so every field carries an alias and both
/// spellings deserialize into the same struct. Counters default to zero
/// when absent; gauges stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotState {
    #[serde(rename = "tokenAddress", alias = "token_address")]
    pub token_address: Option<String>,
    #[serde(rename = "totalBuys", alias = "total_buys")]
    pub total_buys: u64,
    #[serde(rename = "totalSells", alias = "total_sells")]
    pub total_sells: u64,
    #[serde(rename = "totalBuyVolume", alias = "total_buy_volume")]
    pub total_buy_volume: f64,
    #[serde(rename = "totalSellVolume", alias = "total_sell_volume")]
    pub total_sell_volume: f64,
    #[serde(rename = "creatorRewards", alias = "creator_rewards")]
    pub creator_rewards: f64,
    #[serde(rename = "lastPrice", alias = "last_price")]
    pub last_price: Option<f64>,
    #[serde(rename = "highestPrice", alias = "highest_price")]
    pub highest_price: Option<f64>,
    #[serde(rename = "lowestPrice", alias = "lowest_price")]
    pub lowest_price: Option<f64>,
    #[serde(rename = "lastMarketCap", alias = "last_market_cap")]
    pub last_market_cap: Option<f64>,
    #[serde(rename = "lastMarketCapUsd", alias = "last_market_cap_usd")]
    pub last_market_cap_usd: Option<f64>,
    #[serde(rename = "lastHolderCount", alias = "last_holder_count")]
    pub last_holder_count: Option<HolderCount>,
    #[serde(
        rename = "lastCreatorRewardsAvailable",
        alias = "last_creator_rewards_available"
    )]
    pub last_creator_rewards_available: f64,
    #[serde(rename = "totalAnalyses", alias = "total_analyses")]
    pub total_analyses: u64,
    #[serde(rename = "totalAlerts", alias = "total_alerts")]
    pub total_alerts: u64,
    #[serde(rename = "startTime", alias = "start_time")]
    pub start_time: Option<f64>,
    #[serde(rename = "analysisMode", alias = "analysis_mode")]
    pub analysis_mode: Option<String>,
}

/// Partial state carried by a `state_update` message. Every field is
/// optional; absent fields leave the current value untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StateUpdate {
    #[serde(rename = "tokenAddress", alias = "token_address")]
    pub token_address: Option<String>,
    #[serde(rename = "totalBuys", alias = "total_buys")]
    pub total_buys: Option<u64>,
    #[serde(rename = "totalSells", alias = "total_sells")]
    pub total_sells: Option<u64>,
    #[serde(rename = "totalBuyVolume", alias = "total_buy_volume")]
    pub total_buy_volume: Option<f64>,
    #[serde(rename = "totalSellVolume", alias = "total_sell_volume")]
    pub total_sell_volume: Option<f64>,
    #[serde(rename = "creatorRewards", alias = "creator_rewards")]
    pub creator_rewards: Option<f64>,
    #[serde(rename = "lastPrice", alias = "last_price")]
    pub last_price: Option<f64>,
    #[serde(rename = "highestPrice", alias = "highest_price")]
    pub highest_price: Option<f64>,
    #[serde(rename = "lowestPrice", alias = "lowest_price")]
    pub lowest_price: Option<f64>,
    #[serde(rename = "lastMarketCap", alias = "last_market_cap")]
    pub last_market_cap: Option<f64>,
    #[serde(rename = "lastMarketCapUsd", alias = "last_market_cap_usd")]
    pub last_market_cap_usd: Option<f64>,
    #[serde(rename = "lastHolderCount", alias = "last_holder_count")]
    pub last_holder_count: Option<HolderCount>,
    #[serde(
        rename = "lastCreatorRewardsAvailable",
        alias = "last_creator_rewards_available"
    )]
    pub last_creator_rewards_available: Option<f64>,
    #[serde(rename = "totalAnalyses", alias = "total_analyses")]
    pub total_analyses: Option<u64>,
    #[serde(rename = "totalAlerts", alias = "total_alerts")]
    pub total_alerts: Option<u64>,
    #[serde(rename = "startTime", alias = "start_time")]
    pub start_time: Option<f64>,
    #[serde(rename = "analysisMode", alias = "analysis_mode")]
    pub analysis_mode: Option<String>,
}

impl BotState {
    /// Shallow field-merge of a partial update. Fields absent from the
    /// update keep their current value. Returns true if anything changed,
    /// so callers can skip the change notification for no-op updates.
    pub fn merge_update(&mut self, update: &StateUpdate) -> bool {
        let mut changed = false;

        if let Some(v) = &update.token_address {
            if self.token_address.as_deref() != Some(v) {
                self.token_address = Some(v.clone());
                changed = true;
            }
        }
        if let Some(v) = update.total_buys {
            if self.total_buys != v {
                self.total_buys = v;
                changed = true;
            }
        }
        if let Some(v) = update.total_sells {
            if self.total_sells != v {
                self.total_sells = v;
                changed = true;
            }
        }
        if let Some(v) = update.total_buy_volume {
            if self.total_buy_volume != v {
                self.total_buy_volume = v;
                changed = true;
            }
        }
        if let Some(v) = update.total_sell_volume {
            if self.total_sell_volume != v {
                self.total_sell_volume = v;
                changed = true;
            }
        }
        if let Some(v) = update.creator_rewards {
            if self.creator_rewards != v {
                self.creator_rewards = v;
                changed = true;
            }
        }
        if let Some(v) = update.last_price {
            if self.last_price != Some(v) {
                self.last_price = Some(v);
                changed = true;
            }
        }
        if let Some(v) = update.highest_price {
            if self.highest_price != Some(v) {
                self.highest_price = Some(v);
                changed = true;
            }
        }
        if let Some(v) = update.lowest_price {
            if self.lowest_price != Some(v) {
                self.lowest_price = Some(v);
                changed = true;
            }
        }
        if let Some(v) = update.last_market_cap {
            if self.last_market_cap != Some(v) {
                self.last_market_cap = Some(v);
                changed = true;
            }
        }
        if let Some(v) = update.last_market_cap_usd {
            if self.last_market_cap_usd != Some(v) {
                self.last_market_cap_usd = Some(v);
                changed = true;
            }
        }
        if let Some(v) = &update.last_holder_count {
            if self.last_holder_count.as_ref() != Some(v) {
                self.last_holder_count = Some(v.clone());
                changed = true;
            }
        }
        if let Some(v) = update.last_creator_rewards_available {
            if self.last_creator_rewards_available != v {
                self.last_creator_rewards_available = v;
                changed = true;
            }
        }
        if let Some(v) = update.total_analyses {
            if self.total_analyses != v {
                self.total_analyses = v;
                changed = true;
            }
        }
        if let Some(v) = update.total_alerts {
            if self.total_alerts != v {
                self.total_alerts = v;
                changed = true;
            }
        }
        if let Some(v) = update.start_time {
            if self.start_time != Some(v) {
                self.start_time = Some(v);
                changed = true;
            }
        }
        if let Some(v) = &update.analysis_mode {
            if self.analysis_mode.as_deref() != Some(v) {
                self.analysis_mode = Some(v.clone());
                changed = true;
            }
        }

        changed
    }
}

/// Trade side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => f.write_str("buy"),
            TradeSide::Sell => f.write_str("sell"),
        }
    }
}

/// One executed trade, immutable once received. Wire keys match what the
/// bot broadcasts (snake_case).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Seconds since epoch
    #[serde(default)]
    pub timestamp: f64,
    #[serde(rename = "type")]
    pub side: TradeSide,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub sol_amount: f64,
    #[serde(default)]
    pub volume_usd: f64,
    #[serde(default)]
    pub token_amount: f64,
    #[serde(default)]
    pub market_cap_sol: f64,
    #[serde(default)]
    pub holder_count: HolderCount,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_comment: Option<String>,
}

/// One bot-initiated event from the actions log, immutable once received.
/// The type tag is an open-ended set ("analysis", "roast", "say",
/// "auto_start", ...), so it stays a plain string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// ISO-8601 timestamp string as written by the bot
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub details: serde_json::Map<String, Value>,
}

// ============================================================================
// Stream message protocol
// ============================================================================

/// Raw message framing: one JSON object per frame.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    #[allow(dead_code)]
    timestamp: Option<String>,
}

/// Payload of an `initial_state` snapshot message. Missing arrays become
/// empty.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InitialState {
    pub state: Option<BotState>,
    pub recent_trades: Vec<Trade>,
    pub recent_actions: Vec<Action>,
}

/// A dispatched stream message. Unrecognized type tags map to `Unknown`,
/// which the view treats as a no-op, preserving forward compatibility.
#[derive(Debug)]
pub enum StreamEvent {
    InitialState(InitialState),
    Trade(Trade),
    Action(Action),
    StateUpdate(StateUpdate),
    Pong,
    Unknown(String),
}

impl StreamEvent {
    /// Parse one frame. Returns an error only for non-parseable payloads;
    /// unknown type tags parse successfully as `Unknown`.
    pub fn parse(raw: &str) -> Result<StreamEvent> {
        let envelope: Envelope =
            serde_json::from_str(raw).context("invalid message envelope")?;

        let event = match envelope.kind.as_str() {
            "initial_state" => StreamEvent::InitialState(
                serde_json::from_value(envelope.data)
                    .context("invalid initial_state payload")?,
            ),
            "trade" => StreamEvent::Trade(
                serde_json::from_value(envelope.data).context("invalid trade payload")?,
            ),
            "action" => StreamEvent::Action(
                serde_json::from_value(envelope.data).context("invalid action payload")?,
            ),
            "state_update" => StreamEvent::StateUpdate(
                serde_json::from_value(envelope.data)
                    .context("invalid state_update payload")?,
            ),
            "pong" => StreamEvent::Pong,
            other => StreamEvent::Unknown(other.to_string()),
        };

        Ok(event)
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Wire messages
//!
//! Requests arrive as single JSON objects. The envelope fields
//! (`message_type`, `txid`, `sender_ts`) are pulled first so the gates can
//! run before any type-specific parsing; the remaining fields are parsed
//! per message type. Replies are JSON objects carrying `response_type`,
//! `response_code` and `msg`, plus type-specific payload.

use common::{OrderPrice, Side};
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Common fields of every request
#[derive(Debug, Deserialize)]
pub struct Envelope {
    /// Message kind; dispatch key
    #[serde(default)]
    pub message_type: Option<String>,
    /// Transaction id; required for state-changing messages
    #[serde(default)]
    pub txid: Option<Value>,
    /// Sender's clock, unix seconds; triggers the staleness gate
    #[serde(default)]
    pub sender_ts: Option<i64>,
}

impl Envelope {
    /// Pull the envelope out of a raw message
    pub fn from_value(msg: &Value) -> Option<Self> {
        serde_json::from_value(msg.clone()).ok()
    }

    /// The txid normalized to a string (numeric ids arrive from some
    /// broker stacks)
    pub fn txid(&self) -> Option<String> {
        self.txid.as_ref().map(id_to_string)
    }
}

/// Normalize a JSON id (string or number) to its canonical string form
pub fn id_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn market() -> OrderPrice {
    OrderPrice::Market
}

/// Body of a `new_order` request
#[derive(Debug, Deserialize)]
pub struct NewOrderRequest {
    /// Registered broker code
    pub broker_id: String,
    /// Client account id, string or number
    pub account_id: Value,
    /// BUY or SELL
    pub side: Side,
    /// Instrument symbol
    pub symbol: String,
    /// Decimal string, number, or null/empty for a market order
    #[serde(default = "market")]
    pub price: OrderPrice,
    /// Order volume
    pub volume: u64,
}

impl NewOrderRequest {
    /// The account id in canonical string form
    pub fn account_id(&self) -> String {
        id_to_string(&self.account_id)
    }
}

/// Body of the per-instrument query messages
#[derive(Debug, Deserialize)]
pub struct InstrumentRequest {
    /// Instrument symbol
    pub symbol: String,
    /// Book rows to return (`instrument_orderbook` only)
    #[serde(default = "default_book_depth")]
    pub n: usize,
}

fn default_book_depth() -> usize {
    25
}

/// A successful reply with extra payload fields
pub fn ok_response(response_type: &str, payload: Map<String, Value>) -> Value {
    let mut reply = Map::new();
    reply.insert("response_type".to_string(), json!(response_type));
    reply.insert("response_code".to_string(), json!(0));
    reply.insert("msg".to_string(), json!("ok"));
    reply.extend(payload);
    Value::Object(reply)
}

/// An error reply
pub fn exception_response(response_code: u16, msg: &str) -> Value {
    json!({
        "response_type": "exception",
        "response_code": response_code,
        "msg": msg,
    })
}

/// Stringify a price for summary payloads (absent prices stay null)
pub fn price_field(price: Option<f64>) -> Value {
    match price {
        Some(p) => json!(format!("{}", p)),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_normalizes_numeric_txid() {
        let msg = json!({"txid": 800, "message_type": "test"});
        let envelope = Envelope::from_value(&msg).unwrap();
        assert_eq!(envelope.txid().unwrap(), "800");
        assert_eq!(envelope.message_type.as_deref(), Some("test"));
        assert_eq!(envelope.sender_ts, None);
    }

    #[test]
    fn test_new_order_parses_wire_fields() {
        let body: NewOrderRequest = serde_json::from_value(json!({
            "broker_id": "MAGENTA",
            "account_id": 1,
            "side": "BUY",
            "symbol": "STI.",
            "price": "1.01",
            "volume": 100,
        }))
        .unwrap();

        assert_eq!(body.account_id(), "1");
        assert_eq!(body.side, Side::Buy);
        assert_eq!(body.price, OrderPrice::Limit(1.01));
    }

    #[test]
    fn test_new_order_null_price_is_market() {
        let body: NewOrderRequest = serde_json::from_value(json!({
            "broker_id": "MAGENTA",
            "account_id": "1",
            "side": "SELL",
            "symbol": "STI.",
            "price": null,
            "volume": 100,
        }))
        .unwrap();
        assert_eq!(body.price, OrderPrice::Market);

        // a missing price field also reads as market
        let body: NewOrderRequest = serde_json::from_value(json!({
            "broker_id": "MAGENTA",
            "account_id": "1",
            "side": "SELL",
            "symbol": "STI.",
            "volume": 100,
        }))
        .unwrap();
        assert_eq!(body.price, OrderPrice::Market);
    }

    #[test]
    fn test_exception_response_shape() {
        let reply = exception_response(404, "unknown symbol");
        assert_eq!(reply["response_type"], "exception");
        assert_eq!(reply["response_code"], 404);
        assert_eq!(reply["msg"], "unknown symbol");
    }

    #[test]
    fn test_price_field_formatting() {
        assert_eq!(price_field(Some(1.25)), json!("1.25"));
        assert_eq!(price_field(None), Value::Null);
    }
}

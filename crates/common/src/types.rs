//! Fundamental domain types
//!
//! `Side` and `OrderPrice` are shared by the order repository, the matching
//! engine and the exchange core. `OrderPrice` carries the limit/market
//! distinction; market orders are ranked with an infinite sentinel so the
//! comparison-based book priority stays total.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Returns the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Returns true if this is a buy order
    pub fn is_buy(&self) -> bool {
        matches!(self, Side::Buy)
    }

    /// Returns true if this is a sell order
    pub fn is_sell(&self) -> bool {
        matches!(self, Side::Sell)
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Order price: a finite positive limit, or a market order with no
/// price constraint.
///
/// On the wire a market order arrives as `null` or the empty string; a limit
/// price arrives as a decimal string (or bare number). Inside the book a
/// market order ranks as `+inf` (buy) / `-inf` (sell) so that it crosses any
/// limit counter-order, while reporting keeps the original representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderPrice {
    /// Limit order at the given price
    Limit(f64),
    /// Market order: match at any counter-price
    Market,
}

impl OrderPrice {
    /// The price used for priority ranking inside a book.
    ///
    /// Market buys rank above every limit bid, market sells below every
    /// limit ask.
    pub fn rank(&self, side: Side) -> f64 {
        match self {
            OrderPrice::Limit(p) => *p,
            OrderPrice::Market => match side {
                Side::Buy => f64::INFINITY,
                Side::Sell => f64::NEG_INFINITY,
            },
        }
    }

    /// The finite limit price, if any
    pub fn limit(&self) -> Option<f64> {
        match self {
            OrderPrice::Limit(p) => Some(*p),
            OrderPrice::Market => None,
        }
    }

    /// Returns true for market orders
    pub fn is_market(&self) -> bool {
        matches!(self, OrderPrice::Market)
    }

    /// The price used for cash screening: the limit price, or the
    /// instrument's reference price for market orders.
    pub fn effective(&self, reference_price: f64) -> f64 {
        self.limit().unwrap_or(reference_price)
    }
}

impl std::fmt::Display for OrderPrice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderPrice::Limit(p) => write!(f, "{}", p),
            OrderPrice::Market => write!(f, "MARKET"),
        }
    }
}

impl Serialize for OrderPrice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OrderPrice::Limit(p) => serializer.serialize_f64(*p),
            OrderPrice::Market => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for OrderPrice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Number(f64),
            Text(String),
        }

        match Option::<Wire>::deserialize(deserializer)? {
            None => Ok(OrderPrice::Market),
            Some(Wire::Number(p)) => Ok(OrderPrice::Limit(p)),
            Some(Wire::Text(s)) if s.trim().is_empty() => Ok(OrderPrice::Market),
            Some(Wire::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map(OrderPrice::Limit)
                .map_err(|_| de::Error::custom(format!("invalid price: {:?}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
        assert!(Side::Buy.is_buy());
        assert!(Side::Sell.is_sell());
    }

    #[test]
    fn test_side_wire_format() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"BUY\"");
        assert_eq!(
            serde_json::from_str::<Side>("\"SELL\"").unwrap(),
            Side::Sell
        );
    }

    #[test]
    fn test_price_rank_sentinels() {
        assert_eq!(OrderPrice::Market.rank(Side::Buy), f64::INFINITY);
        assert_eq!(OrderPrice::Market.rank(Side::Sell), f64::NEG_INFINITY);
        assert_eq!(OrderPrice::Limit(8.02).rank(Side::Buy), 8.02);
        assert_eq!(OrderPrice::Limit(8.02).rank(Side::Sell), 8.02);
    }

    #[test]
    fn test_price_effective() {
        assert_eq!(OrderPrice::Limit(2.5).effective(1.0), 2.5);
        assert_eq!(OrderPrice::Market.effective(1.0), 1.0);
    }

    #[test]
    fn test_price_from_wire() {
        let p: OrderPrice = serde_json::from_str("\"1.01\"").unwrap();
        assert_eq!(p, OrderPrice::Limit(1.01));

        let p: OrderPrice = serde_json::from_str("2.5").unwrap();
        assert_eq!(p, OrderPrice::Limit(2.5));

        let p: OrderPrice = serde_json::from_str("null").unwrap();
        assert_eq!(p, OrderPrice::Market);

        let p: OrderPrice = serde_json::from_str("\"\"").unwrap();
        assert_eq!(p, OrderPrice::Market);

        assert!(serde_json::from_str::<OrderPrice>("\"eight\"").is_err());
    }

    #[test]
    fn test_price_to_wire() {
        assert_eq!(
            serde_json::to_string(&OrderPrice::Limit(1.25)).unwrap(),
            "1.25"
        );
        assert_eq!(serde_json::to_string(&OrderPrice::Market).unwrap(), "null");
    }
}

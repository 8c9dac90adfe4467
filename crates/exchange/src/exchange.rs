//! The exchange core
//!
//! One [`Exchange`] instance owns everything: the seen-txid set, the broker
//! registry, the client ledger, the order repository, and one lane per
//! listed symbol holding its order book and market stall. A message for a
//! symbol runs to completion (match loop included) under that symbol's lane
//! lock; different symbols proceed in parallel, and cross-symbol races on
//! the shared ledger are caught by the optimistic commit and retried.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use common::Side;
use instrument::{MarketStall, Stock, StockStore};
use matching_engine::{match_once, BookEntry, OrderBook, Trade, TradeProposal};
use oms::{OmsError, Order, OrderStore};
use settlement::{Broker, Ledger, TradeSettlement};

use crate::error::ExchangeError;
use crate::messages::{
    exception_response, ok_response, price_field, Envelope, InstrumentRequest, NewOrderRequest,
};

/// Messages whose sender clock lags wall clock by more than this are
/// rejected as stale
const STALE_AFTER_SECONDS: i64 = 60;

/// Attempts before an optimistic-concurrency loser gives up
const COMMIT_RETRIES: usize = 3;

/// A symbol's matching state, serialized under one lock
struct SymbolLane {
    book: OrderBook,
    stall: MarketStall,
}

/// The exchange: dispatcher, gates, order pipeline and settlement
pub struct Exchange {
    txid_seen: Mutex<HashSet<String>>,
    brokers: RwLock<HashMap<String, Arc<Broker>>>,
    ledger: Ledger,
    stocks: StockStore,
    orders: OrderStore,
    lanes: RwLock<HashMap<String, Arc<Mutex<SymbolLane>>>>,
    // Strictly increasing order timestamps; wall-clock seconds except when
    // several orders land within one second
    last_order_ts: Mutex<i64>,
}

impl Default for Exchange {
    fn default() -> Self {
        Self::new()
    }
}

impl Exchange {
    /// Create an exchange with no listings and no brokers
    pub fn new() -> Self {
        Self {
            txid_seen: Mutex::new(HashSet::new()),
            brokers: RwLock::new(HashMap::new()),
            ledger: Ledger::new(),
            stocks: StockStore::new(),
            orders: OrderStore::new(),
            lanes: RwLock::new(HashMap::new()),
            last_order_ts: Mutex::new(0),
        }
    }

    /// The exchange-wide client ledger
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// The canonical order repository
    pub fn orders(&self) -> &OrderStore {
        &self.orders
    }

    /// List a stock with the default reference price
    pub fn add_stock(&self, stock: Stock) -> storage::Result<()> {
        let stall = MarketStall::new(stock.clone());
        self.list(stock, stall)
    }

    /// List a stock with a listing-supplied reference price
    pub fn add_stock_with_reference(
        &self,
        stock: Stock,
        reference_price: f64,
    ) -> storage::Result<()> {
        let stall = MarketStall::with_reference_price(stock.clone(), reference_price);
        self.list(stock, stall)
    }

    /// List several stocks with the default reference price
    pub fn add_stocks(&self, stocks: Vec<Stock>) -> storage::Result<()> {
        for stock in stocks {
            self.add_stock(stock)?;
        }
        Ok(())
    }

    fn list(&self, stock: Stock, stall: MarketStall) -> storage::Result<()> {
        let symbol = stock.symbol.clone();
        let reference_price = stall.last_price;
        self.stocks.add(stock)?;
        self.lanes.write().insert(
            symbol.clone(),
            Arc::new(Mutex::new(SymbolLane {
                book: OrderBook::new(symbol, reference_price),
                stall,
            })),
        );
        Ok(())
    }

    /// Register a broker
    pub fn add_broker(&self, broker: Broker) {
        self.brokers
            .write()
            .insert(broker.code.clone(), Arc::new(broker));
    }

    /// Handle one message and produce its reply
    ///
    /// Never panics on operator input: every failure maps to an error
    /// reply with the protocol's `(response_code, msg)` pair.
    pub fn recv(&self, msg: &Value) -> Value {
        match self.handle(msg) {
            Ok(reply) => reply,
            Err(err) => {
                warn!(%err, code = err.response_code(), "message rejected");
                exception_response(err.response_code(), &err.to_string())
            }
        }
    }

    fn handle(&self, msg: &Value) -> Result<Value, ExchangeError> {
        let envelope = Envelope::from_value(msg)
            .ok_or_else(|| ExchangeError::Validation("malformed message".to_string()))?;

        // Gates run before any side-effects or type-specific parsing.
        if let Some(txid) = envelope.txid() {
            if self.txid_seen.lock().contains(&txid) {
                return Err(ExchangeError::Duplicate);
            }
        }
        if let Some(sender_ts) = envelope.sender_ts {
            if Utc::now().timestamp() - sender_ts > STALE_AFTER_SECONDS {
                return Err(ExchangeError::Stale);
            }
        }
        // Record the txid ahead of dispatch so a retry storm cannot run the
        // pipeline twice, whatever the first attempt returned.
        if let Some(txid) = envelope.txid() {
            self.txid_seen.lock().insert(txid);
        }

        match envelope.message_type.as_deref() {
            Some("new_order") => self.handle_new_order(&envelope, msg),
            Some("list_stocks") => Ok(json!(self.stocks.symbols())),
            Some("instrument_summary") => self.handle_instrument_summary(msg),
            Some("instrument_trade_history") => self.handle_trade_history(msg),
            Some("instrument_orderbook_summary") => self.handle_orderbook_summary(msg),
            Some("instrument_orderbook") => self.handle_orderbook(msg),
            _ => Err(ExchangeError::UnknownMessage),
        }
    }

    // ------------------------------------------------------------------
    // Order pipeline
    // ------------------------------------------------------------------

    fn handle_new_order(&self, envelope: &Envelope, msg: &Value) -> Result<Value, ExchangeError> {
        let request: NewOrderRequest = serde_json::from_value(msg.clone())
            .map_err(|e| ExchangeError::Validation(format!("malformed new_order: {}", e)))?;

        let txid = envelope
            .txid()
            .ok_or_else(|| ExchangeError::Validation("txid required for new_order".to_string()))?;

        let broker = self
            .brokers
            .read()
            .get(&request.broker_id)
            .cloned()
            .ok_or(ExchangeError::MalformedBroker)?;

        let csid = request.account_id();
        broker
            .get_user(&self.ledger, &csid)
            .ok_or(ExchangeError::UnknownUser)?;

        if request.volume == 0 {
            return Err(ExchangeError::Validation(
                "volume must be positive".to_string(),
            ));
        }
        if let Some(price) = request.price.limit() {
            if !price.is_finite() || price <= 0.0 {
                return Err(ExchangeError::Validation(
                    "price must be a positive decimal".to_string(),
                ));
            }
        }

        self.stocks
            .get(&request.symbol)
            .ok_or(ExchangeError::UnknownSymbol)?;
        let lane = self.lane(&request.symbol)?;
        let mut lane = lane.lock();

        let order = Order {
            txid,
            csid,
            ts: self.next_order_ts(),
            side: request.side,
            symbol: request.symbol.clone(),
            price: request.price,
            volume: request.volume,
            closed: false,
        };

        let reference_price = lane.stall.last_price;
        broker.validate_preorder(&self.ledger, &order, reference_price)?;

        self.with_commit_retries(|| self.accept_order(&order, reference_price))?;

        info!(
            txid = %order.txid,
            symbol = %order.symbol,
            side = %order.side,
            price = %order.price,
            volume = order.volume,
            "order accepted"
        );

        lane.book.insert(book_entry(&order));

        // Repeat matching until the cycle yields no trade.
        while let Some(proposal) = match_once(&lane.book) {
            self.with_commit_retries(|| self.execute_trade(&mut lane, &proposal))?;
        }

        let mut payload = Map::new();
        payload.insert(
            "order".to_string(),
            serde_json::to_value(&order)
                .map_err(|e| ExchangeError::Validation(e.to_string()))?,
        );
        Ok(ok_response("new_order", payload))
    }

    /// Persist the order and reserve its cost as one unit of work
    fn accept_order(&self, order: &Order, reference_price: f64) -> Result<(), ExchangeError> {
        let mut order_session = self.orders.session();
        self.orders.add(&mut order_session, order.clone());

        let mut client_session = self.ledger.session();
        let (buys, sells): (Vec<Order>, Vec<Order>) = match order.side {
            Side::Buy => (vec![order.clone()], Vec::new()),
            Side::Sell => (Vec::new(), vec![order.clone()]),
        };
        let reservations =
            self.ledger
                .reserve(&mut client_session, &buys, &sells, reference_price)?;

        let prepared_orders = order_session.prepare()?;
        let prepared_clients = client_session.prepare()?;
        prepared_orders.apply();
        prepared_clients.apply();

        self.ledger.note_reservations(reservations);
        Ok(())
    }

    /// Close, split and settle one proposed trade as one unit of work
    ///
    /// The book is reconciled only after the commit applies, so a failed
    /// commit leaves book and repository agreeing with each other.
    fn execute_trade(
        &self,
        lane: &mut SymbolLane,
        proposal: &TradeProposal,
    ) -> Result<(), ExchangeError> {
        let mut trade = Trade::from_proposal(proposal, Utc::now().timestamp());

        let mut order_session = self.orders.session();
        let mut closing = vec![proposal.buy_txid.clone()];
        closing.extend(proposal.sell_txids());
        self.orders.close(&mut order_session, &closing)?;

        let mut split_child: Option<Order> = None;
        if proposal.excess > 0 {
            let last_txid = &proposal.last_sell().txid;
            let parent = order_session
                .get_mut(last_txid)
                .ok_or_else(|| OmsError::UnknownOrder(last_txid.clone()))?;
            let child = parent.split_sell(proposal.excess)?;
            order_session.put(child.clone());
            split_child = Some(child);
        }

        let mut client_session = self.ledger.session();
        let settlement = TradeSettlement {
            symbol: proposal.symbol.clone(),
            buy_txid: proposal.buy_txid.clone(),
            buyer: proposal.buy_csid.clone(),
            volume: proposal.volume,
            total_price: trade.total_price,
            seller_credits: proposal
                .sells
                .iter()
                .map(|s| {
                    (
                        s.csid.clone(),
                        proposal.execution_price * s.matched_volume as f64,
                    )
                })
                .collect(),
        };
        self.ledger.settle(&mut client_session, &settlement)?;

        let prepared_orders = order_session.prepare()?;
        let prepared_clients = client_session.prepare()?;
        prepared_orders.apply();
        prepared_clients.apply();

        self.ledger.consume_reservation(&proposal.buy_txid);

        lane.book.remove(&proposal.buy_txid);
        for txid in proposal.sell_txids() {
            lane.book.remove(&txid);
        }
        if let Some(child) = split_child {
            lane.book.insert(book_entry(&child));
        }

        trade.closed = true;
        lane.book.reference_price = trade.avg_price;
        info!(
            tid = %trade.tid,
            symbol = %trade.symbol,
            price = trade.avg_price,
            volume = trade.volume,
            excess = trade.excess,
            "trade executed"
        );
        lane.stall.record_trade(trade);

        Ok(())
    }

    fn with_commit_retries(
        &self,
        mut unit: impl FnMut() -> Result<(), ExchangeError>,
    ) -> Result<(), ExchangeError> {
        let mut attempt = 0;
        loop {
            match unit() {
                Err(ExchangeError::Conflict) if attempt + 1 < COMMIT_RETRIES => {
                    attempt += 1;
                    warn!(attempt, "unit of work lost a commit race, retrying");
                }
                other => return other,
            }
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    fn handle_instrument_summary(&self, msg: &Value) -> Result<Value, ExchangeError> {
        let request = instrument_request(msg)?;
        let lane = self.lane(&request.symbol)?;
        let lane = lane.lock();
        let stall = &lane.stall;

        let mut payload = Map::new();
        payload.insert("symbol".to_string(), json!(stall.stock.symbol));
        payload.insert("name".to_string(), json!(stall.stock.name));
        // Session open/close prices are not tracked; the fields stay on the
        // wire for dashboard compatibility.
        payload.insert("opening_price".to_string(), Value::Null);
        payload.insert("closing_price".to_string(), Value::Null);
        payload.insert("min_price".to_string(), price_field(stall.min_price));
        payload.insert("max_price".to_string(), price_field(stall.max_price));
        payload.insert("num_trades".to_string(), json!(stall.n_trades));
        payload.insert("vol_trades".to_string(), json!(stall.v_trades));
        match stall.last_trade() {
            Some(trade) => {
                payload.insert(
                    "last_trade_price".to_string(),
                    price_field(Some(trade.avg_price)),
                );
                payload.insert("last_trade_volume".to_string(), json!(trade.volume));
                payload.insert("last_trade_ts".to_string(), json!(trade.ts));
            }
            None => {
                payload.insert("last_trade_price".to_string(), Value::Null);
                payload.insert("last_trade_volume".to_string(), Value::Null);
                payload.insert("last_trade_ts".to_string(), Value::Null);
            }
        }
        Ok(ok_response("instrument_summary", payload))
    }

    fn handle_trade_history(&self, msg: &Value) -> Result<Value, ExchangeError> {
        let request = instrument_request(msg)?;
        let lane = self.lane(&request.symbol)?;
        let lane = lane.lock();

        let mut payload = Map::new();
        payload.insert("symbol".to_string(), json!(request.symbol));
        payload.insert(
            "trade_history".to_string(),
            serde_json::to_value(&lane.stall.trade_history)
                .map_err(|e| ExchangeError::Validation(e.to_string()))?,
        );
        Ok(ok_response("instrument_trade_history", payload))
    }

    fn handle_orderbook_summary(&self, msg: &Value) -> Result<Value, ExchangeError> {
        let request = instrument_request(msg)?;
        let lane = self.lane(&request.symbol)?;
        let lane = lane.lock();
        let summary = lane.book.summary();

        let mut payload = Map::new();
        payload.insert("symbol".to_string(), json!(request.symbol));
        payload.insert("depth_buys".to_string(), json!(summary.depth_buys));
        payload.insert("depth_sells".to_string(), json!(summary.depth_sells));
        payload.insert("top_num_buys".to_string(), json!(summary.top_num_buys));
        payload.insert("top_num_sells".to_string(), json!(summary.top_num_sells));
        payload.insert("top_vol_buys".to_string(), json!(summary.top_vol_buys));
        payload.insert("top_vol_sells".to_string(), json!(summary.top_vol_sells));
        payload.insert("current_buy".to_string(), price_field(summary.current_buy));
        payload.insert(
            "current_sell".to_string(),
            price_field(summary.current_sell),
        );
        Ok(ok_response("instrument_orderbook_summary", payload))
    }

    fn handle_orderbook(&self, msg: &Value) -> Result<Value, ExchangeError> {
        let request = instrument_request(msg)?;
        let lane = self.lane(&request.symbol)?;
        let lane = lane.lock();

        let mut payload = Map::new();
        payload.insert("symbol".to_string(), json!(request.symbol));
        payload.insert(
            "buy_book".to_string(),
            book_rows(lane.book.buy_book(), request.n),
        );
        payload.insert(
            "sell_book".to_string(),
            book_rows(lane.book.sell_book(), request.n),
        );
        Ok(ok_response("instrument_orderbook", payload))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn lane(&self, symbol: &str) -> Result<Arc<Mutex<SymbolLane>>, ExchangeError> {
        self.lanes
            .read()
            .get(symbol)
            .cloned()
            .ok_or(ExchangeError::UnknownSymbol)
    }

    /// Strictly increasing arrival timestamp
    ///
    /// Wall-clock seconds, bumped by one when several orders arrive within
    /// the same second, so price-time priority never depends on intake
    /// ordering accidents.
    fn next_order_ts(&self) -> i64 {
        let now = Utc::now().timestamp();
        let mut last = self.last_order_ts.lock();
        *last = (*last + 1).max(now);
        *last
    }
}

fn book_entry(order: &Order) -> BookEntry {
    BookEntry {
        txid: order.txid.clone(),
        csid: order.csid.clone(),
        symbol: order.symbol.clone(),
        side: order.side,
        price: order.price,
        volume: order.volume,
        ts: order.ts,
    }
}

fn book_rows<'a>(entries: impl Iterator<Item = &'a BookEntry>, n: usize) -> Value {
    Value::Array(
        entries
            .take(n)
            .map(|entry| {
                json!({
                    "txid": entry.txid,
                    "csid": entry.csid,
                    "ts": entry.ts,
                    "price": entry.price,
                    "volume": entry.volume,
                })
            })
            .collect(),
    )
}

fn instrument_request(msg: &Value) -> Result<InstrumentRequest, ExchangeError> {
    serde_json::from_value(msg.clone())
        .map_err(|e| ExchangeError::Validation(format!("malformed query: {}", e)))
}

//! Market event fan-out.
//!
//! [`EventBus`] wraps a tokio broadcast channel. Publishing is fire-and-forget: with no
//! subscribers, or with a lagging one, the send result is ignored and the publisher
//! never blocks.

use crate::types::{Side, Transaction};
use rust_decimal::Decimal;
use tokio::sync::broadcast;

/// Default broadcast buffer per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Accepted order placement.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OrderEvent {
    pub trader: String,
    pub instrument: String,
    pub price: Decimal,
    pub quantity: u64,
}

/// One event on the market stream, tagged by `kind`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MarketEvent {
    Bid(OrderEvent),
    Ask(OrderEvent),
    Transaction(Transaction),
}

impl MarketEvent {
    pub fn order(side: Side, event: OrderEvent) -> Self {
        match side {
            Side::Bid => MarketEvent::Bid(event),
            Side::Ask => MarketEvent::Ask(event),
        }
    }
}

#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<MarketEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MarketEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: MarketEvent) {
        // no subscribers is not an error for the publisher
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionId;

    fn tx() -> Transaction {
        Transaction {
            id: TransactionId(1),
            seller: "s".into(),
            buyer: "b".into(),
            instrument: "XYZ".into(),
            price: Decimal::from(62),
            quantity: 1,
            timestamp: 5,
        }
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let bus = EventBus::new(4);
        bus.publish(MarketEvent::Transaction(tx()));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn every_subscriber_receives_event() {
        let bus = EventBus::new(4);
        let mut r1 = bus.subscribe();
        let mut r2 = bus.subscribe();
        bus.publish(MarketEvent::Transaction(tx()));
        assert_eq!(r1.try_recv().unwrap(), MarketEvent::Transaction(tx()));
        assert_eq!(r2.try_recv().unwrap(), MarketEvent::Transaction(tx()));
    }

    #[test]
    fn events_serialize_with_kind_tag() {
        let json = serde_json::to_value(MarketEvent::Transaction(tx())).unwrap();
        assert_eq!(json["kind"], "transaction");
        assert_eq!(json["seller"], "s");
        let bid = MarketEvent::order(
            Side::Bid,
            OrderEvent {
                trader: "t".into(),
                instrument: "XYZ".into(),
                price: Decimal::from(3),
                quantity: 1,
            },
        );
        assert_eq!(serde_json::to_value(bid).unwrap()["kind"], "bid");
    }
}

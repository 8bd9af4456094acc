//! Single-instrument order book: one bid queue and one ask queue.
//!
//! Bids are kept in descending price order, asks in ascending price order; the head of
//! each queue is the best price. Equal prices keep arrival order. A trader has at most
//! one resting order per side.

use crate::types::{BookLevel, BookView, Order, Side};
use rust_decimal::Decimal;

/// Bid and ask queues for one instrument.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OrderBook {
    bids: Vec<Order>,
    asks: Vec<Order>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self, side: Side) -> &Vec<Order> {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    fn queue_mut(&mut self, side: Side) -> &mut Vec<Order> {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    /// Replaces the trader's resting order on `side` with `order`. A zero quantity only
    /// removes the previous order. Returns the replaced order, if any.
    pub fn place(&mut self, side: Side, order: Order) -> Option<Order> {
        let previous = self.cancel(side, &order.trader);
        if order.quantity > 0 {
            let queue = self.queue_mut(side);
            // after every resting order at the same or a better price
            let idx = match side {
                Side::Bid => queue.partition_point(|o| o.price >= order.price),
                Side::Ask => queue.partition_point(|o| o.price <= order.price),
            };
            queue.insert(idx, order);
        }
        previous
    }

    /// Removes the trader's resting order on `side`.
    pub fn cancel(&mut self, side: Side, trader: &str) -> Option<Order> {
        let queue = self.queue_mut(side);
        let idx = queue.iter().position(|o| o.trader == trader)?;
        Some(queue.remove(idx))
    }

    /// Highest bid.
    pub fn best_bid(&self) -> Option<&Order> {
        self.bids.first()
    }

    /// Lowest ask.
    pub fn best_ask(&self) -> Option<&Order> {
        self.asks.first()
    }

    /// Consumes `quantity` from the bid at `bid_index` and the ask at `ask_index`. A fully
    /// consumed order is removed; a partially consumed one keeps its place. `quantity` must
    /// not exceed either order.
    pub fn fill(&mut self, bid_index: usize, ask_index: usize, quantity: u64) {
        for (side, index) in [(Side::Bid, bid_index), (Side::Ask, ask_index)] {
            let queue = self.queue_mut(side);
            if let Some(order) = queue.get_mut(index) {
                if order.quantity <= quantity {
                    queue.remove(index);
                } else {
                    order.quantity -= quantity;
                }
            }
        }
    }

    /// The trader's resting order on `side`.
    pub fn order_of(&self, side: Side, trader: &str) -> Option<&Order> {
        self.queue(side).iter().find(|o| o.trader == trader)
    }

    pub fn bids(&self) -> &[Order] {
        &self.bids
    }

    pub fn asks(&self) -> &[Order] {
        &self.asks
    }

    /// Number of resting orders on both sides.
    pub fn len(&self) -> usize {
        self.bids.len() + self.asks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Re-establishes price order after loading queues from outside (stable, so
    /// equal-priced orders keep their stored order).
    pub fn normalize(&mut self) {
        self.bids.sort_by(|a, b| b.price.cmp(&a.price));
        self.asks.sort_by(|a, b| a.price.cmp(&b.price));
    }

    /// One row per distinct price with summed quantity, best price first.
    pub fn view(&self) -> BookView {
        BookView {
            bids: aggregate(&self.bids),
            asks: aggregate(&self.asks),
        }
    }
}

/// Folds consecutive equal-priced orders (contiguous because queues are sorted).
fn aggregate(queue: &[Order]) -> Vec<BookLevel> {
    let mut levels: Vec<BookLevel> = Vec::new();
    for order in queue {
        match levels.last_mut() {
            Some(level) if level.price == order.price => {
                level.quantity = level.quantity.saturating_add(order.quantity)
            }
            _ => levels.push(BookLevel {
                price: order.price,
                quantity: order.quantity,
            }),
        }
    }
    levels
}

/// True if `queue` is ordered best-first for `side`.
pub fn is_price_sorted(side: Side, queue: &[Order]) -> bool {
    queue.windows(2).all(|w| match side {
        Side::Bid => w[0].price >= w[1].price,
        Side::Ask => w[0].price <= w[1].price,
    })
}

/// Price of the head of `queue`, if any.
pub fn head_price(queue: &[Order]) -> Option<Decimal> {
    queue.first().map(|o| o.price)
}

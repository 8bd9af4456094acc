//! Periodic clearing of one instrument's book.
//!
//! [`clear_instrument`] repeatedly pairs the best crossing bid with the best crossing ask,
//! executing at the resting ask's price, and moves cash and shares through the ledger.

use crate::ledger::Ledger;
use crate::order_book::OrderBook;
use crate::transactions::TransactionLog;
use crate::types::Transaction;
use log::debug;
use std::collections::HashSet;

/// Best crossing (bid index, ask index) not in `voided`, in price-time priority: the
/// highest bid takes the first ask it crosses, a lower bid only gets a turn when the
/// bids above it have no crossing ask left outside `voided`.
fn next_pair(book: &OrderBook, voided: &HashSet<(String, String)>) -> Option<(usize, usize)> {
    for (i, bid) in book.bids().iter().enumerate() {
        let mut crossing = book
            .asks()
            .iter()
            .enumerate()
            .take_while(|(_, ask)| ask.price <= bid.price)
            .peekable();
        // asks are ascending, so no ask crosses this bid or any lower one
        crossing.peek()?;
        let open = crossing.find(|(_, ask)| !voided.contains(&(bid.trader.clone(), ask.trader.clone())));
        if let Some((j, _)) = open {
            return Some((i, j));
        }
    }
    None
}

/// Runs the clearing loop for `instrument` and returns the executed transactions.
///
/// A pair that fails re-validation (self-trade, seller short of shares, buyer short of
/// cash, an amount too large to represent) is voided for the rest of this call: both orders stay resting untouched and the
/// loop moves on to the next crossing pair. Every iteration either voids a new pair or
/// fills quantity, so the loop terminates.
///
/// Only the book, ledger and log are touched; publishing the returned transactions to
/// subscribers is the caller's job.
pub fn clear_instrument(
    instrument: &str,
    book: &mut OrderBook,
    ledger: &mut Ledger,
    log: &mut TransactionLog,
    now: u64,
) -> Vec<Transaction> {
    let mut executed = Vec::new();
    let mut voided = HashSet::new();
    while let Some((i, j)) = next_pair(book, &voided) {
        let (bid, ask) = (&book.bids()[i], &book.asks()[j]);
        let quantity = bid.quantity.min(ask.quantity);
        let price = ask.price;
        let seller = ask.trader.clone();
        let buyer = bid.trader.clone();

        if seller == buyer {
            debug!(
                "pairing voided instrument={} trader={} reason=self_trade",
                instrument, seller
            );
            voided.insert((buyer, seller));
            continue;
        }
        if let Err(reason) = ledger.apply_trade(&seller, &buyer, instrument, price, quantity) {
            debug!(
                "pairing voided instrument={} seller={} buyer={} price={} quantity={} reason={}",
                instrument, seller, buyer, price, quantity, reason
            );
            voided.insert((buyer, seller));
            continue;
        }
        book.fill(i, j, quantity);
        executed.push(log.append(&seller, &buyer, instrument, price, quantity, now));
    }
    executed
}

// Holds loaded orders and answers market selections.
use shared::models::Order;

use crate::error::EngineError;

pub struct OrderStore {
    orders: Vec<Order>,
}

impl OrderStore {
    pub fn new() -> Self {
        OrderStore { orders: Vec::new() }
    }

    pub fn from_orders(orders: Vec<Order>) -> Self {
        let mut store = Self::new();
        store.add_orders(orders);
        store
    }

    /// Keeps orders sorted by order date; equal dates keep insertion order.
    pub fn add_orders(&mut self, new_orders: Vec<Order>) {
        self.orders.extend(new_orders);
        self.orders.sort_by_key(|o| o.order_date);
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Distinct markets, sorted.
    pub fn markets(&self) -> Vec<String> {
        let mut markets: Vec<String> = self.orders.iter().map(|o| o.market.clone()).collect();
        markets.sort();
        markets.dedup();
        markets
    }

    /// Orders whose market is in `selected`. Selecting nothing is an error,
    /// not an empty report.
    pub fn filter_by_markets(&self, selected: &[String]) -> Result<Vec<Order>, EngineError> {
        if selected.is_empty() {
            return Err(EngineError::EmptySelection);
        }
        Ok(self
            .orders
            .iter()
            .filter(|o| selected.iter().any(|m| m == &o.market))
            .cloned()
            .collect())
    }
}

impl Default for OrderStore {
    fn default() -> Self {
        Self::new()
    }
}

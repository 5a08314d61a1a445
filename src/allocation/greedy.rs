//! Single-pass greedy fill.

use tracing::debug;

use super::Allocation;
use crate::types::{Order, Quantity};

/// Accumulate orders in book order while staying under the tolerance ceiling.
///
/// `orders` must be best-first. An order is accepted, in full, only if the
/// running quantity plus its quantity is *strictly* below
/// `capacity * (1 + tolerance)`. Scanning stops once the running quantity
/// reaches `capacity` or the orders run out. A capacity of zero or less
/// selects nothing.
///
/// A negative tolerance (selling) keeps the fill under the capacity; a
/// positive one (buying) lets it overshoot slightly.
///
/// Runs in O(n).
#[must_use]
pub fn greedy(orders: &[Order], capacity: Quantity, tolerance: f64) -> Allocation {
    let ceiling = capacity * (1.0 + tolerance);

    let mut filled: Quantity = 0.0;
    let mut value = 0.0;
    let mut selection = Vec::new();

    for order in orders {
        if filled >= capacity {
            break;
        }

        let next = filled + order.quantity();
        if next < ceiling {
            filled = next;
            value += order.notional();
            selection.push(*order);
        }
    }

    debug!(
        capacity,
        tolerance,
        filled,
        selected = selection.len(),
        scanned = orders.len(),
        "greedy fill"
    );

    Allocation {
        filled_quantity: filled,
        total_value: value,
        selection,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Exchange;

    fn order(price: f64, quantity: f64) -> Order {
        Order::new(price, quantity, Exchange::Coinbase)
    }

    #[test]
    fn test_stops_once_capacity_reached() {
        let orders = [order(100.0, 4.0), order(99.0, 6.0), order(98.0, 1.0)];
        let fill = greedy(&orders, 10.0, 0.01);

        assert_eq!(fill.filled_quantity, 10.0);
        assert_eq!(fill.total_value, 400.0 + 594.0);
        assert_eq!(fill.selection.len(), 2);
    }

    #[test]
    fn test_skips_orders_that_overshoot() {
        // ceiling = 9.9
        let orders = [order(100.0, 5.0), order(99.0, 5.0), order(98.0, 4.0)];
        let fill = greedy(&orders, 10.0, -0.01);

        assert_eq!(fill.filled_quantity, 9.0);
        assert_eq!(fill.total_value, 500.0 + 392.0);
        let prices: Vec<f64> = fill.selection.iter().map(Order::price).collect();
        assert_eq!(prices, vec![100.0, 98.0]);
    }

    #[test]
    fn test_ceiling_is_strict() {
        // 4.0 * (1 + 0.25) = 5.0 exactly; 5.0 < 5.0 is false
        let orders = [order(10.0, 5.0), order(11.0, 2.0)];
        let fill = greedy(&orders, 4.0, 0.25);
        assert_eq!(fill.filled_quantity, 2.0);
        assert_eq!(fill.selection[0].price(), 11.0);
    }

    #[test]
    fn test_insufficient_book_returns_partial() {
        let orders = [order(100.0, 1.0), order(99.0, 2.0)];
        let fill = greedy(&orders, 10.0, 0.01);
        assert_eq!(fill.filled_quantity, 3.0);
        assert_eq!(fill.selection.len(), 2);
    }

    #[test]
    fn test_non_positive_capacity_selects_nothing() {
        let orders = [order(100.0, 1.0)];
        assert!(greedy(&orders, 0.0, 0.01).is_empty());
        assert!(greedy(&orders, -5.0, -0.01).is_empty());
    }

    #[test]
    fn test_empty_orders() {
        let fill = greedy(&[], 10.0, -0.01);
        assert_eq!(fill, Allocation::empty());
    }
}

//! Bounded approximation for books the exact search cannot finish.
//!
//! Quantities are rounded *up* to a grid of `capacity / cells` and a classic
//! tabulated 0/1 knapsack runs over the best-priced levels. Rounding up keeps
//! grid-feasible selections feasible in real quantities, and candidates are
//! still checked against the real capacity, so the result never exceeds it.
//! Each selected order can cost at most one cell of fill. The table holds at
//! most `budget` cells.
//!
//! A first-fit pass over the whole book runs alongside, and the better of the
//! two fills (same lexicographic rule as [`optimal`](super::optimal)) wins.
//! That covers deep books of small levels, where the table can only see a
//! prefix of the book.

use tracing::debug;

use super::optimal::{candidates, Fill};
use super::{Allocation, Objective};
use crate::types::{Order, Quantity};

/// Fewest grid cells the table is allowed to shrink to
pub const MIN_GRID_CELLS: usize = 1_000;

/// Grid resolution cap
pub const MAX_GRID_CELLS: usize = 100_000;

/// Fraction of a cell ignored when rounding up, so exact multiples stay exact
const CELL_SLACK: f64 = 1e-6;

/// Approximate [`optimal`](super::optimal) within a table of `budget` cells.
///
/// `orders` must be best-first; the selection keeps that order. Always
/// completes, in `O(budget + orders.len())` time and space.
#[must_use]
pub fn approximate(
    orders: &[Order],
    capacity: Quantity,
    objective: Objective,
    budget: usize,
) -> Allocation {
    let orders = candidates(orders, capacity);
    let tabulated = tabulate(&orders, capacity, objective, budget);
    let scanned = first_fit(&orders, capacity);

    let tabulated_fill = fill_of(&tabulated);
    let scanned_fill = fill_of(&scanned);
    let use_scan = scanned_fill.beats(tabulated_fill, objective);

    debug!(
        capacity,
        objective = ?objective,
        candidates = orders.len(),
        tabulated = tabulated_fill.quantity,
        first_fit = scanned_fill.quantity,
        use_scan,
        "approximate fill"
    );

    Allocation::from_selection(if use_scan { scanned } else { tabulated })
}

fn fill_of(selection: &[Order]) -> Fill {
    selection.iter().fold(Fill::default(), |fill, order| fill.with(order))
}

/// Take orders in book order whenever they still fit
fn first_fit(orders: &[Order], capacity: Quantity) -> Vec<Order> {
    let mut filled = 0.0;
    let mut selection = Vec::new();
    for order in orders {
        if filled + order.quantity() <= capacity {
            filled += order.quantity();
            selection.push(*order);
        }
    }
    selection
}

/// Tabulated knapsack over the best `budget / MIN_GRID_CELLS` levels
fn tabulate(
    orders: &[Order],
    capacity: Quantity,
    objective: Objective,
    budget: usize,
) -> Vec<Order> {
    if orders.is_empty() {
        return Vec::new();
    }

    let depth = orders.len().min((budget / MIN_GRID_CELLS).max(1));
    let orders = &orders[..depth];
    let cells = (budget / depth).clamp(1, MAX_GRID_CELLS);
    let cell = capacity / cells as f64;

    // Every candidate fits the capacity, so only float noise can push it past `cells`
    let weights: Vec<usize> = orders
        .iter()
        .map(|order| {
            let cells_needed = (order.quantity() / cell - CELL_SLACK).ceil();
            (cells_needed as usize).clamp(1, cells)
        })
        .collect();

    // best[c]: best fill whose grid weight is at most c
    let width = cells + 1;
    let mut best = vec![Fill::default(); width];
    let mut taken = vec![false; depth * width];

    for (i, (order, &weight)) in orders.iter().zip(&weights).enumerate() {
        for c in (weight..=cells).rev() {
            let candidate = best[c - weight].with(order);
            if candidate.quantity <= capacity && candidate.beats(best[c], objective) {
                best[c] = candidate;
                taken[i * width + c] = true;
            }
        }
    }

    let mut c = cells;
    let mut selection = Vec::new();
    for i in (0..depth).rev() {
        if taken[i * width + c] {
            selection.push(orders[i]);
            c -= weights[i];
        }
    }
    selection.reverse();
    selection
}

//! Value-optimal fill via a memoized 0/1 knapsack.
//!
//! Each order is an item whose weight is its quantity and whose value is
//! `price * quantity`. `solve(remaining, i)` yields the best fill using only
//! `orders[i..]` within `remaining` quantity, where "best" is lexicographic:
//!
//! 1. more filled quantity (closer to the capacity from below), then
//! 2. better total value for the [`Objective`].
//!
//! Quantities are continuous, so there is no grid to tabulate. The memo only
//! holds the `(remaining, i)` pairs the search actually reaches, keyed by the
//! exact bit pattern of `remaining`. This works because `remaining` only ever
//! shrinks by subtracting an order's quantity, so shared prefixes of
//! include/exclude decisions produce identical floats. The memo lives for one
//! call and is bounded by a state budget.
//!
//! The search runs on an explicit frame stack rather than the call stack, so
//! book depth is limited by memory, not by thread stack size. Two exact
//! shortcuts keep it small: orders that can never be taken (zero quantity or
//! larger than the capacity) are dropped up front, and once the rest of the
//! book fits in `remaining` it is taken whole without memoizing anything.

use rustc_hash::FxHashMap;
use tracing::debug;

use super::{Allocation, Objective};
use crate::error::Error;
use crate::types::{Order, Quantity};

/// Relative tolerance under which two filled quantities count as equal
const QUANTITY_EPSILON: f64 = 1e-9;

/// Filled quantity and value of a partial selection
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Fill {
    pub(crate) quantity: Quantity,
    pub(crate) value: f64,
}

impl Fill {
    /// This fill with `order` added
    pub(crate) fn with(self, order: &Order) -> Self {
        Self {
            quantity: self.quantity + order.quantity(),
            value: self.value + order.notional(),
        }
    }

    /// True if `self` beats `incumbent` under `objective`
    pub(crate) fn beats(self, incumbent: Fill, objective: Objective) -> bool {
        let scale = self.quantity.abs().max(incumbent.quantity.abs()).max(1.0);
        if (self.quantity - incumbent.quantity).abs() > QUANTITY_EPSILON * scale {
            return self.quantity > incumbent.quantity;
        }
        objective.prefers(self.value, incumbent.value)
    }
}

/// Orders that could be part of a fill: positive quantity no larger than `capacity`
pub(crate) fn candidates(orders: &[Order], capacity: Quantity) -> Vec<Order> {
    orders
        .iter()
        .filter(|order| order.quantity() > 0.0 && order.quantity() <= capacity)
        .copied()
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct Decision {
    best: Fill,
    /// Whether `best` includes the order at this index
    take: bool,
}

/// Where a suspended `(remaining, index)` evaluation resumes
#[derive(Debug, Clone, Copy)]
enum Step {
    Enter,
    /// The exclude branch has returned
    Excluded,
    /// The include branch has returned; `exclude` is the other branch's result
    Included { exclude: Fill },
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    remaining: Quantity,
    index: usize,
    step: Step,
}

impl Frame {
    fn enter(remaining: Quantity, index: usize) -> Self {
        Self {
            remaining,
            index,
            step: Step::Enter,
        }
    }
}

struct Knapsack {
    orders: Vec<Order>,
    /// `suffix[i]` is the fill of taking every order in `orders[i..]`
    suffix: Vec<Fill>,
    objective: Objective,
    memo: FxHashMap<(u64, usize), Decision>,
    max_states: usize,
}

impl Knapsack {
    fn new(orders: Vec<Order>, objective: Objective, max_states: usize) -> Self {
        let mut suffix = vec![Fill::default(); orders.len() + 1];
        for (i, order) in orders.iter().enumerate().rev() {
            suffix[i] = suffix[i + 1].with(order);
        }

        Self {
            orders,
            suffix,
            objective,
            memo: FxHashMap::default(),
            max_states,
        }
    }

    /// Answer for `(remaining, index)` without exploring, if one is known
    fn settled(&self, remaining: Quantity, index: usize) -> Option<Fill> {
        if index == self.orders.len() || remaining <= 0.0 {
            return Some(Fill::default());
        }
        // Everything left fits: taking it all fills strictly more
        if self.suffix[index].quantity <= remaining {
            return Some(self.suffix[index]);
        }
        self.memo
            .get(&(remaining.to_bits(), index))
            .map(|decision| decision.best)
    }

    fn record(
        &mut self,
        remaining: Quantity,
        index: usize,
        decision: Decision,
    ) -> Result<Fill, Error> {
        if self.memo.len() >= self.max_states {
            return Err(Error::StateBudgetExhausted {
                limit: self.max_states,
            });
        }
        self.memo.insert((remaining.to_bits(), index), decision);
        Ok(decision.best)
    }

    /// Best fill of the whole book within `capacity`.
    ///
    /// Each frame first evaluates its exclude branch, then its include branch
    /// if the order fits, and memoizes whichever wins. `returned` carries the
    /// result of the most recently finished frame back to its parent.
    fn solve(&mut self, capacity: Quantity) -> Result<Fill, Error> {
        let mut stack = vec![Frame::enter(capacity, 0)];
        let mut returned = Fill::default();

        while let Some(Frame {
            remaining,
            index,
            step,
        }) = stack.pop()
        {
            match step {
                Step::Enter => {
                    if let Some(fill) = self.settled(remaining, index) {
                        returned = fill;
                        continue;
                    }
                    stack.push(Frame {
                        remaining,
                        index,
                        step: Step::Excluded,
                    });
                    stack.push(Frame::enter(remaining, index + 1));
                }
                Step::Excluded => {
                    let exclude = returned;
                    let quantity = self.orders[index].quantity();
                    if quantity <= remaining {
                        stack.push(Frame {
                            remaining,
                            index,
                            step: Step::Included { exclude },
                        });
                        stack.push(Frame::enter(remaining - quantity, index + 1));
                    } else {
                        let decision = Decision {
                            best: exclude,
                            take: false,
                        };
                        returned = self.record(remaining, index, decision)?;
                    }
                }
                Step::Included { exclude } => {
                    let include = returned.with(&self.orders[index]);
                    let decision = if include.beats(exclude, self.objective) {
                        Decision {
                            best: include,
                            take: true,
                        }
                    } else {
                        Decision {
                            best: exclude,
                            take: false,
                        }
                    };
                    returned = self.record(remaining, index, decision)?;
                }
            }
        }

        Ok(returned)
    }

    /// Walk the memo from `(capacity, 0)` and collect the orders taken.
    ///
    /// An order is selected when the memoized decision at the current remaining
    /// capacity took it, i.e. leaving it out changes the extremal fill.
    fn selection(&self, capacity: Quantity) -> Vec<Order> {
        let mut remaining = capacity;
        let mut selected = Vec::new();

        for (i, order) in self.orders.iter().enumerate() {
            if remaining <= 0.0 {
                break;
            }
            if self.suffix[i].quantity <= remaining {
                selected.extend_from_slice(&self.orders[i..]);
                break;
            }
            let Some(decision) = self.memo.get(&(remaining.to_bits(), i)) else {
                break;
            };
            if decision.take {
                selected.push(*order);
                remaining -= order.quantity();
            }
        }

        selected
    }
}

/// Pick the subset of `orders` that fills closest to `capacity` without
/// exceeding it, breaking ties on total value in the `objective` direction.
///
/// `orders` must be best-first; the selection keeps that order. Orders are
/// taken whole. Orders with zero quantity are never selected. A capacity of
/// zero or less selects nothing.
///
/// # Errors
///
/// Returns [`Error::StateBudgetExhausted`] if more than `max_states`
/// `(remaining, index)` pairs would be memoized.
pub fn optimal(
    orders: &[Order],
    capacity: Quantity,
    objective: Objective,
    max_states: usize,
) -> Result<Allocation, Error> {
    let mut knapsack = Knapsack::new(candidates(orders, capacity), objective, max_states);
    let best = knapsack.solve(capacity)?;
    let selection = knapsack.selection(capacity);

    debug!(
        capacity,
        objective = ?objective,
        levels = orders.len(),
        candidates = knapsack.orders.len(),
        filled = best.quantity,
        value = best.value,
        states = knapsack.memo.len(),
        selected = selection.len(),
        "optimal fill"
    );

    Ok(Allocation::from_selection(selection))
}

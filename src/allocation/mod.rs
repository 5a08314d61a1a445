//! Capacity-constrained allocation over the aggregated book.
//!
//! Two strategies pick whole orders (never partial fills) from a best-first
//! sequence until a target quantity, the *capacity*, is met:
//!
//! - [`greedy`]: one linear pass in price order, accepting an order while the
//!   running quantity stays under `capacity * (1 + tolerance)`.
//! - [`optimal`]: a memoized 0/1 knapsack that gets as close to the capacity as
//!   possible without exceeding it, then maximizes proceeds (selling) or
//!   minimizes cost (buying).
//!
//! The exact search is bounded by a state budget. When a book is too large for
//! it, the `optimal_*` entry points fall back to [`approximate`], a tabulated
//! knapsack over a quantity grid that always completes. Set
//! [`AllocationParams::grid_fallback`] to `false` to get
//! [`Error::StateBudgetExhausted`] instead.
//!
//! Selling matches against bids, buying against asks.
//!
//! # Example
//!
//! ```rust
//! use aggregated_fill::orderbook::OrderBook;
//! use aggregated_fill::types::{Exchange, Order};
//!
//! let mut book = OrderBook::new();
//! book.insert_ask(Order::new(100.0, 2.0, Exchange::Coinbase));
//! book.insert_ask(Order::new(101.0, 3.0, Exchange::Gemini));
//! book.insert_ask(Order::new(99.0, 5.0, Exchange::Kraken));
//!
//! let fill = book.optimal_buy(5.0).unwrap();
//! assert_eq!(fill.filled_quantity, 5.0);
//! assert_eq!(fill.total_value, 495.0);
//! ```

pub mod greedy;
pub mod grid;
pub mod optimal;

use serde::Serialize;
use tracing::warn;

use crate::error::Error;
use crate::orderbook::OrderBook;
use crate::types::{Order, Quantity};

pub use greedy::greedy;
pub use grid::approximate;
pub use optimal::optimal;

/// Sell-side greedy tolerance: stay 1% under the capacity
pub const DEFAULT_SELL_TOLERANCE: f64 = -0.01;

/// Buy-side greedy tolerance: allow up to 1% over the capacity
pub const DEFAULT_BUY_TOLERANCE: f64 = 0.01;

/// Default cap on memoized knapsack states per optimal call
pub const DEFAULT_MAX_STATES: usize = 2_000_000;

/// Result of one allocation call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Allocation {
    /// Sum of selected quantities
    pub filled_quantity: Quantity,
    /// Sum of `price * quantity` over the selection
    pub total_value: f64,
    /// Selected orders, in book order
    pub selection: Vec<Order>,
}

impl Allocation {
    /// An allocation that selected nothing
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build an allocation from selected orders, summing quantity and value
    #[must_use]
    pub fn from_selection(selection: Vec<Order>) -> Self {
        let filled_quantity = selection.iter().map(Order::quantity).sum();
        let total_value = selection.iter().map(Order::notional).sum();
        Self {
            filled_quantity,
            total_value,
            selection,
        }
    }

    /// Volume-weighted average price, or `None` if nothing was filled
    #[must_use]
    pub fn average_price(&self) -> Option<f64> {
        (self.filled_quantity > 0.0).then(|| self.total_value / self.filled_quantity)
    }

    /// True if no order was selected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selection.is_empty()
    }
}

/// Direction in which [`optimal`] breaks ties on total value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    /// Largest proceeds (selling into bids)
    Maximize,
    /// Smallest cost (buying from asks)
    Minimize,
}

impl Objective {
    /// True if `candidate` is strictly better than `incumbent`
    #[must_use]
    pub fn prefers(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Objective::Maximize => candidate > incumbent,
            Objective::Minimize => candidate < incumbent,
        }
    }
}

/// Tunables for the allocation entry points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationParams {
    /// Greedy tolerance when selling
    pub sell_tolerance: f64,
    /// Greedy tolerance when buying
    pub buy_tolerance: f64,
    /// Memo size limit for [`optimal`], also the table size of [`approximate`]
    pub max_states: usize,
    /// Fall back to [`approximate`] when [`optimal`] runs out of states
    pub grid_fallback: bool,
}

impl Default for AllocationParams {
    fn default() -> Self {
        Self {
            sell_tolerance: DEFAULT_SELL_TOLERANCE,
            buy_tolerance: DEFAULT_BUY_TOLERANCE,
            max_states: DEFAULT_MAX_STATES,
            grid_fallback: true,
        }
    }
}

/// Exact search, or the grid approximation if it runs out of states and
/// `params` allows it
fn best_fill(
    orders: &[Order],
    capacity: Quantity,
    objective: Objective,
    params: &AllocationParams,
) -> Result<Allocation, Error> {
    match optimal(orders, capacity, objective, params.max_states) {
        Err(Error::StateBudgetExhausted { limit }) if params.grid_fallback => {
            warn!(
                limit,
                levels = orders.len(),
                objective = ?objective,
                "exact search over budget, approximating on a grid"
            );
            Ok(approximate(orders, capacity, objective, params.max_states))
        }
        result => result,
    }
}

/// Reject capacities that are not finite and strictly positive
///
/// # Errors
///
/// Returns [`Error::InvalidCapacity`].
pub fn validate_capacity(capacity: Quantity) -> Result<(), Error> {
    if capacity.is_finite() && capacity > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidCapacity(capacity))
    }
}

impl OrderBook {
    /// Greedy fill against bids with the default sell tolerance
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] for a non-positive or non-finite capacity.
    pub fn greedy_sell(&self, capacity: Quantity) -> Result<Allocation, Error> {
        self.greedy_sell_with(capacity, &AllocationParams::default())
    }

    /// Greedy fill against asks with the default buy tolerance
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] for a non-positive or non-finite capacity.
    pub fn greedy_buy(&self, capacity: Quantity) -> Result<Allocation, Error> {
        self.greedy_buy_with(capacity, &AllocationParams::default())
    }

    /// Proceeds-maximizing fill against bids
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] for a bad capacity.
    pub fn optimal_sell(&self, capacity: Quantity) -> Result<Allocation, Error> {
        self.optimal_sell_with(capacity, &AllocationParams::default())
    }

    /// Cost-minimizing fill against asks
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] for a bad capacity.
    pub fn optimal_buy(&self, capacity: Quantity) -> Result<Allocation, Error> {
        self.optimal_buy_with(capacity, &AllocationParams::default())
    }

    /// [`OrderBook::greedy_sell`] with explicit parameters
    pub fn greedy_sell_with(
        &self,
        capacity: Quantity,
        params: &AllocationParams,
    ) -> Result<Allocation, Error> {
        validate_capacity(capacity)?;
        Ok(greedy(&self.snapshot_bids(), capacity, params.sell_tolerance))
    }

    /// [`OrderBook::greedy_buy`] with explicit parameters
    pub fn greedy_buy_with(
        &self,
        capacity: Quantity,
        params: &AllocationParams,
    ) -> Result<Allocation, Error> {
        validate_capacity(capacity)?;
        Ok(greedy(&self.snapshot_asks(), capacity, params.buy_tolerance))
    }

    /// [`OrderBook::optimal_sell`] with explicit parameters
    ///
    /// # Errors
    ///
    /// Also returns [`Error::StateBudgetExhausted`] when the search outgrows
    /// `params.max_states` and `params.grid_fallback` is off.
    pub fn optimal_sell_with(
        &self,
        capacity: Quantity,
        params: &AllocationParams,
    ) -> Result<Allocation, Error> {
        validate_capacity(capacity)?;
        best_fill(&self.snapshot_bids(), capacity, Objective::Maximize, params)
    }

    /// [`OrderBook::optimal_buy`] with explicit parameters
    ///
    /// # Errors
    ///
    /// Also returns [`Error::StateBudgetExhausted`] when the search outgrows
    /// `params.max_states` and `params.grid_fallback` is off.
    pub fn optimal_buy_with(
        &self,
        capacity: Quantity,
        params: &AllocationParams,
    ) -> Result<Allocation, Error> {
        validate_capacity(capacity)?;
        best_fill(&self.snapshot_asks(), capacity, Objective::Minimize, params)
    }
}

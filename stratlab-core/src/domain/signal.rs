//! Signal — the trade decision emitted by a rule for one bar.

use serde::{Deserialize, Serialize};

/// Decision for the current bar. `Buy` and `Sell` are requests, not fills:
/// the simulator ignores a `Buy` while long and a `Sell` while flat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

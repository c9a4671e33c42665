//! Measurement cache entries and the hit predicate.

use crate::geometry::{AvailableSpace, LAYOUT_EPSILON};

/// Constraint mode an availability value was captured under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingMode {
    /// The node was given this exact size.
    Exactly,
    /// The node could use at most this much space.
    AtMost,
    /// No constraint applied on the axis.
    Undefined,
}

impl SizingMode {
    /// Mode under which a measure callback sees an availability value.
    /// Min-content is the tightest at-most constraint (zero available);
    /// only the unconstrained max-content keyword measures as undefined.
    /// Folding min-content into undefined would let a min measurement
    /// answer a later max query on the same axis.
    pub fn from_available(available: AvailableSpace) -> SizingMode {
        match available {
            AvailableSpace::Definite(_) | AvailableSpace::MinContent => SizingMode::AtMost,
            AvailableSpace::MaxContent => SizingMode::Undefined,
        }
    }
}

/// A single cached sizing result per node. Recorded after each compute or
/// leaf measurement; dropped by any mutation of the node or its subtree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedMeasurement {
    pub avail_width: f64,
    pub avail_height: f64,
    pub width_mode: SizingMode,
    pub height_mode: SizingMode,
    pub computed_width: f64,
    pub computed_height: f64,
}

impl CachedMeasurement {
    /// Whether this entry answers a request for the given availability and
    /// modes without recomputation.
    pub fn matches(
        &self,
        avail_width: f64,
        avail_height: f64,
        width_mode: SizingMode,
        height_mode: SizingMode,
    ) -> bool {
        axis_matches(self.avail_width, self.computed_width, self.width_mode, avail_width, width_mode)
            && axis_matches(
                self.avail_height,
                self.computed_height,
                self.height_mode,
                avail_height,
                height_mode,
            )
    }
}

/// Per-axis match rule. Modes must agree; `Exactly` wants the same
/// availability, `AtMost` accepts a loosened constraint or a result that
/// still fits a tighter one, `Undefined` always matches.
fn axis_matches(
    cached_avail: f64,
    cached_computed: f64,
    cached_mode: SizingMode,
    new_avail: f64,
    new_mode: SizingMode,
) -> bool {
    if cached_mode != new_mode {
        return false;
    }
    match cached_mode {
        SizingMode::Exactly => (cached_avail - new_avail).abs() < LAYOUT_EPSILON,
        SizingMode::AtMost => {
            new_avail >= cached_avail - LAYOUT_EPSILON
                || cached_computed <= new_avail + LAYOUT_EPSILON
        }
        SizingMode::Undefined => true,
    }
}

//! Style records and their resolution helpers.
//!
//! `FlexStyle` is an immutable value: the tree stores it behind `Arc` and
//! "changing" a style means replacing it with a new value built via
//! [`FlexStyle::with_updates`]. The layout pass can therefore assume styles
//! are stable for the duration of a compute and share them across workers
//! without locking.

use crate::geometry::Edges;

/// A sizing dimension. `Auto` and the intrinsic variants are semantically
/// distinct absences and never produce a concrete value through
/// [`Dimension::resolve`]; the intrinsic variants are dispatched to the
/// intrinsic sizing queries instead.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Dimension {
    #[default]
    Auto,
    /// Absolute pixels.
    Points(f64),
    /// Percentage of the parent's corresponding base, given in percent
    /// units (50.0 means half).
    Percent(f64),
    MinContent,
    MaxContent,
    /// Fit-content with an optional pixel clamp.
    FitContent(Option<f64>),
}

impl Dimension {
    /// Resolve against a parent base. Only `Points` and `Percent` can
    /// yield a value; `Percent` needs a definite base.
    pub fn resolve(&self, parent_base: Option<f64>) -> Option<f64> {
        match self {
            Dimension::Points(points) => Some(*points),
            Dimension::Percent(percent) => parent_base.map(|base| percent / 100.0 * base),
            _ => None,
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Dimension::Auto)
    }

    pub fn is_intrinsic(&self) -> bool {
        matches!(
            self,
            Dimension::MinContent | Dimension::MaxContent | Dimension::FitContent(_)
        )
    }

    /// True when the dimension can resolve to a concrete value given a
    /// definite base.
    pub fn is_defined(&self) -> bool {
        matches!(self, Dimension::Points(_) | Dimension::Percent(_))
    }
}

/// Four dimension-valued edges, used for margins and padding. Each edge
/// defaults to `Auto`; `Auto` resolves to zero except for the special role
/// auto margins play in main-axis free-space distribution.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Spacing {
    pub top: Dimension,
    pub right: Dimension,
    pub bottom: Dimension,
    pub left: Dimension,
}

impl Spacing {
    pub const ZERO: Spacing = Spacing {
        top: Dimension::Points(0.0),
        right: Dimension::Points(0.0),
        bottom: Dimension::Points(0.0),
        left: Dimension::Points(0.0),
    };

    pub fn zero() -> Self {
        Self::ZERO
    }

    pub fn all(value: f64) -> Self {
        Self {
            top: Dimension::Points(value),
            right: Dimension::Points(value),
            bottom: Dimension::Points(value),
            left: Dimension::Points(value),
        }
    }

    /// Resolve to concrete edges. Horizontal edges resolve against the
    /// parent width, vertical edges against the parent height; `Auto` and
    /// intrinsic variants resolve to zero.
    pub fn resolve(&self, parent_width: f64, parent_height: f64) -> Edges {
        Edges {
            top: self.top.resolve(Some(parent_height)).unwrap_or(0.0),
            right: self.right.resolve(Some(parent_width)).unwrap_or(0.0),
            bottom: self.bottom.resolve(Some(parent_height)).unwrap_or(0.0),
            left: self.left.resolve(Some(parent_width)).unwrap_or(0.0),
        }
    }

    /// Auto flag for the main-start edge of a row (left) or column (top).
    pub fn main_start_is_auto(&self, row: bool) -> bool {
        if row { self.left.is_auto() } else { self.top.is_auto() }
    }

    pub fn main_end_is_auto(&self, row: bool) -> bool {
        if row { self.right.is_auto() } else { self.bottom.is_auto() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlexDirection {
    #[default]
    Row,
    RowReverse,
    Column,
    ColumnReverse,
}

impl FlexDirection {
    pub fn is_row(&self) -> bool {
        matches!(self, FlexDirection::Row | FlexDirection::RowReverse)
    }

    pub fn is_reverse(&self) -> bool {
        matches!(self, FlexDirection::RowReverse | FlexDirection::ColumnReverse)
    }

    /// Apply the writing direction: RTL mirrors the row directions and
    /// leaves columns untouched. The resolved value drives the rest of the
    /// pass; the original stays on the style.
    pub fn resolved(&self, direction: Direction) -> FlexDirection {
        match (direction, self) {
            (Direction::Rtl, FlexDirection::Row) => FlexDirection::RowReverse,
            (Direction::Rtl, FlexDirection::RowReverse) => FlexDirection::Row,
            _ => *self,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlexWrap {
    #[default]
    NoWrap,
    Wrap,
    /// Wrap with lines stacked from the cross-axis end.
    WrapReverse,
}

impl FlexWrap {
    pub fn is_wrapping(&self) -> bool {
        !matches!(self, FlexWrap::NoWrap)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JustifyContent {
    #[default]
    FlexStart,
    FlexEnd,
    Center,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignItems {
    FlexStart,
    FlexEnd,
    Center,
    #[default]
    Stretch,
    Baseline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignContent {
    FlexStart,
    FlexEnd,
    Center,
    #[default]
    Stretch,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Relative,
    /// Out of flow; positioned by insets against the parent's padding box.
    Absolute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    #[default]
    Flex,
    /// The node and its whole subtree occupy no space.
    None,
    /// The node generates no box; its children participate in the parent's
    /// layout in its place.
    Contents,
}

/// The full style record for a node. Immutable once attached to a node;
/// see the module docs.
#[derive(Debug, Clone, PartialEq)]
pub struct FlexStyle {
    pub display: Display,
    pub position: Position,
    pub direction: Direction,
    pub flex_direction: FlexDirection,
    pub flex_wrap: FlexWrap,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub align_content: AlignContent,

    pub width: Dimension,
    pub height: Dimension,
    pub min_width: Dimension,
    pub min_height: Dimension,
    pub max_width: Dimension,
    pub max_height: Dimension,
    /// width / height; with exactly one definite axis the other derives.
    pub aspect_ratio: Option<f64>,

    pub flex_grow: f64,
    pub flex_shrink: f64,
    pub flex_basis: Dimension,
    pub align_self: Option<AlignItems>,

    pub margin: Spacing,
    pub padding: Spacing,
    pub border: Edges,
    pub gap: f64,
    pub row_gap: Option<f64>,
    pub column_gap: Option<f64>,

    /// Insets for absolutely positioned nodes.
    pub top: Dimension,
    pub right: Dimension,
    pub bottom: Dimension,
    pub left: Dimension,
}

impl Default for FlexStyle {
    fn default() -> Self {
        Self {
            display: Display::default(),
            position: Position::default(),
            direction: Direction::default(),
            flex_direction: FlexDirection::default(),
            flex_wrap: FlexWrap::default(),
            justify_content: JustifyContent::default(),
            align_items: AlignItems::default(),
            align_content: AlignContent::default(),
            width: Dimension::Auto,
            height: Dimension::Auto,
            min_width: Dimension::Auto,
            min_height: Dimension::Auto,
            max_width: Dimension::Auto,
            max_height: Dimension::Auto,
            aspect_ratio: None,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            flex_basis: Dimension::Auto,
            align_self: None,
            // CSS initial values: concrete zero, not auto.
            margin: Spacing::zero(),
            padding: Spacing::zero(),
            border: Edges::ZERO,
            gap: 0.0,
            row_gap: None,
            column_gap: None,
            top: Dimension::Auto,
            right: Dimension::Auto,
            bottom: Dimension::Auto,
            left: Dimension::Auto,
        }
    }
}

impl FlexStyle {
    /// Build a modified copy. The original is untouched; callers replace a
    /// node's style wholesale via `LayoutTree::set_style`.
    pub fn with_updates(&self, updates: impl FnOnce(&mut FlexStyle)) -> FlexStyle {
        let mut next = self.clone();
        updates(&mut next);
        next
    }

    /// Gap between adjacent items on the main axis of the resolved
    /// direction. Rows separate items by column-gap, columns by row-gap;
    /// the shorthand `gap` backs both.
    pub fn get_gap(&self, resolved_direction: FlexDirection) -> f64 {
        if resolved_direction.is_row() {
            self.column_gap.unwrap_or(self.gap)
        } else {
            self.row_gap.unwrap_or(self.gap)
        }
    }

    /// The main-axis size dimension for the resolved direction.
    pub fn main_size(&self, row: bool) -> Dimension {
        if row { self.width } else { self.height }
    }

    pub fn cross_size(&self, row: bool) -> Dimension {
        if row { self.height } else { self.width }
    }

    pub fn main_min_size(&self, row: bool) -> Dimension {
        if row { self.min_width } else { self.min_height }
    }

    pub fn main_max_size(&self, row: bool) -> Dimension {
        if row { self.max_width } else { self.max_height }
    }

    pub fn cross_min_size(&self, row: bool) -> Dimension {
        if row { self.min_height } else { self.min_width }
    }

    pub fn cross_max_size(&self, row: bool) -> Dimension {
        if row { self.max_height } else { self.max_width }
    }

    /// Effective per-item alignment: `align_self` wins over the
    /// container's `align_items`.
    pub fn effective_align(&self, container_align: AlignItems) -> AlignItems {
        self.align_self.unwrap_or(container_align)
    }
}

/// Clamp a value by optional min/max bounds, min taking precedence.
pub(crate) fn clamp_optional(value: f64, min: Option<f64>, max: Option<f64>) -> f64 {
    let mut out = value;
    if let Some(max_value) = max {
        out = out.min(max_value);
    }
    if let Some(min_value) = min {
        out = out.max(min_value);
    }
    out
}

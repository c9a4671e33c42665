//! Flex line collection and the per-line math: flexible length
//! resolution, main-axis distribution, auto margins and cross-axis
//! alignment.
//!
//! Everything here is pure arithmetic over prepared [`FlexItem`] records;
//! the compute driver owns tree access and fills the records in.

use smallvec::SmallVec;

use crate::geometry::{approx_eq, Edges, LAYOUT_EPSILON};
use crate::style::{clamp_optional, AlignContent, AlignItems, FlexWrap, JustifyContent};
use crate::NodeKey;

/// One in-flow child prepared for the flex pass.
#[derive(Debug, Clone)]
pub(crate) struct FlexItem {
    pub key: NodeKey,
    /// Hypothetical main size before grow/shrink.
    pub base: f64,
    pub min_main: Option<f64>,
    pub max_main: Option<f64>,
    pub grow: f64,
    pub shrink: f64,
    /// Resolved margins; auto edges are zero here and flagged below.
    pub margin: Edges,
    pub main_start_auto: bool,
    pub main_end_auto: bool,
    pub align: AlignItems,
    /// Cross size resolved from the style or the aspect ratio, if any.
    pub cross_resolved: Option<f64>,
    /// The cross dimension is auto and may stretch to the line.
    pub cross_is_auto: bool,
    pub min_cross: Option<f64>,
    pub max_cross: Option<f64>,
    pub aspect_ratio: Option<f64>,
    /// Baseline offset from the top of the box; meaningful for
    /// baseline-aligned items on row axes.
    pub baseline: f64,

    // Outputs of the per-line passes.
    pub main: f64,
    pub cross: f64,
    pub main_pos: f64,
    pub cross_pos: f64,
}

impl FlexItem {
    pub fn new(key: NodeKey, base: f64) -> Self {
        Self {
            key,
            base,
            min_main: None,
            max_main: None,
            grow: 0.0,
            shrink: 1.0,
            margin: Edges::ZERO,
            main_start_auto: false,
            main_end_auto: false,
            align: AlignItems::Stretch,
            cross_resolved: None,
            cross_is_auto: true,
            min_cross: None,
            max_cross: None,
            aspect_ratio: None,
            baseline: 0.0,
            main: base,
            cross: 0.0,
            main_pos: 0.0,
            cross_pos: 0.0,
        }
    }

    /// Main-axis margin box size.
    pub fn outer_main(&self, row: bool) -> f64 {
        self.main + self.margin.main_axis_sum(row)
    }

    pub fn outer_base(&self, row: bool) -> f64 {
        self.base + self.margin.main_axis_sum(row)
    }

    pub fn outer_cross(&self, row: bool) -> f64 {
        self.cross + self.margin.cross_axis_sum(row)
    }

    fn clamped_base(&self) -> f64 {
        clamp_optional(self.base, self.min_main, self.max_main).max(0.0)
    }
}

/// A run of items wrapped together.
#[derive(Debug, Clone, Default)]
pub(crate) struct FlexLine {
    pub items: Vec<FlexItem>,
    pub cross: f64,
    pub cross_pos: f64,
    /// Shared baseline for baseline-aligned items, if the line has any.
    pub baseline: Option<f64>,
}

/// Group items into lines. Without wrapping everything lands on one line;
/// otherwise a new line starts whenever the next outer base no longer
/// fits. An oversized item still occupies a line of its own rather than
/// producing an empty one.
pub(crate) fn collect_lines(
    items: Vec<FlexItem>,
    available_main: f64,
    wrap: FlexWrap,
    gap: f64,
    row: bool,
) -> SmallVec<FlexLine, 2> {
    let mut lines: SmallVec<FlexLine, 2> = SmallVec::new();
    if items.is_empty() {
        return lines;
    }
    if !wrap.is_wrapping() {
        lines.push(FlexLine { items, ..FlexLine::default() });
        return lines;
    }

    let mut current = FlexLine::default();
    let mut used = 0.0;
    for item in items {
        let outer = item.outer_base(row);
        let step = if current.items.is_empty() { outer } else { gap + outer };
        if !current.items.is_empty() && used + step > available_main + LAYOUT_EPSILON {
            lines.push(std::mem::take(&mut current));
            used = outer;
        } else {
            used += step;
        }
        current.items.push(item);
    }
    if !current.items.is_empty() {
        lines.push(current);
    }
    lines
}

/// Distribute free space on the main axis into item sizes.
///
/// Positive free space grows by `flex_grow`; negative shrinks weighted by
/// `flex_shrink * base`. Items pushed outside their min/max are clamped
/// and frozen, and the remainder is redistributed over the rest until no
/// new violations appear.
pub(crate) fn resolve_flexible_lengths(line: &mut FlexLine, container_main: f64, gap: f64, row: bool) {
    let count = line.items.len();
    if count == 0 {
        return;
    }
    let gaps = gap * (count - 1) as f64;
    let total_outer_base: f64 = line.items.iter().map(|item| item.outer_base(row)).sum();
    let free = container_main - total_outer_base - gaps;

    if approx_eq(free, 0.0) {
        for item in &mut line.items {
            item.main = item.clamped_base();
        }
        return;
    }
    let growing = free > 0.0;

    let mut frozen = vec![false; count];
    let mut iterations = 0;
    loop {
        iterations += 1;
        if iterations > count + 1 {
            break;
        }

        let used: f64 = line
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.margin.main_axis_sum(row) + if frozen[index] { item.main } else { item.base }
            })
            .sum();
        let free_space = container_main - used - gaps;

        let total_weight: f64 = line
            .items
            .iter()
            .enumerate()
            .filter(|(index, _)| !frozen[*index])
            .map(|(_, item)| if growing { item.grow } else { item.shrink * item.base })
            .sum();

        let exhausted = (growing && free_space <= LAYOUT_EPSILON)
            || (!growing && free_space >= -LAYOUT_EPSILON);
        if total_weight <= 0.0 || exhausted {
            for (index, item) in line.items.iter_mut().enumerate() {
                if !frozen[index] {
                    item.main = item.clamped_base();
                }
            }
            break;
        }

        let mut newly_frozen = false;
        for (index, item) in line.items.iter_mut().enumerate() {
            if frozen[index] {
                continue;
            }
            let weight = if growing { item.grow } else { item.shrink * item.base };
            let proposed = item.base + free_space * weight / total_weight;
            let clamped = clamp_optional(proposed, item.min_main, item.max_main).max(0.0);
            item.main = clamped;
            if (clamped - proposed).abs() > LAYOUT_EPSILON {
                frozen[index] = true;
                newly_frozen = true;
            }
        }
        if !newly_frozen {
            break;
        }
    }
}

/// Start offset and extra per-item spacing for a justify-content value.
/// `free` already excludes gaps. Overflowing lines fall back the way CSS
/// does: the space-* values degrade to their packing fallback.
pub(crate) fn justify_spacing(justify: JustifyContent, free: f64, count: usize) -> (f64, f64) {
    if count == 0 {
        return (0.0, 0.0);
    }
    match justify {
        JustifyContent::FlexStart => (0.0, 0.0),
        JustifyContent::FlexEnd => (free, 0.0),
        JustifyContent::Center => (free / 2.0, 0.0),
        JustifyContent::SpaceBetween => {
            if count <= 1 || free < 0.0 {
                (0.0, 0.0)
            } else {
                (0.0, free / (count - 1) as f64)
            }
        }
        JustifyContent::SpaceAround => {
            if free < 0.0 {
                (free / 2.0, 0.0)
            } else {
                let step = free / count as f64;
                (step / 2.0, step)
            }
        }
        JustifyContent::SpaceEvenly => {
            if free < 0.0 {
                (free / 2.0, 0.0)
            } else {
                let step = free / (count + 1) as f64;
                (step, step)
            }
        }
    }
}

/// Assign main-axis positions within the line.
///
/// Auto margins, when present with positive free space, take the whole
/// free space (split evenly across the auto slots) and override
/// justify-content for the line.
pub(crate) fn position_main(line: &mut FlexLine, justify: JustifyContent, container_main: f64, gap: f64, row: bool) {
    let count = line.items.len();
    if count == 0 {
        return;
    }
    let gaps = gap * (count - 1) as f64;
    let used: f64 = line.items.iter().map(|item| item.outer_main(row)).sum();
    let free = container_main - used - gaps;

    let auto_slots: usize = line
        .items
        .iter()
        .map(|item| usize::from(item.main_start_auto) + usize::from(item.main_end_auto))
        .sum();

    if auto_slots > 0 && free > LAYOUT_EPSILON {
        let share = free / auto_slots as f64;
        let mut position = 0.0;
        for item in &mut line.items {
            if item.main_start_auto {
                position += share;
            }
            position += item.margin.main_start(row);
            item.main_pos = position;
            position += item.main + item.margin.main_end(row);
            if item.main_end_auto {
                position += share;
            }
            position += gap;
        }
        return;
    }

    let (offset, between) = justify_spacing(justify, free, count);
    let mut position = offset;
    for item in &mut line.items {
        position += item.margin.main_start(row);
        item.main_pos = position;
        position += item.main + item.margin.main_end(row) + gap + between;
    }
}

/// The line's cross extent given its items (and its baseline, if any).
/// Baseline items extend from `baseline - item.baseline` downward.
pub(crate) fn measure_line_cross(line: &FlexLine, row: bool) -> f64 {
    let mut cross: f64 = 0.0;
    for item in &line.items {
        let extent = match (line.baseline, item.align) {
            (Some(shared), AlignItems::Baseline) if row => {
                (shared - item.baseline) + item.cross + item.margin.cross_end(row)
            }
            _ => item.outer_cross(row),
        };
        cross = cross.max(extent);
    }
    cross
}

/// Cross-axis placement of one item inside its line.
pub(crate) fn align_cross(item: &mut FlexItem, line_cross: f64, row: bool, line_baseline: Option<f64>) {
    let margins = item.margin.cross_axis_sum(row);
    match item.align {
        AlignItems::Stretch if item.cross_is_auto => {
            let stretched = (line_cross - margins).max(0.0);
            item.cross = clamp_optional(stretched, item.min_cross, item.max_cross).max(0.0);
            item.cross_pos = item.margin.cross_start(row);
        }
        AlignItems::Baseline if row => match line_baseline {
            Some(shared) => item.cross_pos = shared - item.baseline,
            None => item.cross_pos = item.margin.cross_start(row),
        },
        AlignItems::FlexEnd => {
            item.cross_pos = line_cross - item.cross - item.margin.cross_end(row);
        }
        AlignItems::Center => {
            item.cross_pos = item.margin.cross_start(row) + (line_cross - item.cross - margins) / 2.0;
        }
        // flex-start, stretch with a definite cross size, and baseline on
        // column axes all pack to the start.
        _ => item.cross_pos = item.margin.cross_start(row),
    }
}

/// Distribute cross-axis free space between lines. Only meaningful when
/// wrapping produced more than one line; otherwise lines pack to the
/// start. `Stretch` divides the container cross size evenly among lines.
pub(crate) fn align_content_offsets(
    lines: &mut [FlexLine],
    container_cross: f64,
    align: AlignContent,
    wrap: FlexWrap,
) {
    let count = lines.len();
    if count == 0 {
        return;
    }
    if !wrap.is_wrapping() || count == 1 {
        let mut position = 0.0;
        for line in lines.iter_mut() {
            line.cross_pos = position;
            position += line.cross;
        }
    } else {
        if align == AlignContent::Stretch {
            let per_line = (container_cross / count as f64).max(0.0);
            for line in lines.iter_mut() {
                line.cross = per_line;
            }
        }
        let total: f64 = lines.iter().map(|line| line.cross).sum();
        let free = container_cross - total;
        let (offset, between) = match align {
            AlignContent::FlexStart | AlignContent::Stretch => (0.0, 0.0),
            AlignContent::FlexEnd => (free, 0.0),
            AlignContent::Center => (free / 2.0, 0.0),
            AlignContent::SpaceBetween => {
                if count <= 1 || free < 0.0 {
                    (0.0, 0.0)
                } else {
                    (0.0, free / (count - 1) as f64)
                }
            }
            AlignContent::SpaceAround => {
                if free < 0.0 {
                    (free / 2.0, 0.0)
                } else {
                    let step = free / count as f64;
                    (step / 2.0, step)
                }
            }
            AlignContent::SpaceEvenly => {
                if free < 0.0 {
                    (free / 2.0, 0.0)
                } else {
                    let step = free / (count + 1) as f64;
                    (step, step)
                }
            }
        };
        let mut position = offset;
        for line in lines.iter_mut() {
            line.cross_pos = position;
            position += line.cross + between;
        }
    }

    if wrap == FlexWrap::WrapReverse {
        for line in lines.iter_mut() {
            line.cross_pos = container_cross - line.cross_pos - line.cross;
        }
    }
}

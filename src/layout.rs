//! Field placement: turns a record into the runs and columns of one page.

use crate::config::LayoutConfig;
use crate::record::{LabelRecord, RecipientName};
use crate::vertical::Column;

/// A left-to-right run. `x` is the left edge, `y` the baseline, both in
/// millimeters from the top-left corner.
#[derive(Clone, Debug, PartialEq)]
pub struct HorizontalRun {
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub text: String,
}

/// Everything drawn for one record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PagePlan {
    pub postal: Option<HorizontalRun>,
    pub columns: Vec<Column>,
}

/// Split at the first ASCII space, or failing that the first full-width
/// space. Both halves are trimmed; without a delimiter the second is empty.
pub fn split_blocks(text: &str) -> (String, String) {
    let text = text.trim();
    let split = text.split_once(' ').or_else(|| text.split_once('\u{3000}'));
    match split {
        Some((first, second)) => (first.trim().to_string(), second.trim().to_string()),
        None => (text.to_string(), String::new()),
    }
}

/// Lay out `record`, or `None` when it has nothing to print.
pub fn plan_page(record: &LabelRecord, config: &LayoutConfig) -> Option<PagePlan> {
    if record.is_empty() {
        return None;
    }
    let mut plan = PagePlan {
        postal: plan_postal(record, config),
        columns: Vec::new(),
    };
    plan.columns.extend(plan_address(record, config));
    plan.columns.extend(plan_name(record, config));
    Some(plan)
}

fn plan_postal(record: &LabelRecord, config: &LayoutConfig) -> Option<HorizontalRun> {
    if record.postal.is_empty() {
        return None;
    }
    let layout = &config.postal;
    let placement = layout.placement();
    Some(HorizontalRun {
        x: placement.anchor_x(config.offset, config.page_width_mm),
        y: placement.top_y(config.offset),
        font_size: layout.font_size,
        text: format!("{}{}", layout.prefix, record.postal),
    })
}

fn plan_address(record: &LabelRecord, config: &LayoutConfig) -> Vec<Column> {
    let layout = &config.address;
    let placement = layout.placement();
    let top = placement.top_y(config.offset);
    let column = |x: f32, text: String| {
        Column::new(x, top, layout.leading, layout.font_size, text).compress_spaces(layout.compress_spaces)
    };

    let (first, second) = if layout.split_columns {
        split_blocks(&record.address)
    } else {
        (record.address.clone(), String::new())
    };

    if second.is_empty() {
        if first.is_empty() {
            return Vec::new();
        }
        let x = placement.anchor_x(config.offset, config.page_width_mm);
        return vec![column(x, first)];
    }

    let (x1, x2) = placement.column_pair(config.offset, config.page_width_mm, layout.column_gap);
    let mut columns = Vec::with_capacity(2);
    if !first.is_empty() {
        columns.push(column(x1, first));
    }
    columns.push(column(x2, second));
    columns
}

fn plan_name(record: &LabelRecord, config: &LayoutConfig) -> Vec<Column> {
    let layout = &config.name;
    let placement = layout.placement();
    let top = placement.top_y(config.offset);
    let anchor = placement.anchor_x(config.offset, config.page_width_mm);
    let column = |x: f32, text: String| Column::new(x, top, layout.leading, layout.font_size, text);

    // Honorific-bearing text for the last name part, or None when nothing
    // should be drawn there.
    let with_honorific = |part: &str| -> Option<String> {
        if !part.is_empty() {
            Some(format!("{part}{}", layout.honorific))
        } else if layout.honorific_when_given_missing && !layout.honorific.is_empty() {
            Some(layout.honorific.clone())
        } else {
            None
        }
    };

    match &record.name {
        RecipientName::Combined(name) => with_honorific(name)
            .map(|text| column(anchor, text))
            .into_iter()
            .collect(),
        RecipientName::Split { surname, given } if layout.single_column => {
            let tail = with_honorific(given).unwrap_or_default();
            let text = match (surname.is_empty(), given.is_empty()) {
                (false, false) => format!("{surname}\u{3000}{tail}"),
                (false, true) => format!("{surname}{tail}"),
                _ => tail,
            };
            if text.is_empty() {
                Vec::new()
            } else {
                vec![column(anchor, text)]
            }
        }
        RecipientName::Split { surname, given } => {
            let (x1, x2) = placement.column_pair(config.offset, config.page_width_mm, layout.column_gap);
            let mut columns = Vec::with_capacity(2);
            if !surname.is_empty() {
                columns.push(column(x1, surname.clone()));
            }
            if let Some(text) = with_honorific(given) {
                columns.push(column(x2, text));
            }
            columns
        }
    }
}

//! Plain-text rendering of records, the pagination footer, and banners.

use client_core::{
    operations::{InputKind, OperationDescriptor},
    FieldError, Notice, NoticeKind, PaginationState,
};
use shared::domain::HumanBeing;

const HEADERS: [&str; 8] = [
    "ID",
    "Name",
    "Coordinates",
    "Real Hero",
    "Impact Speed",
    "Weapon Type",
    "Mood",
    "Created",
];

/// `May 1, 2024, 12:30 PM`; unparseable timestamps are shown as sent.
pub fn format_created(record: &HumanBeing) -> String {
    record
        .created_at()
        .map(|date| date.format("%b %-d, %Y, %I:%M %p").to_string())
        .unwrap_or_else(|| record.creation_date.clone())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

fn row(record: &HumanBeing) -> [String; 8] {
    let name = if record.soundtrack_name.is_empty() {
        record.name.clone()
    } else {
        format!("{} ({})", record.name, record.soundtrack_name)
    };
    [
        format!("#{}", record.id),
        name,
        format!("({}, {})", record.coordinates.x, record.coordinates.y),
        yes_no(record.real_hero).to_string(),
        format!("{:.2}", record.impact_speed),
        record.weapon_type.to_string(),
        record.mood.map(|mood| mood.to_string()).unwrap_or_default(),
        format_created(record),
    ]
}

pub fn render_table(records: &[HumanBeing], pagination: &PaginationState) -> String {
    if records.is_empty() {
        return format!("No human beings found\n{}", pagination.empty_hint());
    }

    let rows: Vec<[String; 8]> = records.iter().map(row).collect();
    let mut widths = HEADERS.map(|header| header.chars().count());
    for cells in &rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_line = |cells: &[&str]| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format_line(&HEADERS));
    lines.push(
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for cells in &rows {
        let cells: Vec<&str> = cells.iter().map(String::as_str).collect();
        lines.push(format_line(&cells));
    }
    lines.join("\n")
}

/// "Showing A to B of N results" plus the page strip, or `None` when there is
/// only one page.
pub fn render_footer(pagination: &PaginationState) -> Option<String> {
    if !pagination.shows_controls() {
        return None;
    }
    let (first, last) = pagination.visible_range()?;
    let pages = pagination
        .page_window()
        .into_iter()
        .map(|page| {
            if page == pagination.page {
                format!("[{}]", page + 1)
            } else {
                (page + 1).to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    let previous = if pagination.has_previous() {
        "< Previous"
    } else {
        "(first page)"
    };
    let next = if pagination.has_next() {
        "Next >"
    } else {
        "(last page)"
    };
    Some(format!(
        "Showing {first} to {last} of {} results\n{previous}  {pages}  {next}",
        pagination.total
    ))
}

pub fn render_record(record: &HumanBeing) -> String {
    let car = record
        .car
        .as_ref()
        .map(|car| {
            let cool = if car.cool { ", cool" } else { "" };
            format!("{}{cool}", car.name)
        })
        .unwrap_or_else(|| "-".to_string());
    let toothpick = record.has_toothpick.map(yes_no).unwrap_or("-");
    let mood = record.mood.map(|mood| mood.to_string());

    [
        ("ID", format!("#{}", record.id)),
        ("Name", record.name.clone()),
        (
            "Coordinates",
            format!("({}, {})", record.coordinates.x, record.coordinates.y),
        ),
        ("Created", format_created(record)),
        ("Real Hero", yes_no(record.real_hero).to_string()),
        ("Toothpick", toothpick.to_string()),
        ("Car", car),
        ("Mood", mood.unwrap_or_else(|| "-".to_string())),
        ("Impact Speed", format!("{:.2}", record.impact_speed)),
        ("Soundtrack", record.soundtrack_name.clone()),
        ("Weapon Type", record.weapon_type.to_string()),
    ]
    .iter()
    .map(|(label, value)| format!("{label:<13} {value}"))
    .collect::<Vec<_>>()
    .join("\n")
}

pub fn render_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|err| format!("  {}: {}", err.field, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_notice(notice: &Notice) -> String {
    match notice.kind {
        NoticeKind::Success => notice.message.clone(),
        NoticeKind::Error => format!("error: {}", notice.message),
    }
}

pub fn render_catalog(descriptors: &[OperationDescriptor]) -> String {
    descriptors
        .iter()
        .map(|op| {
            let mut block = format!(
                "{:<22} {}\n{:<22} {}",
                op.id.as_str(),
                op.title,
                "",
                op.description
            );
            for input in &op.inputs {
                let required = if input.required { " (required)" } else { "" };
                let choices = match input.kind {
                    InputKind::Select => format!(": {}", input.options.join(" | ")),
                    InputKind::Text | InputKind::Number => String::new(),
                };
                block.push_str(&format!(
                    "\n{:<22} --{}{required}{choices}",
                    "",
                    flag_name(input.name)
                ));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// `weaponType` -> `weapon-type`
fn flag_name(input_name: &str) -> String {
    let mut flag = String::with_capacity(input_name.len() + 2);
    for ch in input_name.chars() {
        if ch.is_ascii_uppercase() {
            flag.push('-');
            flag.push(ch.to_ascii_lowercase());
        } else {
            flag.push(ch);
        }
    }
    flag
}

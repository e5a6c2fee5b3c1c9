use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    TotalLabel,
    TotalValue,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::TotalLabel => style(text).bold(),
        StyleType::TotalValue => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Right-aligned money cell.
pub fn money_cell(amount: f64) -> Cell {
    Cell::new(format!("{amount:.2}")).set_alignment(CellAlignment::Right)
}

/// Money cell colored by sign, for deltas and signed amounts.
pub fn signed_money_cell(amount: f64) -> Cell {
    let cell = money_cell(amount);
    if amount < 0.0 {
        cell.fg(Color::Red)
    } else {
        cell.fg(Color::Green)
    }
}

/// Formats an `Option<T>` into a `Cell`. `None` is displayed as "N/A".
pub fn format_optional_cell<T>(value: Option<T>, format_fn: impl Fn(T) -> String) -> Cell {
    value.map_or(
        Cell::new("N/A")
            .fg(Color::DarkGrey)
            .set_alignment(CellAlignment::Right),
        |v| Cell::new(format_fn(v)).set_alignment(CellAlignment::Right),
    )
}

/// Textual progress bar for goal completion, e.g. "#######---- 63%".
pub fn progress_text(value: f64, goal: f64) -> String {
    let ratio = if goal > 0.0 {
        (value / goal).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (ratio * 20.0).round() as usize;
    format!(
        "{}{} {:>3.0}%",
        "#".repeat(filled),
        "-".repeat(20 - filled),
        ratio * 100.0
    )
}

/// Creates a new `indicatif::ProgressBar` with standard styling.
pub fn new_progress_bar(len: u64, with_message: bool) -> ProgressBar {
    let template = if with_message {
        "{spinner:.green} {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})"
    } else {
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})"
    };

    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(template)
            .unwrap()
            .progress_chars("#>-"),
    );
    pb
}

/// Prints a separator line matching the terminal width.
pub fn print_separator() {
    let term_width = console::Term::stdout()
        .size_checked()
        .map(|(_, w)| w as usize)
        .unwrap_or(80);
    println!("\n{}", "─".repeat(term_width));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_text_bounds() {
        assert!(progress_text(0.0, 100.0).ends_with("0%"));
        assert!(progress_text(100.0, 100.0).ends_with("100%"));
        // Over-funded goals cap at 100%.
        assert!(progress_text(500.0, 100.0).ends_with("100%"));
        // Zero goal never divides by zero.
        assert!(progress_text(10.0, 0.0).ends_with("0%"));
    }
}

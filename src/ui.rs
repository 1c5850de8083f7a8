use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Row, Table};
use console::style;
use metascope::metadata::normalize::ReportTable;

const HEADER_WIDTH: usize = 66;

pub const NO_DATA_FOUND: &str = "No data found.";

pub fn render_header() {
    let border = "═".repeat(HEADER_WIDTH - 2);
    println!("{}", style(format!("╔{}╗", border)).cyan().bold());
    println!(
        "{}",
        style(format!(
            "║ {:^inner_width$} ║",
            "metascope | File Metadata Extractor",
            inner_width = HEADER_WIDTH - 4
        ))
        .cyan()
        .bold()
    );
    println!("{}\n", style(format!("╚{}╝", border)).cyan().bold());
}

pub fn render_file_input_hint() {
    let hint_lines = [
        "┌─ You can enter:",
        "│   • A file name with extension (e.g. report.pdf)",
        "│   • A relative path (e.g. ./docs/report.pdf)",
        "│   • An absolute path, quoted or not (e.g. \"/home/user/My Photo.jpg\")",
        "└─",
    ];

    for line in hint_lines.iter() {
        println!("{}", style(line).cyan().dim());
    }

    println!();
}

pub fn render_report_table(table: &ReportTable) {
    println!("{}", style(&table.title).bold().cyan());
    if table.rows.is_empty() {
        println!("{}\n", style(NO_DATA_FOUND).dim());
        return;
    }

    let mut rendered = base_table();
    rendered.set_header(vec![header_cell("Field"), header_cell("Value")]);
    for row in &table.rows {
        rendered.add_row(build_row(&row.field, &row.value, value_color(&row.value)));
    }
    println!("{rendered}\n");
}

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
        .add_attribute(Attribute::Underlined)
}

fn build_row(label: &str, value: &str, value_color: Color) -> Row {
    Row::from(vec![
        Cell::new(label).fg(Color::Rgb {
            r: 160,
            g: 196,
            b: 255,
        }),
        Cell::new(value).fg(value_color),
    ])
}

fn value_color(value: &str) -> Color {
    if value.starts_with("Error") || value.starts_with("Unsupported") {
        Color::Red
    } else if value == "Unknown" || value == "Unavailable" {
        Color::DarkGrey
    } else {
        Color::White
    }
}

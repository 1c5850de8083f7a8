//! Exportación del reporte de metadata en distintos formatos.

use crate::error::ExportError;
use crate::metadata::normalize::report_tables;
use crate::metadata::report::MetadataReport;
use clap::ValueEnum;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs;
use std::path::{Path, PathBuf};

pub const REPORT_STEM: &str = "metadata_report";
pub const PDF_TITLE: &str = "Metadata Extraction Report";

// Carta US en puntos.
const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const TITLE_X: i64 = 50;
const TITLE_Y: i64 = PAGE_HEIGHT - 50;
const BODY_X: i64 = 40;
const BODY_START_Y: i64 = PAGE_HEIGHT - 80;
const CONTINUATION_Y: i64 = PAGE_HEIGHT - 50;
const BOTTOM_MARGIN: i64 = 40;
const LINE_STEP: i64 = 12;
const BODY_SIZE: i64 = 10;
const TITLE_SIZE: i64 = 16;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Txt,
    Xlsx,
    #[default]
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Txt => "txt",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Json => "JSON",
            ExportFormat::Txt => "TXT",
            ExportFormat::Xlsx => "Excel",
            ExportFormat::Pdf => "PDF",
        }
    }
}

/// `metadata_report.<ext>` junto al archivo analizado.
pub fn default_report_path(input: &Path, format: ExportFormat) -> PathBuf {
    let absolute = fs::canonicalize(input).unwrap_or_else(|_| input.to_path_buf());
    let directory = absolute
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    directory.join(format!("{REPORT_STEM}.{}", format.extension()))
}

pub fn export_report(
    report: &MetadataReport,
    format: ExportFormat,
    path: &Path,
) -> Result<(), ExportError> {
    match format {
        ExportFormat::Json => export_json(report, path),
        ExportFormat::Txt => export_txt(report, path),
        ExportFormat::Xlsx => export_xlsx(report, path),
        ExportFormat::Pdf => export_pdf(report, path),
    }
}

/// JSON con sangría de cuatro espacios, base del volcado PDF.
pub fn report_text(report: &MetadataReport) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    report.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn export_json(report: &MetadataReport, path: &Path) -> Result<(), ExportError> {
    fs::write(path, report_text(report)?)?;
    Ok(())
}

fn export_txt(report: &MetadataReport, path: &Path) -> Result<(), ExportError> {
    let mut output = String::new();
    output.push_str(PDF_TITLE);
    output.push('\n');
    output.push_str(&"=".repeat(PDF_TITLE.len()));
    output.push_str("\n\n");

    for table in report_tables(report)? {
        output.push_str(&table.title);
        output.push('\n');
        output.push_str(&"-".repeat(table.title.len()));
        output.push('\n');
        if table.rows.is_empty() {
            output.push_str("No data found.\n\n");
            continue;
        }
        for row in &table.rows {
            let value = row.value.replace('\n', "\n    ");
            output.push_str(&format!("- {}: {}\n", row.field, value));
        }
        output.push('\n');
    }

    fs::write(path, output)?;
    Ok(())
}

fn export_xlsx(report: &MetadataReport, path: &Path) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Metadata")?;
    worksheet.set_column_width(0, 26.0)?;
    worksheet.set_column_width(1, 30.0)?;
    worksheet.set_column_width(2, 80.0)?;

    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(0x1F4E78))
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin);

    let cell_format = Format::new()
        .set_text_wrap()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Left);

    for (column, header) in ["Section", "Field", "Value"].into_iter().enumerate() {
        worksheet.write_with_format(0, column as u16, header, &header_format)?;
    }

    let mut row_index = 1_u32;
    for table in report_tables(report)? {
        for row in &table.rows {
            worksheet.write_with_format(row_index, 0, table.title.as_str(), &cell_format)?;
            worksheet.write_with_format(row_index, 1, row.field.as_str(), &cell_format)?;
            worksheet.write_with_format(row_index, 2, row.value.as_str(), &cell_format)?;
            row_index += 1;
        }
    }

    workbook.save(path)?;
    Ok(())
}

fn export_pdf(report: &MetadataReport, path: &Path) -> Result<(), ExportError> {
    let text = report_text(report)?;
    let lines: Vec<String> = text.lines().map(|line| line.replace(['{', '}'], "")).collect();

    let mut doc = build_pdf(&lines)?;
    doc.compress();
    doc.save(path)?;
    Ok(())
}

/// Título en la primera página y una línea de cuerpo cada 12 pt; al bajar del
/// margen inferior se abre una página nueva.
fn build_pdf(lines: &[String]) -> Result<Document, ExportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let title_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let body_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => body_font_id,
            "F2" => title_font_id,
        },
    });

    let mut page_ids = Vec::new();
    let mut page_ops = vec![text_operation("F2", TITLE_SIZE, TITLE_X, TITLE_Y, PDF_TITLE)];
    let mut current_y = BODY_START_Y;

    for line in lines {
        if !line.trim().is_empty() {
            page_ops.push(text_operation("F1", BODY_SIZE, BODY_X, current_y, line));
        }
        current_y -= LINE_STEP;
        if current_y < BOTTOM_MARGIN {
            page_ids.push(add_pdf_page(&mut doc, pages_id, &page_ops)?);
            page_ops.clear();
            current_y = CONTINUATION_Y;
        }
    }
    if !page_ops.is_empty() || page_ids.is_empty() {
        page_ids.push(add_pdf_page(&mut doc, pages_id, &page_ops)?);
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<Object>>(),
        "Count" => page_ids.len() as i64,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    Ok(doc)
}

fn text_operation(font: &str, size: i64, x: i64, y: i64, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.into(), size.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

fn add_pdf_page(
    doc: &mut Document,
    pages_id: ObjectId,
    ops: &[Vec<Operation>],
) -> Result<ObjectId, ExportError> {
    let content = Content {
        operations: ops.concat(),
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    }))
}

mod ui;

use clap::Parser;
use console::style;
use metascope::metadata::export::{ExportFormat, default_report_path, export_report};
use metascope::metadata::extract_metadata;
use metascope::metadata::normalize::report_tables;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use ui::{render_file_input_hint, render_header, render_report_table};

/// Extrae la metadata de un archivo y la exporta como reporte.
#[derive(Debug, Parser)]
#[command(name = "metascope", version, about)]
struct Cli {
    /// Archivo a analizar; si se omite se pide por consola.
    path: Option<String>,

    /// Formato del reporte exportado.
    #[arg(long, value_enum, default_value_t = ExportFormat::Pdf)]
    format: ExportFormat,

    /// Ruta del reporte; por defecto `metadata_report.<ext>` junto al archivo.
    #[arg(long)]
    output: Option<PathBuf>,

    /// No escribe ningún reporte.
    #[arg(long)]
    no_export: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    render_header();

    let raw = match cli.path {
        Some(path) => path,
        None => {
            render_file_input_hint();
            match read_user_input() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    eprintln!("{}", style("No path was provided.").red());
                    return ExitCode::FAILURE;
                }
                Err(error) => {
                    eprintln!("{} {error}", style("Could not read the input:").red());
                    return ExitCode::FAILURE;
                }
            }
        }
    };

    let path = PathBuf::from(strip_wrapping_quotes(&raw));
    if !path.exists() {
        eprintln!(
            "{} `{}`",
            style("The file does not exist:").red().bold(),
            path.display()
        );
        return ExitCode::FAILURE;
    }

    match run(&path, cli.format, cli.output, cli.no_export) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", style(message).red());
            ExitCode::FAILURE
        }
    }
}

fn run(
    path: &Path,
    format: ExportFormat,
    output: Option<PathBuf>,
    no_export: bool,
) -> Result<(), String> {
    let report = extract_metadata(path).map_err(|error| error.to_string())?;
    let tables = report_tables(&report).map_err(|error| error.to_string())?;
    for table in &tables {
        render_report_table(table);
    }

    if no_export {
        return Ok(());
    }

    let target = output.unwrap_or_else(|| default_report_path(path, format));
    export_report(&report, format, &target).map_err(|error| error.to_string())?;
    println!(
        "{} {}",
        style(format!("{} report saved to", format.label())).green(),
        style(target.display()).bold()
    );
    Ok(())
}

fn read_user_input() -> io::Result<Option<String>> {
    print!("{} ", style("Path").bold().cyan());
    print!("{} ", style("›").cyan());
    io::stdout().flush()?;

    let mut buffer = String::new();
    let bytes_read = io::stdin().read_line(&mut buffer)?;
    if bytes_read == 0 {
        return Ok(None);
    }

    let line = buffer.trim().to_string();
    Ok(if line.is_empty() { None } else { Some(line) })
}

/// Quita comillas simples o dobles que envuelven la ruta (arrastrar y soltar).
fn strip_wrapping_quotes(input: &str) -> &str {
    let trimmed = input.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_around_paths_are_removed() {
        assert_eq!(strip_wrapping_quotes("\"/tmp/My Photo.jpg\""), "/tmp/My Photo.jpg");
        assert_eq!(strip_wrapping_quotes("  'song.mp3' "), "song.mp3");
        assert_eq!(strip_wrapping_quotes("plain.pdf"), "plain.pdf");
        assert_eq!(strip_wrapping_quotes("\"unbalanced.pdf"), "\"unbalanced.pdf");
    }

    #[test]
    fn cli_flags_parse() {
        let cli = Cli::try_parse_from(["metascope", "a.pdf", "--format", "json", "--no-export"])
            .expect("argumentos válidos");
        assert_eq!(cli.path.as_deref(), Some("a.pdf"));
        assert_eq!(cli.format, ExportFormat::Json);
        assert!(cli.no_export);
    }
}

//! pdfc – command-line front end for the PDF component.
//!
//! Usage:
//!   pdfc [OPTIONS] [INPUT]
//!
//! Settings come from an optional JSON config (`-c`); flags override them.
//! `--dest` picks the destination; it suppresses the implied output file
//! but `-o` still forces file output.
//! With an input file the PDF is written next to it with the same stem
//! unless `-o` says otherwise. Without input or `-o`, the configured
//! destination is used and any bytes go to stdout.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use serde_json::json;

use pdf_component::{Aliases, Destination, Orientation, Output, PageFormat, Pdf, PdfConfig};

#[derive(Parser)]
#[command(name = "pdfc")]
#[command(about = "Render HTML to PDF through the configurable PDF component")]
struct Cli {
    /// HTML file to convert (overrides the configured content)
    input: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output path (forces file output)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stylesheet file, may use a path alias such as @runtime/print.css
    #[arg(long)]
    css: Option<String>,

    /// Destination code when no output path is given: I, D, F or S
    #[arg(long, value_parser = parse_destination)]
    dest: Option<Destination>,

    /// Page format preset, e.g. A4, Letter, Legal-L
    #[arg(long)]
    format: Option<String>,

    /// Landscape orientation
    #[arg(long)]
    landscape: bool,

    /// Document title (default: input file stem)
    #[arg(long)]
    title: Option<String>,

    /// Directory the @runtime alias points at
    #[arg(long)]
    runtime: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn parse_destination(code: &str) -> Result<Destination, String> {
    Destination::from_code(code).ok_or_else(|| format!("unknown destination '{code}', expected I, D, F or S"))
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config: PdfConfig = match &cli.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => PdfConfig::default(),
    };

    let settings = &mut config.settings;
    if let Some(input) = &cli.input {
        settings.content = fs::read_to_string(input)?;
    }
    if let Some(css) = cli.css {
        settings.css_file = Some(css);
    }
    if let Some(format) = cli.format.as_deref() {
        settings.format = PageFormat::from(format);
    }
    if cli.landscape {
        settings.orientation = Orientation::Landscape;
    }
    if let Some(dest) = cli.dest {
        settings.destination = Some(dest);
    }

    // With --dest and no -o, the input does not imply a file next to it.
    let implied_output = cli.input.as_ref().filter(|_| cli.dest.is_none());
    let output_path = cli.output.clone().or_else(|| {
        implied_output.map(|input| {
            let mut o = input.clone();
            o.set_extension("pdf");
            o
        })
    });
    if let Some(path) = &output_path {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        settings.filename = path.to_string_lossy().into_owned();
        settings.destination = Some(Destination::File);
    }

    let title = cli.title.or_else(|| {
        cli.input
            .as_ref()
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned())
    });
    if let Some(title) = title {
        config.options.insert("title".to_string(), json!(title));
    }

    let mut aliases = Aliases::default();
    if let Some(dir) = cli.runtime {
        aliases.set("@runtime", dir);
    }

    let mut pdf: Pdf = Pdf::with_aliases(config, aliases);
    match pdf.render()? {
        Output::File(path) => {
            let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            eprintln!("Wrote '{}' ({size} bytes)", path.display());
        }
        other => {
            let bytes = other.bytes().unwrap_or_default();
            io::stdout().write_all(bytes)?;
        }
    }
    Ok(())
}

//! `HtmlEngine`: the bundled renderer, buffering written HTML and CSS and
//! running the layout pipeline on output.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use super::{resolve_destination, EngineConfig, HtmlMode, Output, Payload, PdfEngine, DEFAULT_FILENAME};
use crate::error::{Error, Result};
use crate::fonts::FontClass;
use crate::layout_config::{DocumentMetadata, LayoutConfig, PageGeometry};
use crate::pipeline::{compute_layout_config, document_css, generate_pdf, PipelineConfig};
use crate::settings::{Destination, Mode};
use crate::style::{Typography, DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE};

/// Properties settable through [`PdfEngine::set_property`].
const PROPERTIES: &[&str] = &[
    "title",
    "author",
    "subject",
    "keywords",
    "creator",
    "header",
    "footer",
    "line_height",
    "show_image_errors",
];

/// Methods callable through [`PdfEngine::call_method`].
const METHODS: &[&str] = &[
    "write_html",
    "set_title",
    "set_author",
    "set_subject",
    "set_keywords",
    "set_creator",
    "set_header",
    "set_footer",
    "add_page",
    "page_count",
];

const PAGE_BREAK: &str = r#"<div style="page-break-before: always"></div>"#;

pub struct HtmlEngine {
    mode: Mode,
    temp_dir: PathBuf,
    geometry: PageGeometry,
    typography: Typography,
    metadata: DocumentMetadata,
    header: Option<String>,
    footer: Option<String>,
    show_image_errors: bool,
    css: String,
    body: String,
}

impl HtmlEngine {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            geometry: self.geometry,
            typography: self.typography.clone(),
            metadata: self.metadata.clone(),
            header: self.header.clone(),
            footer: self.footer.clone(),
            strict_images: self.show_image_errors,
        }
    }

    fn layout(&self) -> Result<LayoutConfig> {
        compute_layout_config(&self.body, &self.css, &self.pipeline_config())
    }

    fn render(&self) -> Result<Vec<u8>> {
        let (bytes, layout) = generate_pdf(&self.body, &self.css, &self.pipeline_config())?;
        log::debug!("rendered {} page(s), {} bytes", layout.page_count(), bytes.len());
        Ok(bytes)
    }

    /// Spool `bytes` in the temp directory, then move them into place.
    fn write_file(&self, target: &Path, bytes: &[u8]) -> Result<()> {
        let mut spool = tempfile::Builder::new()
            .prefix("pdf-")
            .suffix(".part")
            .tempfile_in(&self.temp_dir)?;
        spool.write_all(bytes)?;
        if let Err(e) = spool.persist(target) {
            // Different filesystem: copy; the spool file is removed on drop.
            fs::copy(e.file.path(), target)?;
        }
        Ok(())
    }

    fn warn_unsupported_script(&self, html: &str) {
        if self.mode == Mode::Asian && html.chars().any(is_cjk) {
            log::warn!("CJK text cannot be drawn with the builtin fonts and will be replaced");
        }
    }
}

fn is_cjk(c: char) -> bool {
    matches!(
        c as u32,
        0x3040..=0x30FF | 0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xAC00..=0xD7AF | 0xF900..=0xFAFF
    )
}

fn invalid_property(name: &str, reason: impl Into<String>) -> Error {
    Error::InvalidProperty {
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn invalid_arguments(method: &str, reason: impl Into<String>) -> Error {
    Error::InvalidArguments {
        method: method.to_string(),
        reason: reason.into(),
    }
}

/// Strings, with numbers accepted in their JSON form.
fn text_value(name: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(invalid_property(name, format!("expected a string, got {other}"))),
    }
}

fn optional_text_value(name: &str, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        other => text_value(name, other).map(Some),
    }
}

fn exactly_one(method: &str, args: Vec<Value>) -> Result<Value> {
    let count = args.len();
    let mut args = args.into_iter();
    match (args.next(), count) {
        (Some(value), 1) => Ok(value),
        _ => Err(invalid_arguments(method, format!("expected 1 argument, got {count}"))),
    }
}

impl PdfEngine for HtmlEngine {
    fn new(config: EngineConfig) -> Result<Self> {
        let (width_mm, height_mm) = config.format.dimensions_mm(config.orientation)?;
        let geometry = PageGeometry::from_mm(
            width_mm,
            height_mm,
            [
                config.margin_top,
                config.margin_right,
                config.margin_bottom,
                config.margin_left,
                config.margin_header,
                config.margin_footer,
            ],
        );

        let mut font_family = if config.default_font.trim().is_empty() {
            DEFAULT_FONT_FAMILY.to_string()
        } else {
            config.default_font.trim().to_string()
        };
        if config.mode == Mode::Core {
            font_family = FontClass::from_family(&font_family).core_family().to_string();
        }
        let font_size = if config.default_font_size > 0.0 {
            config.default_font_size
        } else {
            DEFAULT_FONT_SIZE
        };

        log::debug!(
            "engine: format {} ({width_mm}x{height_mm}mm), mode {:?}, font {font_family} {font_size}pt",
            config.format,
            config.mode.as_str(),
        );

        Ok(Self {
            mode: config.mode,
            temp_dir: config.temp_dir,
            geometry,
            typography: Typography {
                font_family,
                font_size,
                ..Typography::default()
            },
            metadata: DocumentMetadata::default(),
            header: None,
            footer: None,
            show_image_errors: false,
            css: String::new(),
            body: String::new(),
        })
    }

    fn has_property(&self, name: &str) -> bool {
        PROPERTIES.contains(&name)
    }

    fn set_property(&mut self, name: &str, value: &Value) -> Result<()> {
        match name {
            "title" => self.metadata.title = text_value(name, value)?,
            "author" => self.metadata.author = text_value(name, value)?,
            "subject" => self.metadata.subject = text_value(name, value)?,
            "creator" => self.metadata.creator = text_value(name, value)?,
            "keywords" => {
                self.metadata.keywords = text_value(name, value)?
                    .split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(String::from)
                    .collect();
            }
            "header" => self.header = optional_text_value(name, value)?,
            "footer" => self.footer = optional_text_value(name, value)?,
            "line_height" => match value.as_f64() {
                Some(v) if v > 0.0 => self.typography.line_height = v as f32,
                _ => return Err(invalid_property(name, "expected a positive number")),
            },
            "show_image_errors" => {
                self.show_image_errors = value
                    .as_bool()
                    .ok_or_else(|| invalid_property(name, "expected a boolean"))?;
            }
            _ => return Err(invalid_property(name, "no such property")),
        }
        Ok(())
    }

    fn has_method(&self, name: &str) -> bool {
        METHODS.contains(&name)
    }

    fn call_method(&mut self, name: &str, args: Vec<Value>) -> Result<Value> {
        log::debug!("engine method {name} with {} argument(s)", args.len());
        match name {
            "write_html" => {
                let (html, mode) = match args.as_slice() {
                    [Value::String(html)] => (html.as_str(), HtmlMode::Document),
                    [Value::String(html), mode] => {
                        let mode = mode
                            .as_u64()
                            .and_then(HtmlMode::from_code)
                            .ok_or_else(|| invalid_arguments(name, "mode must be 0, 1 or 2"))?;
                        (html.as_str(), mode)
                    }
                    _ => return Err(invalid_arguments(name, "expected (html[, mode])")),
                };
                self.write_html(html, mode)?;
                Ok(Value::Null)
            }
            "set_title" | "set_author" | "set_subject" | "set_keywords" | "set_creator"
            | "set_header" | "set_footer" => {
                let property = &name["set_".len()..];
                let value = exactly_one(name, args)?;
                self.set_property(property, &value).map_err(|e| match e {
                    Error::InvalidProperty { reason, .. } => invalid_arguments(name, reason),
                    other => other,
                })?;
                Ok(Value::Null)
            }
            "add_page" => {
                if !args.is_empty() {
                    return Err(invalid_arguments(name, "expected no arguments"));
                }
                self.body.push_str(PAGE_BREAK);
                Ok(Value::Null)
            }
            "page_count" => Ok(json!(self.layout()?.page_count())),
            _ => Err(Error::InvalidMethod(name.to_string())),
        }
    }

    fn write_html(&mut self, html: &str, mode: HtmlMode) -> Result<()> {
        log::debug!("write_html: {} bytes as {mode:?}", html.len());
        match mode {
            HtmlMode::HeaderCss => {
                self.css.push_str(html);
                self.css.push('\n');
            }
            HtmlMode::Document => {
                self.warn_unsupported_script(html);
                self.css.push_str(&document_css(html));
                self.body.push_str(html);
            }
            HtmlMode::Body => {
                self.warn_unsupported_script(html);
                self.body.push_str(html);
            }
        }
        Ok(())
    }

    fn output(&mut self, filename: &str, destination: Option<Destination>) -> Result<Output> {
        let destination = resolve_destination(filename, destination);
        let filename = if filename.is_empty() {
            DEFAULT_FILENAME.to_string()
        } else {
            filename.to_string()
        };
        let bytes = self.render()?;

        Ok(match destination {
            Destination::Browser => Output::Inline(Payload {
                filename,
                bytes,
                attachment: false,
            }),
            Destination::Download => Output::Download(Payload {
                filename,
                bytes,
                attachment: true,
            }),
            Destination::File => {
                let target = PathBuf::from(filename);
                self.write_file(&target, &bytes)?;
                log::info!("wrote {}", target.display());
                Output::File(target)
            }
            Destination::String => Output::Bytes(bytes),
        })
    }
}

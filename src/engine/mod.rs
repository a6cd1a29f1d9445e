//! The engine seam: what the component needs from an HTML → PDF renderer.

use std::path::PathBuf;

use serde_json::Value;

use crate::error::Result;
use crate::format::{Orientation, PageFormat};
use crate::settings::{Destination, Mode};

mod html;

pub use html::HtmlEngine;

/// Filename used when output is requested without one.
pub const DEFAULT_FILENAME: &str = "document.pdf";

/// Construction parameters handed to [`PdfEngine::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub mode: Mode,
    pub format: PageFormat,
    pub orientation: Orientation,
    /// Empty lets the engine choose.
    pub default_font: String,
    /// Points; 0 lets the engine choose.
    pub default_font_size: f32,
    /// Margins in millimetres.
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_header: f32,
    pub margin_footer: f32,
    /// Existing, writable scratch directory.
    pub temp_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Blank,
            format: PageFormat::default(),
            orientation: Orientation::Portrait,
            default_font: String::new(),
            default_font_size: 0.0,
            margin_left: 15.0,
            margin_right: 15.0,
            margin_top: 16.0,
            margin_bottom: 16.0,
            margin_header: 9.0,
            margin_footer: 9.0,
            temp_dir: std::env::temp_dir(),
        }
    }
}

/// How [`PdfEngine::write_html`] interprets its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HtmlMode {
    /// A full document; `<style>` blocks are harvested into the stylesheet.
    #[default]
    Document,
    /// CSS only.
    HeaderCss,
    /// Body HTML only; `<style>` blocks are ignored.
    Body,
}

impl HtmlMode {
    pub fn code(self) -> u8 {
        match self {
            HtmlMode::Document => 0,
            HtmlMode::HeaderCss => 1,
            HtmlMode::Body => 2,
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(HtmlMode::Document),
            1 => Some(HtmlMode::HeaderCss),
            2 => Some(HtmlMode::Body),
            _ => None,
        }
    }
}

/// A rendered document ready to hand to an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub filename: String,
    pub bytes: Vec<u8>,
    /// Attachment (download) rather than inline display.
    pub attachment: bool,
}

impl Payload {
    /// Response headers for serving the payload.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let disposition = if self.attachment { "attachment" } else { "inline" };
        vec![
            ("Content-Type", "application/pdf".to_string()),
            (
                "Content-Disposition",
                format!("{disposition}; filename=\"{}\"", self.filename.replace('"', "")),
            ),
            ("Content-Length", self.bytes.len().to_string()),
            ("Cache-Control", "public, must-revalidate, max-age=0".to_string()),
            ("Pragma", "public".to_string()),
        ]
    }
}

/// Result of [`PdfEngine::output`], one variant per destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// `I`: show in the viewer.
    Inline(Payload),
    /// `D`: force a download.
    Download(Payload),
    /// `F`: written to this path.
    File(PathBuf),
    /// `S`: raw PDF bytes.
    Bytes(Vec<u8>),
}

impl Output {
    pub fn destination(&self) -> Destination {
        match self {
            Output::Inline(_) => Destination::Browser,
            Output::Download(_) => Destination::Download,
            Output::File(_) => Destination::File,
            Output::Bytes(_) => Destination::String,
        }
    }

    /// The PDF bytes, unless they went to a file.
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Output::Inline(p) | Output::Download(p) => Some(&p.bytes),
            Output::Bytes(b) => Some(b),
            Output::File(_) => None,
        }
    }
}

/// Destination actually used: an unset destination streams inline when
/// there is no filename and writes a file otherwise.
pub fn resolve_destination(filename: &str, destination: Option<Destination>) -> Destination {
    destination.unwrap_or(if filename.is_empty() {
        Destination::Browser
    } else {
        Destination::File
    })
}

/// An HTML → PDF renderer driven by name.
///
/// Properties and methods are looked up in fixed tables; the component
/// checks `has_*` before calling `set_property` / `call_method`.
pub trait PdfEngine: Sized {
    fn new(config: EngineConfig) -> Result<Self>;

    fn has_property(&self, name: &str) -> bool;

    fn set_property(&mut self, name: &str, value: &Value) -> Result<()>;

    fn has_method(&self, name: &str) -> bool;

    fn call_method(&mut self, name: &str, args: Vec<Value>) -> Result<Value>;

    fn write_html(&mut self, html: &str, mode: HtmlMode) -> Result<()>;

    fn output(&mut self, filename: &str, destination: Option<Destination>) -> Result<Output>;
}

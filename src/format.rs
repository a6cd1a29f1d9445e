//! Page formats and orientation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const FORMAT_A3: &str = "A3";
pub const FORMAT_A4: &str = "A4";
pub const FORMAT_FOLIO: &str = "Folio";
pub const FORMAT_LEDGER: &str = "Ledger-L";
pub const FORMAT_LEGAL: &str = "Legal";
pub const FORMAT_LETTER: &str = "Letter";
pub const FORMAT_TABLOID: &str = "Tabloid";

/// Suffix marking a named format as landscape.
pub const LANDSCAPE_SUFFIX: &str = "-L";

/// Millimetres → PDF points.
pub const MM_TO_PT: f32 = 72.0 / 25.4;

/// Preset sizes in millimetres, as (name, width, height).
const PRESETS: &[(&str, f32, f32)] = &[
    ("A3", 297.0, 420.0),
    ("A4", 210.0, 297.0),
    ("Folio", 215.9, 330.2),
    ("Ledger", 431.8, 279.4),
    ("Legal", 215.9, 355.6),
    ("Letter", 215.9, 279.4),
    ("Tabloid", 279.4, 431.8),
];

/// Page orientation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    #[serde(rename = "P")]
    Portrait,
    #[serde(rename = "L")]
    Landscape,
}

impl Orientation {
    pub fn code(self) -> &'static str {
        match self {
            Orientation::Portrait => "P",
            Orientation::Landscape => "L",
        }
    }
}

/// A named preset (`"A4"`, `"Letter-L"`) or an explicit `[width, height]`
/// pair in millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageFormat {
    Named(String),
    Size([f32; 2]),
}

impl Default for PageFormat {
    fn default() -> Self {
        PageFormat::Named(FORMAT_A4.to_string())
    }
}

impl From<&str> for PageFormat {
    fn from(name: &str) -> Self {
        PageFormat::Named(name.to_string())
    }
}

impl fmt::Display for PageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageFormat::Named(name) => f.write_str(name),
            PageFormat::Size([w, h]) => write!(f, "{w}x{h}mm"),
        }
    }
}

impl PageFormat {
    /// Append the landscape suffix to a named format when `orientation` is
    /// landscape. Never appends twice; explicit sizes are left alone.
    pub fn apply_orientation(&mut self, orientation: Orientation) {
        if orientation != Orientation::Landscape {
            return;
        }
        if let PageFormat::Named(name) = self {
            if !name.ends_with(LANDSCAPE_SUFFIX) {
                name.push_str(LANDSCAPE_SUFFIX);
            }
        }
    }

    /// Page size in millimetres as (width, height).
    ///
    /// A `-L` suffix or landscape orientation puts the long edge horizontal.
    /// Explicit sizes are only swapped when landscape is requested and the
    /// pair is portrait-shaped.
    pub fn dimensions_mm(&self, orientation: Orientation) -> Result<(f32, f32)> {
        let landscape = orientation == Orientation::Landscape;
        match self {
            PageFormat::Size([w, h]) => {
                if *w <= 0.0 || *h <= 0.0 {
                    return Err(Error::UnknownFormat(self.to_string()));
                }
                if landscape && w < h {
                    Ok((*h, *w))
                } else {
                    Ok((*w, *h))
                }
            }
            PageFormat::Named(name) => {
                let (base, suffixed) = match name.strip_suffix(LANDSCAPE_SUFFIX) {
                    Some(base) => (base, true),
                    None => (name.as_str(), false),
                };
                let &(_, w, h) = PRESETS
                    .iter()
                    .find(|(preset, _, _)| preset.eq_ignore_ascii_case(base.trim()))
                    .ok_or_else(|| Error::UnknownFormat(name.clone()))?;
                if suffixed || landscape {
                    Ok((w.max(h), w.min(h)))
                } else {
                    Ok((w, h))
                }
            }
        }
    }

    /// Page size in PDF points.
    pub fn dimensions_pt(&self, orientation: Orientation) -> Result<(f32, f32)> {
        let (w, h) = self.dimensions_mm(orientation)?;
        Ok((w * MM_TO_PT, h * MM_TO_PT))
    }
}

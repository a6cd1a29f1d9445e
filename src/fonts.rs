//! Builtin font selection and text measurement.
//!
//! Only the fourteen standard PDF fonts are used, so no font files are read
//! or embedded. Widths are estimated from a per-class average advance, which
//! is close enough to feed Taffy with intrinsic text sizes.

use printpdf::BuiltinFont;

/// Typeface class a CSS family name maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontClass {
    Sans,
    Serif,
    Mono,
}

impl FontClass {
    /// Classify a CSS `font-family` value (first family only).
    pub fn from_family(family: &str) -> Self {
        let family = family.trim().to_ascii_lowercase();
        if family.contains("mono")
            || family.contains("courier")
            || family.contains("consol")
            || family == "fixed"
        {
            FontClass::Mono
        } else if family == "serif"
            || family.contains("times")
            || family.contains("georgia")
            || family.contains("garamond")
            || (family.contains("serif") && !family.contains("sans"))
        {
            FontClass::Serif
        } else {
            FontClass::Sans
        }
    }

    /// Canonical core font family name.
    pub fn core_family(self) -> &'static str {
        match self {
            FontClass::Sans => "Helvetica",
            FontClass::Serif => "Times",
            FontClass::Mono => "Courier",
        }
    }

    /// Average glyph advance as a fraction of the font size.
    fn average_advance(self) -> f32 {
        match self {
            FontClass::Sans => 0.5,
            FontClass::Serif => 0.45,
            FontClass::Mono => 0.6,
        }
    }
}

/// A concrete face: class plus weight and slant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontFace {
    pub class: FontClass,
    pub bold: bool,
    pub italic: bool,
}

impl FontFace {
    pub fn new(family: &str, bold: bool, italic: bool) -> Self {
        Self {
            class: FontClass::from_family(family),
            bold,
            italic,
        }
    }

    pub fn builtin(self) -> BuiltinFont {
        use BuiltinFont::*;
        match (self.class, self.bold, self.italic) {
            (FontClass::Sans, false, false) => Helvetica,
            (FontClass::Sans, true, false) => HelveticaBold,
            (FontClass::Sans, false, true) => HelveticaOblique,
            (FontClass::Sans, true, true) => HelveticaBoldOblique,
            (FontClass::Serif, false, false) => TimesRoman,
            (FontClass::Serif, true, false) => TimesBold,
            (FontClass::Serif, false, true) => TimesItalic,
            (FontClass::Serif, true, true) => TimesBoldItalic,
            (FontClass::Mono, false, false) => Courier,
            (FontClass::Mono, true, false) => CourierBold,
            (FontClass::Mono, false, true) => CourierOblique,
            (FontClass::Mono, true, true) => CourierBoldOblique,
        }
    }

    /// Estimated width of `text` at `font_size`, in points.
    pub fn text_width(self, text: &str, font_size: f32) -> f32 {
        let mut advance = self.class.average_advance();
        // Courier is fixed-pitch in every weight.
        if self.bold && self.class != FontClass::Mono {
            advance *= 1.1;
        }
        text.chars().count() as f32 * font_size * advance
    }

    /// Distance from the top of a line box to the baseline.
    pub fn ascender(self, font_size: f32) -> f32 {
        font_size * 0.75
    }
}

/// Line box height for a font size and CSS line-height factor.
pub fn line_height_px(font_size: f32, line_height_factor: f32) -> f32 {
    font_size * line_height_factor
}

/// Word-wrap text to fit within `max_width` points. Returns a vec of lines.
pub fn wrap_text(text: &str, face: FontFace, font_size: f32, max_width: f32) -> Vec<String> {
    if max_width <= 0.0 || text.is_empty() {
        return vec![text.to_string()];
    }

    let mut lines: Vec<String> = Vec::new();
    for paragraph in text.split('\n') {
        let mut current_line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current_line.is_empty() {
                word.to_string()
            } else {
                format!("{current_line} {word}")
            };
            if face.text_width(&candidate, font_size) > max_width && !current_line.is_empty() {
                lines.push(std::mem::replace(&mut current_line, word.to_string()));
            } else {
                current_line = candidate;
            }
        }
        lines.push(current_line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_text_width() {
        let face = FontFace::new("Helvetica", false, false);
        // 5 chars × 16 × 0.5 = 40
        assert!((face.text_width("Hello", 16.0) - 40.0).abs() < 0.1);
        let mono = FontFace::new("Courier New", true, false);
        assert!((mono.text_width("Hello", 10.0) - 30.0).abs() < 0.1);
    }

    #[test]
    fn families_map_to_core_fonts() {
        assert_eq!(FontClass::from_family("Times New Roman"), FontClass::Serif);
        assert_eq!(FontClass::from_family("serif"), FontClass::Serif);
        assert_eq!(FontClass::from_family("sans-serif"), FontClass::Sans);
        assert_eq!(FontClass::from_family("DejaVu Sans Mono"), FontClass::Mono);
        assert_eq!(FontClass::from_family("Arial"), FontClass::Sans);
        assert_eq!(
            FontFace::new("Georgia", true, true).builtin(),
            BuiltinFont::TimesBoldItalic
        );
    }

    #[test]
    fn word_wrap_basic() {
        let face = FontFace::new("Helvetica", false, false);
        let lines = wrap_text("Hello world foo bar", face, 16.0, 60.0);
        assert!(lines.len() >= 2, "Expected wrapping, got {lines:?}");
        assert!(lines.iter().all(|l| !l.is_empty()));
    }

    #[test]
    fn long_word_stays_on_its_own_line() {
        let face = FontFace::new("Helvetica", false, false);
        let lines = wrap_text("a supercalifragilistic b", face, 10.0, 30.0);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }
}

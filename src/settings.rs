//! Component settings: render settings, engine options, and the list of
//! engine method calls run before rendering.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

use crate::format::{Orientation, PageFormat};

/// Output destination code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Destination {
    /// Stream to the caller / viewer (`I`).
    #[serde(rename = "I")]
    Browser,
    /// Force a download (`D`).
    #[serde(rename = "D")]
    Download,
    /// Write to a file (`F`).
    #[serde(rename = "F")]
    File,
    /// Return the raw bytes (`S`).
    #[serde(rename = "S")]
    String,
}

impl Destination {
    pub fn code(self) -> char {
        match self {
            Destination::Browser => 'I',
            Destination::Download => 'D',
            Destination::File => 'F',
            Destination::String => 'S',
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "I" => Some(Destination::Browser),
            "D" => Some(Destination::Download),
            "F" => Some(Destination::File),
            "S" => Some(Destination::String),
            _ => None,
        }
    }
}

/// `null`, `""` or a destination code, case-insensitive.
fn optional_destination<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Destination>, D::Error> {
    let code: Option<String> = Option::deserialize(deserializer)?;
    match code.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(code) => Destination::from_code(code)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("unknown destination '{code}'"))),
    }
}

/// Script / language handling flag passed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mode {
    #[default]
    Blank,
    /// `+aCJK`
    Asian,
    /// `c`: core fonts only.
    Core,
    /// `UTF-8`
    Utf8,
    /// Any other value, kept as a language / country code.
    Locale(String),
}

impl Mode {
    pub fn as_str(&self) -> &str {
        match self {
            Mode::Blank => "",
            Mode::Asian => "+aCJK",
            Mode::Core => "c",
            Mode::Utf8 => "UTF-8",
            Mode::Locale(code) => code,
        }
    }
}

impl From<String> for Mode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "" => Mode::Blank,
            "+aCJK" => Mode::Asian,
            "c" => Mode::Core,
            "UTF-8" | "utf-8" => Mode::Utf8,
            _ => Mode::Locale(value),
        }
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the component needs to build the engine and produce output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// HTML content to convert.
    pub content: String,
    /// Stylesheet file, possibly aliased (`@app/css/print.css`).
    pub css_file: Option<String>,
    /// CSS appended after the stylesheet file.
    pub inline_css: String,
    /// Default font family; empty lets the engine choose.
    pub default_font: String,
    /// Default font size in points; 0 lets the engine choose.
    pub default_font_size: f32,
    /// Output destination; unset (or `""`) lets the engine decide from the
    /// filename.
    #[serde(deserialize_with = "optional_destination")]
    pub destination: Option<Destination>,
    pub filename: String,
    pub format: PageFormat,
    /// Margins in millimetres.
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_header: f32,
    pub margin_footer: f32,
    pub mode: Mode,
    pub orientation: Orientation,
    /// Engine working directory, possibly aliased. Filled by `Pdf::init`.
    pub temp_path: Option<String>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            content: String::new(),
            css_file: None,
            inline_css: String::new(),
            default_font: String::new(),
            default_font_size: 0.0,
            destination: None,
            filename: String::new(),
            format: PageFormat::default(),
            margin_top: 16.0,
            margin_bottom: 16.0,
            margin_left: 15.0,
            margin_right: 15.0,
            margin_header: 9.0,
            margin_footer: 9.0,
            mode: Mode::Blank,
            orientation: Orientation::Portrait,
            temp_path: None,
        }
    }
}

/// Engine property name → value, applied by `Pdf::configure`.
pub type EngineOptions = Map<String, Value>;

pub fn default_engine_options() -> EngineOptions {
    let mut options = Map::new();
    options.insert("creator".to_string(), json!("pdf-component"));
    options.insert("show_image_errors".to_string(), json!(false));
    options
}

/// One engine method call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    /// A single argument, or an array of arguments.
    #[serde(default = "no_params")]
    pub params: Value,
}

fn no_params() -> Value {
    Value::Array(Vec::new())
}

impl MethodCall {
    pub fn new(method: impl Into<String>, params: impl Into<Value>) -> Self {
        Self {
            method: method.into(),
            params: params.into(),
        }
    }
}

/// Method calls run in order before rendering.
pub type MethodInvocationList = Vec<MethodCall>;

/// Turn method params into an argument list: arrays are spread, `null` means
/// no arguments, any other value becomes the single argument.
pub fn into_arguments(params: Value) -> Vec<Value> {
    match params {
        Value::Array(args) => args,
        Value::Null => Vec::new(),
        scalar => vec![scalar],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn documented_defaults() {
        let s = RenderSettings::default();
        assert_eq!(s.format, PageFormat::from("A4"));
        assert_eq!(s.orientation, Orientation::Portrait);
        assert_eq!(
            (s.margin_top, s.margin_bottom, s.margin_left, s.margin_right),
            (16.0, 16.0, 15.0, 15.0)
        );
        assert_eq!((s.margin_header, s.margin_footer), (9.0, 9.0));
        assert_eq!(s.mode, Mode::Blank);
        assert_eq!(s.destination, None);
    }

    #[test]
    fn mode_round_trips_through_strings() {
        for code in ["", "+aCJK", "c", "UTF-8", "de"] {
            let mode = Mode::from(code.to_string());
            assert_eq!(String::from(mode), code);
        }
        assert_eq!(Mode::from("ja".to_string()), Mode::Locale("ja".into()));
    }

    #[test]
    fn destination_codes() {
        let d: Destination = serde_json::from_str("\"S\"").unwrap();
        assert_eq!(d, Destination::String);
        assert_eq!(Destination::from_code("d"), Some(Destination::Download));
        assert_eq!(Destination::from_code("X"), None);
        assert_eq!(Destination::File.code(), 'F');
    }

    #[test]
    fn blank_destination_means_unset() {
        let s: RenderSettings = serde_json::from_str(r#"{"destination": ""}"#).unwrap();
        assert_eq!(s.destination, None);
        let s: RenderSettings = serde_json::from_str(r#"{"destination": null}"#).unwrap();
        assert_eq!(s.destination, None);
        let s: RenderSettings = serde_json::from_str(r#"{"destination": "f"}"#).unwrap();
        assert_eq!(s.destination, Some(Destination::File));
        assert!(serde_json::from_str::<RenderSettings>(r#"{"destination": "Q"}"#).is_err());
    }

    #[test]
    fn scalar_params_are_wrapped() {
        assert_eq!(into_arguments(json!("Title")), vec![json!("Title")]);
        assert_eq!(into_arguments(json!(["a", 2])), vec![json!("a"), json!(2)]);
        assert_eq!(into_arguments(Value::Null), Vec::<Value>::new());
    }

    #[test]
    fn method_call_params_default_to_empty() {
        let call: MethodCall = serde_json::from_str(r#"{"method": "add_page"}"#).unwrap();
        assert_eq!(call.params, json!([]));
    }
}

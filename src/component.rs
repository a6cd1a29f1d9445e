//! The `Pdf` component: holds render settings, builds the engine on first
//! use and drives it from configuration.

use std::fs;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::alias::Aliases;
use crate::engine::{EngineConfig, HtmlEngine, HtmlMode, Output, PdfEngine};
use crate::error::{Error, Result};
use crate::settings::{
    default_engine_options, into_arguments, Destination, EngineOptions, MethodInvocationList,
    RenderSettings,
};
use crate::workdir::ensure_work_dir;

/// Working directory used when `temp_path` is not configured.
pub const DEFAULT_TEMP_PATH: &str = "@runtime/pdf";

/// Serializable form of the component's configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    #[serde(flatten)]
    pub settings: RenderSettings,
    /// Engine properties applied before rendering.
    pub options: EngineOptions,
    /// Engine methods run, in order, before rendering.
    pub methods: MethodInvocationList,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            settings: RenderSettings::default(),
            options: default_engine_options(),
            methods: Vec::new(),
        }
    }
}

/// HTML → PDF component over an engine `E`.
///
/// The engine is constructed lazily by [`Pdf::engine`] and kept for the
/// lifetime of the component, as is the stylesheet computed by
/// [`Pdf::stylesheet`].
pub struct Pdf<E: PdfEngine = HtmlEngine> {
    pub settings: RenderSettings,
    pub options: EngineOptions,
    pub methods: MethodInvocationList,
    pub aliases: Aliases,
    cached_css: Option<String>,
    engine: Option<E>,
}

impl<E: PdfEngine> Default for Pdf<E> {
    fn default() -> Self {
        Self::new(PdfConfig::default())
    }
}

impl<E: PdfEngine> Pdf<E> {
    pub fn new(config: PdfConfig) -> Self {
        Self::with_aliases(config, Aliases::default())
    }

    pub fn with_aliases(config: PdfConfig, aliases: Aliases) -> Self {
        let mut pdf = Self {
            settings: config.settings,
            options: config.options,
            methods: config.methods,
            aliases,
            cached_css: None,
            engine: None,
        };
        pdf.init();
        pdf
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: PdfConfig = serde_json::from_str(json)?;
        Ok(Self::new(config))
    }

    /// Fill in the default working directory and normalise the format.
    /// Safe to call more than once.
    pub fn init(&mut self) {
        if self.settings.temp_path.is_none() {
            self.settings.temp_path = Some(DEFAULT_TEMP_PATH.to_string());
        }
        self.parse_format();
    }

    /// Append the landscape suffix to a named format when the orientation is
    /// landscape.
    pub fn parse_format(&mut self) {
        let orientation = self.settings.orientation;
        self.settings.format.apply_orientation(orientation);
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    /// The engine, built on first access.
    pub fn engine(&mut self) -> Result<&mut E> {
        let engine = match self.engine.take() {
            Some(engine) => engine,
            None => self.build_engine()?,
        };
        Ok(self.engine.insert(engine))
    }

    fn build_engine(&self) -> Result<E> {
        let temp_path = self
            .settings
            .temp_path
            .as_deref()
            .unwrap_or(DEFAULT_TEMP_PATH);
        let temp_dir = self
            .aliases
            .resolve(temp_path)
            .ok_or_else(|| Error::InvalidConfig {
                path: temp_path.into(),
                reason: "unknown path alias".to_string(),
            })?;
        ensure_work_dir(&temp_dir)?;

        let s = &self.settings;
        log::debug!(
            "building engine: format {}, orientation {}, temp dir {}",
            s.format,
            s.orientation.code(),
            temp_dir.display()
        );
        E::new(EngineConfig {
            mode: s.mode.clone(),
            format: s.format.clone(),
            orientation: s.orientation,
            default_font: s.default_font.clone(),
            default_font_size: s.default_font_size,
            margin_left: s.margin_left,
            margin_right: s.margin_right,
            margin_top: s.margin_top,
            margin_bottom: s.margin_bottom,
            margin_header: s.margin_header,
            margin_footer: s.margin_footer,
            temp_dir,
        })
    }

    /// The external stylesheet followed by the inline CSS. Computed once;
    /// later calls return the cached text.
    pub fn stylesheet(&mut self) -> &str {
        if self.cached_css.is_none() {
            self.cached_css = Some(self.load_stylesheet());
        }
        self.cached_css.as_deref().unwrap_or_default()
    }

    fn load_stylesheet(&self) -> String {
        let mut css = match self.settings.css_file.as_deref() {
            None => String::new(),
            Some(path) => match self.aliases.resolve(path) {
                None => {
                    log::warn!("stylesheet {path}: unknown path alias");
                    String::new()
                }
                Some(file) => fs::read_to_string(&file).unwrap_or_else(|e| {
                    log::warn!("stylesheet {}: {e}", file.display());
                    String::new()
                }),
            },
        };
        css.push_str(&self.settings.inline_css);
        css
    }

    /// Set each declared engine property in `options`. Undeclared names and
    /// wrongly typed values are skipped. An empty map leaves the engine
    /// unbuilt.
    pub fn configure(&mut self, options: &EngineOptions) -> Result<()> {
        if options.is_empty() {
            return Ok(());
        }
        let engine = self.engine()?;
        for (name, value) in options {
            if !engine.has_property(name) {
                log::debug!("engine has no property {name}, skipping");
                continue;
            }
            match engine.set_property(name, value) {
                Ok(()) => log::debug!("engine property {name} = {value}"),
                Err(Error::InvalidProperty { reason, .. }) => {
                    log::warn!("skipping engine property {name}: {reason}")
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Call engine method `name`. `params` is a single argument, an array
    /// of arguments, or `null` for none.
    pub fn run_method(&mut self, name: &str, params: Value) -> Result<Value> {
        let engine = self.engine()?;
        if !engine.has_method(name) {
            return Err(Error::InvalidMethod(name.to_string()));
        }
        let args = into_arguments(params);
        log::debug!("calling engine method {name} with {} argument(s)", args.len());
        engine.call_method(name, args)
    }

    /// Feed `content` (and the stylesheet, if any) to the engine and emit
    /// the document.
    pub fn output(
        &mut self,
        content: &str,
        filename: &str,
        destination: Option<Destination>,
    ) -> Result<Output> {
        let css = self.stylesheet().to_string();
        let engine = self.engine()?;
        if css.is_empty() {
            engine.write_html(content, HtmlMode::Document)?;
        } else {
            engine.write_html(&css, HtmlMode::HeaderCss)?;
            engine.write_html(content, HtmlMode::Body)?;
        }
        engine.output(filename, destination)
    }

    /// Apply options, run the configured methods in order, then output the
    /// configured content.
    pub fn render(&mut self) -> Result<Output> {
        let options = self.options.clone();
        self.configure(&options)?;

        for call in self.methods.clone() {
            self.run_method(&call.method, call.params)?;
        }

        let content = self.settings.content.clone();
        let filename = self.settings.filename.clone();
        let destination = self.settings.destination;
        self.output(&content, &filename, destination)
    }
}

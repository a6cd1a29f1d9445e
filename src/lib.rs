//! # pdf-component – configurable HTML → PDF component
//!
//! [`Pdf`] collects render settings, builds a [`PdfEngine`] on first use,
//! applies engine properties and method calls by name, and feeds HTML plus
//! an optional stylesheet into the engine to produce a document.
//!
//! The bundled [`HtmlEngine`] renders through these stages:
//!
//! 1. **Parse** – HTML string → DOM tree ([`dom`])
//! 2. **Style** – stylesheet rules, utility classes, inline styles ([`css`], [`style`])
//! 3. **Layout** – compute flexbox/grid layout with Taffy ([`layout`])
//! 4. **Paginate** – split into pages, add headers and footers ([`pagination`])
//! 5. **Render** – emit PDF bytes via printpdf ([`render`])

pub mod alias;
pub mod component;
pub mod css;
pub mod dom;
pub mod engine;
pub mod error;
pub mod fonts;
pub mod format;
pub mod layout;
pub mod layout_config;
pub mod pagination;
pub mod pipeline;
pub mod render;
pub mod settings;
pub mod style;
pub mod workdir;

pub use alias::Aliases;
pub use component::{Pdf, PdfConfig};
pub use engine::{EngineConfig, HtmlEngine, HtmlMode, Output, Payload, PdfEngine};
pub use error::{Error, Result};
pub use format::{Orientation, PageFormat};
pub use pipeline::{generate_pdf, generate_pdf_from_html};
pub use settings::{Destination, EngineOptions, MethodCall, Mode, RenderSettings};

//! Component behaviour checked against a recording engine.

use std::cell::RefCell;
use std::fs;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use pdf_component::settings::MethodCall;
use pdf_component::{
    Aliases, Destination, EngineConfig, EngineOptions, Error, HtmlMode, Output, Pdf, PdfConfig,
    PdfEngine, Result,
};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Built(EngineConfig),
    Set(String, Value),
    Called(String, Vec<Value>),
    Wrote(String, HtmlMode),
    Output(String, Option<Destination>),
}

thread_local! {
    static EVENTS: RefCell<Vec<Event>> = const { RefCell::new(Vec::new()) };
}

fn record(event: Event) {
    EVENTS.with(|events| events.borrow_mut().push(event));
}

fn take_events() -> Vec<Event> {
    EVENTS.with(|events| events.borrow_mut().drain(..).collect())
}

struct Recorder;

impl PdfEngine for Recorder {
    fn new(config: EngineConfig) -> Result<Self> {
        record(Event::Built(config));
        Ok(Recorder)
    }

    fn has_property(&self, name: &str) -> bool {
        matches!(name, "title" | "author" | "page_number")
    }

    fn set_property(&mut self, name: &str, value: &Value) -> Result<()> {
        if name == "page_number" && !value.is_u64() {
            return Err(Error::InvalidProperty {
                name: name.to_string(),
                reason: "expected a number".to_string(),
            });
        }
        record(Event::Set(name.to_string(), value.clone()));
        Ok(())
    }

    fn has_method(&self, name: &str) -> bool {
        matches!(name, "set_footer" | "add_page")
    }

    fn call_method(&mut self, name: &str, args: Vec<Value>) -> Result<Value> {
        record(Event::Called(name.to_string(), args));
        Ok(Value::Null)
    }

    fn write_html(&mut self, html: &str, mode: HtmlMode) -> Result<()> {
        record(Event::Wrote(html.to_string(), mode));
        Ok(())
    }

    fn output(&mut self, filename: &str, destination: Option<Destination>) -> Result<Output> {
        record(Event::Output(filename.to_string(), destination));
        Ok(Output::Bytes(b"%PDF-recorded".to_vec()))
    }
}

fn recorder(root: &std::path::Path, config: PdfConfig) -> Pdf<Recorder> {
    take_events();
    let mut aliases = Aliases::default();
    aliases.set("@runtime", root);
    Pdf::with_aliases(config, aliases)
}

fn empty_config() -> PdfConfig {
    PdfConfig {
        options: EngineOptions::new(),
        ..PdfConfig::default()
    }
}

fn without_build(events: Vec<Event>) -> Vec<Event> {
    events
        .into_iter()
        .filter(|e| !matches!(e, Event::Built(_)))
        .collect()
}

#[test]
fn engine_is_built_once_with_settings() {
    let root = tempfile::tempdir().unwrap();
    let mut config = empty_config();
    config.settings.margin_left = 7.0;
    config.settings.default_font = "serif".into();
    let mut pdf = recorder(root.path(), config);

    pdf.engine().unwrap();
    pdf.engine().unwrap();
    pdf.run_method("add_page", Value::Null).unwrap();

    let built: Vec<EngineConfig> = take_events()
        .into_iter()
        .filter_map(|e| match e {
            Event::Built(c) => Some(c),
            _ => None,
        })
        .collect();
    assert_eq!(built.len(), 1);
    assert_eq!(built[0].margin_left, 7.0);
    assert_eq!(built[0].default_font, "serif");
    assert_eq!(built[0].temp_dir, root.path().join("pdf"));
    assert!(root.path().join("pdf").is_dir());
}

#[test]
fn construction_is_deferred() {
    let root = tempfile::tempdir().unwrap();
    let pdf = recorder(root.path(), PdfConfig::default());
    assert!(!pdf.has_engine());
    assert!(take_events().is_empty());
    assert!(!root.path().join("pdf").exists());
}

#[test]
fn css_and_body_are_written_separately() {
    let root = tempfile::tempdir().unwrap();
    let mut config = empty_config();
    config.settings.inline_css = "p { color: red }".into();
    let mut pdf = recorder(root.path(), config);

    pdf.output("<p>x</p>", "out.pdf", Some(Destination::String))
        .unwrap();
    assert_eq!(
        without_build(take_events()),
        vec![
            Event::Wrote("p { color: red }".into(), HtmlMode::HeaderCss),
            Event::Wrote("<p>x</p>".into(), HtmlMode::Body),
            Event::Output("out.pdf".into(), Some(Destination::String)),
        ]
    );
}

#[test]
fn without_css_the_content_is_one_document_write() {
    let root = tempfile::tempdir().unwrap();
    let mut pdf = recorder(root.path(), empty_config());

    pdf.output("<html><body>x</body></html>", "", None).unwrap();
    assert_eq!(
        without_build(take_events()),
        vec![
            Event::Wrote("<html><body>x</body></html>".into(), HtmlMode::Document),
            Event::Output(String::new(), None),
        ]
    );
}

#[test]
fn configure_sets_declared_properties_only() {
    let root = tempfile::tempdir().unwrap();
    let mut pdf = recorder(root.path(), empty_config());
    let options: EngineOptions = serde_json::from_value(json!({
        "title": "Report",
        "nonexistent": 1,
        "page_number": "not a number",
        "author": "Ops",
    }))
    .unwrap();

    pdf.configure(&options).unwrap();
    let mut set = without_build(take_events());
    set.sort_by_key(|e| format!("{e:?}"));
    assert_eq!(
        set,
        vec![
            Event::Set("author".into(), json!("Ops")),
            Event::Set("title".into(), json!("Report")),
        ]
    );
}

#[test]
fn unknown_method_is_rejected_before_invocation() {
    let root = tempfile::tempdir().unwrap();
    let mut pdf = recorder(root.path(), empty_config());

    let err = pdf.run_method("self_destruct", json!([1, 2])).unwrap_err();
    assert!(matches!(err, Error::InvalidMethod(ref name) if name == "self_destruct"));
    assert!(err.to_string().contains("self_destruct"));
    assert!(without_build(take_events()).is_empty());
}

#[test]
fn method_params_become_arguments() {
    let root = tempfile::tempdir().unwrap();
    let mut pdf = recorder(root.path(), empty_config());

    pdf.run_method("set_footer", json!("{PAGENO}")).unwrap();
    pdf.run_method("set_footer", json!(["a", 2])).unwrap();
    pdf.run_method("add_page", Value::Null).unwrap();
    assert_eq!(
        without_build(take_events()),
        vec![
            Event::Called("set_footer".into(), vec![json!("{PAGENO}")]),
            Event::Called("set_footer".into(), vec![json!("a"), json!(2)]),
            Event::Called("add_page".into(), vec![]),
        ]
    );
}

#[test]
fn stylesheet_is_read_once() {
    let root = tempfile::tempdir().unwrap();
    let css_path = root.path().join("print.css");
    fs::write(&css_path, "h1 { font-size: 20px }").unwrap();

    let mut config = empty_config();
    config.settings.css_file = Some(css_path.to_string_lossy().into_owned());
    let mut pdf = recorder(root.path(), config);

    assert_eq!(pdf.stylesheet(), "h1 { font-size: 20px }");
    fs::write(&css_path, "changed").unwrap();
    assert_eq!(pdf.stylesheet(), "h1 { font-size: 20px }");
}

#[test]
fn render_configures_then_calls_methods_then_outputs() {
    let root = tempfile::tempdir().unwrap();
    let mut config = empty_config();
    config.settings.content = "<p>body</p>".into();
    config.settings.filename = "report.pdf".into();
    config.settings.destination = Some(Destination::Download);
    config.options.insert("title".into(), json!("Q3"));
    config.methods = vec![
        MethodCall::new("set_footer", "{PAGENO}"),
        MethodCall::new("add_page", Value::Null),
    ];
    let mut pdf = recorder(root.path(), config);

    let output = pdf.render().unwrap();
    assert_eq!(output.bytes(), Some(&b"%PDF-recorded"[..]));
    assert_eq!(
        without_build(take_events()),
        vec![
            Event::Set("title".into(), json!("Q3")),
            Event::Called("set_footer".into(), vec![json!("{PAGENO}")]),
            Event::Called("add_page".into(), vec![]),
            Event::Wrote("<p>body</p>".into(), HtmlMode::Document),
            Event::Output("report.pdf".into(), Some(Destination::Download)),
        ]
    );
}

#[test]
fn failing_method_stops_render() {
    let root = tempfile::tempdir().unwrap();
    let mut config = empty_config();
    config.methods = vec![MethodCall::new("missing", Value::Null)];
    let mut pdf = recorder(root.path(), config);

    assert!(matches!(pdf.render(), Err(Error::InvalidMethod(_))));
    assert!(!without_build(take_events())
        .iter()
        .any(|e| matches!(e, Event::Output(..))));
}

#[test]
fn html_engine_string_destination_writes_no_file() {
    let root = tempfile::tempdir().unwrap();
    let mut aliases = Aliases::default();
    aliases.set("@runtime", root.path());
    let mut config = PdfConfig::default();
    config.settings.content = "<h1>Hello</h1><p>World</p>".into();
    config.settings.inline_css = "h1 { color: #336699 }".into();
    config.settings.filename = "ignored.pdf".into();
    config.settings.destination = Some(Destination::String);
    let mut pdf: Pdf = Pdf::with_aliases(config, aliases);

    let output = pdf.render().unwrap();
    assert_eq!(output.destination(), Destination::String);
    assert!(output.bytes().unwrap().starts_with(b"%PDF-"));
    assert!(!root.path().join("ignored.pdf").exists());
    let leftovers: Vec<_> = fs::read_dir(root.path().join("pdf")).unwrap().collect();
    assert!(leftovers.is_empty());
}

#[test]
fn html_engine_file_destination() {
    let root = tempfile::tempdir().unwrap();
    let target = root.path().join("out.pdf");
    let mut aliases = Aliases::default();
    aliases.set("@runtime", root.path());
    let mut config = PdfConfig::default();
    config.settings.content = "<p>file</p>".into();
    config.settings.filename = target.to_string_lossy().into_owned();
    let mut pdf: Pdf = Pdf::with_aliases(config, aliases);

    match pdf.render().unwrap() {
        Output::File(path) => assert_eq!(path, target),
        other => panic!("expected file output, got {:?}", other.destination()),
    }
    assert!(fs::read(&target).unwrap().starts_with(b"%PDF-"));
}

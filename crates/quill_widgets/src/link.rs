//! Navigation and input widgets: [`Link`], [`Slider`], [`Textfield`]

use std::ops::Deref;

use indexmap::IndexMap;
use url::form_urlencoded;

use quill_core::{
    choose_presentation, DefaultValidators, EventKind, NodeId, SharedDocument, Viewport,
};

use crate::view::{Child, View};

// ============================================================================
// Link
// ============================================================================

/// Where a [`Link`] points
#[derive(Clone, Debug, PartialEq)]
pub enum LinkTarget {
    /// Absolute or relative URL, used as is
    Url(String),
    /// Query parameters merged into the current location's query string
    Params(Vec<(String, String)>),
}

impl LinkTarget {
    /// Resolve to an `href` against the host's current query string
    pub fn resolve(&self, viewport: &dyn Viewport) -> String {
        match self {
            LinkTarget::Url(url) => url.clone(),
            LinkTarget::Params(params) => {
                let current = viewport.location_search();
                format!("?{}", merge_query(&current, params))
            }
        }
    }
}

/// Set `params` on a query string; existing keys keep their position
pub fn merge_query(search: &str, params: &[(String, String)]) -> String {
    let search = search.strip_prefix('?').unwrap_or(search);
    let mut merged: IndexMap<String, String> = IndexMap::new();
    for (key, value) in form_urlencoded::parse(search.as_bytes()) {
        merged.entry(key.into_owned()).or_insert_with(|| value.into_owned());
    }
    for (key, value) in params {
        merged.insert(key.clone(), value.clone());
    }
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(merged.iter())
        .finish()
}

/// An anchor opening in a new tab, or handled in-page
#[derive(Clone)]
pub struct Link {
    inner: View,
    anchor: NodeId,
    href: String,
}

impl Deref for Link {
    type Target = View;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Link {
    pub fn new(doc: &SharedDocument, name: &str, target: LinkTarget, viewport: &dyn Viewport) -> Self {
        let href = target.resolve(viewport);
        let anchor = View::element(doc, "a");
        anchor
            .set_attribute("target", "_blank")
            .set_attribute("href", &href)
            .set_text(&choose_presentation(&DefaultValidators, name));
        let node = anchor.node();
        Self {
            inner: View::with_children(doc, vec![Child::from(anchor)]),
            anchor: node,
            href,
        }
    }

    /// Handle navigation in-page: the click's default is prevented and
    /// `handler` receives the href
    pub fn on_navigate(self, handler: impl Fn(&str) + 'static) -> Self {
        let href = self.href.clone();
        self.doc()
            .write()
            .add_event_listener(self.anchor, EventKind::Click, move |event| {
                event.prevent_default();
                handler(&href);
            });
        self
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn anchor(&self) -> NodeId {
        self.anchor
    }
}

// ============================================================================
// Slider
// ============================================================================

/// Bounds and start value of a [`Slider`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
    pub value: f64,
}

impl SliderRange {
    /// A thousandth of the range
    pub fn step(&self) -> f64 {
        (self.max - self.min) / 1000.0
    }
}

/// A named range input
#[derive(Clone)]
pub struct Slider {
    inner: View,
    input: NodeId,
    range: SliderRange,
}

impl Deref for Slider {
    type Target = View;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Slider {
    pub fn new(doc: &SharedDocument, name: &str, range: SliderRange) -> Self {
        let (label, input) = {
            let mut d = doc.write();
            let label = d.create_element("label");
            let caption = d.create_element("div");
            d.set_text(caption, name);
            let input = d.create_element("input");
            d.set_attribute(input, "type", "range");
            d.set_attribute(input, "min", &range.min.to_string());
            d.set_attribute(input, "max", &range.max.to_string());
            d.set_attribute(input, "step", &range.step().to_string());
            d.set_attribute(input, "name", name);
            d.set_attribute(input, "value", &range.value.to_string());
            d.append_child(label, caption);
            d.append_child(label, input);
            (label, input)
        };
        Self {
            inner: View::with_children(doc, vec![Child::from(label)]),
            input,
            range,
        }
    }

    /// Call `handler` with the start value now and the new value on every input
    pub fn on_input(self, handler: impl Fn(f64) + 'static) -> Self {
        let weak = self.weak_doc();
        let input = self.input;
        let fallback = self.range.value;
        handler(fallback);
        self.doc()
            .write()
            .add_event_listener(input, EventKind::Input, move |_| {
                let Some(doc) = weak.upgrade() else {
                    return;
                };
                let value = doc
                    .read()
                    .attribute(input, "value")
                    .and_then(|v| v.parse::<f64>().ok());
                match value {
                    Some(value) => handler(value),
                    None => tracing::warn!("slider value is not a number"),
                }
            });
        self
    }

    pub fn value(&self) -> f64 {
        self.doc()
            .read()
            .attribute(self.input, "value")
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.range.value)
    }

    /// Move the slider as the user would, firing `input`
    pub fn set_value(&self, value: f64) {
        let clamped = value.clamp(self.range.min, self.range.max);
        self.doc()
            .write()
            .set_attribute(self.input, "value", &clamped.to_string());
        self.doc().fire(self.input, EventKind::Input);
    }

    pub fn input(&self) -> NodeId {
        self.input
    }
}

// ============================================================================
// Textfield
// ============================================================================

/// A single-line text input inside a form
///
/// Pressing enter submits the form; the submit is handled in-page.
#[derive(Clone)]
pub struct Textfield {
    inner: View,
    input: NodeId,
}

impl Deref for Textfield {
    type Target = View;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Textfield {
    pub fn new(doc: &SharedDocument, text: &str) -> Self {
        let form = View::element(doc, "form");
        form.css(&[("display", "inline")]);
        let input = {
            let mut d = doc.write();
            let input = d.create_element("input");
            d.set_attribute(input, "type", "text");
            d.set_attribute(input, "value", text);
            d.set_attribute(input, "name", text);
            input
        };
        form.append(input);
        Self { inner: form, input }
    }

    /// Called with the value when the form is submitted
    pub fn on_submit(self, handler: impl Fn(&str) + 'static) -> Self {
        let weak = self.weak_doc();
        let input = self.input;
        self.on(EventKind::Submit, move |event| {
            event.prevent_default();
            if let Some(doc) = weak.upgrade() {
                let value = doc.read().attribute(input, "value").unwrap_or("").to_string();
                handler(&value);
            }
        });
        self
    }

    /// Called with the value on every committed change
    pub fn on_change(self, handler: impl Fn(&str) + 'static) -> Self {
        self.listen_input(EventKind::Change, handler);
        self
    }

    /// Called with the value on every keystroke
    pub fn on_input(self, handler: impl Fn(&str) + 'static) -> Self {
        self.listen_input(EventKind::Input, handler);
        self
    }

    fn listen_input(&self, kind: EventKind, handler: impl Fn(&str) + 'static) {
        let weak = self.weak_doc();
        let input = self.input;
        self.doc().write().add_event_listener(input, kind, move |_| {
            if let Some(doc) = weak.upgrade() {
                let value = doc.read().attribute(input, "value").unwrap_or("").to_string();
                handler(&value);
            }
        });
    }

    pub fn value(&self) -> String {
        self.doc()
            .read()
            .attribute(self.input, "value")
            .unwrap_or("")
            .to_string()
    }

    /// Type `value` as the user would, firing `input`
    pub fn type_value(&self, value: &str) {
        self.doc().write().set_attribute(self.input, "value", value);
        self.doc().fire(self.input, EventKind::Input);
    }

    /// Commit the current value, firing `change`
    pub fn commit(&self) {
        self.doc().fire(self.input, EventKind::Change);
    }

    /// Press enter, firing `submit` on the form
    pub fn submit(&self) {
        self.fire(EventKind::Submit);
    }

    pub fn input(&self) -> NodeId {
        self.input
    }
}

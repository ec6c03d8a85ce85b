//! Sanitized field injection
//!
//! A slot is the element of a stamped row named after a data field
//! (`.title`, `.clip`). A slot holding a `source` element is a media slot and
//! receives the value as its `src`; any other slot receives the value as
//! content. Values are validated before anything is written. A rejected value
//! removes the slot together with its `.field-toggle` companion.

use quill_core::{Document, NodeId, Validators};
use serde_json::Value;

/// How a slot receives its value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotKind {
    /// Value becomes the `src` of this `source` element
    Media { source: NodeId },
    /// Value becomes the slot content
    Markup,
}

/// A located field slot inside one stamped row
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    pub node: NodeId,
    pub toggle: Option<NodeId>,
    pub kind: SlotKind,
}

impl Slot {
    /// Find the slot for `field` under `root`
    pub fn locate(doc: &Document, root: NodeId, field: &str) -> Option<Slot> {
        let node = doc.query_selector(root, &format!(".{field}"))?;
        let toggle = doc.query_selector(root, &format!(".{field}-toggle"));
        let kind = match doc.query_selector(node, "source") {
            Some(source) => SlotKind::Media { source },
            None => SlotKind::Markup,
        };
        Some(Slot { node, toggle, kind })
    }
}

/// Outcome of [`inject`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Injection {
    Written,
    Removed,
}

/// Text form of a row value; `null` is empty
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Write `value` into `slot`, or remove the slot if the value is rejected
pub fn inject(
    doc: &mut Document,
    slot: &Slot,
    value: &Value,
    validators: &dyn Validators,
) -> Injection {
    let text = stringify(value);
    let accepted = match slot.kind {
        SlotKind::Media { .. } => validators.validate_url(&text),
        SlotKind::Markup => !text.is_empty() && validators.validate_security_xss(&text),
    };

    if !accepted {
        doc.destroy(slot.node);
        if let Some(toggle) = slot.toggle {
            doc.destroy(toggle);
        }
        return Injection::Removed;
    }

    match slot.kind {
        SlotKind::Media { source } => doc.set_attribute(source, "src", &text),
        SlotKind::Markup => doc.set_text(slot.node, &text),
    }
    Injection::Written
}

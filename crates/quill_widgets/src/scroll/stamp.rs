//! Template stamping from structure-of-arrays row data
//!
//! [`RowData`] maps each field name to one value per row. [`stamp`] clones
//! the template once per row and writes the row's values into the clone:
//! fields named like a style property become inline styles, every field is
//! also offered to the matching slot through [`inject`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use quill_core::{css_property, Bounds, Document, NodeId, QuillError, Result, Validators};

use super::inject::{inject, stringify, Injection, Slot};

/// Per-field value sequences, one value per row
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowData(IndexMap<String, Vec<Value>>);

impl RowData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`RowData::insert`]
    pub fn with(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.insert(field, values);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, values: Vec<Value>) {
        self.0.insert(field.into(), values);
    }

    pub fn get(&self, field: &str) -> Option<&[Value]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Common row count of every field
    ///
    /// Fails when there are no fields, a field has no values, or two fields
    /// disagree on their length.
    pub fn row_count(&self) -> Result<usize> {
        let mut fields = self.0.iter();
        let Some((first, values)) = fields.next() else {
            return Err(QuillError::EmptyRowData);
        };
        let expected = values.len();
        if expected == 0 {
            return Err(QuillError::EmptyField {
                field: first.clone(),
            });
        }
        for (field, values) in fields {
            if values.is_empty() {
                return Err(QuillError::EmptyField {
                    field: field.clone(),
                });
            }
            if values.len() != expected {
                return Err(QuillError::LengthMismatch {
                    field: field.clone(),
                    expected,
                    found: values.len(),
                });
            }
        }
        Ok(expected)
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<Value>)> for RowData {
    fn from_iter<T: IntoIterator<Item = (K, Vec<Value>)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// One stamped list item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RenderedNode {
    /// Position in the batch it was stamped in
    pub index: usize,
    pub node: NodeId,
}

impl RenderedNode {
    /// Live geometry
    pub fn bounds(&self, doc: &Document) -> Bounds {
        doc.bounds(self.node)
    }

    /// Inline opacity; unset or unparsable counts as fully opaque
    pub fn opacity(&self, doc: &Document) -> f64 {
        doc.style(self.node, "opacity")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .unwrap_or(1.0)
    }
}

/// Clone `template` once per row of `rows`
///
/// The row data is validated before the first clone is made, so on error
/// the document is left untouched. The returned nodes are detached.
pub fn stamp(
    doc: &mut Document,
    template: NodeId,
    rows: &RowData,
    validators: &dyn Validators,
) -> Result<Vec<RenderedNode>> {
    let count = rows.row_count()?;
    if !doc.contains(template) {
        return Err(QuillError::NodeNotFound(template));
    }

    let mut batch = Vec::with_capacity(count);
    for index in 0..count {
        let node = doc
            .clone_node(template)
            .ok_or(QuillError::NodeNotFound(template))?;
        doc.set_attribute(node, "id", &index.to_string());
        doc.set_style(node, "display", None);

        for (field, values) in &rows.0 {
            let value = &values[index];
            if let Some(property) = css_property(field) {
                doc.set_style(node, &property, Some(stringify(value).as_str()));
            }
            if let Some(slot) = Slot::locate(doc, node, field) {
                if inject(doc, &slot, value, validators) == Injection::Removed {
                    tracing::trace!("row {} dropped slot `{}`", index, field);
                }
            }
        }
        batch.push(RenderedNode { index, node });
    }
    Ok(batch)
}

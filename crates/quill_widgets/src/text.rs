//! Plain text block

use std::ops::Deref;

use quill_core::SharedDocument;

use crate::view::View;

/// A vertically centred run of text
#[derive(Clone)]
pub struct Text {
    inner: View,
}

impl Deref for Text {
    type Target = View;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Text {
    pub fn new(doc: &SharedDocument, text: &str) -> Self {
        let inner = View::new(doc);
        inner
            .set_text(text)
            .css(&[("flex-direction", "column"), ("justify-content", "center")]);
        Self { inner }
    }
}

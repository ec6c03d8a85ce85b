//! Inline style helpers
//!
//! Property names are stored kebab-case. [`css_property`] answers whether a
//! name (camelCase or kebab-case) is a known style property, which is how the
//! list renderer tells style fields apart from slot fields.

/// Style properties recognised on elements, kebab-case, sorted
const STYLE_PROPERTIES: &[&str] = &[
    "align-content",
    "align-items",
    "align-self",
    "animation",
    "aspect-ratio",
    "backdrop-filter",
    "background",
    "background-color",
    "background-image",
    "background-position",
    "background-size",
    "border",
    "border-color",
    "border-radius",
    "border-width",
    "bottom",
    "box-shadow",
    "color",
    "cursor",
    "display",
    "filter",
    "flex",
    "flex-basis",
    "flex-direction",
    "flex-grow",
    "flex-shrink",
    "flex-wrap",
    "font",
    "font-family",
    "font-size",
    "font-style",
    "font-weight",
    "gap",
    "height",
    "justify-content",
    "left",
    "letter-spacing",
    "line-height",
    "margin",
    "margin-bottom",
    "margin-left",
    "margin-right",
    "margin-top",
    "max-height",
    "max-width",
    "min-height",
    "min-width",
    "object-fit",
    "opacity",
    "order",
    "outline",
    "overflow",
    "overflow-x",
    "overflow-y",
    "padding",
    "padding-bottom",
    "padding-left",
    "padding-right",
    "padding-top",
    "pointer-events",
    "position",
    "right",
    "text-align",
    "text-decoration",
    "text-transform",
    "top",
    "transform",
    "transition",
    "visibility",
    "white-space",
    "width",
    "z-index",
];

/// Convert camelCase to kebab-case; kebab-case passes through unchanged
pub fn normalize_property(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Canonical property name if `name` is a known style property
pub fn css_property(name: &str) -> Option<String> {
    let normalized = normalize_property(name);
    STYLE_PROPERTIES
        .binary_search(&normalized.as_str())
        .ok()
        .map(|_| normalized)
}

/// Named layout presets a `View` can be created with
///
/// `View::with_presets("fixed bottom flex")` applies each preset in order.
pub fn preset(name: &str) -> Option<&'static [(&'static str, &'static str)]> {
    let styles: &'static [(&'static str, &'static str)] = match name {
        "flex" => &[
            ("display", "flex"),
            ("flex-direction", "column"),
            ("justify-content", "space-around"),
            ("align-content", "space-around"),
            ("align-items", "center"),
        ],
        "child" => &[("flex", "auto")],
        "fixed" => &[("position", "fixed")],
        "bottom" => &[("bottom", "0"), ("width", "100%")],
        "left" => &[("left", "0"), ("height", "100%")],
        "right" => &[("right", "0"), ("height", "100%")],
        "top" => &[("top", "0"), ("width", "100%")],
        "fullscreen" => &[
            ("position", "fixed"),
            ("top", "0"),
            ("left", "0"),
            ("right", "0"),
            ("bottom", "0"),
            ("width", "100%"),
            ("height", "100%"),
        ],
        _ => return None,
    };
    Some(styles)
}

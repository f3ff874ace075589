use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::css::{parse_inline_style, Declarations};

/// Properties a plain box renders from structured fields.
pub const BOX_HANDLED_STYLES: &[&str] = &[
    "margin",
    "margin-top",
    "margin-bottom",
    "margin-right",
    "margin-left",
    "padding",
    "padding-top",
    "padding-bottom",
    "padding-right",
    "padding-left",
    "border-color",
    "border-width",
    "border-radius",
    "height",
    "min-height",
    "max-height",
    "width",
    "min-width",
    "max-width",
];

/// Properties a container renders from structured fields.
///
/// The box-handled properties come first, in the same order. This order is
/// the order of entries in a split's `customStyle`.
pub const CONTAINER_HANDLED_STYLES: &[&str] = &[
    "margin",
    "margin-top",
    "margin-bottom",
    "margin-right",
    "margin-left",
    "padding",
    "padding-top",
    "padding-bottom",
    "padding-right",
    "padding-left",
    "border-color",
    "border-width",
    "border-radius",
    "height",
    "min-height",
    "max-height",
    "width",
    "min-width",
    "max-width",
    "opacity",
    "position",
    "top",
    "right",
    "bottom",
    "left",
    "font-family",
    "font-size",
    "font-weight",
    "line-height",
    "flex-grow",
    "flex-shrink",
    "flex-direction",
    "flex-wrap",
    "justify-content",
    "align-items",
    "align-content",
    "display",
    "overflow",
];

pub fn is_box_handled(property: &str) -> bool {
    BOX_HANDLED_STYLES.contains(&property)
}

pub fn is_container_handled(property: &str) -> bool {
    CONTAINER_HANDLED_STYLES.contains(&property)
}

/// Which handled-property set a split uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleSet {
    Box,
    #[default]
    Container,
}

impl StyleSet {
    pub fn properties(self) -> &'static [&'static str] {
        match self {
            StyleSet::Box => BOX_HANDLED_STYLES,
            StyleSet::Container => CONTAINER_HANDLED_STYLES,
        }
    }
}

/// Style input as it appears on a node: CSS text or a parsed mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleSource<'a> {
    Css(&'a str),
    Parsed(Declarations),
    None,
}

impl<'a> StyleSource<'a> {
    /// Interpret a node's `style` field.
    pub fn from_value(value: Option<&'a Value>) -> Self {
        match value {
            Some(Value::String(css)) => StyleSource::Css(css),
            Some(Value::Object(map)) => StyleSource::Parsed(Declarations::from_json_map(map)),
            _ => StyleSource::None,
        }
    }

    fn into_declarations(self) -> Declarations {
        match self {
            StyleSource::Css(css) => parse_inline_style(css),
            StyleSource::Parsed(decls) => decls,
            StyleSource::None => Declarations::new(),
        }
    }
}

/// Result of partitioning a declaration block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSplit {
    /// Declarations the layout engine does not model, kept as a mapping.
    pub style: Declarations,
    /// Handled declarations as `"prop: value"` pairs joined by `"; "`.
    pub custom_style: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overflow: Option<String>,
}

/// Partition `source` against an explicit handled-property set.
pub fn split_style(source: StyleSource<'_>, set: StyleSet) -> StyleSplit {
    let mut style = source.into_declarations();

    let custom: Vec<String> = set
        .properties()
        .iter()
        .filter_map(|&prop| style.remove(prop).map(|value| format!("{}: {}", prop, value)))
        .collect();

    let display = style.remove("display");
    let overflow = style.remove("overflow");

    StyleSplit {
        style,
        custom_style: custom.join("; "),
        display,
        overflow,
    }
}

/// Partition a container's style.
pub fn split_container_style(source: StyleSource<'_>) -> StyleSplit {
    split_style(source, StyleSet::Container)
}

/// Partition a plain box's style.
pub fn split_box_style(source: StyleSource<'_>) -> StyleSplit {
    split_style(source, StyleSet::Box)
}

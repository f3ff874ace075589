//! Shape classification for response-tree nodes.
//!
//! A model response is loosely typed JSON. Before it is transformed each
//! value is classified into exactly one [`Segment`] variant; the variants are
//! checked in a fixed priority order because a node can carry several of the
//! recognised keys at once (a container with `contents`, an element wrapper
//! with `above`, ...).

use serde_json::{Map, Value};

/// One node of a response tree, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment<'a> {
    /// A falsy value (`null`, `false`, `0`, `""`), passed through untouched.
    Absent(&'a Value),
    /// Final leaf content.
    Text(&'a str),
    /// `{ element: X }`, an indirection collapsed to `X`.
    Element(&'a Value),
    Sequence(&'a [Value]),
    /// A node whose `contents` is prose to be rendered.
    RichText {
        node: &'a Map<String, Value>,
        contents: &'a str,
    },
    Image(ImagePlaceholder<'a>),
    Container(&'a Map<String, Value>),
    /// Any other node with nested `contents`.
    Contents(&'a Map<String, Value>),
    Above(&'a Map<String, Value>),
    Besides(&'a Map<String, Value>),
    /// Nothing recognisable; carried through and reported.
    Unrecognized(&'a Value),
}

/// The fields of an `image` node the layout needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlaceholder<'a> {
    pub height: Option<&'a Value>,
    pub width: Option<&'a Value>,
    pub description: Option<&'a Value>,
}

/// JavaScript truthiness of a JSON value.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn truthy_field<'a>(node: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    node.get(key).filter(|v| is_truthy(v))
}

impl<'a> Segment<'a> {
    pub fn classify(value: &'a Value) -> Segment<'a> {
        if !is_truthy(value) {
            return Segment::Absent(value);
        }
        let node = match value {
            Value::String(s) => return Segment::Text(s),
            Value::Array(items) => return Segment::Sequence(items),
            Value::Object(node) => node,
            _ => return Segment::Unrecognized(value),
        };

        if let Some(inner) = truthy_field(node, "element") {
            return Segment::Element(inner);
        }
        if let Some(Value::String(contents)) = node.get("contents") {
            return Segment::RichText { node, contents };
        }
        match node.get("type").and_then(Value::as_str) {
            Some("image") => {
                return Segment::Image(ImagePlaceholder {
                    height: node.get("height"),
                    width: node.get("width"),
                    description: node.get("description"),
                })
            }
            Some("container") => return Segment::Container(node),
            _ => {}
        }
        if truthy_field(node, "contents").is_some() {
            Segment::Contents(node)
        } else if truthy_field(node, "above").is_some() {
            Segment::Above(node)
        } else if truthy_field(node, "besides").is_some() {
            Segment::Besides(node)
        } else {
            Segment::Unrecognized(value)
        }
    }

    /// Short name of the variant, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Segment::Absent(_) => "absent",
            Segment::Text(_) => "text",
            Segment::Element(_) => "element",
            Segment::Sequence(_) => "sequence",
            Segment::RichText { .. } => "rich-text",
            Segment::Image(_) => "image",
            Segment::Container(_) => "container",
            Segment::Contents(_) => "contents",
            Segment::Above(_) => "above",
            Segment::Besides(_) => "besides",
            Segment::Unrecognized(_) => "unrecognized",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kind(value: Value) -> &'static str {
        Segment::classify(&value).kind()
    }

    #[test]
    fn falsy_values_are_absent() {
        for v in [json!(null), json!(false), json!(0), json!(""), json!(0.0)] {
            assert_eq!(kind(v), "absent");
        }
    }

    #[test]
    fn element_wins_over_everything() {
        assert_eq!(kind(json!({"element": {"type": "image"}, "type": "container"})), "element");
    }

    #[test]
    fn falsy_element_is_ignored() {
        assert_eq!(kind(json!({"element": null, "above": [1]})), "above");
    }

    #[test]
    fn string_contents_beat_type() {
        assert_eq!(kind(json!({"type": "container", "contents": "hi"})), "rich-text");
        assert_eq!(kind(json!({"type": "image", "contents": ""})), "rich-text");
    }

    #[test]
    fn image_and_container() {
        assert_eq!(kind(json!({"type": "image", "width": 3})), "image");
        assert_eq!(kind(json!({"type": "container"})), "container");
    }

    #[test]
    fn structural_keys_in_priority_order() {
        assert_eq!(kind(json!({"contents": [], "above": []})), "contents");
        assert_eq!(kind(json!({"above": {}, "besides": []})), "above");
        assert_eq!(kind(json!({"besides": [{}]})), "besides");
    }

    #[test]
    fn leftovers_are_unrecognized() {
        assert_eq!(kind(json!({"type": "blank"})), "unrecognized");
        assert_eq!(kind(json!(42)), "unrecognized");
        assert_eq!(kind(json!(true)), "unrecognized");
        assert_eq!(kind(json!({"contents": 0})), "unrecognized");
    }
}

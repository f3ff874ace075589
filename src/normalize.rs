//! Response-tree normalisation.
//!
//! Rewrites a layout-like tree (model output, or the output of
//! [`crate::html::parse_html`]) into the platform's canonical node shapes:
//! element wrappers are collapsed, prose is rendered to markup, image
//! placeholders become bordered containers and container styles are
//! partitioned into structured and custom parts.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::markdown::{MarkdownRenderer, RichTextRenderer};
use crate::segment::{ImagePlaceholder, Segment};
use crate::style::{split_style, StyleSet, StyleSource};

const IMAGE_BORDER_COLOR: &str = "#808080";
const IMAGE_BORDER_WIDTH: &str = "3px";

/// Nodes below this many levels are copied through without being walked.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Why a node was left as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// No shape rule matched.
    UnknownShape,
    /// The node sits deeper than [`MAX_NESTING_DEPTH`].
    TooDeep,
}

/// A node kept in the output unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnrecognizedNode {
    /// JSON pointer to the node in the input tree.
    pub path: String,
    pub node: Value,
    pub reason: SkipReason,
}

/// Output of [`Normalizer::normalize`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Normalized {
    pub tree: Value,
    pub warnings: Vec<UnrecognizedNode>,
}

pub struct Normalizer<R = MarkdownRenderer> {
    renderer: R,
    style_set: StyleSet,
}

impl Default for Normalizer<MarkdownRenderer> {
    fn default() -> Self {
        Self::new(MarkdownRenderer::default())
    }
}

impl<R: RichTextRenderer> Normalizer<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            style_set: StyleSet::Container,
        }
    }

    /// Use a different handled-property set for container styles.
    pub fn with_style_set(mut self, style_set: StyleSet) -> Self {
        self.style_set = style_set;
        self
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Normalise `tree`, collecting a warning for every unrecognised node.
    pub fn normalize(&self, tree: &Value) -> Normalized {
        let mut warnings = Vec::new();
        let tree = self.go(tree, "", 0, &mut warnings);
        Normalized { tree, warnings }
    }

    /// Normalise `tree`, discarding warnings (they are still logged).
    pub fn walk(&self, tree: &Value) -> Value {
        self.normalize(tree).tree
    }

    fn go(
        &self,
        value: &Value,
        path: &str,
        depth: usize,
        warnings: &mut Vec<UnrecognizedNode>,
    ) -> Value {
        if depth > MAX_NESTING_DEPTH {
            log::warn!(
                "layout nested deeper than {} levels at {}, passing through unchanged",
                MAX_NESTING_DEPTH,
                display_path(path)
            );
            warnings.push(UnrecognizedNode {
                path: path.to_string(),
                node: value.clone(),
                reason: SkipReason::TooDeep,
            });
            return value.clone();
        }

        let segment = Segment::classify(value);
        log::trace!("{} -> {}", display_path(path), segment.kind());

        match segment {
            Segment::Absent(v) => v.clone(),
            Segment::Text(s) => Value::String(s.to_string()),
            Segment::Element(inner) => {
                self.go(inner, &child_path(path, "element"), depth + 1, warnings)
            }
            Segment::Sequence(items) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        self.go(item, &child_path(path, &i.to_string()), depth + 1, warnings)
                    })
                    .collect(),
            ),
            Segment::RichText { node, contents } => {
                let mut out = node.clone();
                out.insert(
                    "contents".to_string(),
                    Value::String(self.renderer.render(contents)),
                );
                Value::Object(out)
            }
            Segment::Image(image) => image_container(&image),
            Segment::Container(node) => self.container(node, path, depth, warnings),
            Segment::Contents(node) => self.descend(node, "contents", path, depth, warnings),
            Segment::Above(node) => self.descend(node, "above", path, depth, warnings),
            Segment::Besides(node) => self.descend(node, "besides", path, depth, warnings),
            Segment::Unrecognized(v) => {
                log::warn!(
                    "unrecognized layout node at {}, passing through unchanged",
                    display_path(path)
                );
                warnings.push(UnrecognizedNode {
                    path: path.to_string(),
                    node: v.clone(),
                    reason: SkipReason::UnknownShape,
                });
                v.clone()
            }
        }
    }

    fn container(
        &self,
        node: &Map<String, Value>,
        path: &str,
        depth: usize,
        warnings: &mut Vec<UnrecognizedNode>,
    ) -> Value {
        let split = split_style(StyleSource::from_value(node.get("style")), self.style_set);

        let mut out = node.clone();
        out.insert(
            "customStyle".to_string(),
            Value::String(split.custom_style),
        );
        set_or_remove(&mut out, "display", split.display);
        set_or_remove(&mut out, "overflow", split.overflow);
        out.insert("style".to_string(), split.style.to_json());
        if let Some(contents) = node.get("contents") {
            let contents = self.go(contents, &child_path(path, "contents"), depth + 1, warnings);
            out.insert("contents".to_string(), contents);
        }
        Value::Object(out)
    }

    fn descend(
        &self,
        node: &Map<String, Value>,
        key: &str,
        path: &str,
        depth: usize,
        warnings: &mut Vec<UnrecognizedNode>,
    ) -> Value {
        let mut out = node.clone();
        if let Some(child) = node.get(key) {
            let child = self.go(child, &child_path(path, key), depth + 1, warnings);
            out.insert(key.to_string(), child);
        }
        Value::Object(out)
    }
}

/// Normalise with the default Markdown renderer.
pub fn walk_response(tree: &Value) -> Value {
    Normalizer::<MarkdownRenderer>::default().walk(tree)
}

fn image_container(image: &ImagePlaceholder<'_>) -> Value {
    let mut style = Map::new();
    if let Some(h) = image.height.and_then(pixels) {
        style.insert("height".to_string(), Value::String(h));
    }
    if let Some(w) = image.width.and_then(pixels) {
        style.insert("width".to_string(), Value::String(w));
    }
    style.insert("border-style".to_string(), Value::from("solid"));
    style.insert("border-color".to_string(), Value::from(IMAGE_BORDER_COLOR));
    style.insert("border-width".to_string(), Value::from(IMAGE_BORDER_WIDTH));
    style.insert("vAlign".to_string(), Value::from("middle"));
    style.insert("hAlign".to_string(), Value::from("center"));

    let mut out = Map::new();
    out.insert("type".to_string(), Value::from("container"));
    out.insert("style".to_string(), Value::Object(style));
    if let Some(description) = image.description {
        out.insert("contents".to_string(), description.clone());
    }
    Value::Object(out)
}

fn pixels(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(format!("{}px", n)),
        Value::String(s) if !s.is_empty() => Some(format!("{}px", s)),
        _ => None,
    }
}

fn set_or_remove(node: &mut Map<String, Value>, key: &str, value: Option<String>) {
    match value {
        Some(v) => {
            node.insert(key.to_string(), Value::String(v));
        }
        None => {
            node.shift_remove(key);
        }
    }
}

fn child_path(parent: &str, key: &str) -> String {
    format!("{}/{}", parent, key.replace('~', "~0").replace('/', "~1"))
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

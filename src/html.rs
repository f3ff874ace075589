//! HTML → response tree.
//!
//! Model output in HTML form (often wrapped in a fenced ```` ```html ```` block
//! with prose around it) is parsed with html5ever and the `<body>` is walked
//! into the generic tree shape the normaliser consumes.

use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use serde_json::{json, Value};

const FENCE_OPEN: &str = "```html";
const FENCE_CLOSE: &str = "```";

/// Elements nested deeper than this below `<body>` are dropped.
///
/// Each HTML level becomes two levels of the response tree, so this keeps
/// parsed trees inside [`crate::normalize::MAX_NESTING_DEPTH`].
pub const MAX_HTML_DEPTH: usize = 100;

/// A node produced by the HTML walk.
#[derive(Debug, Clone, PartialEq)]
pub enum HtmlSegment {
    /// The body: children stacked vertically.
    Above(Vec<HtmlSegment>),
    /// Text content. Paragraphs and headings carry serialised inner HTML.
    Blank {
        contents: String,
        text_style: Option<Vec<String>>,
    },
    /// Any other element, children walked recursively.
    Container {
        html_element: String,
        custom_class: String,
        contents: Vec<HtmlSegment>,
    },
}

impl HtmlSegment {
    pub fn into_value(self) -> Value {
        match self {
            HtmlSegment::Above(children) => json!({
                "above": children.into_iter().map(HtmlSegment::into_value).collect::<Vec<_>>()
            }),
            HtmlSegment::Blank {
                contents,
                text_style: None,
            } => json!({ "type": "blank", "contents": contents }),
            HtmlSegment::Blank {
                contents,
                text_style: Some(text_style),
            } => json!({ "type": "blank", "contents": contents, "textStyle": text_style }),
            HtmlSegment::Container {
                html_element,
                custom_class,
                contents,
            } => json!({
                "type": "container",
                "htmlElement": html_element,
                "customClass": custom_class,
                "contents": contents.into_iter().map(HtmlSegment::into_value).collect::<Vec<_>>()
            }),
        }
    }
}

impl From<HtmlSegment> for Value {
    fn from(segment: HtmlSegment) -> Self {
        segment.into_value()
    }
}

/// Return the contents of the first ```` ```html ```` block, or all of `text`.
pub fn extract_html_block(text: &str) -> &str {
    match text.find(FENCE_OPEN) {
        Some(start) => {
            let rest = &text[start + FENCE_OPEN.len()..];
            match rest.find(FENCE_CLOSE) {
                Some(end) => &rest[..end],
                None => rest,
            }
        }
        None => text,
    }
}

/// Parse model output as HTML and walk its body.
///
/// Markup errors are recovered by html5ever, so this cannot fail; a document
/// with nothing in its body gives an empty `Above`.
pub fn parse_html(text: &str) -> HtmlSegment {
    let html = extract_html_block(text);
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            exact_errors: false,
            scripting_enabled: false,
            ..TreeBuilderOpts::default()
        },
        ..ParseOpts::default()
    };
    let dom = parse_document(RcDom::default(), opts).one(html);

    match find_body(&dom.document).and_then(|body| walk(&body, 0)) {
        Some(tree) => tree,
        None => HtmlSegment::Above(Vec::new()),
    }
}

fn is_element(handle: &Handle, tag: &str) -> bool {
    matches!(&handle.data, NodeData::Element { name, .. } if &*name.local == tag)
}

/// `document > html > body`; the tree builder always puts it there.
fn find_body(document: &Handle) -> Option<Handle> {
    let html = document
        .children
        .borrow()
        .iter()
        .find(|child| is_element(child, "html"))
        .cloned()?;
    let body = html
        .children
        .borrow()
        .iter()
        .find(|child| is_element(child, "body"))
        .cloned();
    body
}

fn walk(handle: &Handle, depth: usize) -> Option<HtmlSegment> {
    if depth > MAX_HTML_DEPTH {
        log::warn!(
            "dropping HTML nested deeper than {} levels below <body>",
            MAX_HTML_DEPTH
        );
        return None;
    }

    match &handle.data {
        NodeData::Element { name, attrs, .. } => {
            let tag: &str = &name.local;
            match tag {
                "body" => Some(HtmlSegment::Above(walk_children(handle, depth))),
                "p" => Some(HtmlSegment::Blank {
                    contents: inner_html(handle),
                    text_style: None,
                }),
                "script" => None,
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Some(HtmlSegment::Blank {
                    contents: inner_html(handle),
                    text_style: Some(vec![tag.to_string()]),
                }),
                _ => {
                    let custom_class = attrs
                        .borrow()
                        .iter()
                        .find(|attr| &*attr.name.local == "class")
                        .map(|attr| attr.value.split_whitespace().collect::<Vec<_>>().join(" "))
                        .unwrap_or_default();
                    Some(HtmlSegment::Container {
                        html_element: tag.to_string(),
                        custom_class,
                        contents: walk_children(handle, depth),
                    })
                }
            }
        }
        NodeData::Text { contents } => {
            if contents.borrow().trim().is_empty() {
                None
            } else {
                Some(HtmlSegment::Blank {
                    contents: serialize_nodes(std::slice::from_ref(handle)),
                    text_style: None,
                })
            }
        }
        _ => None,
    }
}

fn walk_children(handle: &Handle, depth: usize) -> Vec<HtmlSegment> {
    handle
        .children
        .borrow()
        .iter()
        .filter_map(|child| walk(child, depth + 1))
        .collect()
}

/// Serialise a node's children back to HTML.
fn inner_html(handle: &Handle) -> String {
    serialize_nodes(&handle.children.borrow())
}

/// Serialise nodes back to HTML, text escaped as in the source markup.
fn serialize_nodes(nodes: &[Handle]) -> String {
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::IncludeNode,
        ..Default::default()
    };
    let mut buf = Vec::new();
    for child in nodes {
        let serializable = SerializableHandle::from(child.clone());
        if let Err(e) = serialize(&mut buf, &serializable, opts.clone()) {
            log::warn!("failed to serialize HTML child: {}", e);
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn headings_and_paragraphs() {
        let tree = parse_html("<body><h1>Hi</h1><p>text</p></body>").into_value();
        assert_eq!(
            tree,
            json!({"above": [
                {"type": "blank", "contents": "Hi", "textStyle": ["h1"]},
                {"type": "blank", "contents": "text"}
            ]})
        );
    }

    #[test]
    fn paragraph_keeps_inline_markup() {
        let tree = parse_html("<p>a <b>bold</b> &amp; <i>it</i></p>");
        assert_eq!(
            tree,
            HtmlSegment::Above(vec![HtmlSegment::Blank {
                contents: "a <b>bold</b> &amp; <i>it</i>".to_string(),
                text_style: None,
            }])
        );
    }

    #[test]
    fn scripts_and_whitespace_dropped() {
        let tree = parse_html("<body>\n  <script>alert(1)</script>\n  <div>\n</div>\n</body>");
        assert_eq!(
            tree,
            HtmlSegment::Above(vec![HtmlSegment::Container {
                html_element: "div".to_string(),
                custom_class: String::new(),
                contents: vec![],
            }])
        );
    }

    #[test]
    fn containers_carry_tag_and_classes() {
        let tree = parse_html(r#"<div class="card  shadow"><span>x</span><!-- c --></div>"#);
        assert_eq!(
            tree.into_value(),
            json!({"above": [{
                "type": "container",
                "htmlElement": "div",
                "customClass": "card shadow",
                "contents": [{
                    "type": "container",
                    "htmlElement": "span",
                    "customClass": "",
                    "contents": [{"type": "blank", "contents": "x"}]
                }]
            }]})
        );
    }

    #[test]
    fn fenced_block_extraction() {
        let text = "Here you go:\n```html\n<p>x</p>\n```\nEnjoy!";
        assert_eq!(extract_html_block(text), "\n<p>x</p>\n");
        assert_eq!(
            parse_html(text).into_value(),
            json!({"above": [{"type": "blank", "contents": "x"}]})
        );
    }

    #[test]
    fn unterminated_fence_takes_rest() {
        assert_eq!(extract_html_block("```html<p>y</p>"), "<p>y</p>");
    }

    #[test]
    fn no_fence_uses_whole_text() {
        assert_eq!(extract_html_block("<p>z</p>"), "<p>z</p>");
    }

    #[test]
    fn text_nodes_keep_entities_like_paragraphs() {
        let tree = parse_html("<div>a &amp; b &lt;i&gt;</div><p>a &amp; b &lt;i&gt;</p>");
        assert_eq!(
            tree.into_value(),
            json!({"above": [
                {
                    "type": "container",
                    "htmlElement": "div",
                    "customClass": "",
                    "contents": [{"type": "blank", "contents": "a &amp; b &lt;i&gt;"}]
                },
                {"type": "blank", "contents": "a &amp; b &lt;i&gt;"}
            ]})
        );
    }

    fn nested_divs(levels: usize) -> String {
        format!("{}x{}", "<div>".repeat(levels), "</div>".repeat(levels))
    }

    /// Number of containers along the first-child chain, and the leaf text if any.
    fn first_chain(segment: &HtmlSegment) -> (usize, Option<String>) {
        let mut depth = 0;
        let mut current = segment;
        loop {
            let children = match current {
                HtmlSegment::Above(children) => children,
                HtmlSegment::Container { contents, .. } => {
                    depth += 1;
                    contents
                }
                HtmlSegment::Blank { contents, .. } => return (depth, Some(contents.clone())),
            };
            match children.first() {
                Some(child) => current = child,
                None => return (depth, None),
            }
        }
    }

    #[test]
    fn nesting_past_limit_is_dropped() {
        let tree = parse_html(&nested_divs(MAX_HTML_DEPTH + 1));
        assert_eq!(first_chain(&tree), (MAX_HTML_DEPTH, None));
    }

    #[test]
    fn nesting_at_limit_is_kept() {
        let tree = parse_html(&nested_divs(MAX_HTML_DEPTH - 1));
        assert_eq!(first_chain(&tree), (MAX_HTML_DEPTH - 1, Some("x".to_string())));
    }

    #[test]
    fn very_deep_html_does_not_overflow() {
        let tree = parse_html(&nested_divs(2_000));
        assert_eq!(first_chain(&tree).0, MAX_HTML_DEPTH);
    }

    #[test]
    fn empty_input_gives_empty_body() {
        assert_eq!(parse_html(""), HtmlSegment::Above(vec![]));
    }
}

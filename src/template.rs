//! Prompt templates.
//!
//! Templates use `{{ ... }}` for interpolation and `{{# ... }}` for blocks:
//!
//! ```text
//! You are building an app for: {{ userPrompt }}
//! {{#for table in tables}}
//! Table {{ table.name }} has {{ table.fields.length }} fields.
//! {{#if table.description}}  {{ table.description }}{{#else}}  (no description){{#end}}
//! {{#end}}
//! ```
//!
//! Paths are dotted (`a.b.0.c`); `length` on an array or string gives its
//! size. Missing values and `null` render as nothing, strings verbatim,
//! arrays and objects as JSON.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::error::{CopilotError, CopilotResult};
use crate::segment::is_truthy;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Interpolate(String),
    For {
        var: String,
        path: String,
        body: Vec<Node>,
    },
    If {
        path: String,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

/// A compiled template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    name: String,
    nodes: Vec<Node>,
}

/// An open block while compiling.
enum Frame {
    For { var: String, path: String },
    If { path: String, then: Option<Vec<Node>> },
}

fn tag_regex() -> &'static Regex {
    static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
    TAG_REGEX.get_or_init(|| Regex::new(r"\{\{(#?)\s*(.+?)\s*\}\}").unwrap())
}

fn for_regex() -> &'static Regex {
    static FOR_REGEX: OnceLock<Regex> = OnceLock::new();
    FOR_REGEX.get_or_init(|| Regex::new(r"^for\s+([A-Za-z_$][\w$]*)\s+in\s+(\S+)$").unwrap())
}

impl Template {
    pub fn compile(name: &str, source: &str) -> CopilotResult<Template> {
        let err = |message: String| CopilotError::Template {
            template: name.to_string(),
            message,
        };

        let mut stack: Vec<(Frame, Vec<Node>)> = Vec::new();
        let mut current: Vec<Node> = Vec::new();
        let mut last = 0;

        for caps in tag_regex().captures_iter(source) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if whole.start() > last {
                current.push(Node::Text(source[last..whole.start()].to_string()));
            }
            last = whole.end();

            let body = caps[2].trim();
            if caps[1].is_empty() {
                current.push(Node::Interpolate(body.to_string()));
                continue;
            }

            if let Some(for_caps) = for_regex().captures(body) {
                let frame = Frame::For {
                    var: for_caps[1].to_string(),
                    path: for_caps[2].to_string(),
                };
                stack.push((frame, std::mem::take(&mut current)));
            } else if let Some(path) = body.strip_prefix("if ") {
                let frame = Frame::If {
                    path: path.trim().to_string(),
                    then: None,
                };
                stack.push((frame, std::mem::take(&mut current)));
            } else if body == "else" {
                match stack.last_mut() {
                    Some((Frame::If { then, .. }, _)) if then.is_none() => {
                        *then = Some(std::mem::take(&mut current));
                    }
                    _ => return Err(err("'else' outside of an 'if' block".to_string())),
                }
            } else if body == "end" {
                let (frame, parent) = stack
                    .pop()
                    .ok_or_else(|| err("'end' without an open block".to_string()))?;
                let inner = std::mem::replace(&mut current, parent);
                let node = match frame {
                    Frame::For { var, path } => Node::For {
                        var,
                        path,
                        body: inner,
                    },
                    Frame::If { path, then: None } => Node::If {
                        path,
                        then: inner,
                        otherwise: Vec::new(),
                    },
                    Frame::If {
                        path,
                        then: Some(then),
                    } => Node::If {
                        path,
                        then,
                        otherwise: inner,
                    },
                };
                current.push(node);
            } else {
                return Err(CopilotError::UnknownBlock {
                    template: name.to_string(),
                    block: body.to_string(),
                });
            }
        }

        if !stack.is_empty() {
            return Err(err(format!("{} unclosed block(s)", stack.len())));
        }
        if last < source.len() {
            current.push(Node::Text(source[last..].to_string()));
        }

        Ok(Template {
            name: name.to_string(),
            nodes: current,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render against `context`, which should be a JSON object.
    pub fn render(&self, context: &Value) -> String {
        let mut out = String::new();
        let mut scopes = Vec::new();
        render_nodes(&self.nodes, context, &mut scopes, &mut out);
        out
    }
}

fn render_nodes(
    nodes: &[Node],
    context: &Value,
    scopes: &mut Vec<(String, Value)>,
    out: &mut String,
) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Interpolate(path) => {
                if let Some(value) = resolve(path, context, scopes) {
                    push_value(out, &value);
                }
            }
            Node::For { var, path, body } => {
                let items = match resolve(path, context, scopes) {
                    Some(Value::Array(items)) => items,
                    Some(other) if !other.is_null() => {
                        log::warn!("template loop over non-array '{}'", path);
                        continue;
                    }
                    _ => continue,
                };
                for item in items {
                    scopes.push((var.clone(), item));
                    render_nodes(body, context, scopes, out);
                    scopes.pop();
                }
            }
            Node::If {
                path,
                then,
                otherwise,
            } => {
                let truthy = resolve(path, context, scopes)
                    .map(|v| is_truthy(&v))
                    .unwrap_or(false);
                let branch = if truthy { then } else { otherwise };
                render_nodes(branch, context, scopes, out);
            }
        }
    }
}

fn resolve(path: &str, context: &Value, scopes: &[(String, Value)]) -> Option<Value> {
    let mut parts = path.split('.');
    let head = parts.next()?;
    let mut current = scopes
        .iter()
        .rev()
        .find(|(name, _)| name == head)
        .map(|(_, v)| v)
        .or_else(|| context.get(head))?
        .clone();

    for part in parts {
        let next = match &current {
            Value::Object(map) => map.get(part)?.clone(),
            Value::Array(items) if part == "length" => Value::from(items.len()),
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?.clone(),
            Value::String(s) if part == "length" => Value::from(s.chars().count()),
            _ => return None,
        };
        current = next;
    }
    Some(current)
}

fn push_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push_str(s),
        Value::Bool(b) => out.push_str(&b.to_string()),
        Value::Number(n) => out.push_str(&n.to_string()),
        other => out.push_str(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn render(source: &str, context: Value) -> String {
        Template::compile("test", source).unwrap().render(&context)
    }

    #[test]
    fn keeps_its_name() {
        let template = Template::compile("build-page.txt", "x").unwrap();
        assert_eq!(template.name(), "build-page.txt");
    }

    #[test]
    fn interpolates_paths() {
        let ctx = json!({"user": {"name": "Ada", "tags": ["x", "y"]}, "n": 3});
        assert_eq!(
            render("{{user.name}} has {{ n }} / {{user.tags.1}} / {{user.tags.length}}", ctx),
            "Ada has 3 / y / 2"
        );
    }

    #[test]
    fn missing_and_null_render_empty() {
        assert_eq!(render("[{{nope}}][{{a.b}}]", json!({"a": null})), "[][]");
    }

    #[test]
    fn objects_render_as_json() {
        assert_eq!(render("{{o}}", json!({"o": {"k": 1}})), r#"{"k":1}"#);
    }

    #[test]
    fn for_loop_with_shadowing() {
        let ctx = json!({"t": "outer", "tables": [{"name": "a"}, {"name": "b"}]});
        assert_eq!(
            render("{{#for t in tables}}<{{t.name}}>{{#end}}{{t}}", ctx),
            "<a><b>outer"
        );
    }

    #[test]
    fn if_else() {
        let src = "{{#if flag}}yes{{#else}}no{{#end}}";
        assert_eq!(render(src, json!({"flag": true})), "yes");
        assert_eq!(render(src, json!({"flag": ""})), "no");
        assert_eq!(render(src, json!({})), "no");
    }

    #[test]
    fn nested_blocks() {
        let src = "{{#for r in rows}}{{#if r.on}}{{r.v}}{{#end}}{{#end}}";
        let ctx = json!({"rows": [{"on": 1, "v": "a"}, {"on": 0, "v": "b"}, {"on": true, "v": "c"}]});
        assert_eq!(render(src, ctx), "ac");
    }

    #[test]
    fn unbalanced_blocks_are_errors() {
        assert!(matches!(
            Template::compile("t", "{{#if a}}x"),
            Err(CopilotError::Template { .. })
        ));
        assert!(matches!(
            Template::compile("t", "x{{#end}}"),
            Err(CopilotError::Template { .. })
        ));
        assert!(matches!(
            Template::compile("t", "{{#else}}"),
            Err(CopilotError::Template { .. })
        ));
    }

    #[test]
    fn unknown_block_is_error() {
        let err = Template::compile("t", "{{# for (const x of y) { }}").unwrap_err();
        assert!(matches!(err, CopilotError::UnknownBlock { .. }));
    }

    #[test]
    fn text_without_tags_is_unchanged() {
        assert_eq!(render("plain { text }", json!({})), "plain { text }");
    }
}

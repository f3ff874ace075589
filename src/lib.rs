//! # Copilot common helpers
//!
//! Shared plumbing for a low-code platform's AI copilot: turning language-model
//! output into the platform's layout tree, and building the prompts that ask
//! for it.
//!
//! ## Features
//! - Response-tree normalisation with shape dispatch and CSS partitioning
//! - HTML output (fenced or raw) parsed into the same tree shape
//! - JSON-Schema inference from form field metadata
//! - Prompt templates rendered over the host's table schema
//! - LLM plugin configuration advisory
//!
//! ## Example — normalising a JSON layout
//! ```ignore
//! use copilot_common::walk_response;
//! use serde_json::json;
//!
//! let layout = walk_response(&json!({
//!     "above": [
//!         {"type": "blank", "contents": "# Welcome"},
//!         {"type": "container", "style": "color: red; margin: 4px", "contents": "hi"}
//!     ]
//! }));
//! ```
//!
//! ## Example — HTML output
//! ```ignore
//! use copilot_common::parse_html_response;
//!
//! let reply = "Here is your page:\n```html\n<h1>Shop</h1><p>Open daily</p>\n```";
//! let normalized = parse_html_response(reply);
//! assert!(normalized.warnings.is_empty());
//! ```

pub mod config;
pub mod css;
pub mod error;
pub mod host;
pub mod html;
pub mod markdown;
pub mod normalize;
pub mod prompt;
pub mod schema;
pub mod segment;
pub mod style;
pub mod template;

// --- Core types ---
pub use config::{incomplete_cfg_msg, CopilotConfig, PluginConfigs};
pub use css::Declarations;
pub use error::{CopilotError, CopilotResult};
pub use html::HtmlSegment;
pub use markdown::{MarkdownOptions, MarkdownRenderer, RichTextRenderer};
pub use normalize::{Normalized, Normalizer, SkipReason, UnrecognizedNode};
pub use segment::Segment;
pub use style::{StyleSet, StyleSplit};

// --- Host collaborators ---
pub use host::{CompletionService, MemoryTemplateStore, SchemaService, TableInfo, TemplateStore};
pub use prompt::{get_completion, PromptBuilder};
pub use schema::{FieldDescriptor, SchemaFragment};

use serde_json::Value;

/// Normalise a response tree with the default Markdown renderer.
pub fn walk_response(tree: &Value) -> Value {
    normalize::walk_response(tree)
}

/// Split a CSS declaration string into structured and custom parts.
pub fn split_container_style(css: &str) -> StyleSplit {
    style::split_container_style(style::StyleSource::Css(css))
}

/// Parse HTML model output into an (un-normalised) response tree.
pub fn parse_html(text: &str) -> Value {
    html::parse_html(text).into_value()
}

/// Parse HTML model output and normalise it.
pub fn parse_html_response(text: &str) -> Normalized {
    Normalizer::<MarkdownRenderer>::default().normalize(&parse_html(text))
}

/// JSON-Schema fragment for one field.
pub fn field_properties(field: &FieldDescriptor) -> SchemaFragment {
    schema::field_properties(field)
}

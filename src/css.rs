//! Inline CSS declaration parsing.
//!
//! Turns the text of a `style` attribute (`"margin: 4px; color: red"`) into an
//! ordered list of declarations. Parsing never fails: malformed declarations
//! are skipped and completely unparsable input yields an empty list.

use cssparser::AtRuleParser as CssAtRuleParser;
use cssparser::BasicParseErrorKind;
use cssparser::CowRcStr;
use cssparser::DeclarationParser as CssDeclarationParser;
use cssparser::ParseError;
use cssparser::Parser;
use cssparser::ParserInput;
use cssparser::ParserState;
use cssparser::QualifiedRuleParser as CssQualifiedRuleParser;
use cssparser::RuleBodyItemParser as CssRuleBodyItemParser;
use cssparser::RuleBodyParser as CssRuleBodyParser;
use cssparser::Token;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// Ordered CSS property → value mapping.
///
/// Insertion order is kept. Re-inserting an existing property overwrites its
/// value in place, matching how later declarations win in a style attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declarations {
    entries: Vec<(String, String)>,
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Build from an already-parsed JSON style object.
    ///
    /// Strings are taken verbatim and numbers/bools through their JSON text;
    /// nested values and nulls have no CSS meaning and are skipped.
    pub fn from_json_map(map: &Map<String, Value>) -> Self {
        let mut decls = Declarations::new();
        for (name, value) in map {
            match value {
                Value::String(s) => decls.insert(name.clone(), s.clone()),
                Value::Number(n) => decls.insert(name.clone(), n.to_string()),
                Value::Bool(b) => decls.insert(name.clone(), b.to_string()),
                _ => log::debug!("skipping non-scalar style value for '{}'", name),
            }
        }
        decls
    }

    /// Convert into a JSON object, preserving order.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(n, v)| (n.clone(), Value::String(v.clone())))
                .collect(),
        )
    }
}

impl FromIterator<(String, String)> for Declarations {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut decls = Declarations::new();
        for (name, value) in iter {
            decls.insert(name, value);
        }
        decls
    }
}

impl Serialize for Declarations {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// ─── cssparser glue ──────────────────────────────────────────────────────────

/// Records each declaration's name and raw value text.
struct InlineDeclParser;

impl CssDeclarationParser<'_> for InlineDeclParser {
    type Declaration = (String, String);
    type Error = ();

    fn parse_value<'input>(
        &mut self,
        name: CowRcStr<'input>,
        input: &mut Parser<'input, '_>,
        _decl_start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'input, Self::Error>> {
        let mut cursor = input.position();
        let mut parts = Vec::new();
        loop {
            let before = input.position();
            let (is_comment, opens_block) = match input.next_including_whitespace_and_comments() {
                Ok(token) => (
                    matches!(token, Token::Comment(_)),
                    matches!(
                        token,
                        Token::Function(_)
                            | Token::ParenthesisBlock
                            | Token::SquareBracketBlock
                            | Token::CurlyBracketBlock
                    ),
                ),
                Err(_) => break,
            };
            if opens_block {
                let _: Result<(), ParseError<'input, ()>> = input.parse_nested_block(|nested| {
                    while nested.next_including_whitespace_and_comments().is_ok() {}
                    Ok(())
                });
            }
            if is_comment {
                parts.push(input.slice(cursor..before).trim());
                cursor = input.position();
            }
        }
        parts.push(input.slice_from(cursor).trim());

        let value = parts
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if value.is_empty() {
            return Err(input.new_error(BasicParseErrorKind::EndOfInput));
        }

        // Custom property names are case-sensitive.
        let name = if name.starts_with("--") {
            name.to_string()
        } else {
            name.to_ascii_lowercase()
        };
        Ok((name, value))
    }
}

impl CssAtRuleParser<'_> for InlineDeclParser {
    type Prelude = ();
    type AtRule = (String, String);
    type Error = ();

    #[inline]
    fn parse_prelude<'input>(
        &mut self,
        _name: CowRcStr<'input>,
        _input: &mut Parser<'input, '_>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        Ok(())
    }

    #[inline]
    fn parse_block<'input>(
        &mut self,
        _prelude: Self::Prelude,
        _state: &ParserState,
        input: &mut Parser<'input, '_>,
    ) -> Result<Self::AtRule, ParseError<'input, Self::Error>> {
        Err(input.new_error(BasicParseErrorKind::AtRuleBodyInvalid))
    }

    #[inline]
    fn rule_without_block(
        &mut self,
        _prelude: Self::Prelude,
        _state: &ParserState,
    ) -> Result<Self::AtRule, Self::Error> {
        Err(())
    }
}

impl CssQualifiedRuleParser<'_> for InlineDeclParser {
    type Prelude = ();
    type QualifiedRule = (String, String);
    type Error = ();

    #[inline]
    fn parse_prelude<'input>(
        &mut self,
        input: &mut Parser<'input, '_>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        Err(input.new_error(BasicParseErrorKind::QualifiedRuleInvalid))
    }

    #[inline]
    fn parse_block<'input>(
        &mut self,
        _prelude: Self::Prelude,
        _state: &ParserState,
        input: &mut Parser<'input, '_>,
    ) -> Result<Self::QualifiedRule, ParseError<'input, Self::Error>> {
        Err(input.new_error(BasicParseErrorKind::QualifiedRuleInvalid))
    }
}

impl CssRuleBodyItemParser<'_, (String, String), ()> for InlineDeclParser {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

/// Parse the body of a `style` attribute.
pub fn parse_inline_style(css: &str) -> Declarations {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut body = InlineDeclParser;
    let mut decls = Declarations::new();
    for item in CssRuleBodyParser::new(&mut parser, &mut body) {
        match item {
            Ok((name, value)) => decls.insert(name, value),
            Err((err, slice)) => {
                log::warn!("dropping invalid CSS declaration '{}': {:?}", slice.trim(), err.kind)
            }
        }
    }
    decls
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_declarations_in_order() {
        let decls = parse_inline_style("color: red; margin-top: 4px ;width:100%");
        let pairs: Vec<_> = decls.iter().collect();
        assert_eq!(
            pairs,
            vec![("color", "red"), ("margin-top", "4px"), ("width", "100%")]
        );
    }

    #[test]
    fn property_names_are_lowercased() {
        let decls = parse_inline_style("Margin-Left: 2em");
        assert_eq!(decls.get("margin-left"), Some("2em"));
    }

    #[test]
    fn later_declaration_overwrites_in_place() {
        let decls = parse_inline_style("color: red; width: 1px; color: blue");
        let pairs: Vec<_> = decls.iter().collect();
        assert_eq!(pairs, vec![("color", "blue"), ("width", "1px")]);
    }

    #[test]
    fn custom_property_names_keep_case() {
        let decls = parse_inline_style("--MyVar: 4px; COLOR: var(--MyVar)");
        let pairs: Vec<_> = decls.iter().collect();
        assert_eq!(pairs, vec![("--MyVar", "4px"), ("color", "var(--MyVar)")]);
    }

    #[test]
    fn comments_are_dropped_from_values() {
        let decls = parse_inline_style(
            "color: red /* note */; margin: 1px /* a */ 2px; border: /* only */",
        );
        let pairs: Vec<_> = decls.iter().collect();
        assert_eq!(pairs, vec![("color", "red"), ("margin", "1px 2px")]);
    }

    #[test]
    fn keeps_complex_values() {
        let decls = parse_inline_style(
            "font-family: \"Helvetica Neue\", sans-serif; background: url(a;b.png) no-repeat",
        );
        assert_eq!(decls.get("font-family"), Some("\"Helvetica Neue\", sans-serif"));
        assert_eq!(decls.get("background"), Some("url(a;b.png) no-repeat"));
    }

    #[test]
    fn garbage_yields_empty_mapping() {
        assert!(parse_inline_style("this is not css").is_empty());
        assert!(parse_inline_style("").is_empty());
        assert!(parse_inline_style("color:").is_empty());
    }

    #[test]
    fn skips_only_broken_declarations() {
        let decls = parse_inline_style("oops; height: 3px");
        assert_eq!(decls.len(), 1);
        assert_eq!(decls.get("height"), Some("3px"));
    }

    #[test]
    fn json_map_conversion() {
        let value = serde_json::json!({"width": 10, "color": "red", "nested": {"a": 1}});
        let decls = Declarations::from_json_map(value.as_object().unwrap());
        assert_eq!(decls.get("width"), Some("10"));
        assert_eq!(decls.get("color"), Some("red"));
        assert!(!decls.contains("nested"));
        assert_eq!(decls.to_json(), serde_json::json!({"width": "10", "color": "red"}));
    }
}

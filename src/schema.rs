use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Hosts send `null` for absent values; read it as the default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Metadata for one form or table field, as supplied by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldDescriptor {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sublabel: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(rename = "input_type", skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub is_repeat: bool,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub fields: Vec<FieldDescriptor>,
    #[serde(deserialize_with = "null_as_default")]
    pub attributes: FieldAttributes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionList>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldType {
    Name(String),
    Named { name: String },
    Other(Value),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionList>,
}

/// Enumerated choices: `"a, b, c"` or a list of strings / `{value, name}` objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionList {
    Csv(String),
    List(Vec<OptionItem>),
    /// Anything else gives no choices.
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionItem {
    Text(String),
    Labelled {
        #[serde(default)]
        value: Value,
        #[serde(default)]
        name: Value,
    },
    /// Numbers and other non-object items.
    Other(Value),
}

impl OptionList {
    fn is_empty(&self) -> bool {
        match self {
            OptionList::Csv(s) => s.is_empty(),
            OptionList::List(_) => false,
            OptionList::Other(_) => true,
        }
    }
}

impl FieldDescriptor {
    /// `type.name`, else `type` when it is a name, else `input_type`.
    ///
    /// A `type` object without a usable name shadows `input_type` and gives `None`.
    pub fn type_name(&self) -> Option<&str> {
        match &self.field_type {
            Some(FieldType::Named { name }) if !name.is_empty() => Some(name.as_str()),
            Some(FieldType::Name(name)) if !name.is_empty() => Some(name.as_str()),
            Some(FieldType::Named { .. }) | Some(FieldType::Other(_)) => None,
            _ => self.input_type.as_deref(),
        }
    }

    /// Sublabel, falling back to the label.
    pub fn description(&self) -> Option<String> {
        self.sublabel
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.label.as_deref().filter(|s| !s.is_empty()))
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Boolean,
    Integer,
    Number,
    Array,
    Object,
}

/// A JSON-Schema fragment describing one field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaFragment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaFragment>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_properties"
    )]
    pub properties: Option<Vec<(String, SchemaFragment)>>,
}

fn serialize_properties<S: Serializer>(
    properties: &Option<Vec<(String, SchemaFragment)>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let properties = properties.as_deref().unwrap_or_default();
    let mut map = serializer.serialize_map(Some(properties.len()))?;
    for (name, fragment) in properties {
        map.serialize_entry(name, fragment)?;
    }
    map.end()
}

impl SchemaFragment {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Look up a property of an object fragment by name.
    pub fn property(&self, name: &str) -> Option<&SchemaFragment> {
        self.properties
            .as_ref()?
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| f)
    }
}

/// Normalise an option list to plain strings.
///
/// CSV strings are split on `,` and trimmed. List objects contribute their
/// `value`, or their `name` when `value` is empty; objects with neither are
/// skipped. Other scalar items are used as text.
pub fn to_array_of_strings(options: &OptionList) -> Vec<String> {
    match options {
        OptionList::Csv(s) => s.split(',').map(|part| part.trim().to_string()).collect(),
        OptionList::List(items) => items
            .iter()
            .filter_map(|item| match item {
                OptionItem::Text(s) => Some(s.clone()),
                OptionItem::Labelled { value, name } => scalar_text(value).or_else(|| scalar_text(name)),
                OptionItem::Other(value) => scalar_text(value),
            })
            .collect(),
        OptionList::Other(_) => Vec::new(),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

fn enum_from(options: Option<&OptionList>) -> Option<Vec<String>> {
    options
        .filter(|opts| !opts.is_empty())
        .map(to_array_of_strings)
}

/// An `object` fragment with one described property per field.
pub fn object_schema(fields: &[FieldDescriptor]) -> SchemaFragment {
    let properties = fields
        .iter()
        .map(|f| {
            let mut fragment = field_properties(f);
            fragment.description = f.description();
            (f.name.clone(), fragment)
        })
        .collect();
    SchemaFragment {
        schema_type: Some(SchemaType::Object),
        properties: Some(properties),
        ..SchemaFragment::default()
    }
}

/// Infer the schema fragment for a field.
pub fn field_properties(field: &FieldDescriptor) -> SchemaFragment {
    let mut props = SchemaFragment::default();

    if field.is_repeat {
        props.schema_type = Some(SchemaType::Array);
        props.items = Some(Box::new(object_schema(&field.fields)));
    }

    // The type switch runs even for repeats and may override `array`.
    match field.type_name() {
        Some("String") => {
            props.schema_type = Some(SchemaType::String);
            if let Some(values) = enum_from(field.attributes.options.as_ref()) {
                props.enum_values = Some(values);
            }
        }
        Some("Bool") => props.schema_type = Some(SchemaType::Boolean),
        Some("Integer") => props.schema_type = Some(SchemaType::Integer),
        Some("Float") => props.schema_type = Some(SchemaType::Number),
        Some("select") => {
            props.schema_type = Some(SchemaType::String);
            if let Some(values) = enum_from(field.options.as_ref()) {
                props.enum_values = Some(values);
            }
        }
        _ => {}
    }

    if props.schema_type.is_none() && field.input_type.as_deref() == Some("code") {
        props.schema_type = Some(SchemaType::String);
    }

    props
}

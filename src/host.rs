//! Host-platform collaborators.
//!
//! Table metadata, template files and the language model all live outside this
//! crate; the host hands in implementations of these traits.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{CopilotError, CopilotResult};
use crate::schema::FieldDescriptor;

/// A table as described by the host's data layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<FieldDescriptor>,
}

pub trait SchemaService: Send + Sync {
    fn list_tables(&self) -> CopilotResult<Vec<TableInfo>>;

    /// The table holding user accounts, if the host has one.
    fn find_user_table(&self) -> CopilotResult<Option<TableInfo>>;
}

pub trait CompletionService: Send + Sync {
    fn generate(&self, prompt: &str, system_prompt: &str) -> CopilotResult<String>;
}

pub trait TemplateStore: Send + Sync {
    /// Return the source of template `name`, or [`CopilotError::TemplateNotFound`].
    fn read_template(&self, name: &str) -> CopilotResult<String>;
}

/// Templates kept in memory, keyed by name.
#[derive(Debug, Default)]
pub struct MemoryTemplateStore {
    templates: RwLock<HashMap<String, String>>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: impl Into<String>, source: impl Into<String>) {
        match self.templates.write() {
            Ok(mut templates) => {
                templates.insert(name.into(), source.into());
            }
            Err(_) => log::error!("template store lock poisoned"),
        }
    }

    pub fn with_template(self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn read_template(&self, name: &str) -> CopilotResult<String> {
        let templates = self
            .templates
            .read()
            .map_err(|_| CopilotError::Io("template store lock poisoned".to_string()))?;
        templates
            .get(name)
            .cloned()
            .ok_or_else(|| CopilotError::TemplateNotFound {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_lookup() {
        let store = MemoryTemplateStore::new().with_template("a.txt", "hello");
        assert_eq!(store.read_template("a.txt").unwrap(), "hello");
        assert!(matches!(
            store.read_template("b.txt"),
            Err(CopilotError::TemplateNotFound { name }) if name == "b.txt"
        ));
    }

    #[test]
    fn insert_overwrites() {
        let store = MemoryTemplateStore::new();
        store.insert("a", "1");
        store.insert("a", "2");
        assert_eq!(store.read_template("a").unwrap(), "2");
    }
}

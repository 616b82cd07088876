//! Static module registry.
//!
//! The registry is built once per process from the compiled-in catalog and is
//! never mutated afterwards. Lookups by unknown id return `None`; callers treat
//! that as "render nothing".

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable module identifier, e.g. `"tasks"` or `"bug-report"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ModuleId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for ModuleId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ModuleId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ModuleId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Menu grouping. Each category carries the colour theme its tiles render with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    System,
    Productivity,
    Development,
    Design,
    Testing,
    Utilities,
    Lifestyle,
    Media,
    Games,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::System,
        Category::Productivity,
        Category::Development,
        Category::Design,
        Category::Testing,
        Category::Utilities,
        Category::Lifestyle,
        Category::Media,
        Category::Games,
    ];

    pub fn color_theme(self) -> &'static str {
        match self {
            Category::System => "slate",
            Category::Productivity => "blue",
            Category::Development => "indigo",
            Category::Design => "pink",
            Category::Testing => "orange",
            Category::Utilities => "cyan",
            Category::Lifestyle => "emerald",
            Category::Media => "violet",
            Category::Games => "rose",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::System => "System & Settings",
            Category::Productivity => "Office & Productivity",
            Category::Development => "Development & Coding",
            Category::Design => "Design & UI",
            Category::Testing => "Testing & QA",
            Category::Utilities => "Utilities & Connectivity",
            Category::Lifestyle => "Finance & Lifestyle",
            Category::Media => "Media & Reading",
            Category::Games => "Games & Fun",
        }
    }
}

/// How the shell window should look while a module is mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presentation {
    #[default]
    Embedded,
    Fullscreen,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptor {
    pub id: ModuleId,
    pub label: String,
    /// Symbolic icon name resolved by the frontend icon set.
    pub icon: String,
    pub category: Category,
    pub color_theme: String,
    pub description: String,
    pub enabled_by_default: bool,
    pub presentation: Presentation,
}

impl ModuleDescriptor {
    pub fn new(id: &str, label: &str, icon: &str, category: Category, description: &str) -> Self {
        Self {
            id: ModuleId::from(id),
            label: label.to_string(),
            icon: icon.to_string(),
            category,
            color_theme: category.color_theme().to_string(),
            description: description.to_string(),
            enabled_by_default: true,
            presentation: Presentation::Embedded,
        }
    }

    pub fn hidden_by_default(mut self) -> Self {
        self.enabled_by_default = false;
        self
    }

    pub fn fullscreen(mut self) -> Self {
        self.presentation = Presentation::Fullscreen;
        self
    }

    fn matches(&self, needle: &str) -> bool {
        self.label.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("E-OVD-0200: duplicate module id '{0}'")]
    DuplicateId(ModuleId),
    #[error("E-OVD-0205: empty module id")]
    EmptyId,
}

impl RegistryError {
    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::DuplicateId(_) => crate::config::errors::ERR_REGISTRY_DUPLICATE,
            RegistryError::EmptyId => crate::config::errors::ERR_REGISTRY_EMPTY_ID,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModuleRegistry {
    modules: Vec<ModuleDescriptor>,
}

impl ModuleRegistry {
    pub fn new(modules: Vec<ModuleDescriptor>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::with_capacity(modules.len());
        for descriptor in &modules {
            if descriptor.id.as_str().trim().is_empty() {
                return Err(RegistryError::EmptyId);
            }
            if !seen.insert(descriptor.id.clone()) {
                return Err(RegistryError::DuplicateId(descriptor.id.clone()));
            }
        }
        Ok(Self { modules })
    }

    /// Registry over the compiled-in catalog.
    pub fn builtin() -> Self {
        // INVARIANT: catalog ids are unique; covered by catalog tests.
        Self {
            modules: crate::catalog::builtin_descriptors(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ModuleDescriptor> {
        self.modules.iter().find(|m| m.id.as_str() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ModuleId> {
        self.modules.iter().map(|m| &m.id)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Case-insensitive match on label or description, declaration order kept.
    pub fn search(&self, query: &str) -> Vec<&ModuleDescriptor> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.modules.iter().filter(|m| m.matches(&needle)).collect()
    }

    pub fn by_category(&self) -> Vec<(Category, Vec<&ModuleDescriptor>)> {
        Category::ALL
            .iter()
            .filter_map(|category| {
                let members: Vec<_> = self
                    .modules
                    .iter()
                    .filter(|m| m.category == *category)
                    .collect();
                (!members.is_empty()).then_some((*category, members))
            })
            .collect()
    }
}

//! Named visibility configurations.
//!
//! System presets are authored as keep-lists (the modules a profile is about)
//! and normalized against a registry into the same deny-list form user
//! presets are stored in. Nothing downstream ever sees a keep-list.

use serde::{Deserialize, Serialize};

use crate::registry::{ModuleId, ModuleRegistry};
use crate::visibility::is_mandatory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetKind {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: String,
    pub label: String,
    pub hidden_ids: Vec<ModuleId>,
    pub kind: PresetKind,
    /// Short blurb shown under system presets in the config panel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Preset {
    pub fn user(id: String, label: String, hidden_ids: Vec<ModuleId>) -> Self {
        Self {
            id,
            label,
            hidden_ids,
            kind: PresetKind::User,
            description: None,
            color: None,
        }
    }

    pub fn is_system(&self) -> bool {
        self.kind == PresetKind::System
    }
}

/// Compile-time description of a system preset.
#[derive(Debug, Clone, Copy)]
pub struct SystemPresetSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub color: &'static str,
    pub keep: &'static [&'static str],
}

impl SystemPresetSpec {
    /// Deny-list form: every registry id that is neither kept nor mandatory.
    pub fn normalize(&self, registry: &ModuleRegistry) -> Preset {
        let hidden_ids = registry
            .ids()
            .filter(|id| !self.keep.contains(&id.as_str()) && !is_mandatory(id.as_str()))
            .cloned()
            .collect();
        Preset {
            id: self.id.to_string(),
            label: self.label.to_string(),
            hidden_ids,
            kind: PresetKind::System,
            description: Some(self.description.to_string()),
            color: Some(self.color.to_string()),
        }
    }
}

pub const SYSTEM_PRESETS: &[SystemPresetSpec] = &[
    SystemPresetSpec {
        id: "default",
        label: "Default",
        description: "Restore original state",
        color: "slate-600",
        keep: &["tasks", "notes", "calendar", "weather", "music", "news", "ai"],
    },
    SystemPresetSpec {
        id: "system_only",
        label: "System Only",
        description: "Only Config & Settings",
        color: "gray-700",
        keep: &["system"],
    },
    SystemPresetSpec {
        id: "dev",
        label: "Developer",
        description: "Code, Git, Terminal, DB",
        color: "blue-600",
        keep: &[
            "terminal",
            "code",
            "git",
            "database",
            "erd",
            "json",
            "json_tools",
            "request",
            "jwt",
            "regex",
            "decode",
            "snippets",
            "library",
            "devops",
            "tree",
            "tester",
            "testcase",
            "bug-report",
        ],
    },
    SystemPresetSpec {
        id: "creative",
        label: "Creator",
        description: "Design, Music, Colors",
        color: "pink-600",
        keep: &[
            "design",
            "typography",
            "icons",
            "whiteboard",
            "music",
            "camera",
            "img-compress",
            "fb-tools",
        ],
    },
    SystemPresetSpec {
        id: "minimal",
        label: "Focus",
        description: "Keep only the essentials",
        color: "emerald-600",
        keep: &["tasks", "notes", "timer", "breathe", "music"],
    },
];

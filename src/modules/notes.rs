//! Pinned/sorted notes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::load_or_notice;
use crate::host::lifecycle::{
    ActionOutcome, Module, ModuleAction, ModuleContext, ModuleError, ModuleView, Notice,
};
use crate::registry::ModuleId;

const ITEMS_KEY: &str = "items";
const SETTINGS_KEY: &str = "view";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub pinned: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteSort {
    #[default]
    Updated,
    Created,
    Alpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteLayout {
    #[default]
    List,
    Grid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteViewSettings {
    pub layout: NoteLayout,
    pub grid_columns: u8,
    pub sort: NoteSort,
}

impl Default for NoteViewSettings {
    fn default() -> Self {
        Self {
            layout: NoteLayout::List,
            grid_columns: 2,
            sort: NoteSort::Updated,
        }
    }
}

/// Stored notes; `None` until the first save so a fresh profile gets the
/// welcome note.
#[derive(Default, Deserialize)]
#[serde(transparent)]
struct StoredNotes(Option<Vec<Note>>);

pub struct NotesModule {
    id: ModuleId,
    notes: Vec<Note>,
    settings: NoteViewSettings,
    query: String,
    notice: Option<Notice>,
}

fn welcome_note(now: i64) -> Note {
    Note {
        id: "default".to_string(),
        title: "Welcome!".to_string(),
        content: "# Welcome to Notes\n- Try pinning this note.\n- Search is instant.".to_string(),
        created_at: now,
        updated_at: now,
        pinned: true,
    }
}

impl NotesModule {
    pub fn new() -> Self {
        Self {
            id: ModuleId::from("notes"),
            notes: Vec::new(),
            settings: NoteViewSettings::default(),
            query: String::new(),
            notice: None,
        }
    }

    /// Pinned notes first, then by the selected sort; filtered by the search query.
    pub fn ordered(&self) -> Vec<&Note> {
        let needle = self.query.trim().to_lowercase();
        let mut out: Vec<&Note> = self
            .notes
            .iter()
            .filter(|n| {
                needle.is_empty()
                    || n.title.to_lowercase().contains(&needle)
                    || n.content.to_lowercase().contains(&needle)
            })
            .collect();
        out.sort_by(|a, b| {
            b.pinned.cmp(&a.pinned).then_with(|| match self.settings.sort {
                NoteSort::Updated => b.updated_at.cmp(&a.updated_at),
                NoteSort::Created => b.created_at.cmp(&a.created_at),
                NoteSort::Alpha => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            })
        });
        out
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut Note, ModuleError> {
        self.notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| ModuleError::InvalidAction(format!("no note {id}")))
    }

    fn save(&mut self, ctx: &ModuleContext) -> Result<(), ModuleError> {
        ctx.store.put(ITEMS_KEY, &self.notes)?;
        self.notice = None;
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NotesView<'a> {
    notes: Vec<&'a Note>,
    settings: NoteViewSettings,
    query: &'a str,
}

#[async_trait]
impl Module for NotesModule {
    async fn mount(&mut self, ctx: &mut ModuleContext) -> Result<(), ModuleError> {
        let (stored, notice): (StoredNotes, _) = load_or_notice(&ctx.store, ITEMS_KEY)?;
        let now = chrono::Utc::now().timestamp_millis();
        self.notes = match stored.0 {
            Some(notes) => notes,
            None if notice.is_none() => vec![welcome_note(now)],
            None => Vec::new(),
        };
        let (settings, settings_notice) = load_or_notice(&ctx.store, SETTINGS_KEY)?;
        self.settings = settings;
        self.notice = notice.or(settings_notice);
        Ok(())
    }

    fn render(&self) -> ModuleView {
        let view = NotesView {
            notes: self.ordered(),
            settings: self.settings,
            query: &self.query,
        };
        ModuleView::ready(&self.id, view).with_notice(self.notice.clone())
    }

    async fn handle(
        &mut self,
        action: ModuleAction,
        ctx: &mut ModuleContext,
    ) -> Result<ActionOutcome, ModuleError> {
        let now = chrono::Utc::now().timestamp_millis();
        match action.name.as_str() {
            "add" => {
                let note = Note {
                    id: uuid::Uuid::new_v4().to_string(),
                    title: action
                        .payload
                        .get("title")
                        .and_then(|v| v.as_str())
                        .unwrap_or("New note")
                        .to_string(),
                    content: String::new(),
                    created_at: now,
                    updated_at: now,
                    pinned: false,
                };
                self.notes.insert(0, note);
                self.save(ctx)?;
            }
            "update" => {
                let note = self.find_mut(action.str_arg("id")?)?;
                if let Some(title) = action.payload.get("title").and_then(|v| v.as_str()) {
                    note.title = title.to_string();
                }
                if let Some(content) = action.payload.get("content").and_then(|v| v.as_str()) {
                    note.content = content.to_string();
                }
                note.updated_at = now;
                self.save(ctx)?;
            }
            "pin" => {
                let note = self.find_mut(action.str_arg("id")?)?;
                note.pinned = !note.pinned;
                self.save(ctx)?;
            }
            "delete" => {
                let id = action.str_arg("id")?.to_string();
                self.notes.retain(|n| n.id != id);
                self.save(ctx)?;
            }
            "settings" => {
                let mut next = self.settings;
                if let Some(layout) = action.payload.get("layout") {
                    next.layout = serde_json::from_value(layout.clone())
                        .map_err(|e| ModuleError::InvalidAction(format!("layout: {e}")))?;
                }
                if let Some(sort) = action.payload.get("sort") {
                    next.sort = serde_json::from_value(sort.clone())
                        .map_err(|e| ModuleError::InvalidAction(format!("sort: {e}")))?;
                }
                if let Some(cols) = action.payload.get("gridColumns").and_then(|v| v.as_u64()) {
                    next.grid_columns = cols.clamp(1, 4) as u8;
                }
                ctx.store.put(SETTINGS_KEY, &next)?;
                self.settings = next;
            }
            "search" => {
                self.query = action.str_arg("query")?.to_string();
            }
            _ => return Err(action.unknown()),
        }
        Ok(ActionOutcome::Handled)
    }
}

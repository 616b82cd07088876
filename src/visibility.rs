//! Visibility and preset engine.
//!
//! Owns the live `HiddenSet`, the user presets and the active-preset marker.
//! Every mutation is written to the shell namespace of the preference store
//! before the call returns. The hidden set, user presets and active marker go
//! out as one atomic batch; if it fails neither memory nor disk changes and
//! the error is returned.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::limits::MAX_PRESET_LABEL_CHARS;
use crate::config::paths::{ACTIVE_PRESET_KEY, CUSTOM_PRESETS_KEY, HIDDEN_MODULES_KEY};
use crate::host::events::{EventSink, HostEvent};
use crate::presets::{Preset, PresetKind, SystemPresetSpec, SYSTEM_PRESETS};
use crate::registry::{ModuleDescriptor, ModuleId, ModuleRegistry};
use crate::store::{SharedStore, ShellBatch, ShellStore, StoreError};

/// Modules that can never be hidden.
pub const MANDATORY_MODULES: [&str; 4] = ["config", "settings", "about", "license"];

pub fn is_mandatory(id: &str) -> bool {
    MANDATORY_MODULES.contains(&id)
}

/// Set of hidden module ids. Never contains a mandatory id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HiddenSet(BTreeSet<ModuleId>);

impl HiddenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from arbitrary ids, dropping mandatory ones.
    pub fn from_ids<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ModuleId>,
    {
        Self(
            ids.into_iter()
                .map(|id| -> ModuleId { id.into() })
                .filter(|id| !is_mandatory(id.as_str()))
                .collect(),
        )
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleId> {
        self.0.iter()
    }

    pub fn to_vec(&self) -> Vec<ModuleId> {
        self.0.iter().cloned().collect()
    }

    fn retain_known(&mut self, registry: &ModuleRegistry) {
        self.0.retain(|id| registry.contains(id.as_str()));
    }

    /// Flip membership; returns true when the id is now hidden.
    fn flip(&mut self, id: ModuleId) -> bool {
        if self.0.remove(&id) {
            false
        } else {
            self.0.insert(id);
            true
        }
    }
}

/// Registry entries not in `hidden`, declaration order preserved.
pub fn compute_visible<'a>(
    registry: &'a ModuleRegistry,
    hidden: &HiddenSet,
) -> Vec<&'a ModuleDescriptor> {
    registry
        .iter()
        .filter(|m| !hidden.contains(m.id.as_str()))
        .collect()
}

#[derive(Debug, Error)]
pub enum VisibilityError {
    #[error("E-OVD-0202: module '{0}' is mandatory and cannot be hidden")]
    Mandatory(ModuleId),
    #[error("E-OVD-0201: unknown module '{0}'")]
    UnknownModule(String),
    #[error("E-OVD-0204: system preset '{0}' cannot be modified")]
    SystemPresetImmutable(String),
    #[error("E-OVD-0203: preset '{0}' not found")]
    PresetNotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityStats {
    pub total: usize,
    pub visible: usize,
    pub hidden: usize,
    /// Visible share of the catalog, rounded to the nearest percent.
    pub percent_active: u8,
}

/// Snapshot of everything the engine persists.
#[derive(Clone)]
struct State {
    hidden: HiddenSet,
    user_presets: Vec<Preset>,
    active_preset: Option<String>,
}

pub type SharedVisibility = Arc<RwLock<VisibilityEngine>>;

pub struct VisibilityEngine {
    registry: Arc<ModuleRegistry>,
    store: ShellStore,
    system_presets: Vec<Preset>,
    state: State,
    sink: Option<Arc<dyn EventSink>>,
}

impl VisibilityEngine {
    /// Load persisted visibility state, using the built-in system presets.
    pub fn load(registry: Arc<ModuleRegistry>, store: SharedStore) -> Result<Self, VisibilityError> {
        Self::with_system_presets(registry, store, SYSTEM_PRESETS)
    }

    pub fn with_system_presets(
        registry: Arc<ModuleRegistry>,
        store: SharedStore,
        specs: &[SystemPresetSpec],
    ) -> Result<Self, VisibilityError> {
        #[cfg(feature = "otel_spans")]
        let _span = tracing::info_span!("visibility_load", presets = specs.len()).entered();

        let store = ShellStore::new(store);
        let system_presets: Vec<Preset> = specs.iter().map(|s| s.normalize(&registry)).collect();

        let mut hidden = match store.load::<HiddenSet>(HIDDEN_MODULES_KEY)? {
            Some(persisted) => HiddenSet::from_ids(persisted.0),
            None => HiddenSet::from_ids(
                registry
                    .iter()
                    .filter(|m| !m.enabled_by_default)
                    .map(|m| m.id.clone()),
            ),
        };
        hidden.retain_known(&registry);

        let user_presets: Vec<Preset> = store
            .load::<Vec<Preset>>(CUSTOM_PRESETS_KEY)?
            .unwrap_or_default()
            .into_iter()
            .filter(|p| p.kind == PresetKind::User)
            .collect();

        let active_preset = store
            .load::<String>(ACTIVE_PRESET_KEY)?
            .filter(|id| user_presets.iter().any(|p| &p.id == id));

        tracing::info!(
            target = "overdesk",
            hidden = hidden.len(),
            user_presets = user_presets.len(),
            active_preset = active_preset.as_deref().unwrap_or("none"),
            "visibility state loaded"
        );

        Ok(Self {
            registry,
            store,
            system_presets,
            state: State {
                hidden,
                user_presets,
                active_preset,
            },
            sink: None,
        })
    }

    pub fn into_shared(self) -> SharedVisibility {
        Arc::new(RwLock::new(self))
    }

    pub fn set_event_sink(&mut self, sink: Arc<dyn EventSink>) {
        self.sink = Some(sink);
    }

    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    pub fn hidden(&self) -> &HiddenSet {
        &self.state.hidden
    }

    pub fn visible(&self) -> Vec<&ModuleDescriptor> {
        compute_visible(&self.registry, &self.state.hidden)
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.registry.contains(id) && !self.state.hidden.contains(id)
    }

    pub fn active_preset(&self) -> Option<&str> {
        self.state.active_preset.as_deref()
    }

    pub fn system_presets(&self) -> &[Preset] {
        &self.system_presets
    }

    pub fn user_presets(&self) -> &[Preset] {
        &self.state.user_presets
    }

    /// System presets first, then user presets in creation order.
    pub fn presets(&self) -> Vec<&Preset> {
        self.system_presets
            .iter()
            .chain(self.state.user_presets.iter())
            .collect()
    }

    pub fn preset(&self, id: &str) -> Option<&Preset> {
        self.presets().into_iter().find(|p| p.id == id)
    }

    pub fn stats(&self) -> VisibilityStats {
        let total = self.registry.len();
        let hidden = self.state.hidden.len();
        let visible = total - hidden;
        let percent_active = if total == 0 {
            0
        } else {
            ((visible as f64 / total as f64) * 100.0).round() as u8
        };
        VisibilityStats {
            total,
            visible,
            hidden,
            percent_active,
        }
    }

    /// `"My Setup {n+1}"` where n is the number of user presets.
    pub fn suggested_preset_name(&self) -> String {
        format!("My Setup {}", self.state.user_presets.len() + 1)
    }

    /// Flip one module's visibility. Returns true when it is now hidden.
    pub fn toggle(&mut self, id: &str) -> Result<bool, VisibilityError> {
        if is_mandatory(id) {
            return Err(VisibilityError::Mandatory(ModuleId::from(id)));
        }
        if !self.registry.contains(id) {
            return Err(VisibilityError::UnknownModule(id.to_string()));
        }
        let mut next = self.state.clone();
        let now_hidden = next.hidden.flip(ModuleId::from(id));
        sync_active_preset(&mut next);
        self.commit(next)?;
        tracing::debug!(target = "overdesk", id, now_hidden, "module visibility toggled");
        Ok(now_hidden)
    }

    /// Replace the hidden set wholesale. Mandatory and unknown ids are dropped.
    pub fn bulk_update<I, T>(&mut self, ids: I) -> Result<(), VisibilityError>
    where
        I: IntoIterator<Item = T>,
        T: Into<ModuleId>,
    {
        let mut next = self.state.clone();
        next.hidden = HiddenSet::from_ids(ids);
        next.hidden.retain_known(&self.registry);
        sync_active_preset(&mut next);
        self.commit(next)
    }

    pub fn show_all(&mut self) -> Result<(), VisibilityError> {
        let mut next = self.state.clone();
        next.hidden = HiddenSet::new();
        next.active_preset = None;
        self.commit(next)
    }

    pub fn apply_preset(&mut self, preset_id: &str) -> Result<(), VisibilityError> {
        #[cfg(feature = "otel_spans")]
        let _span = tracing::info_span!("apply_preset", preset_id).entered();

        let preset = self
            .preset(preset_id)
            .cloned()
            .ok_or_else(|| VisibilityError::PresetNotFound(preset_id.to_string()))?;
        let mut next = self.state.clone();
        next.hidden = HiddenSet::from_ids(preset.hidden_ids);
        next.hidden.retain_known(&self.registry);
        next.active_preset = match preset.kind {
            PresetKind::User => Some(preset.id),
            PresetKind::System => None,
        };
        self.commit(next)?;
        tracing::info!(target = "overdesk", preset_id, hidden = self.state.hidden.len(), "preset applied");
        Ok(())
    }

    /// Capture the live hidden set as a new user preset, which becomes active.
    pub fn save_preset(&mut self, name: &str) -> Result<Preset, VisibilityError> {
        let preset = Preset::user(
            uuid::Uuid::new_v4().to_string(),
            normalize_label(name),
            self.state.hidden.to_vec(),
        );
        let mut next = self.state.clone();
        next.user_presets.push(preset.clone());
        next.active_preset = Some(preset.id.clone());
        self.commit(next)?;
        tracing::info!(target = "overdesk", preset_id = %preset.id, label = %preset.label, "preset saved");
        Ok(preset)
    }

    pub fn rename_preset(&mut self, preset_id: &str, name: &str) -> Result<(), VisibilityError> {
        self.ensure_user_preset(preset_id)?;
        let mut next = self.state.clone();
        if let Some(p) = next.user_presets.iter_mut().find(|p| p.id == preset_id) {
            p.label = normalize_label(name);
        }
        self.commit(next)
    }

    /// Remove a user preset. The hidden set is left as is.
    pub fn delete_preset(&mut self, preset_id: &str) -> Result<(), VisibilityError> {
        self.ensure_user_preset(preset_id)?;
        let mut next = self.state.clone();
        next.user_presets.retain(|p| p.id != preset_id);
        if next.active_preset.as_deref() == Some(preset_id) {
            next.active_preset = None;
        }
        self.commit(next)
    }

    fn ensure_user_preset(&self, preset_id: &str) -> Result<(), VisibilityError> {
        if self.system_presets.iter().any(|p| p.id == preset_id) {
            return Err(VisibilityError::SystemPresetImmutable(preset_id.to_string()));
        }
        if !self.state.user_presets.iter().any(|p| p.id == preset_id) {
            return Err(VisibilityError::PresetNotFound(preset_id.to_string()));
        }
        Ok(())
    }

    fn commit(&mut self, next: State) -> Result<(), VisibilityError> {
        #[cfg(feature = "otel_spans")]
        let _span = tracing::info_span!("visibility_persist", hidden = next.hidden.len()).entered();

        let mut batch = ShellBatch::default();
        batch.save(HIDDEN_MODULES_KEY, &next.hidden)?;
        batch.save(CUSTOM_PRESETS_KEY, &next.user_presets)?;
        match &next.active_preset {
            Some(id) => batch.save(ACTIVE_PRESET_KEY, id)?,
            None => batch.remove(ACTIVE_PRESET_KEY)?,
        }
        self.store.commit(batch)?;
        self.state = next;
        if let Some(sink) = &self.sink {
            sink.emit(HostEvent::VisibilityChanged {
                hidden: self.state.hidden.len(),
                active_preset: self.state.active_preset.clone(),
            });
        }
        Ok(())
    }
}

/// While a user preset is active, live edits are written back into it.
fn sync_active_preset(state: &mut State) {
    let Some(active) = state.active_preset.as_deref() else {
        return;
    };
    if let Some(preset) = state.user_presets.iter_mut().find(|p| p.id == active) {
        preset.hidden_ids = state.hidden.to_vec();
    }
}

fn normalize_label(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return "Untitled".to_string();
    }
    trimmed.chars().take(MAX_PRESET_LABEL_CHARS).collect()
}

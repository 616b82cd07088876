//! Pomodoro focus timer.
//!
//! State is persisted with a `last_updated` stamp so a running countdown
//! catches up on time spent unmounted.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::load_or_notice;
use crate::config::limits::MODULE_TICK_MS;
use crate::host::lifecycle::{
    ActionOutcome, Module, ModuleAction, ModuleContext, ModuleError, ModuleView, Notice,
};
use crate::registry::ModuleId;
use crate::store::ScopedStore;

const STATE_KEY: &str = "state";
const MIN_DURATION_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Focus,
    Short,
    Long,
}

/// Durations in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    pub work: u64,
    pub short: u64,
    pub long: u64,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            work: 25,
            short: 5,
            long: 15,
        }
    }
}

impl TimerSettings {
    pub fn duration_secs(&self, mode: TimerMode) -> u64 {
        let minutes = match mode {
            TimerMode::Focus => self.work,
            TimerMode::Short => self.short,
            TimerMode::Long => self.long,
        };
        minutes.saturating_mul(60)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub settings: TimerSettings,
    pub mode: TimerMode,
    pub time_left: u64,
    pub initial_time: u64,
    pub active: bool,
    pub sessions: u32,
    /// Unix millis of the last state change while running.
    pub last_updated: i64,
}

impl Default for TimerState {
    fn default() -> Self {
        let settings = TimerSettings::default();
        let initial = settings.duration_secs(TimerMode::Focus);
        Self {
            settings,
            mode: TimerMode::Focus,
            time_left: initial,
            initial_time: initial,
            active: false,
            sessions: 0,
            last_updated: 0,
        }
    }
}

impl TimerState {
    /// Subtract time elapsed since `last_updated` from a running countdown.
    /// Returns true when the countdown completed as a result.
    pub fn catch_up(&mut self, now_ms: i64) -> bool {
        if !self.active {
            return false;
        }
        let elapsed = (now_ms.saturating_sub(self.last_updated).max(0) / 1000) as u64;
        self.last_updated = now_ms;
        self.advance(elapsed)
    }

    /// Count down by `secs`; completes the phase when it reaches zero.
    pub fn advance(&mut self, secs: u64) -> bool {
        if !self.active || secs == 0 {
            return false;
        }
        self.time_left = self.time_left.saturating_sub(secs);
        if self.time_left == 0 {
            self.complete();
            return true;
        }
        false
    }

    /// End the current phase: focus -> break (every 4th is long), break -> focus.
    pub fn complete(&mut self) {
        let next = match self.mode {
            TimerMode::Focus => {
                self.sessions = self.sessions.saturating_add(1);
                if (self.sessions + 1) % 4 == 0 {
                    TimerMode::Long
                } else {
                    TimerMode::Short
                }
            }
            TimerMode::Short | TimerMode::Long => TimerMode::Focus,
        };
        self.set_mode(next);
    }

    pub fn toggle(&mut self, now_ms: i64) {
        self.active = !self.active;
        self.last_updated = now_ms;
    }

    pub fn reset(&mut self) {
        let duration = self.settings.duration_secs(self.mode);
        self.active = false;
        self.time_left = duration;
        self.initial_time = duration;
    }

    pub fn set_mode(&mut self, mode: TimerMode) {
        self.mode = mode;
        self.reset();
    }

    /// Shift the paused countdown by `delta_secs`, never below one minute.
    pub fn adjust(&mut self, delta_secs: i64) {
        if self.active {
            return;
        }
        let next = self
            .time_left
            .saturating_add_signed(delta_secs)
            .max(MIN_DURATION_SECS);
        self.time_left = next;
        self.initial_time = next;
    }

    pub fn update_settings(&mut self, settings: TimerSettings) {
        self.settings = settings;
        if !self.active {
            self.reset();
        }
    }
}

pub struct TimerModule {
    id: ModuleId,
    state: Arc<Mutex<TimerState>>,
    notice: Option<Notice>,
}

impl TimerModule {
    pub fn new() -> Self {
        Self {
            id: ModuleId::from("timer"),
            state: Arc::new(Mutex::new(TimerState::default())),
            notice: None,
        }
    }

    pub fn snapshot(&self) -> TimerState {
        self.state.lock().clone()
    }

    fn persist(&self, store: &ScopedStore) -> Result<(), ModuleError> {
        let snapshot = self.state.lock().clone();
        store.put(STATE_KEY, &snapshot)?;
        Ok(())
    }
}

#[async_trait]
impl Module for TimerModule {
    async fn mount(&mut self, ctx: &mut ModuleContext) -> Result<(), ModuleError> {
        let (mut state, notice): (TimerState, _) = load_or_notice(&ctx.store, STATE_KEY)?;
        if state.catch_up(chrono::Utc::now().timestamp_millis()) {
            tracing::debug!(target = "overdesk", mode = ?state.mode, "timer phase completed while away");
        }
        *self.state.lock() = state;
        self.notice = notice;
        self.persist(&ctx.store)?;

        let shared = self.state.clone();
        let store = ctx.store.clone();
        ctx.scope
            .spawn_interval(Duration::from_millis(MODULE_TICK_MS), move || {
                let completed = {
                    let mut state = shared.lock();
                    if state.active {
                        state.last_updated = chrono::Utc::now().timestamp_millis();
                    }
                    state.advance(1)
                };
                if completed {
                    let snapshot = shared.lock().clone();
                    if let Err(err) = store.put(STATE_KEY, &snapshot) {
                        tracing::warn!(target = "overdesk", error = %err, "timer state not saved");
                    }
                }
            });
        Ok(())
    }

    async fn unmount(&mut self, ctx: &mut ModuleContext) -> Result<(), ModuleError> {
        {
            let mut state = self.state.lock();
            if state.active {
                state.last_updated = chrono::Utc::now().timestamp_millis();
            }
        }
        self.persist(&ctx.store)
    }

    fn render(&self) -> ModuleView {
        ModuleView::ready(&self.id, self.snapshot()).with_notice(self.notice.clone())
    }

    async fn handle(
        &mut self,
        action: ModuleAction,
        ctx: &mut ModuleContext,
    ) -> Result<ActionOutcome, ModuleError> {
        let now = chrono::Utc::now().timestamp_millis();
        {
            let mut state = self.state.lock();
            match action.name.as_str() {
                "toggle" => state.toggle(now),
                "reset" => state.reset(),
                "mode" => {
                    let mode: TimerMode = serde_json::from_value(action.payload["value"].clone())
                        .map_err(|e| ModuleError::InvalidAction(format!("mode: {e}")))?;
                    state.set_mode(mode);
                }
                "adjust" => state.adjust(action.i64_arg("delta")?),
                "settings" => {
                    let settings: TimerSettings = serde_json::from_value(action.payload.clone())
                        .map_err(|e| ModuleError::InvalidAction(format!("settings: {e}")))?;
                    state.update_settings(settings);
                }
                _ => return Err(action.unknown()),
            }
        }
        self.persist(&ctx.store)?;
        Ok(ActionOutcome::Handled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(mode: TimerMode, time_left: u64, sessions: u32) -> TimerState {
        TimerState {
            mode,
            time_left,
            sessions,
            active: true,
            last_updated: 1_000_000,
            ..TimerState::default()
        }
    }

    #[test]
    fn focus_completion_alternates_breaks() {
        let mut state = running(TimerMode::Focus, 1, 0);
        assert!(state.advance(1));
        assert_eq!(state.sessions, 1);
        assert_eq!(state.mode, TimerMode::Short);
        assert!(!state.active);
        assert_eq!(state.time_left, 5 * 60);

        let mut state = running(TimerMode::Focus, 1, 2);
        state.advance(1);
        assert_eq!(state.sessions, 3);
        assert_eq!(state.mode, TimerMode::Long);
        assert_eq!(state.time_left, 15 * 60);
    }

    #[test]
    fn breaks_return_to_focus() {
        let mut state = running(TimerMode::Long, 3, 3);
        state.advance(10);
        assert_eq!(state.mode, TimerMode::Focus);
        assert_eq!(state.time_left, 25 * 60);
        assert_eq!(state.sessions, 3);
    }

    #[test]
    fn catch_up_subtracts_elapsed_time() {
        let mut state = running(TimerMode::Focus, 600, 0);
        assert!(!state.catch_up(1_000_000 + 90_500));
        assert_eq!(state.time_left, 510);

        let mut paused = TimerState::default();
        assert!(!paused.catch_up(i64::MAX));
        assert_eq!(paused.time_left, 25 * 60);
    }

    #[test]
    fn adjust_clamps_to_one_minute_and_ignores_running() {
        let mut state = TimerState::default();
        state.adjust(-60 * 60);
        assert_eq!(state.time_left, 60);
        state.adjust(120);
        assert_eq!(state.time_left, 180);
        assert_eq!(state.initial_time, 180);

        state.toggle(0);
        state.adjust(600);
        assert_eq!(state.time_left, 180);
    }

    #[test]
    fn extreme_adjustments_saturate() {
        let mut state = TimerState::default();
        state.adjust(i64::MAX);
        state.adjust(i64::MAX);
        assert_eq!(state.time_left, u64::MAX);
        state.adjust(i64::MIN);
        state.adjust(i64::MIN);
        state.adjust(i64::MIN);
        assert_eq!(state.time_left, MIN_DURATION_SECS);

        state.update_settings(TimerSettings {
            work: u64::MAX,
            short: 5,
            long: 15,
        });
        assert_eq!(state.time_left, u64::MAX);

        let mut stale = running(TimerMode::Focus, 600, 0);
        stale.last_updated = i64::MIN;
        stale.catch_up(i64::MAX);
        assert_eq!(stale.mode, TimerMode::Short);
    }

    #[test]
    fn settings_change_resets_paused_timer() {
        let mut state = TimerState::default();
        state.update_settings(TimerSettings {
            work: 50,
            short: 10,
            long: 30,
        });
        assert_eq!(state.time_left, 50 * 60);
    }
}

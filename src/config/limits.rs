//! Timing and capacity limits

/// HTTP
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 10_000;

/// Update checks run hourly by default.
pub const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 3_600;

/// Polling modules (clock, focus timer) tick once a second.
pub const MODULE_TICK_MS: u64 = 1_000;

/// Preset labels longer than this are truncated on save/rename.
pub const MAX_PRESET_LABEL_CHARS: usize = 64;

/// SQLite
pub const SQLITE_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Geocoding search returns at most this many candidates.
pub const GEOCODE_RESULT_LIMIT: u8 = 5;

/// Weather auto-refresh while mounted.
pub const WEATHER_REFRESH_SECS: u64 = 15 * 60;

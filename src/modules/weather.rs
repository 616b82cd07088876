//! Current conditions and a three-day forecast from open-meteo.
//!
//! Requests run in the background through the module's scope; results that
//! arrive after unmount are discarded. Failures keep the last good data and
//! show an inline notice.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::load_or_notice;
use crate::config::limits::{GEOCODE_RESULT_LIMIT, WEATHER_REFRESH_SECS};
use crate::host::lifecycle::{
    ActionOutcome, Module, ModuleAction, ModuleContext, ModuleError, ModuleView, Notice,
};
use crate::registry::ModuleId;

const LOCATION_KEY: &str = "location";
const SAVED_KEY: &str = "saved_locations";

#[derive(Debug, Clone)]
pub struct WeatherEndpoints {
    pub forecast_url: String,
    pub geocoding_url: String,
}

impl Default for WeatherEndpoints {
    fn default() -> Self {
        Self {
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            geocoding_url: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
        }
    }
}

impl WeatherEndpoints {
    /// Both endpoints under one base URL (test servers, proxies).
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            forecast_url: format!("{base}/v1/forecast"),
            geocoding_url: format!("{base}/v1/search"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherLocation {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

impl WeatherLocation {
    fn same_place(&self, other: &WeatherLocation) -> bool {
        self.lat == other.lat && self.lon == other.lon
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temperature_2m: f64,
    pub relative_humidity_2m: f64,
    pub weather_code: i64,
    pub wind_speed_10m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastDay {
    pub date: String,
    pub code: i64,
    pub max: f64,
    pub min: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub current: CurrentWeather,
    pub days: Vec<ForecastDay>,
}

#[derive(Deserialize)]
struct ForecastResponse {
    current: CurrentWeather,
    daily: DailySeries,
}

#[derive(Deserialize)]
struct DailySeries {
    time: Vec<String>,
    weather_code: Vec<i64>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
}

#[derive(Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    name: String,
    #[serde(default)]
    country: Option<String>,
    latitude: f64,
    longitude: f64,
}

/// Icon family for a WMO weather code.
pub fn condition(code: i64) -> &'static str {
    match code {
        0 | 1 => "sun",
        2 | 3 => "cloud",
        51..=67 => "rain",
        71..=77 => "snow",
        c if c >= 95 => "storm",
        _ => "cloud",
    }
}

pub async fn fetch_forecast(
    client: &reqwest::Client,
    url: &str,
    location: &WeatherLocation,
) -> Result<Forecast, ModuleError> {
    let response: ForecastResponse = client
        .get(url)
        .query(&[
            ("latitude", location.lat.to_string()),
            ("longitude", location.lon.to_string()),
            (
                "current",
                "temperature_2m,relative_humidity_2m,weather_code,wind_speed_10m".to_string(),
            ),
            (
                "daily",
                "weather_code,temperature_2m_max,temperature_2m_min".to_string(),
            ),
            ("timezone", "auto".to_string()),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let daily = response.daily;
    // Day 0 is today; the forecast strip shows the next three.
    let days = daily
        .time
        .into_iter()
        .zip(daily.weather_code)
        .zip(daily.temperature_2m_max.into_iter().zip(daily.temperature_2m_min))
        .skip(1)
        .take(3)
        .map(|((date, code), (max, min))| ForecastDay {
            date,
            code,
            max,
            min,
        })
        .collect();
    Ok(Forecast {
        current: response.current,
        days,
    })
}

pub async fn search_locations(
    client: &reqwest::Client,
    url: &str,
    query: &str,
) -> Result<Vec<WeatherLocation>, ModuleError> {
    let response: GeocodeResponse = client
        .get(url)
        .query(&[
            ("name", query.to_string()),
            ("count", GEOCODE_RESULT_LIMIT.to_string()),
            ("language", "en".to_string()),
            ("format", "json".to_string()),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(response
        .results
        .into_iter()
        .map(|r| WeatherLocation {
            name: r.name,
            country: r.country,
            lat: r.latitude,
            lon: r.longitude,
        })
        .collect())
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherState {
    pub location: Option<WeatherLocation>,
    pub saved: Vec<WeatherLocation>,
    pub current: Option<CurrentWeather>,
    pub forecast: Vec<ForecastDay>,
    pub condition: Option<&'static str>,
    pub results: Vec<WeatherLocation>,
    pub loading: bool,
    #[serde(skip)]
    pub notice: Option<Notice>,
}

pub struct WeatherModule {
    id: ModuleId,
    endpoints: WeatherEndpoints,
    state: Arc<Mutex<WeatherState>>,
}

impl WeatherModule {
    pub fn new(endpoints: WeatherEndpoints) -> Self {
        Self {
            id: ModuleId::from("weather"),
            endpoints,
            state: Arc::new(Mutex::new(WeatherState::default())),
        }
    }

    pub fn snapshot(&self) -> WeatherState {
        self.state.lock().clone()
    }

    fn refresh(&self, ctx: &mut ModuleContext) {
        let Some(location) = self.state.lock().location.clone() else {
            return;
        };
        self.state.lock().loading = true;
        let client = ctx.http.clone();
        let url = self.endpoints.forecast_url.clone();
        let shared = self.state.clone();
        ctx.scope.spawn_guarded(
            async move { fetch_forecast(&client, &url, &location).await },
            move |result| apply_forecast(&shared, result),
        );
    }

    fn schedule_refresh(&self, ctx: &mut ModuleContext) {
        let client = ctx.http.clone();
        let url = self.endpoints.forecast_url.clone();
        let shared = self.state.clone();
        let token = ctx.token();
        ctx.scope.spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(WEATHER_REFRESH_SECS));
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(location) = shared.lock().location.clone() else {
                    continue;
                };
                tracing::debug!(target = "overdesk", place = %location.name, "auto-refreshing weather");
                let result = fetch_forecast(&client, &url, &location).await;
                if !token.is_live() {
                    break;
                }
                apply_forecast(&shared, result);
            }
        });
    }
}

fn apply_forecast(shared: &Mutex<WeatherState>, result: Result<Forecast, ModuleError>) {
    let mut state = shared.lock();
    state.loading = false;
    match result {
        Ok(forecast) => {
            state.condition = Some(condition(forecast.current.weather_code));
            state.current = Some(forecast.current);
            state.forecast = forecast.days;
            state.notice = None;
        }
        Err(err) => {
            tracing::warn!(target = "overdesk", code = err.code(), error = %err, "weather fetch failed");
            state.notice = Some(err.notice());
        }
    }
}

#[async_trait]
impl Module for WeatherModule {
    async fn mount(&mut self, ctx: &mut ModuleContext) -> Result<(), ModuleError> {
        let (location, location_notice): (Option<WeatherLocation>, _) =
            load_or_notice(&ctx.store, LOCATION_KEY)?;
        let (saved, saved_notice) = load_or_notice(&ctx.store, SAVED_KEY)?;
        {
            let mut state = self.state.lock();
            state.location = location;
            state.saved = saved;
            state.notice = location_notice.or(saved_notice);
        }
        self.refresh(ctx);
        self.schedule_refresh(ctx);
        Ok(())
    }

    fn render(&self) -> ModuleView {
        let state = self.snapshot();
        let notice = state.notice.clone();
        ModuleView::ready(&self.id, state).with_notice(notice)
    }

    async fn handle(
        &mut self,
        action: ModuleAction,
        ctx: &mut ModuleContext,
    ) -> Result<ActionOutcome, ModuleError> {
        match action.name.as_str() {
            "search" => {
                let query = action.str_arg("query")?.trim().to_string();
                if query.is_empty() {
                    return Ok(ActionOutcome::Handled);
                }
                self.state.lock().loading = true;
                let client = ctx.http.clone();
                let url = self.endpoints.geocoding_url.clone();
                let shared = self.state.clone();
                ctx.scope.spawn_guarded(
                    async move { search_locations(&client, &url, &query).await },
                    move |result| {
                        let mut state = shared.lock();
                        state.loading = false;
                        match result {
                            Ok(results) => {
                                state.results = results;
                                state.notice = None;
                            }
                            Err(err) => state.notice = Some(err.notice()),
                        }
                    },
                );
            }
            "select" => {
                let index = action.u64_arg("index")? as usize;
                let location = {
                    let mut state = self.state.lock();
                    let location = state.results.get(index).cloned().ok_or_else(|| {
                        ModuleError::InvalidAction(format!("no search result {index}"))
                    })?;
                    state.location = Some(location.clone());
                    state.results.clear();
                    location
                };
                ctx.store.put(LOCATION_KEY, &location)?;
                self.refresh(ctx);
            }
            "refresh" => self.refresh(ctx),
            "save_location" => {
                let saved = {
                    let mut state = self.state.lock();
                    let Some(current) = state.location.clone() else {
                        return Ok(ActionOutcome::Handled);
                    };
                    if state.saved.iter().any(|l| l.same_place(&current)) {
                        state.saved.retain(|l| !l.same_place(&current));
                    } else {
                        state.saved.push(current);
                    }
                    state.saved.clone()
                };
                ctx.store.put(SAVED_KEY, &saved)?;
            }
            _ => return Err(action.unknown()),
        }
        Ok(ActionOutcome::Handled)
    }
}

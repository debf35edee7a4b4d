//! Turns a raw Visual Crossing timeline payload into presentation records.
//!
//! The payload is treated as untyped JSON: the provider may omit sections,
//! and nothing here fails on a partial response. Missing current conditions
//! are reported through [`Assembled::current_conditions`] while the forecast
//! is still produced.

use chrono::{Locale, NaiveDate, TimeZone, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::AssemblyError;
use crate::model::{CurrentConditions, DailyForecast};

/// Place name used when neither geocoding nor the provider resolved one.
pub const UNKNOWN_PLACE: &str = "Неизвестное место";

/// Number of upcoming days shown, not counting today.
pub const FORECAST_DAYS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Assembled {
    pub current: Option<CurrentConditions>,
    pub forecast: Vec<DailyForecast>,
}

impl Assembled {
    pub fn current_conditions(&self) -> Result<&CurrentConditions, AssemblyError> {
        self.current.as_ref().ok_or(AssemblyError::MissingCurrentConditions)
    }
}

/// Parse a locale name such as "ru_RU", falling back to Russian.
pub fn parse_locale(name: &str) -> Locale {
    Locale::try_from(name).unwrap_or_else(|_| {
        warn!(locale = name, "Unknown locale, using ru_RU for weekday labels");
        Locale::ru_RU
    })
}

/// Normalize a provider payload.
///
/// `resolved_place` is the reverse-geocoded name, if geocoding succeeded;
/// it takes precedence over the provider's `resolvedAddress`.
pub fn assemble(payload: &Value, resolved_place: Option<&str>, locale: Locale) -> Assembled {
    let place = resolved_place
        .filter(|p| !p.is_empty())
        .or_else(|| {
            payload.get("resolvedAddress").and_then(Value::as_str).filter(|p| !p.is_empty())
        })
        .unwrap_or(UNKNOWN_PLACE);

    let current = payload
        .get("currentConditions")
        .filter(|c| c.is_object())
        .map(|c| CurrentConditions {
            place: place.to_string(),
            temperature_c: number(c, "temp"),
            feels_like_c: number(c, "feelslike"),
            condition_code: text(c, "icon"),
            wind_speed: number(c, "windspeed"),
            humidity_pct: number(c, "humidity"),
        });

    if current.is_none() {
        debug!("Payload has no current conditions");
    }

    let forecast = match payload.get("days").and_then(Value::as_array) {
        Some(days) => days
            .iter()
            .skip(1)
            .take(FORECAST_DAYS)
            .map(|day| daily_forecast(day, locale))
            .collect(),
        None => Vec::new(),
    };

    Assembled { current, forecast }
}

fn daily_forecast(day: &Value, locale: Locale) -> DailyForecast {
    let raw_date = text(day, "datetime");
    let label = weekday_label(&raw_date, locale).unwrap_or_else(|| capitalize(&raw_date));

    DailyForecast {
        label,
        temp_max_c: number(day, "tempmax"),
        temp_min_c: number(day, "tempmin"),
        condition_code: text(day, "icon"),
    }
}

/// Capitalized weekday name for a `YYYY-MM-DD` date.
pub fn weekday_label(date: &str, locale: Locale) -> Option<String> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let midnight = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?);
    let weekday = midnight.format_localized("%A", locale).to_string();
    Some(capitalize(&weekday))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn number(obj: &Value, key: &str) -> f64 {
    obj.get(key).and_then(Value::as_f64).unwrap_or_default()
}

fn text(obj: &Value, key: &str) -> String {
    obj.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

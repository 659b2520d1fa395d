use chrono::NaiveDateTime;
use clap::ValueEnum;

use crate::classify::{self, Icon};
use crate::error::{Error, Result};
use crate::units::clock::format_clock_time;
use crate::units::format_number;
use crate::units::temperature::{c2f, round_half_step};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Unit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl Unit {
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Celsius => "°C",
            Unit::Fahrenheit => "°F",
        }
    }

    /// Rounds a metric temperature and converts it for display.
    pub fn display(self, temp_c: f64) -> f64 {
        match self {
            Unit::Celsius => round_half_step(temp_c),
            Unit::Fahrenheit => c2f(round_half_step(temp_c)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Period {
    Hourly,
    #[default]
    Weekly,
}

/// Current conditions as delivered by the weather API, always metric.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub temperature: f64,
    pub feels_like: f64,
    pub precipitation: f64,
    pub wind_speed: f64,
    pub cloud_cover: f64,
    pub sunrise: String,
    pub sunset: String,
    pub icon: Option<String>,
    pub conditions: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPeriod {
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub precipitation: f64,
    pub wind_speed: f64,
    pub icon: Option<String>,
    pub conditions: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRecord {
    pub event: String,
    pub text: String,
}

/// One validated answer from the weather API.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub snapshot: WeatherSnapshot,
    pub hours: Vec<ForecastPeriod>,
    pub days: Vec<ForecastPeriod>,
    pub alerts: Vec<AlertRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRecord {
    pub temperature_text: String,
    pub unit_symbol: &'static str,
    pub city: String,
    pub precipitation_text: String,
    pub feels_like_text: String,
    pub feels_like_status: &'static str,
    pub wind_speed_text: String,
    pub wind_status: &'static str,
    pub cloud_cover_text: String,
    pub cloud_cover_status: &'static str,
    pub sunrise_text: String,
    pub sunset_text: String,
    pub icon: Icon,
    pub conditions: String,
}

pub fn prepare_display(snapshot: &WeatherSnapshot, unit: Unit) -> Result<DisplayRecord> {
    let numbers = [
        ("temp", snapshot.temperature),
        ("feelslike", snapshot.feels_like),
        ("precip", snapshot.precipitation),
        ("windspeed", snapshot.wind_speed),
        ("cloudcover", snapshot.cloud_cover),
    ];
    if let Some((name, _)) = numbers.iter().find(|(_, v)| !v.is_finite()) {
        return Err(Error::MalformedSnapshot(format!("{name} is not a number")));
    }

    let clock = |name: &str, raw: &str| {
        format_clock_time(raw)
            .map(|t| format!("{t} Uhr"))
            .ok_or_else(|| Error::MalformedSnapshot(format!("{name} {raw:?} is not a clock time")))
    };

    let city = snapshot
        .location
        .split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();

    Ok(DisplayRecord {
        temperature_text: format_number(unit.display(snapshot.temperature)),
        unit_symbol: unit.symbol(),
        city,
        precipitation_text: format!("Perc : {:.0}%", (snapshot.precipitation * 100.0).round()),
        feels_like_text: format!(
            "{}{}",
            format_number(unit.display(snapshot.feels_like)),
            unit.symbol()
        ),
        feels_like_status: classify::feels_like_status(snapshot.feels_like),
        wind_speed_text: format!("{:.0} km/h", snapshot.wind_speed.round()),
        wind_status: classify::wind_status(snapshot.wind_speed),
        cloud_cover_text: format!("{:.0}%", snapshot.cloud_cover.round()),
        cloud_cover_status: classify::cloud_cover_status(snapshot.cloud_cover),
        sunrise_text: clock("sunrise", &snapshot.sunrise)?,
        sunset_text: clock("sunset", &snapshot.sunset)?,
        icon: classify::icon_for_condition(snapshot.icon.as_deref()),
        conditions: snapshot.conditions.clone(),
    })
}

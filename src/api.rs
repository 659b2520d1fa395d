use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Endpoints;
use crate::error::{Error, Result};
use crate::weather::{AlertRecord, ForecastPeriod, WeatherReport, WeatherSnapshot};

const USER_AGENT: &str = concat!("wetter/", env!("CARGO_PKG_VERSION"));

/// The remote services the orchestrator talks to.
pub trait WeatherSource: Send + Sync {
    fn timeline(&self, city: &str) -> Result<WeatherReport>;

    fn cities(&self, country: &str) -> Result<Vec<String>>;

    fn locate(&self) -> Result<String>;
}

pub mod timeline {
    use super::*;

    #[derive(Deserialize, Debug, Default)]
    pub struct TimelineResponse {
        #[serde(rename = "resolvedAddress")]
        pub resolved_address: Option<String>,

        #[serde(rename = "currentConditions")]
        pub current_conditions: Option<Conditions>,

        #[serde(default)]
        pub days: Vec<Day>,

        #[serde(default)]
        pub alerts: Option<Vec<Alert>>,
    }

    #[derive(Deserialize, Debug, Default)]
    pub struct Conditions {
        pub temp: Option<f64>,
        pub feelslike: Option<f64>,
        pub precip: Option<f64>,
        pub windspeed: Option<f64>,
        pub cloudcover: Option<f64>,
        pub sunrise: Option<String>,
        pub sunset: Option<String>,
        pub icon: Option<String>,
        pub conditions: Option<String>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Day {
        pub datetime: String,
        pub temp: Option<f64>,
        pub precip: Option<f64>,
        pub windspeed: Option<f64>,
        pub icon: Option<String>,
        pub conditions: Option<String>,

        #[serde(default)]
        pub hours: Vec<Hour>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Hour {
        pub datetime: String,
        pub temp: Option<f64>,
        pub precip: Option<f64>,
        pub windspeed: Option<f64>,
        pub icon: Option<String>,
        pub conditions: Option<String>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Alert {
        pub event: Option<String>,
        pub headline: Option<String>,
        pub description: Option<String>,
    }

    fn required<T>(value: Option<T>, field: &str) -> Result<T> {
        value.ok_or_else(|| Error::MalformedSnapshot(format!("missing field {field}")))
    }

    fn parse_date(raw: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|e| Error::MalformedSnapshot(format!("invalid date {raw:?}: {e}")))
    }

    fn parse_time(raw: &str) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
            .map_err(|e| Error::MalformedSnapshot(format!("invalid time {raw:?}: {e}")))
    }

    impl TimelineResponse {
        /// Validates the whole payload; nothing is displayed from a partial answer.
        pub fn into_report(self) -> Result<WeatherReport> {
            let current = required(self.current_conditions, "currentConditions")?;
            let snapshot = WeatherSnapshot {
                temperature: required(current.temp, "currentConditions.temp")?,
                feels_like: required(current.feelslike, "currentConditions.feelslike")?,
                precipitation: current.precip.unwrap_or(0.0),
                wind_speed: required(current.windspeed, "currentConditions.windspeed")?,
                cloud_cover: required(current.cloudcover, "currentConditions.cloudcover")?,
                sunrise: required(current.sunrise, "currentConditions.sunrise")?,
                sunset: required(current.sunset, "currentConditions.sunset")?,
                icon: current.icon,
                conditions: current.conditions.unwrap_or_default(),
                location: required(self.resolved_address, "resolvedAddress")?,
            };

            let mut days = Vec::with_capacity(self.days.len());
            let mut hours = Vec::new();
            for (i, day) in self.days.into_iter().enumerate() {
                let date = parse_date(&day.datetime)?;
                if i == 0 {
                    for hour in day.hours {
                        hours.push(ForecastPeriod {
                            timestamp: date.and_time(parse_time(&hour.datetime)?),
                            temperature: required(hour.temp, "hours.temp")?,
                            precipitation: hour.precip.unwrap_or(0.0),
                            wind_speed: hour.windspeed.unwrap_or(0.0),
                            icon: hour.icon,
                            conditions: hour.conditions.unwrap_or_default(),
                        });
                    }
                }
                days.push(ForecastPeriod {
                    timestamp: date.and_time(NaiveTime::MIN),
                    temperature: required(day.temp, "days.temp")?,
                    precipitation: day.precip.unwrap_or(0.0),
                    wind_speed: day.windspeed.unwrap_or(0.0),
                    icon: day.icon,
                    conditions: day.conditions.unwrap_or_default(),
                });
            }
            if days.is_empty() {
                return Err(Error::MalformedSnapshot("no forecast days".to_string()));
            }

            let alerts = self
                .alerts
                .unwrap_or_default()
                .into_iter()
                .map(|a| AlertRecord {
                    event: a.event.unwrap_or_default(),
                    text: a.headline.or(a.description).unwrap_or_default(),
                })
                .collect();

            Ok(WeatherReport {
                snapshot,
                hours,
                days,
                alerts,
            })
        }
    }
}

pub mod cities {
    use super::*;

    #[derive(Serialize, Debug)]
    pub struct CitiesRequest<'a> {
        pub country: &'a str,
    }

    #[derive(Deserialize, Debug, Default)]
    pub struct CitiesResponse {
        #[serde(default)]
        pub error: bool,

        #[serde(default)]
        pub msg: String,

        #[serde(default)]
        pub data: Vec<String>,
    }

    impl CitiesResponse {
        pub fn into_cities(self) -> Result<Vec<String>> {
            if self.error {
                return Err(Error::CityList(self.msg));
            }
            Ok(self.data)
        }
    }
}

pub mod geolocation {
    use super::*;

    #[derive(Deserialize, Debug, Default)]
    pub struct IpLocation {
        pub city: Option<String>,
    }
}

/// Blocking client for Visual Crossing, CountriesNow and ipapi.
pub struct ApiClient {
    client: Client,
    api_key: String,
    endpoints: Endpoints,
}

impl ApiClient {
    pub fn new(api_key: String, endpoints: Endpoints, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            api_key,
            endpoints,
        })
    }

    fn timeline_url(&self, city: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.endpoints.weather)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", self.endpoints.weather)))?;
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(self.endpoints.weather.clone()))?
            .pop_if_empty()
            .push(city);
        url.query_pairs_mut()
            .append_pair("unitGroup", "metric")
            .append_pair("key", &self.api_key)
            .append_pair("contentType", "json");
        Ok(url)
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::Status {
            url: response.url().path().to_string(),
            status,
        })
    }
}

impl WeatherSource for ApiClient {
    fn timeline(&self, city: &str) -> Result<WeatherReport> {
        let url = self.timeline_url(city)?;
        debug!(path = %url.path(), "requesting timeline");
        let body: timeline::TimelineResponse =
            check_status(self.client.get(url).send()?)?.json()?;
        body.into_report()
    }

    fn cities(&self, country: &str) -> Result<Vec<String>> {
        debug!(url = %self.endpoints.cities, country, "requesting city list");
        let body: cities::CitiesResponse = check_status(
            self.client
                .post(&self.endpoints.cities)
                .json(&cities::CitiesRequest { country })
                .send()?,
        )?
        .json()?;
        body.into_cities()
    }

    fn locate(&self) -> Result<String> {
        debug!(url = %self.endpoints.geolocation, "requesting IP location");
        let body: geolocation::IpLocation =
            check_status(self.client.get(&self.endpoints.geolocation).send()?)?.json()?;
        body.city
            .filter(|c| !c.trim().is_empty())
            .ok_or(Error::LocationUnavailable)
    }
}

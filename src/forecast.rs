use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::classify::{icon_for_condition, Icon};
use crate::units::clock::german_weekday;
use crate::units::format_number;
use crate::units::temperature::{c2f, round_half_step};
use crate::weather::{ForecastPeriod, Period, Unit};

const HOURS_PER_DAY: usize = 24;

#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub label: String,
    pub temperature: String,
    pub unit_symbol: &'static str,
    pub icon: Icon,
    pub conditions: String,
    /// Weekly cards open a detail popup.
    pub interactive: bool,
    pub highlighted: bool,
}

fn card_temperature(temp_c: f64, unit: Unit) -> f64 {
    match unit {
        Unit::Celsius => round_half_step(temp_c),
        Unit::Fahrenheit => round_half_step(c2f(temp_c)),
    }
}

/// Builds the card strip. Hourly mode is capped at one day of entries.
pub fn render_forecast(
    periods: &[ForecastPeriod],
    unit: Unit,
    mode: Period,
    now: NaiveDateTime,
) -> Vec<CardView> {
    let count = match mode {
        Period::Hourly => periods.len().min(HOURS_PER_DAY),
        Period::Weekly => periods.len(),
    };

    periods[..count]
        .iter()
        .map(|p| {
            let (label, highlighted) = match mode {
                Period::Weekly => (german_weekday(p.timestamp.weekday()).to_string(), false),
                Period::Hourly => (
                    p.timestamp.format("%H:%M").to_string(),
                    p.timestamp.hour() == now.hour() && p.timestamp.weekday() == now.weekday(),
                ),
            };
            CardView {
                label,
                temperature: format_number(card_temperature(p.temperature, unit)),
                unit_symbol: unit.symbol(),
                icon: icon_for_condition(p.icon.as_deref()),
                conditions: p.conditions.clone(),
                interactive: mode == Period::Weekly,
                highlighted,
            }
        })
        .collect()
}

/// Popup content for one day of the weekly forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct DayDetail {
    pub title: String,
    pub lines: Vec<(&'static str, String)>,
}

impl DayDetail {
    pub fn new(day: &ForecastPeriod, unit: Unit) -> Self {
        Self {
            title: german_weekday(day.timestamp.weekday()).to_string(),
            lines: vec![
                (
                    "Temperatur",
                    format!(
                        "{}{}",
                        format_number(card_temperature(day.temperature, unit)),
                        unit.symbol()
                    ),
                ),
                (
                    "Windgeschwindigkeit",
                    format!("{} km/h", format_number(round_half_step(day.wind_speed))),
                ),
                (
                    "Niederschlag",
                    format!("{} mm", format_number(round_half_step(day.precipitation))),
                ),
                ("Bedingungen", day.conditions.clone()),
            ],
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    pub(crate) fn hours_from(start: NaiveDateTime, count: usize) -> Vec<ForecastPeriod> {
        (0..count)
            .map(|i| ForecastPeriod {
                timestamp: start + Duration::hours(i as i64),
                temperature: 10.0 + i as f64 * 0.1,
                precipitation: 0.0,
                wind_speed: 12.0,
                icon: Some("clear-day".to_string()),
                conditions: "Clear".to_string(),
            })
            .collect()
    }

    fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_hourly_is_capped_at_24_cards() {
        // Monday 2024-01-15
        let start = midnight(2024, 1, 15);
        let periods = hours_from(start, 30);

        let hourly = render_forecast(&periods, Unit::Celsius, Period::Hourly, start);
        assert_eq!(hourly.len(), 24);
        assert_eq!(hourly[0].label, "00:00");
        assert_eq!(hourly[23].label, "23:00");
        assert!(hourly.iter().all(|c| !c.interactive));

        let weekly = render_forecast(&periods, Unit::Celsius, Period::Weekly, start);
        assert_eq!(weekly.len(), 30);
        assert!(weekly.iter().all(|c| c.interactive && !c.highlighted));
    }

    #[test]
    fn test_hourly_handles_short_input() {
        let start = midnight(2024, 1, 15);
        let cards = render_forecast(&hours_from(start, 5), Unit::Celsius, Period::Hourly, start);
        assert_eq!(cards.len(), 5);
    }

    #[test]
    fn test_current_hour_is_highlighted() {
        let start = midnight(2024, 1, 15);
        let now = start + Duration::minutes(14 * 60 + 25);
        let cards = render_forecast(&hours_from(start, 24), Unit::Celsius, Period::Hourly, now);

        let highlighted: Vec<_> = cards.iter().filter(|c| c.highlighted).collect();
        assert_eq!(highlighted.len(), 1);
        assert_eq!(highlighted[0].label, "14:00");

        // a different weekday at the same hour matches nothing
        let tuesday = now + Duration::days(1);
        let cards = render_forecast(
            &hours_from(start, 24),
            Unit::Celsius,
            Period::Hourly,
            tuesday,
        );
        assert!(cards.iter().all(|c| !c.highlighted));
    }

    #[test]
    fn test_weekly_labels_and_units() {
        let days: Vec<_> = (0..3)
            .map(|i| ForecastPeriod {
                timestamp: midnight(2024, 1, 14) + Duration::days(i),
                temperature: 0.0,
                precipitation: 1.2,
                wind_speed: 20.4,
                icon: Some("rain".to_string()),
                conditions: "Rain".to_string(),
            })
            .collect();

        let cards = render_forecast(&days, Unit::Fahrenheit, Period::Weekly, midnight(2024, 1, 14));
        let labels: Vec<_> = cards.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["Sonntag", "Montag", "Dienstag"]);
        assert_eq!(cards[0].temperature, "32");
        assert_eq!(cards[0].unit_symbol, "°F");
        assert_eq!(cards[0].icon, Icon::Rain);
        assert_eq!(cards[0].conditions, "Rain");
    }

    #[test]
    fn test_card_just_below_freezing() {
        let day = ForecastPeriod {
            temperature: -0.1,
            ..hours_from(midnight(2024, 1, 15), 1).remove(0)
        };
        let cards = render_forecast(&[day], Unit::Celsius, Period::Weekly, midnight(2024, 1, 15));
        assert_eq!(cards[0].temperature, "0");
    }

    #[test]
    fn test_day_detail() {
        let day = ForecastPeriod {
            timestamp: midnight(2024, 1, 16),
            temperature: 6.75,
            precipitation: 5.5,
            wind_speed: 20.0,
            icon: None,
            conditions: "Rain, Overcast".to_string(),
        };
        let detail = DayDetail::new(&day, Unit::Celsius);
        assert_eq!(detail.title, "Dienstag");
        assert_eq!(
            detail.lines,
            vec![
                ("Temperatur", "6.5°C".to_string()),
                ("Windgeschwindigkeit", "20 km/h".to_string()),
                ("Niederschlag", "6 mm".to_string()),
                ("Bedingungen", "Rain, Overcast".to_string()),
            ]
        );
    }
}

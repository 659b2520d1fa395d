use std::path::PathBuf;

use clap::builder::{styling::AnsiColor, Styles};
use clap::Parser;

use crate::weather::{Period, Unit};

const ABOUT: &str = "Weather TUI powered by Visual Crossing";

const LONG_ABOUT: &str = "
TUI for viewing current conditions, hourly and weekly forecasts and weather alerts for a city.

The city is saved, so subsequent runs of `wetter` will use the last city unless otherwise
specified. Without a saved city the default city from the config file is shown (Hamburg).

A Visual Crossing API key is required. Pass it with --api-key or set `api_key` in the config file
(see --config).

Keys: c/f unit, h/w hourly/weekly, / search, a alerts, l locate via IP, r retry, q quit.
";

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default())
    .usage(AnsiColor::Green.on_default())
    .literal(AnsiColor::Green.on_default())
    .placeholder(AnsiColor::Green.on_default());

#[derive(Parser, Debug)]
#[command(version, styles=STYLES, about=ABOUT, long_about = LONG_ABOUT)]
pub struct Args {
    #[arg(help = "City to show (e.g. Berlin, München, etc.)")]
    pub city: Option<String>,

    #[arg(long, value_enum, default_value_t = Unit::Celsius, help = "Temperature unit")]
    pub unit: Unit,

    #[arg(long, value_enum, default_value_t = Period::Weekly, help = "Forecast period shown first")]
    pub period: Period,

    #[arg(long, help = "Visual Crossing API key (overrides the config file)")]
    pub api_key: Option<String>,

    #[arg(long, help = "Path of the config file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Write logs to this file instead of the config directory")]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["wetter"]).unwrap();
        assert_eq!(args.city, None);
        assert_eq!(args.unit, Unit::Celsius);
        assert_eq!(args.period, Period::Weekly);
    }

    #[test]
    fn test_city_and_flags() {
        let args = Args::try_parse_from([
            "wetter",
            "Frankfurt am Main",
            "--unit",
            "fahrenheit",
            "--period",
            "hourly",
            "--api-key",
            "XYZ",
        ])
        .unwrap();
        assert_eq!(args.city.as_deref(), Some("Frankfurt am Main"));
        assert_eq!(args.unit, Unit::Fahrenheit);
        assert_eq!(args.period, Period::Hourly);
        assert_eq!(args.api_key.as_deref(), Some("XYZ"));
    }
}

pub mod temperature {
    /// Rounds to the nearest whole number, except that fractions in the 0.2-0.5 and
    /// 0.7-0.8 bands snap to the half step and 0.8-1.0 snaps up.
    pub fn round_half_step(value: f64) -> f64 {
        let floor = value.floor();
        let decimal = value - floor;
        if (0.3..0.5).contains(&decimal) {
            floor + 0.5
        } else if (0.8..1.0).contains(&decimal) {
            value.ceil()
        } else if (0.2..0.3).contains(&decimal) || (0.7..0.8).contains(&decimal) {
            floor + 0.5
        } else {
            // half-up, so -2.5 goes to -2
            (value + 0.5).floor()
        }
    }

    pub fn c2f(temp_c: f64) -> f64 {
        round_half_step(temp_c * 9.0 / 5.0 + 32.0)
    }

    // Not used by the display flow; Visual Crossing always answers in metric.
    pub fn f2c(temp_f: f64) -> f64 {
        round_half_step((temp_f - 32.0) * 5.0 / 9.0)
    }

    #[test]
    fn test_temperature() {
        assert_eq!(f2c(212.0), 100.0);
        assert_eq!(f2c(32.0), 0.0);
        assert_eq!(c2f(0.0), 32.0);
        assert_eq!(c2f(100.0), 212.0);
    }

    #[test]
    fn test_round_half_step_standard_bands() {
        assert_eq!(round_half_step(12.0), 12.0);
        assert_eq!(round_half_step(12.1), 12.0);
        assert_eq!(round_half_step(12.5), 13.0);
        assert_eq!(round_half_step(12.6), 13.0);
        assert_eq!(round_half_step(-2.5), -2.0);
    }

    #[test]
    fn test_round_half_step_snapping_bands() {
        assert_eq!(round_half_step(12.25), 12.5);
        assert_eq!(round_half_step(12.4), 12.5);
        assert_eq!(round_half_step(12.75), 12.5);
        assert_eq!(round_half_step(12.85), 13.0);
        assert_eq!(round_half_step(12.99), 13.0);
        assert_eq!(round_half_step(-0.6), -0.5);
    }

    #[test]
    fn test_round_half_step_stays_within_half() {
        let mut v = -40.0;
        while v < 40.0 {
            assert!((round_half_step(v) - v).abs() <= 0.5, "{v}");
            v += 0.037;
        }
    }
}

pub mod clock {
    use chrono::Weekday;

    /// Turns "7:5" or "07:05:33" into "07:05". Seconds are dropped.
    pub fn format_clock_time(raw: &str) -> Option<String> {
        let mut fields = raw.trim().split(':');
        let hour: u32 = fields.next()?.parse().ok()?;
        let minute: u32 = fields.next()?.parse().ok()?;
        Some(format!("{hour:02}:{minute:02}"))
    }

    pub fn german_weekday(day: Weekday) -> &'static str {
        match day {
            Weekday::Sun => "Sonntag",
            Weekday::Mon => "Montag",
            Weekday::Tue => "Dienstag",
            Weekday::Wed => "Mittwoch",
            Weekday::Thu => "Donnerstag",
            Weekday::Fri => "Freitag",
            Weekday::Sat => "Samstag",
        }
    }

    #[test]
    fn test_format_clock_time() {
        assert_eq!(format_clock_time("7:5").as_deref(), Some("07:05"));
        assert_eq!(format_clock_time("07:12:33").as_deref(), Some("07:12"));
        assert_eq!(format_clock_time("18:45").as_deref(), Some("18:45"));
        assert_eq!(format_clock_time("1845"), None);
        assert_eq!(format_clock_time("ab:cd"), None);
    }
}

/// Prints 13.0 as "13" and 12.5 as "12.5".
pub fn format_number(value: f64) -> String {
    // -0.0 prints as "-0"
    let value = value + 0.0;
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

#[test]
fn test_format_number() {
    assert_eq!(format_number(13.0), "13");
    assert_eq!(format_number(12.5), "12.5");
    assert_eq!(format_number(-0.5), "-0.5");
}

#[test]
fn test_format_number_just_below_zero() {
    assert_eq!(format_number(temperature::round_half_step(-0.1)), "0");
    assert_eq!(format_number(temperature::round_half_step(-0.15)), "0");
    assert_eq!(format_number(-0.0), "0");
}

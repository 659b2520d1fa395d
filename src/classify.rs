const ICON_DIR: &str = "./assets/icon/icons";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    PartlyCloudyDay,
    PartlyCloudyNight,
    Rain,
    Sun,
    Night,
    Clouds,
}

impl Icon {
    /// Asset path used by the web version of the widget.
    pub fn path(self) -> String {
        let file = match self {
            Icon::PartlyCloudyDay => "partly-cloudy-day-64.png",
            Icon::PartlyCloudyNight => "cloudy-night-64.png",
            Icon::Rain => "rain-64.png",
            Icon::Sun => "sun-64.png",
            Icon::Night => "night-64.png",
            Icon::Clouds => "clouds-64.png",
        };
        format!("{ICON_DIR}/{file}")
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Icon::PartlyCloudyDay => "⛅",
            Icon::PartlyCloudyNight => "☁☾",
            Icon::Rain => "☂",
            Icon::Sun => "☀",
            Icon::Night => "☾",
            Icon::Clouds => "☁",
        }
    }
}

pub fn icon_for_condition(code: Option<&str>) -> Icon {
    match code {
        Some("partly-cloudy-day") => Icon::PartlyCloudyDay,
        Some("partly-cloudy-night") => Icon::PartlyCloudyNight,
        Some("rain") => Icon::Rain,
        Some("clear-day") => Icon::Sun,
        Some("clear-night") => Icon::Night,
        _ => Icon::Clouds,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertClass {
    pub icon: String,
    pub title: &'static str,
    pub description: &'static str,
}

// First match wins: an "icy frost" event is Glatteis.
const ALERT_KEYWORDS: [(&str, &str, &str, &str); 4] = [
    (
        "icy",
        "icy-street.png",
        "Glatteis",
        "Es besteht die Gefahr von Glatteis",
    ),
    (
        "frost",
        "frost.png",
        "Frost",
        "Offizielle Warnung vor Frost",
    ),
    (
        "snowfall",
        "snowfall.png",
        "Schneefall",
        "Es besteht die Gefahr von Schneefall",
    ),
    (
        "wind",
        "windy.png",
        "Windböen",
        "Es besteht die Gefahr von Windböen",
    ),
];

pub fn classify_alert(event: &str) -> AlertClass {
    let event = event.to_lowercase();
    ALERT_KEYWORDS
        .iter()
        .find(|(keyword, ..)| event.contains(*keyword))
        .map(|&(_, icon, title, description)| AlertClass {
            icon: format!("{ICON_DIR}/{icon}"),
            title,
            description,
        })
        .unwrap_or_else(|| AlertClass {
            icon: format!("{ICON_DIR}/no-warnings.png"),
            title: "Derzeit keine Warnungen",
            description: "",
        })
}

pub fn cloud_cover_status(percent: f64) -> &'static str {
    if percent < 25.0 {
        "klar"
    } else if percent < 50.0 {
        "leicht bewölkt"
    } else if percent < 75.0 {
        "bewölkt"
    } else {
        "bedeckt"
    }
}

pub fn feels_like_status(temp_c: f64) -> &'static str {
    if temp_c < 3.0 {
        "sehr kalt"
    } else if temp_c < 5.0 {
        "kalt"
    } else if temp_c < 10.0 {
        "angenehm"
    } else if temp_c < 20.0 {
        "warm"
    } else {
        "heiß"
    }
}

pub fn wind_status(kmh: f64) -> &'static str {
    if kmh < 20.0 {
        "leicht"
    } else if kmh < 50.0 {
        "mäßig"
    } else if kmh < 70.0 {
        "stark"
    } else {
        "sehr stark"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_lookup() {
        assert_eq!(icon_for_condition(Some("clear-day")), Icon::Sun);
        assert_eq!(
            icon_for_condition(Some("clear-day")).path(),
            "./assets/icon/icons/sun-64.png"
        );
        assert_eq!(icon_for_condition(Some("rain")), Icon::Rain);
        assert_eq!(
            icon_for_condition(Some("partly-cloudy-night")),
            Icon::PartlyCloudyNight
        );
    }

    #[test]
    fn test_unknown_icon_falls_back_to_clouds() {
        assert_eq!(icon_for_condition(Some("fog")), Icon::Clouds);
        assert_eq!(icon_for_condition(None), Icon::Clouds);
        assert_eq!(
            icon_for_condition(Some("fog")).path(),
            "./assets/icon/icons/clouds-64.png"
        );
    }

    #[test]
    fn test_alert_precedence() {
        let alert = classify_alert("Icy Frost Warning");
        assert_eq!(alert.title, "Glatteis");
        assert_eq!(alert.icon, "./assets/icon/icons/icy-street.png");

        assert_eq!(classify_alert("Frost warning").title, "Frost");
        assert_eq!(classify_alert("Heavy SNOWFALL").title, "Schneefall");
        assert_eq!(classify_alert("Strong wind").title, "Windböen");
    }

    #[test]
    fn test_alert_keyword_edge_cases() {
        let alert = classify_alert("Wind-less fog");
        assert_eq!(alert.title, "Windböen");

        let alert = classify_alert("Gusts expected");
        assert_eq!(alert.title, "Derzeit keine Warnungen");
        assert_eq!(alert.description, "");
    }

    #[test]
    fn test_threshold_buckets() {
        assert_eq!(cloud_cover_status(0.0), "klar");
        assert_eq!(cloud_cover_status(25.0), "leicht bewölkt");
        assert_eq!(cloud_cover_status(74.9), "bewölkt");
        assert_eq!(cloud_cover_status(100.0), "bedeckt");

        assert_eq!(feels_like_status(-5.0), "sehr kalt");
        assert_eq!(feels_like_status(3.0), "kalt");
        assert_eq!(feels_like_status(9.9), "angenehm");
        assert_eq!(feels_like_status(10.0), "warm");
        assert_eq!(feels_like_status(20.0), "heiß");

        assert_eq!(wind_status(5.0), "leicht");
        assert_eq!(wind_status(20.0), "mäßig");
        assert_eq!(wind_status(69.0), "stark");
        assert_eq!(wind_status(90.0), "sehr stark");
    }
}

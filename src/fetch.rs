use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::api::WeatherSource;
use crate::config::PreferenceStore;
use crate::error::Result;
use crate::forecast::{render_forecast, CardView};
use crate::weather::{
    prepare_display, AlertRecord, DisplayRecord, ForecastPeriod, Period, Unit, WeatherReport,
};

const NOTICE_TTL: Duration = Duration::from_secs(2);

/// Everything a single weather request depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayState {
    pub city: String,
    pub unit: Unit,
    pub period: Period,
}

/// A fully prepared screen. Swapped in whole or not at all.
#[derive(Debug, Clone)]
pub struct WeatherView {
    pub params: DisplayState,
    pub display: DisplayRecord,
    pub cards: Vec<CardView>,
    pub days: Vec<ForecastPeriod>,
    pub alerts: Vec<AlertRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error { retryable: bool },
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
    created: Instant,
}

impl Notice {
    fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NoticeKind::Info,
            created: Instant::now(),
        }
    }

    fn error(text: impl Into<String>, retryable: bool) -> Self {
        Self {
            text: text.into(),
            kind: NoticeKind::Error { retryable },
            created: Instant::now(),
        }
    }

    fn expired(&self) -> bool {
        self.kind == NoticeKind::Info && self.created.elapsed() >= NOTICE_TTL
    }
}

pub enum Message {
    Weather {
        seq: u64,
        params: DisplayState,
        result: Result<WeatherReport>,
    },
    Cities(Result<Vec<String>>),
    Location(Result<String>),
}

pub struct Orchestrator {
    source: Arc<dyn WeatherSource>,
    prefs: PreferenceStore,
    default_city: String,
    state: DisplayState,
    latest_seq: u64,
    pending: bool,
    view: Option<WeatherView>,
    notice: Option<Notice>,
    blocking_message: Option<String>,
    cities: Option<Vec<String>>,
    tx: Sender<Message>,
    rx: Receiver<Message>,
    clock: fn() -> NaiveDateTime,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn WeatherSource>,
        prefs: PreferenceStore,
        default_city: String,
        state: DisplayState,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            prefs,
            default_city,
            state,
            latest_seq: 0,
            pending: false,
            view: None,
            notice: None,
            blocking_message: None,
            cities: None,
            tx,
            rx,
            clock: local_now,
        }
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn view(&self) -> Option<&WeatherView> {
        self.view.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn blocking_message(&self) -> Option<&str> {
        self.blocking_message.as_deref()
    }

    pub fn dismiss_message(&mut self) {
        self.blocking_message = None;
    }

    /// The city list, once it has arrived. Taken by the search box.
    pub fn take_cities(&mut self) -> Option<Vec<String>> {
        self.cities.take()
    }

    /// Starts a fetch for `params`; the state reflects it immediately.
    pub fn request(&mut self, params: DisplayState) -> u64 {
        self.latest_seq += 1;
        let seq = self.latest_seq;
        self.state = params.clone();
        self.pending = true;
        info!(seq, city = %params.city, unit = ?params.unit, period = ?params.period, "fetching weather");

        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = source.timeline(&params.city);
            // the receiver only goes away on shutdown
            let _ = tx.send(Message::Weather {
                seq,
                params,
                result,
            });
        });
        seq
    }

    pub fn retry(&mut self) -> u64 {
        self.request(self.state.clone())
    }

    pub fn set_unit(&mut self, unit: Unit) {
        if self.state.unit != unit {
            self.request(DisplayState {
                unit,
                ..self.state.clone()
            });
        }
    }

    pub fn set_period(&mut self, period: Period) {
        if self.state.period != period {
            self.request(DisplayState {
                period,
                ..self.state.clone()
            });
        }
    }

    pub fn search(&mut self, city: String) {
        self.request(DisplayState {
            city,
            ..self.state.clone()
        });
    }

    pub fn load_cities(&self, country: &str) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let country = country.to_string();
        thread::spawn(move || {
            let _ = tx.send(Message::Cities(source.cities(&country)));
        });
    }

    pub fn locate(&self) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let _ = tx.send(Message::Location(source.locate()));
        });
    }

    /// Applies every message that has already arrived.
    pub fn drain(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            self.handle(message);
        }
        if self.notice.as_ref().is_some_and(Notice::expired) {
            self.notice = None;
        }
    }

    /// Waits up to `timeout` for one message. Returns false on timeout.
    pub fn pump(&mut self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(message) => {
                self.handle(message);
                true
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        }
    }

    pub fn handle(&mut self, message: Message) {
        match message {
            Message::Weather {
                seq,
                params,
                result,
            } => self.apply_weather(seq, params, result),
            Message::Cities(Ok(cities)) => {
                info!(count = cities.len(), "city list loaded");
                self.cities = Some(cities);
            }
            Message::Cities(Err(e)) => {
                warn!(error = %e, "could not load city list");
                self.notice = Some(Notice::error(
                    "Städteliste konnte nicht geladen werden",
                    false,
                ));
            }
            Message::Location(Ok(city)) => {
                info!(city = %city, "location resolved over IP");
                if let Err(e) = self.prefs.save_city(&city) {
                    warn!(error = %e, "could not persist last city");
                }
                self.search(city);
            }
            Message::Location(Err(e)) => {
                warn!(error = %e, "location lookup failed");
                self.search(self.default_city.clone());
                self.blocking_message = Some(
                    "Wir konnten Ihren Standort leider nicht abrufen. \
                     Bitte suchen Sie ihn manuell über unser Suchfeld."
                        .to_string(),
                );
            }
        }
    }

    fn apply_weather(
        &mut self,
        seq: u64,
        params: DisplayState,
        result: Result<WeatherReport>,
    ) {
        if seq != self.latest_seq {
            debug!(seq, latest = self.latest_seq, city = %params.city, "dropping stale response");
            return;
        }
        self.pending = false;

        match result.and_then(|report| self.build_view(params, report)) {
            Ok(view) => {
                info!(seq, city = %view.display.city, "weather updated");
                self.view = Some(view);
                if matches!(self.notice, Some(Notice { kind: NoticeKind::Error { .. }, .. })) {
                    self.notice = None;
                }
            }
            Err(e) => {
                warn!(seq, error = %e, "weather request failed");
                self.notice = Some(Notice::error(
                    format!("Wetterdaten nicht verfügbar: {e}"),
                    e.is_transient(),
                ));
            }
        }
    }

    fn build_view(
        &self,
        params: DisplayState,
        report: WeatherReport,
    ) -> Result<WeatherView> {
        let display = prepare_display(&report.snapshot, params.unit)?;
        let periods = match params.period {
            Period::Hourly => &report.hours,
            Period::Weekly => &report.days,
        };
        let cards = render_forecast(periods, params.unit, params.period, (self.clock)());
        Ok(WeatherView {
            params,
            display,
            cards,
            days: report.days,
            alerts: report.alerts,
        })
    }

    pub fn show_info(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice::info(text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::tests::hours_from;
    use crate::weather::tests::snapshot;
    use crate::error::Error;
    use crate::weather::WeatherSnapshot;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const WAIT: Duration = Duration::from_secs(5);

    /// Serves canned reports. Cities listed in `gates` block until released.
    #[derive(Default)]
    struct FakeSource {
        reports: HashMap<String, WeatherReport>,
        gates: Mutex<HashMap<String, Receiver<()>>>,
        unavailable: Vec<String>,
        location: Option<String>,
    }

    impl FakeSource {
        fn with_cities(names: &[&str]) -> Self {
            let reports = names
                .iter()
                .map(|name| (name.to_string(), report_for(name)))
                .collect();
            Self {
                reports,
                ..Default::default()
            }
        }

        fn gate(&self, city: &str) -> Sender<()> {
            let (tx, rx) = mpsc::channel();
            self.gates.lock().unwrap().insert(city.to_string(), rx);
            tx
        }
    }

    impl WeatherSource for FakeSource {
        fn timeline(&self, city: &str) -> Result<WeatherReport> {
            let gate = self.gates.lock().unwrap().remove(city);
            if let Some(gate) = gate {
                let _ = gate.recv();
            }
            if self.unavailable.iter().any(|c| c == city) {
                return Err(Error::Status {
                    url: format!("/timeline/{city}"),
                    status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                });
            }
            self.reports.get(city).cloned().ok_or(Error::Status {
                url: format!("/timeline/{city}"),
                status: reqwest::StatusCode::BAD_REQUEST,
            })
        }

        fn cities(&self, _country: &str) -> Result<Vec<String>> {
            Ok(vec!["Berlin".to_string(), "Bern".to_string()])
        }

        fn locate(&self) -> Result<String> {
            self.location.clone().ok_or(Error::LocationUnavailable)
        }
    }

    fn report_for(city: &str) -> WeatherReport {
        let start = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        WeatherReport {
            snapshot: WeatherSnapshot {
                location: format!("{city}, Deutschland"),
                ..snapshot()
            },
            hours: hours_from(start, 30),
            days: hours_from(start, 7),
            alerts: vec![AlertRecord {
                event: "frost".to_string(),
                text: format!("Frost in {city}"),
            }],
        }
    }

    fn orchestrator(source: Arc<FakeSource>, dir: &tempfile::TempDir) -> Orchestrator {
        let mut orch = Orchestrator::new(
            source,
            PreferenceStore::new(dir.path().join("state.toml")),
            "Hamburg".to_string(),
            DisplayState {
                city: "Hamburg".to_string(),
                unit: Unit::Celsius,
                period: Period::Weekly,
            },
        );
        orch.clock = || {
            NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(5, 30, 0)
                .unwrap()
        };
        orch
    }

    fn shown_city(orch: &Orchestrator) -> Option<&str> {
        orch.view().map(|v| v.display.city.as_str())
    }

    #[test]
    fn test_fetch_and_render() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(Arc::new(FakeSource::with_cities(&["Hamburg"])), &dir);

        orch.retry();
        assert!(orch.is_loading());
        assert!(orch.pump(WAIT));
        assert!(!orch.is_loading());

        let view = orch.view().unwrap();
        assert_eq!(view.display.city, "Hamburg");
        assert_eq!(view.cards.len(), 7);
        assert!(view.cards.iter().all(|c| c.interactive));
        assert_eq!(view.alerts.len(), 1);
    }

    #[test]
    fn test_period_toggle_refetches_hourly() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(Arc::new(FakeSource::with_cities(&["Hamburg"])), &dir);

        orch.set_period(Period::Weekly);
        assert!(!orch.is_loading(), "same period must not refetch");

        orch.set_period(Period::Hourly);
        assert!(orch.pump(WAIT));
        let view = orch.view().unwrap();
        assert_eq!(view.cards.len(), 24);
        assert_eq!(view.cards.iter().filter(|c| c.highlighted).count(), 1);
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(FakeSource::with_cities(&["Berlin", "Hamburg"]));
        let release_berlin = source.gate("Berlin");
        let mut orch = orchestrator(Arc::clone(&source), &dir);

        orch.search("Berlin".to_string());
        orch.search("Hamburg".to_string());
        assert_eq!(orch.state().city, "Hamburg");

        assert!(orch.pump(WAIT));
        assert_eq!(shown_city(&orch), Some("Hamburg"));

        release_berlin.send(()).unwrap();
        assert!(orch.pump(WAIT));
        assert_eq!(shown_city(&orch), Some("Hamburg"));
        assert_eq!(orch.state().city, "Hamburg");
    }

    #[test]
    fn test_failure_keeps_previous_view() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(Arc::new(FakeSource::with_cities(&["Hamburg"])), &dir);

        orch.retry();
        assert!(orch.pump(WAIT));

        orch.search("Atlantis".to_string());
        assert!(orch.pump(WAIT));
        assert_eq!(shown_city(&orch), Some("Hamburg"));
        let notice = orch.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error { retryable: false });
        assert_eq!(orch.state().city, "Atlantis");
    }

    #[test]
    fn test_server_error_is_retryable() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource {
            unavailable: vec!["Hamburg".to_string()],
            ..FakeSource::with_cities(&["Hamburg"])
        };
        let mut orch = orchestrator(Arc::new(source), &dir);

        orch.retry();
        assert!(orch.pump(WAIT));
        assert!(orch.view().is_none());
        assert_eq!(
            orch.notice().unwrap().kind,
            NoticeKind::Error { retryable: true }
        );
    }

    #[test]
    fn test_malformed_report_is_rejected_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = FakeSource::with_cities(&["Hamburg", "Kiel"]);
        if let Some(report) = source.reports.get_mut("Kiel") {
            report.snapshot.sunrise = "dawn".to_string();
        }
        let mut orch = orchestrator(Arc::new(source), &dir);

        orch.retry();
        assert!(orch.pump(WAIT));
        orch.search("Kiel".to_string());
        assert!(orch.pump(WAIT));

        let view = orch.view().unwrap();
        assert_eq!(view.display.city, "Hamburg");
        assert_eq!(view.params.city, "Hamburg");
        assert_eq!(
            orch.notice().unwrap().kind,
            NoticeKind::Error { retryable: false }
        );
    }

    #[test]
    fn test_location_success_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource {
            location: Some("Berlin".to_string()),
            ..FakeSource::with_cities(&["Berlin"])
        };
        let mut orch = orchestrator(Arc::new(source), &dir);

        orch.locate();
        assert!(orch.pump(WAIT));
        assert_eq!(orch.state().city, "Berlin");
        assert!(orch.pump(WAIT));
        assert_eq!(shown_city(&orch), Some("Berlin"));

        let prefs = PreferenceStore::new(dir.path().join("state.toml"));
        assert_eq!(prefs.last_city().as_deref(), Some("Berlin"));
    }

    #[test]
    fn test_location_failure_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(Arc::new(FakeSource::with_cities(&["Hamburg"])), &dir);
        orch.search("Bremen".to_string());

        orch.locate();
        // the Bremen failure and the location failure, in either order
        assert!(orch.pump(WAIT));
        assert!(orch.pump(WAIT));
        assert!(orch.blocking_message().is_some());
        assert_eq!(orch.state().city, "Hamburg");

        while shown_city(&orch).is_none() {
            assert!(orch.pump(WAIT));
        }
        assert_eq!(shown_city(&orch), Some("Hamburg"));

        orch.dismiss_message();
        assert!(orch.blocking_message().is_none());
    }

    #[test]
    fn test_city_list_arrives_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(Arc::new(FakeSource::default()), &dir);

        orch.load_cities("Germany");
        assert!(orch.pump(WAIT));
        assert_eq!(orch.take_cities().unwrap(), ["Berlin", "Bern"]);
        assert!(orch.take_cities().is_none());
    }
}

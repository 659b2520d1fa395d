use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use std::io;
use std::time::Duration;

use chrono::Local;
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, Wrap},
    Frame, Terminal,
};
use tracing::debug;

use crate::classify::classify_alert;
use crate::fetch::{NoticeKind, Orchestrator, WeatherView};
use crate::forecast::{CardView, DayDetail};
use crate::search::Autocomplete;
use crate::weather::{DisplayRecord, Period, Unit};

const MISSING: &str = "--";
const TICK: Duration = Duration::from_millis(100);
const CARD_WIDTH: u16 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overlay {
    None,
    Alerts,
    Day(usize),
    LocationPrompt,
}

pub struct App {
    orchestrator: Orchestrator,
    search: Autocomplete,
    mode: Mode,
    overlay: Overlay,
    selected_day: usize,
}

impl App {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            search: Autocomplete::default(),
            mode: Mode::Normal,
            overlay: Overlay::None,
            selected_day: 0,
        }
    }

    fn tick(&mut self) {
        self.orchestrator.drain();
        if let Some(cities) = self.orchestrator.take_cities() {
            self.search.set_cities(cities);
        }
    }

    fn weekly_cards(&self) -> usize {
        match self.orchestrator.view() {
            Some(view) if view.params.period == Period::Weekly => view.cards.len(),
            _ => 0,
        }
    }

    /// Returns false when the user asked to quit.
    fn on_key(&mut self, key: KeyEvent) -> bool {
        if self.orchestrator.blocking_message().is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.orchestrator.dismiss_message();
            }
            return true;
        }
        match self.mode {
            Mode::Search => self.on_search_key(key),
            Mode::Normal if self.overlay != Overlay::None => self.on_overlay_key(key),
            Mode::Normal => return self.on_normal_key(key),
        }
        true
    }

    fn on_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) => self.search.push_char(c),
            KeyCode::Backspace => self.search.pop_char(),
            KeyCode::Down => self.search.focus_next(),
            KeyCode::Up => self.search.focus_prev(),
            KeyCode::Enter => {
                if let Some(city) = self.search.enter() {
                    debug!(city = %city, "search committed");
                    self.orchestrator.search(city);
                    self.mode = Mode::Normal;
                }
            }
            KeyCode::Esc => {
                self.search.clear();
                self.mode = Mode::Normal;
            }
            _ => {}
        }
    }

    fn on_overlay_key(&mut self, key: KeyEvent) {
        match (self.overlay, key.code) {
            (Overlay::LocationPrompt, KeyCode::Char('j' | 'y')) => {
                self.overlay = Overlay::None;
                self.orchestrator.show_info("Standort wird ermittelt…");
                self.orchestrator.locate();
            }
            (_, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q' | 'n')) => {
                self.overlay = Overlay::None;
            }
            _ => {}
        }
    }

    fn on_normal_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return false,
            KeyCode::Char('c') => self.orchestrator.set_unit(Unit::Celsius),
            KeyCode::Char('f') => self.orchestrator.set_unit(Unit::Fahrenheit),
            KeyCode::Char('h') => self.orchestrator.set_period(Period::Hourly),
            KeyCode::Char('w') => self.orchestrator.set_period(Period::Weekly),
            KeyCode::Char('/') | KeyCode::Char('s') => self.mode = Mode::Search,
            KeyCode::Char('a') => self.overlay = Overlay::Alerts,
            KeyCode::Char('l') => self.overlay = Overlay::LocationPrompt,
            KeyCode::Char('r') => {
                self.orchestrator.retry();
            }
            KeyCode::Left => self.selected_day = self.selected_day.saturating_sub(1),
            KeyCode::Right => {
                if self.selected_day + 1 < self.weekly_cards() {
                    self.selected_day += 1;
                }
            }
            KeyCode::Enter if self.weekly_cards() > 0 => {
                self.overlay = Overlay::Day(self.selected_day.min(self.weekly_cards() - 1));
            }
            _ => {}
        }
        true
    }
}

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        app.tick();
        terminal.draw(|f| ui(f, app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !app.on_key(key) {
                    return Ok(());
                }
            }
        }
    }
}

fn bordered(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(Color::Yellow),
        ))
        .title_alignment(Alignment::Left)
        .border_style(Style::default().fg(Color::Cyan))
        .border_type(BorderType::Rounded)
}

fn value_style() -> Style {
    Style::default().fg(Color::Green)
}

fn toggle<'a>(active: bool, label: &'a str) -> Span<'a> {
    if active {
        Span::styled(
            format!("[{label}]"),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::raw(format!(" {label} "))
    }
}

fn display_headline(app: &App) -> Paragraph<'_> {
    let state = app.orchestrator.state();
    let city = app
        .orchestrator
        .view()
        .map_or(state.city.as_str(), |v| v.display.city.as_str());
    let mut title = vec![
        Span::raw(" "),
        Span::styled(
            city.to_string(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
    ];
    if let Some(view) = app.orchestrator.view() {
        title.push(Span::raw(" : "));
        title.push(Span::styled(
            view.display.conditions.clone(),
            Style::default().fg(Color::Blue),
        ));
    }
    if app.orchestrator.is_loading() {
        title.push(Span::styled("  lädt…", Style::default().fg(Color::DarkGray)));
    }

    Paragraph::new(vec![
        Line::from(title),
        Line::from(vec![
            Span::raw(format!(" {}   ", Local::now().format("%d-%m-%Y %H:%M"))),
            toggle(state.unit == Unit::Celsius, "°C"),
            toggle(state.unit == Unit::Fahrenheit, "°F"),
            Span::raw("   "),
            toggle(state.period == Period::Hourly, "Stündlich"),
            toggle(state.period == Period::Weekly, "Woche"),
        ]),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .border_type(BorderType::Rounded),
    )
}

fn display_current_conditions(display: &DisplayRecord) -> Table<'_> {
    let rows = vec![
        Row::new(vec![Cell::from("")]),
        Row::new(vec![
            Cell::from(" Temperatur"),
            Cell::from(format!(
                "{} {}{}",
                display.icon.glyph(),
                display.temperature_text,
                display.unit_symbol
            ))
            .style(value_style().add_modifier(Modifier::BOLD)),
        ]),
        Row::new(vec![
            Cell::from(" Niederschlag"),
            Cell::from(display.precipitation_text.as_str()).style(value_style()),
        ]),
        Row::new(vec![
            Cell::from(" Sonnenaufgang"),
            Cell::from(display.sunrise_text.as_str()).style(value_style()),
        ]),
        Row::new(vec![
            Cell::from(" Sonnenuntergang"),
            Cell::from(display.sunset_text.as_str()).style(value_style()),
        ]),
    ];

    Table::new(rows, [Constraint::Length(17), Constraint::Min(10)])
        .block(bordered("Aktuelle Bedingungen"))
}

fn display_summary(display: &DisplayRecord, alerts: usize) -> Paragraph<'_> {
    let row = |label: &'static str, value: String, status: &'static str| {
        Line::from(vec![
            Span::raw(format!(" {label:13}")),
            Span::styled(value, value_style()),
            Span::raw("  "),
            Span::styled(status, Style::default().fg(Color::Magenta)),
        ])
    };
    let alert_line = if alerts == 0 {
        Line::from(Span::raw(" Keine Warnungen"))
    } else {
        Line::from(Span::styled(
            format!(" {alerts} Warnung(en), [a] anzeigen"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ))
    };

    Paragraph::new(vec![
        Line::from(""),
        row(
            "Gefühlt",
            display.feels_like_text.clone(),
            display.feels_like_status,
        ),
        row(
            "Bewölkung",
            display.cloud_cover_text.clone(),
            display.cloud_cover_status,
        ),
        row("Wind", display.wind_speed_text.clone(), display.wind_status),
        Line::from(""),
        alert_line,
    ])
    .block(bordered("Übersicht"))
}

fn card_widget(card: &CardView, selected: bool) -> Paragraph<'_> {
    let border = if selected {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else if card.highlighted {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Cyan)
    };
    Paragraph::new(vec![
        Line::from(Span::raw(card.icon.glyph())),
        Line::from(Span::styled(
            format!("{}{}", card.temperature, card.unit_symbol),
            value_style().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            card.conditions.as_str(),
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border)
            .title(Span::styled(card.label.as_str(), border))
            .title_alignment(Alignment::Center),
    )
}

fn render_cards(f: &mut Frame, area: Rect, view: &WeatherView, selected: usize) {
    let block = bordered(match view.params.period {
        Period::Hourly => "Stündlich",
        Period::Weekly => "Woche  [←/→] wählen  [Enter] Details",
    });
    let inner = block.inner(area);
    f.render_widget(block, area);

    let visible = usize::from((inner.width / CARD_WIDTH).max(1));
    let anchor = match view.params.period {
        Period::Weekly => selected,
        Period::Hourly => view.cards.iter().position(|c| c.highlighted).unwrap_or(0),
    };
    let offset = (anchor + 1).saturating_sub(visible);

    let shown: Vec<_> = view.cards.iter().enumerate().skip(offset).take(visible).collect();
    let slots = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Length(CARD_WIDTH); shown.len()])
        .split(inner);
    for ((i, card), slot) in shown.into_iter().zip(slots.iter()) {
        let is_selected = card.interactive && i == selected;
        f.render_widget(card_widget(card, is_selected), *slot);
    }
}

fn display_footer(app: &App) -> Paragraph<'_> {
    if let Some(notice) = app.orchestrator.notice() {
        let line = match notice.kind {
            NoticeKind::Info => Line::from(Span::styled(
                format!(" {}", notice.text),
                Style::default().fg(Color::Blue),
            )),
            NoticeKind::Error { retryable } => {
                let mut spans = vec![Span::styled(
                    format!(" {}", notice.text),
                    Style::default().fg(Color::Red),
                )];
                if retryable {
                    spans.push(Span::styled("  [r]", Style::default().fg(Color::Yellow)));
                    spans.push(Span::raw(" erneut versuchen"));
                }
                Line::from(spans)
            }
        };
        return Paragraph::new(line);
    }

    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));
    Paragraph::new(Line::from(vec![
        key(" [q]"),
        Span::raw("uit "),
        key("[c/f]"),
        Span::raw(" Einheit "),
        key("[h/w]"),
        Span::raw(" Zeitraum "),
        key("[/]"),
        Span::raw(" Suche "),
        key("[a]"),
        Span::raw(" Warnungen "),
        key("[l]"),
        Span::raw(" Standort "),
        key("[r]"),
        Span::raw(" neu laden"),
    ]))
}

/// A rectangle of `width` percent and `height` rows centred in `area`.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = (u32::from(area.width) * u32::from(width.min(100)) / 100) as u16;
    let h = height.min(area.height);
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
    .intersection(area)
}

fn render_popup(f: &mut Frame, title: &str, lines: Vec<Line>, height: u16) {
    let area = centered_rect(60, height, f.area());
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(bordered(title)),
        area,
    );
}

fn close_hint() -> Line<'static> {
    Line::from(vec![
        Span::styled("[Esc]", Style::default().fg(Color::Yellow)),
        Span::raw(" Schließen"),
    ])
}

fn render_alerts(f: &mut Frame, view: Option<&WeatherView>) {
    let mut lines = vec![Line::from("")];
    match view.map(|v| v.alerts.as_slice()) {
        Some(alerts) if !alerts.is_empty() => {
            for alert in alerts {
                let class = classify_alert(&alert.event);
                lines.push(Line::from(Span::styled(
                    format!(" {}", class.title),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )));
                if !class.description.is_empty() {
                    lines.push(Line::from(format!(" {}", class.description)));
                }
                if !alert.text.is_empty() {
                    lines.push(Line::from(Span::styled(
                        format!(" {}", alert.text),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
                lines.push(Line::from(""));
            }
        }
        _ => {
            lines.push(Line::from(" Keine Warnungen für Ihren Standort."));
            lines.push(Line::from(""));
        }
    }
    lines.push(close_hint());
    let height = lines.len() as u16 + 2;
    render_popup(f, "Wetterwarnungen", lines, height);
}

fn render_day(f: &mut Frame, detail: &DayDetail) {
    let mut lines = vec![Line::from("")];
    for (label, value) in &detail.lines {
        lines.push(Line::from(vec![
            Span::raw(format!(" {label:21}")),
            Span::styled(value.as_str(), value_style()),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(close_hint());
    let height = lines.len() as u16 + 2;
    render_popup(f, &detail.title, lines, height);
}

fn render_search(f: &mut Frame, search: &Autocomplete) {
    let suggestions = search.suggestions().unwrap_or_default();
    let area = f.area();
    let height = (suggestions.len() as u16 + 3).min(area.height.saturating_sub(2)).max(3);
    let popup = Rect::new(
        area.x + area.width / 4,
        area.y + 1,
        area.width / 2,
        height,
    )
    .intersection(area);
    f.render_widget(Clear, popup);

    let block = bordered("Stadt suchen  [↑/↓] [Enter] [Esc]");
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::raw(" "),
            Span::styled(search.input(), value_style()),
            Span::styled("█", Style::default().fg(Color::DarkGray)),
        ])),
        chunks[0],
    );

    let items: Vec<ListItem> = suggestions
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let (typed, rest) = s.split();
            let mut style = Style::default();
            if i as i32 == search.focus() {
                style = style.bg(Color::Blue);
            }
            ListItem::new(Line::from(vec![
                Span::raw(" "),
                Span::styled(typed, style.add_modifier(Modifier::BOLD)),
                Span::styled(rest, style),
            ]))
        })
        .collect();
    f.render_widget(List::new(items), chunks[1]);
}

fn ui(f: &mut Frame, app: &App) {
    let vert_layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(8),
            Constraint::Length(8),
            Constraint::Length(1),
        ])
        .split(f.area());

    f.render_widget(display_headline(app), vert_layout[0]);

    match app.orchestrator.view() {
        Some(view) => {
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
                .split(vert_layout[1]);
            f.render_widget(display_current_conditions(&view.display), chunks[0]);
            f.render_widget(display_summary(&view.display, view.alerts.len()), chunks[1]);

            let selected = app.selected_day.min(view.cards.len().saturating_sub(1));
            render_cards(f, vert_layout[2], view, selected);
        }
        None => {
            let text = if app.orchestrator.is_loading() {
                " Lade Wetterdaten…"
            } else {
                MISSING
            };
            f.render_widget(
                Paragraph::new(vec![Line::from(""), Line::from(text)])
                    .block(bordered("Aktuelle Bedingungen")),
                vert_layout[1],
            );
        }
    }

    f.render_widget(display_footer(app), vert_layout[3]);

    match app.overlay {
        Overlay::None => {}
        Overlay::Alerts => render_alerts(f, app.orchestrator.view()),
        Overlay::Day(index) => {
            if let Some(day) = app.orchestrator.view().and_then(|v| v.days.get(index)) {
                render_day(f, &DayDetail::new(day, app.orchestrator.state().unit));
            }
        }
        Overlay::LocationPrompt => render_popup(
            f,
            "Standort",
            vec![
                Line::from(""),
                Line::from(" Standort über die IP-Adresse ermitteln?"),
                Line::from(""),
                Line::from(vec![
                    Span::styled(" [j]", Style::default().fg(Color::Yellow)),
                    Span::raw(" Ja   "),
                    Span::styled("[n]", Style::default().fg(Color::Yellow)),
                    Span::raw(" Nein"),
                ]),
            ],
            6,
        ),
    }

    if app.mode == Mode::Search {
        render_search(f, &app.search);
    }

    if let Some(message) = app.orchestrator.blocking_message() {
        render_popup(
            f,
            "Hinweis",
            vec![
                Line::from(""),
                Line::from(format!(" {message}")),
                Line::from(""),
                Line::from(vec![
                    Span::styled(" [Enter]", Style::default().fg(Color::Yellow)),
                    Span::raw(" OK"),
                ]),
            ],
            8,
        );
    }
}

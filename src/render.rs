//! Turning a [`Board`] into output.
//!
//! Nothing here feeds back into polling; the loop only needs [`Renderer`].

use anyhow::Result;
use chrono::Local;
use std::io::Write;
use std::time::Duration;

use crate::config::TrackerConfig;
use crate::poll::{Board, SourceBoard};

pub trait Renderer {
    fn render(&mut self, board: &Board) -> Result<()>;
}

/// Display-only urgency of an arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtaBand {
    Now,
    Soon,
    Approaching,
    Later,
}

impl EtaBand {
    pub fn of(minutes: i64) -> Self {
        match minutes {
            m if m <= 0 => EtaBand::Now,
            m if m <= 5 => EtaBand::Soon,
            m if m <= 10 => EtaBand::Approaching,
            _ => EtaBand::Later,
        }
    }

    fn color(self) -> Color {
        match self {
            EtaBand::Now | EtaBand::Soon => Color::Red,
            EtaBand::Approaching => Color::Yellow,
            EtaBand::Later => Color::Green,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Color {
    Bold,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
}

impl Color {
    fn code(self) -> &'static str {
        match self {
            Color::Bold => "\x1b[1m",
            Color::Red => "\x1b[91m",
            Color::Green => "\x1b[92m",
            Color::Yellow => "\x1b[93m",
            Color::Blue => "\x1b[94m",
            Color::Magenta => "\x1b[95m",
            Color::Cyan => "\x1b[96m",
        }
    }
}

const RESET: &str = "\x1b[0m";
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
const RULE_WIDTH: usize = 75;
const LOCATION_WIDTH: usize = 28;

fn paint(color: Color, text: &str) -> String {
    format!("{}{text}{RESET}", color.code())
}

/// Human text for an ETA, e.g. "Arriving now", "1 minute", "7 minutes".
pub fn eta_text(minutes: i64) -> String {
    match minutes {
        m if m <= 0 => "Arriving now".to_string(),
        1 => "1 minute".to_string(),
        m => format!("{m} minutes"),
    }
}

/// Zero stops away is shown as unknown, matching the upstream's use of 0
/// as "no distance data".
pub fn stops_text(stops_away: Option<u32>) -> String {
    match stops_away {
        Some(n) if n > 0 => n.to_string(),
        _ => "Unknown".to_string(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

/// Colored full-screen board for an interactive terminal.
pub struct TerminalRenderer<W> {
    out: W,
    banner: Vec<String>,
    refresh: Option<Duration>,
}

impl<W: Write> TerminalRenderer<W> {
    /// `refresh` is `None` for a one-shot run.
    pub fn new(out: W, config: &TrackerConfig, refresh: Option<Duration>) -> Self {
        let mut banner = vec![paint(
            Color::Bold,
            &paint(Color::Blue, "=== NYC MTA Arrival Tracker - Live Monitoring ==="),
        )];
        let field = |label: &str, value: &str| {
            format!("{} {}", paint(Color::Green, label), paint(Color::Bold, value))
        };

        if let Some(bus) = &config.bus {
            banner.push(field("Monitoring stop:", &bus.stop_id));
            if let Some(route) = bus.route() {
                banner.push(field("Route filter:", route));
            }
        }
        if let Some(train) = &config.train {
            banner.push(field("Monitoring station:", &train.station_id));
            if let Some(route) = &train.route_filter {
                banner.push(field("Subway route filter:", route));
            }
        }
        if let Some(refresh) = refresh {
            banner.push(field(
                "Refresh interval:",
                &format!("{} seconds", refresh.as_secs()),
            ));
            banner.push(paint(Color::Red, "Press Ctrl+C to exit"));
        }

        Self {
            out,
            banner,
            refresh,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn rule() -> String {
        paint(Color::Cyan, &"=".repeat(RULE_WIDTH))
    }

    fn push_bus(text: &mut String, board: &SourceBoard) {
        if let Some(failure) = &board.failure {
            text.push_str(&format!("\nBus data unavailable: {failure}\n"));
            return;
        }
        if board.arrivals.is_empty() {
            text.push_str("\nNo upcoming buses found.\n");
            return;
        }

        let header = format!(
            "{:<10} {:<30} {:<15} {}",
            "Route", "Bus Location", "Arriving In", "Stops Away"
        );
        text.push_str(&format!("\n{}\n", paint(Color::Bold, &paint(Color::Cyan, &header))));
        text.push_str(&paint(Color::Cyan, &"-".repeat(68)));
        text.push('\n');

        for arrival in &board.arrivals {
            let Some(minutes) = arrival.eta_minutes else {
                continue;
            };
            text.push_str(&format!(
                "{} {} {} {}\n",
                paint(Color::Yellow, &format!("{:<10}", arrival.route)),
                format!("{:<30}", truncate(&arrival.location_or_direction, LOCATION_WIDTH)),
                eta_cell(minutes, 15),
                paint(Color::Magenta, &stops_text(arrival.stops_away)),
            ));
        }
    }

    fn push_train(text: &mut String, board: &SourceBoard) {
        if let Some(failure) = &board.failure {
            text.push_str(&format!("\nSubway data unavailable: {failure}\n"));
            return;
        }
        if board.arrivals.is_empty() {
            text.push_str("\nNo upcoming trains found.\n");
            return;
        }

        let header = format!("{:<10} {:<12} {}", "Route", "Direction", "Arriving In");
        text.push_str(&format!("\n{}\n", paint(Color::Bold, &paint(Color::Cyan, &header))));
        text.push_str(&paint(Color::Cyan, &"-".repeat(40)));
        text.push('\n');

        for arrival in &board.arrivals {
            let Some(minutes) = arrival.eta_minutes else {
                continue;
            };
            text.push_str(&format!(
                "{} {:<12} {}\n",
                paint(Color::Yellow, &format!("{:<10}", arrival.route)),
                arrival.location_or_direction,
                eta_cell(minutes, 0),
            ));
        }
    }
}

fn eta_cell(minutes: i64, width: usize) -> String {
    let band = EtaBand::of(minutes);
    let text = format!("{:<width$}", eta_text(minutes));
    let colored = paint(band.color(), &text);
    if band == EtaBand::Now {
        paint(Color::Bold, &colored)
    } else {
        colored
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render(&mut self, board: &Board) -> Result<()> {
        let mut text = String::from(CLEAR_SCREEN);
        text.push_str(&Self::rule());
        text.push('\n');
        for line in &self.banner {
            text.push_str(line);
            text.push('\n');
        }
        text.push_str(&Self::rule());
        text.push('\n');

        let updated = board.polled_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");
        text.push_str(&format!(
            "\n{}\n",
            paint(Color::Cyan, &format!("[Last updated: {updated}]"))
        ));

        if let Some(bus) = &board.bus {
            Self::push_bus(&mut text, bus);
        }
        if let Some(train) = &board.train {
            Self::push_train(&mut text, train);
        }
        if let Some(refresh) = self.refresh {
            text.push_str(&format!(
                "\nRefreshing in {} seconds... (Press Ctrl+C to exit)\n",
                refresh.as_secs()
            ));
        }

        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

/// One JSON document per tick, newline separated.
pub struct JsonRenderer<W> {
    out: W,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for JsonRenderer<W> {
    fn render(&mut self, board: &Board) -> Result<()> {
        serde_json::to_writer(&mut self.out, board)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrival::{ArrivalRecord, Source};
    use crate::config::{BusConfig, TrainConfig};
    use chrono::{TimeZone, Utc};

    fn config() -> TrackerConfig {
        TrackerConfig {
            bus: Some(BusConfig {
                api_key: "k".to_string(),
                stop_id: "308214".to_string(),
                line_ref: Some("MTA NYCT_M15".to_string()),
            }),
            train: Some(TrainConfig {
                api_key: "k".to_string(),
                station_id: "635".to_string(),
                route_filter: None,
            }),
            refresh_interval: Duration::from_secs(30),
            max_bus_results: 10,
            max_train_results: 8,
        }
    }

    fn bus(route: &str, location: &str, eta: i64, stops: u32) -> ArrivalRecord {
        ArrivalRecord {
            route: route.to_string(),
            source: Source::Bus,
            location_or_direction: location.to_string(),
            eta_minutes: Some(eta),
            stops_away: Some(stops),
            raw_timestamp: None,
        }
    }

    fn board(bus_board: SourceBoard, train_board: SourceBoard) -> Board {
        Board {
            polled_at: Utc.with_ymd_and_hms(2025, 3, 14, 16, 0, 0).unwrap(),
            bus: Some(bus_board),
            train: Some(train_board),
        }
    }

    fn render_terminal(board: &Board) -> String {
        let mut renderer =
            TerminalRenderer::new(Vec::new(), &config(), Some(Duration::from_secs(30)));
        renderer.render(board).unwrap();
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn test_eta_band_boundaries() {
        assert_eq!(EtaBand::of(-3), EtaBand::Now);
        assert_eq!(EtaBand::of(0), EtaBand::Now);
        assert_eq!(EtaBand::of(1), EtaBand::Soon);
        assert_eq!(EtaBand::of(5), EtaBand::Soon);
        assert_eq!(EtaBand::of(6), EtaBand::Approaching);
        assert_eq!(EtaBand::of(7), EtaBand::Approaching);
        assert_eq!(EtaBand::of(10), EtaBand::Approaching);
        assert_eq!(EtaBand::of(11), EtaBand::Later);
    }

    #[test]
    fn test_eta_text() {
        assert_eq!(eta_text(-1), "Arriving now");
        assert_eq!(eta_text(0), "Arriving now");
        assert_eq!(eta_text(1), "1 minute");
        assert_eq!(eta_text(4), "4 minutes");
    }

    #[test]
    fn test_stops_text_zero_is_unknown() {
        assert_eq!(stops_text(Some(0)), "Unknown");
        assert_eq!(stops_text(None), "Unknown");
        assert_eq!(stops_text(Some(3)), "3");
    }

    #[test]
    fn test_terminal_board_lists_arrivals() {
        let long_location = "approaching the intersection of 1st Ave and E 57th St";
        let output = render_terminal(&board(
            SourceBoard {
                arrivals: vec![bus("M15", long_location, 7, 2)],
                failure: None,
            },
            SourceBoard::default(),
        ));

        assert!(output.starts_with(CLEAR_SCREEN));
        assert!(output.contains("Monitoring stop:"));
        assert!(output.contains("M15"));
        assert!(output.contains("7 minutes"));
        assert!(output.contains(&truncate(long_location, LOCATION_WIDTH)));
        assert!(!output.contains(long_location));
        assert!(output.contains("No upcoming trains found."));
        assert!(output.contains("Refreshing in 30 seconds"));
    }

    #[test]
    fn test_terminal_board_distinguishes_failure_from_empty() {
        let output = render_terminal(&board(
            SourceBoard {
                arrivals: vec![],
                failure: Some("transport error: timed out".to_string()),
            },
            SourceBoard::default(),
        ));

        assert!(output.contains("Bus data unavailable: transport error: timed out"));
        assert!(!output.contains("No upcoming buses found."));
    }

    #[test]
    fn test_one_shot_has_no_refresh_line() {
        let mut renderer = TerminalRenderer::new(Vec::new(), &config(), None);
        renderer
            .render(&board(SourceBoard::default(), SourceBoard::default()))
            .unwrap();
        let output = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(!output.contains("Refreshing in"));
    }

    #[test]
    fn test_json_renderer_writes_one_line_per_board() {
        let mut renderer = JsonRenderer::new(Vec::new());
        let b = board(
            SourceBoard {
                arrivals: vec![bus("M15", "at stop", 0, 0)],
                failure: None,
            },
            SourceBoard::default(),
        );
        renderer.render(&b).unwrap();
        renderer.render(&b).unwrap();

        let output = String::from_utf8(renderer.into_inner()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["bus"]["arrivals"][0]["route"], "M15");
        assert_eq!(value["bus"]["arrivals"][0]["source"], "bus");
        assert_eq!(value["train"]["arrivals"], serde_json::json!([]));
    }
}

use std::fmt::Write as _;

use crate::{
    app::{
        params::ParamStore,
        poller::{PollState, ScreenController},
    },
    domain::location::SavedLocation,
};

/// Plain-text view of one screen: status, today's values for the active
/// types, the day-by-day odor outlook and the number of map markers.
pub fn render_report(controller: &ScreenController, params: &ParamStore) -> String {
    let mut out = String::new();
    let today = controller.today();
    let _ = writeln!(
        out,
        "{} | {} | {}",
        controller.screen().label(),
        today.format("%Y-%m-%d"),
        state_label(controller.state())
    );
    if let Some(notice) = controller.notice() {
        let _ = writeln!(out, "! {notice}");
    }
    let failures = controller.refresh_meta().consecutive_failures;
    if failures > 1 {
        let _ = writeln!(out, "! {failures} refreshes failed in a row");
    }

    let index = controller.index();
    let active = params.active_ids();
    if !active.is_empty() {
        let width = active.iter().map(String::len).max().unwrap_or(0);
        let _ = writeln!(out, "Today");
        for kind in &active {
            match index.value_on(kind, today) {
                Some(value) => {
                    let _ = writeln!(out, "  {kind:<width$}  {value:.1}");
                }
                None => {
                    let _ = writeln!(out, "  {kind:<width$}  --");
                }
            }
        }
    }

    let outlook = index.outlook(today, params.horizon());
    if !outlook.is_empty() {
        let _ = writeln!(out, "Outlook");
        for day in outlook {
            let mark = if day.flagged { "odor" } else { "ok" };
            let _ = writeln!(out, "  {}  {mark}", day.date.format("%d %b"));
        }
    }

    let _ = writeln!(
        out,
        "{} records, {} markers",
        index.len(),
        index.positions().count()
    );
    out
}

pub fn render_locations(locations: &[SavedLocation]) -> String {
    if locations.is_empty() {
        return "No saved locations\n".to_string();
    }
    let mut out = String::new();
    for location in locations {
        let position = match location.usable_coordinate() {
            Some(coordinate) => {
                format!("{:.4}, {:.4}", coordinate.latitude, coordinate.longitude)
            }
            None => "no coordinates".to_string(),
        };
        let _ = writeln!(
            out,
            "{}  {}  [{position}]",
            location.id,
            location.display_name()
        );
    }
    out
}

fn state_label(state: PollState) -> &'static str {
    match state {
        PollState::Idle => "idle",
        PollState::Fetching => "fetching",
        PollState::Ready => "ready",
        PollState::Failed => "failed",
    }
}

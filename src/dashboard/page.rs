use std::fmt::Write;

use crate::models::{DerivedCommuteMetric, NowPlaying, Snapshot};

use super::Direction;

const STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Roboto, Helvetica, Arial, sans-serif;
       background: #1a1a1a; color: #fff; margin: 0; padding: 2rem; }
.card { background: #2d2d2d; border-radius: 20px; padding: 2rem; margin-bottom: 1.5rem; }
.commute .time { font-size: 7rem; font-weight: 700; line-height: 1; color: #4cd964; }
.time span { font-size: 2rem; font-weight: 400; color: #888; }
.moderate-traffic { color: #ff9500 !important; }
.heavy-traffic { color: #ff3b30 !important; }
h1, h2 { color: #888; text-transform: uppercase; letter-spacing: 2px; font-size: 1.1rem; }
ul { padding-left: 1.2rem; }
.footer { color: #555; font-size: 0.9rem; }
.cover { width: 64px; height: 64px; border-radius: 8px; vertical-align: middle; margin-right: 1rem; }
"#;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn commute_card(out: &mut String, direction: Direction, metric: &DerivedCommuteMetric) {
    let _ = write!(
        out,
        r#"<div class="card commute"><h1>{label}</h1><div class="time {severity}">{minutes}<span>min {arrow}</span></div><div class="details">{km} km</div></div>"#,
        label = escape(direction.label()),
        severity = metric.severity.css_class(),
        minutes = metric.value.duration_minutes,
        arrow = metric.trend.arrow(),
        km = metric.value.distance_km,
    );
}

/// Full dashboard page for one snapshot. Only the commute in the `primary`
/// direction is shown; the page reloads every `refresh_secs`.
pub fn render(snapshot: &Snapshot, primary: Direction, refresh_secs: u64) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<!DOCTYPE html><html><head><meta charset="utf-8"><title>Commute Board</title><meta http-equiv="refresh" content="{refresh_secs}"><style>{STYLE}</style></head><body>"#
    );

    let metric = match primary {
        Direction::ToWork => &snapshot.to_work,
        Direction::ToHome => &snapshot.to_home,
    };
    commute_card(&mut out, primary, metric);

    let weather = &snapshot.weather;
    let _ = write!(
        out,
        r#"<div class="card"><h2>Weather</h2><div>{icon} {temp}°C (feels like {feels}°C) · {condition}</div></div>"#,
        icon = escape(&weather.icon),
        temp = weather.temperature_c,
        feels = weather.feels_like_c,
        condition = weather.condition.label(),
    );

    out.push_str(r#"<div class="card"><h2>Traffic</h2><ul>"#);
    for alert in snapshot.alerts.entries() {
        let _ = write!(out, "<li>{}</li>", escape(alert));
    }
    out.push_str("</ul></div>");

    out.push_str(r#"<div class="card"><h2>Now playing</h2><div>"#);
    match &snapshot.now_playing {
        NowPlaying::Playing(track) => {
            if !track.cover_url.is_empty() {
                let _ = write!(out, r#"<img class="cover" src="{}" alt="">"#, escape(&track.cover_url));
            }
            let _ = write!(out, "{} · {}", escape(&track.title), escape(&track.artist));
        }
        other => out.push_str(&escape(other.title())),
    }
    out.push_str("</div></div>");

    let updated = if snapshot.is_placeholder() {
        "Initializing...".to_string()
    } else {
        snapshot
            .last_updated
            .with_timezone(&chrono::Local)
            .format("%H:%M:%S")
            .to_string()
    };
    let _ = write!(out, r#"<div class="footer">Updated at {updated}</div></body></html>"#);
    out
}

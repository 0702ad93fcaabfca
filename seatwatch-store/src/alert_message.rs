use seatwatch_core::{EvaluationResult, FlightIdentity, Watch, WatchKind};

/// Plain-text alert ready to hand to the mailer.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertMessage {
    pub subject: String,
    pub text_body: String,
}

/// Renders the alert for one recipient. The subject is the watch title.
pub fn render(recipient_name: &str, watch: &Watch, result: &EvaluationResult) -> AlertMessage {
    let greeting_name = if recipient_name.trim().is_empty() { "there" } else { recipient_name };

    let mut lines = vec![
        format!("Hello {},", greeting_name),
        String::new(),
        format!("Your seat availability alert \"{}\" has been triggered.", watch.title),
        String::new(),
    ];
    lines.extend(detail_lines(watch, result));
    lines.extend([
        String::new(),
        format!("Alert: {}", result.message()),
        format!("Your threshold: {}", with_unit(watch, result.threshold())),
        format!("Current seats: {:.0}", result.current_value()),
        String::new(),
        "You can change or disable this alert at any time from your watch settings.".to_string(),
    ]);

    AlertMessage {
        subject: watch.title.clone(),
        text_body: lines.join("\n"),
    }
}

fn with_unit(watch: &Watch, threshold: f64) -> String {
    match watch.kind {
        WatchKind::SingleFlight { .. } => format!("{:.0} seats", threshold),
        WatchKind::SavedSearch(_) => format!("{:.1}%", threshold),
    }
}

fn detail_lines(watch: &Watch, result: &EvaluationResult) -> Vec<String> {
    match &watch.kind {
        WatchKind::SingleFlight { snapshot } => {
            // Prefer the freshly matched record, fall back to what was saved.
            let identity = result
                .matched()
                .and_then(|record| record.identity().ok())
                .or_else(|| snapshot.identity().ok());
            match identity {
                Some(identity) => flight_lines(&identity),
                None => Vec::new(),
            }
        }
        WatchKind::SavedSearch(criteria) => vec![
            format!("Route: {} -> {}", criteria.origin, criteria.destination),
            format!("Date: {}", criteria.departure_date.format("%Y-%m-%d")),
        ],
    }
}

fn flight_lines(identity: &FlightIdentity) -> Vec<String> {
    vec![
        format!("Flight: {}", identity.flight_designator()),
        format!("Route: {} -> {}", identity.origin, identity.destination),
        format!("Date: {}", identity.departure_date),
    ]
}

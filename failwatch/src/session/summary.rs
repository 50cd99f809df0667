use std::fmt::Write;

use tokio::time::Instant;

use crate::event::Event;

const RULE: &str =
    "============================================================";

/// Render events as a numbered list with the time elapsed since `origin`,
/// or since the first event if there is no origin.
pub fn events_summary(events: &[Event], origin: Option<Instant>) -> String {
    let mut out = String::new();

    // Writing to a String does not fail.
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "DETECTED EVENTS");
    let _ = writeln!(out, "{}", RULE);

    let origin = origin.or_else(|| events.first().map(|e| e.timestamp));

    if events.is_empty() {
        let _ = writeln!(out, "(no events)");
    }

    for (i, e) in events.iter().enumerate() {
        let elapsed = origin
            .map(|o| e.elapsed_since(o).as_secs_f64())
            .unwrap_or_default();

        let _ = write!(out, "{}. [+{:.3}s] {} @ {}", i + 1, elapsed, e.kind, e.node);
        if let Some(p) = &e.payload {
            let _ = write!(out, " {}", p);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "{}", RULE);
    out
}

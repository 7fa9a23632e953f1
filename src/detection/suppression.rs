use chrono::Duration;
use super::{AkiEvent, AkiLevel};

/// Keeps one event per trailing window.
///
/// For every event, the window spans `window_days` back from its timestamp, both ends inclusive.
/// The event with the highest creatinine in that window keeps its level (the earliest one on a
/// tie) and every other event in the window is set to [`AkiLevel::NoRisk`]. Levels are only ever
/// lowered, so running the pass twice changes nothing.
///
/// `events` must belong to one patient and be sorted by timestamp.
pub fn suppress_duplicates(events: &mut [AkiEvent], window_days: i64) {
    for anchor in 0..events.len() {
        // A window reaching past the representable range covers everything before the anchor
        let window_start = Duration::try_days(window_days)
            .and_then(|span| events[anchor].timestamp.checked_sub_signed(span));
        let first = match window_start {
            Some(start) => events[..=anchor].partition_point(|e| e.timestamp < start),
            None => 0,
        };

        let mut keep = first;
        for index in first + 1..=anchor {
            if events[index].cr_value > events[keep].cr_value {
                keep = index;
            }
        }

        for (index, event) in events.iter_mut().enumerate().take(anchor + 1).skip(first) {
            if index != keep {
                event.level = AkiLevel::NoRisk;
            }
        }
    }
}

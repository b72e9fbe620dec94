//! Stage timeline math for a single run.
//!
//! A run's lifecycle is an open-ended, append-only sequence of named
//! stages reported by the job itself. Stage names are caller-defined; the
//! only conventions are the terminal [`TERMINAL_STAGE`] name and the
//! [`FAILURE_MARKER`] substring that flags a run as failed. Ordering is
//! always by server-side finish time, never by report arrival order.

use serde::Serialize;

use crate::format::format_hms;
use crate::types::Timestamp;

/// Stage name that marks a run as complete.
pub const TERMINAL_STAGE: &str = "COMPLETED";

/// Substring that marks a stage (and therefore the run) as failed.
pub const FAILURE_MARKER: &str = "FAILURE";

/// Rotating palette for the per-stage progress bar segments.
pub const SEGMENT_COLORS: [&str; 10] = [
    "#F3BE1A", "#66321C", "#FFA475", "#067586", "#C87533", "#52656B", "#CF5351", "#4F4B59",
    "#738F1E", "#037784",
];

/// One completed stage of a run, as read back from storage.
#[derive(Debug, Clone)]
pub struct StageEvent {
    pub name: String,
    pub finished: Timestamp,
    pub duration_seconds: f64,
}

/// One rendered segment of the run's stage progress bar.
#[derive(Debug, Clone, Serialize)]
pub struct StageSegment {
    pub name: String,
    pub readable_name: String,
    pub color: &'static str,
    pub duration: String,
    pub percentage: f64,
}

pub fn is_failure_stage(name: &str) -> bool {
    name.contains(FAILURE_MARKER)
}

/// Whether any stage of the run carries the failure marker.
pub fn run_failed<'a>(names: impl IntoIterator<Item = &'a str>) -> bool {
    names.into_iter().any(is_failure_stage)
}

/// Strip the reporting job's enum prefix and underscores for display.
pub fn display_stage_name(name: &str) -> String {
    name.replace("Status.", "").replace('_', " ")
}

/// Sort stage events chronologically by finish time.
///
/// Reports can arrive over HTTP in any order; the server-side finish
/// timestamp is authoritative for reconstructing the timeline.
pub fn chronological(mut events: Vec<StageEvent>) -> Vec<StageEvent> {
    events.sort_by_key(|e| e.finished);
    events
}

pub fn total_duration_seconds(events: &[StageEvent]) -> f64 {
    events.iter().map(|e| e.duration_seconds).sum()
}

/// Build progress-bar segments from chronologically ordered stage events.
///
/// Each segment's percentage is its share of the total duration; a run
/// with zero total duration gets all-zero percentages.
pub fn stage_segments(events: &[StageEvent]) -> Vec<StageSegment> {
    let total = total_duration_seconds(events);
    events
        .iter()
        .enumerate()
        .map(|(idx, event)| {
            let stripped = event.name.replace("Status.", "");
            StageSegment {
                readable_name: stripped.replace('_', " "),
                name: stripped,
                color: SEGMENT_COLORS[idx % SEGMENT_COLORS.len()],
                duration: format_hms(event.duration_seconds),
                percentage: if total > 0.0 {
                    event.duration_seconds / total * 100.0
                } else {
                    0.0
                },
            }
        })
        .collect()
}

/// Progress percentage for the dashboard bar.
///
/// A failed run always shows a full (red) bar; a run with no progress
/// record yet shows zero.
pub fn progress_percent(progress: Option<f64>, failed: bool) -> u8 {
    if failed {
        return 100;
    }
    match progress {
        Some(fraction) => (fraction * 100.0).clamp(0.0, 100.0) as u8,
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event(name: &str, finished_offset_secs: i64, duration: f64) -> StageEvent {
        StageEvent {
            name: name.to_string(),
            finished: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
                + chrono::Duration::seconds(finished_offset_secs),
            duration_seconds: duration,
        }
    }

    #[test]
    fn out_of_order_reports_reconstruct_chronology() {
        // Reported in arrival order 3rd, 1st, 2nd.
        let events = vec![
            event("Status.PUBLISHING", 300, 30.0),
            event("Status.DOWNLOADING", 100, 60.0),
            event("Status.PROCESSING", 200, 45.0),
        ];

        let ordered = chronological(events);
        let names: Vec<_> = ordered.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Status.DOWNLOADING", "Status.PROCESSING", "Status.PUBLISHING"]
        );

        // Total duration is independent of report order.
        assert_eq!(total_duration_seconds(&ordered), 135.0);
    }

    #[test]
    fn segments_carry_share_of_total_duration() {
        let ordered = chronological(vec![
            event("Status.DOWNLOADING", 100, 75.0),
            event("Status.UPLOADING_CONTENT", 200, 25.0),
        ]);
        let segments = stage_segments(&ordered);

        assert_eq!(segments[0].percentage, 75.0);
        assert_eq!(segments[1].percentage, 25.0);
        assert_eq!(segments[1].readable_name, "UPLOADING CONTENT");
        assert_eq!(segments[0].color, SEGMENT_COLORS[0]);
        assert_eq!(segments[0].duration, "0:01:15");
    }

    #[test]
    fn zero_total_duration_yields_zero_percentages() {
        let segments = stage_segments(&[event("Status.START", 0, 0.0)]);
        assert_eq!(segments[0].percentage, 0.0);
    }

    #[test]
    fn failure_marker_flags_the_run() {
        assert!(is_failure_stage("Status.FAILURE"));
        assert!(is_failure_stage("DOWNLOAD_FAILURE"));
        assert!(!is_failure_stage("Status.DOWNLOADING"));

        assert!(run_failed(["Status.START", "Status.FAILURE"]));
        assert!(!run_failed(["Status.START", "COMPLETED"]));
    }

    #[test]
    fn progress_percent_prefers_failure() {
        assert_eq!(progress_percent(Some(0.25), true), 100);
        assert_eq!(progress_percent(Some(0.25), false), 25);
        assert_eq!(progress_percent(None, false), 0);
        assert_eq!(progress_percent(Some(1.5), false), 100);
    }

    #[test]
    fn stage_names_strip_prefix_and_underscores() {
        assert_eq!(
            display_stage_name("Status.UPLOADING_CONTENT"),
            "UPLOADING CONTENT"
        );
    }
}

//! Run stat diffing against the previous successful run.
//!
//! Resource counts and sizes are stored per run as `{kind: value}` maps.
//! [`diff_stats`] turns the current run's map plus the previous run's map
//! into display-ready rows, classifying each kind as increased, decreased,
//! or unchanged. Value formatting is injected so the same diff works for
//! plain counts and for byte sizes.

use std::collections::BTreeMap;

use serde::Serialize;

/// Direction of a per-kind change relative to the previous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatDelta {
    Increased,
    Decreased,
    Unchanged,
}

impl StatDelta {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increased => "increased",
            Self::Decreased => "decreased",
            Self::Unchanged => "unchanged",
        }
    }

    /// Table row class used by the dashboard templates.
    pub fn bg_class(&self) -> &'static str {
        match self {
            Self::Increased => "table-success",
            Self::Decreased => "table-danger",
            Self::Unchanged => "table-default",
        }
    }
}

impl std::fmt::Display for StatDelta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One display-ready row of the run stats table.
#[derive(Debug, Clone, Serialize)]
pub struct StatRow {
    /// Content kind (e.g. "video", "exercise", "topic").
    pub name: String,
    /// Icon class for the kind.
    pub icon: &'static str,
    /// Formatted current value.
    pub value: String,
    /// Formatted previous value, or `"-"` when there was none.
    pub previous_value: String,
    pub delta: StatDelta,
    pub bg_class: &'static str,
}

/// Icon class for a content kind, with a generic file fallback.
pub fn resource_icon(kind: &str) -> &'static str {
    match kind {
        ".mp4" => "fa-video-camera",
        ".mp3" => "fa-headphones",
        ".png" => "fa-file-image-o",
        ".pdf" => "fa-file-pdf-o",
        ".zip" => "fa-file-archive-o",
        "audio" => "fa-volume-up",
        "topic" => "fa-folder",
        "video" => "fa-video-camera",
        "exercise" => "fa-book",
        "document" => "fa-file-text",
        "html5" => "fa-file-code-o",
        "total" => "",
        _ => "fa-file",
    }
}

/// Parse a stored `{kind: value}` JSON object into an ordered map.
///
/// Null values count as zero; non-objects yield `None`.
pub fn stats_map(value: Option<&serde_json::Value>) -> Option<BTreeMap<String, i64>> {
    let object = value?.as_object()?;
    Some(
        object
            .iter()
            .map(|(k, v)| (k.clone(), v.as_i64().unwrap_or(0)))
            .collect(),
    )
}

/// Diff the current run's stats against the previous run's.
///
/// Every key of `current` produces one row; keys only present in
/// `previous` are ignored. A missing previous map or missing key is
/// treated as zero, displayed as `"-"`. An absent/empty current map
/// yields no rows at all.
pub fn diff_stats(
    current: Option<&BTreeMap<String, i64>>,
    previous: Option<&BTreeMap<String, i64>>,
    format_value: impl Fn(i64) -> String,
) -> Vec<StatRow> {
    let Some(current) = current else {
        return Vec::new();
    };

    let mut rows = Vec::with_capacity(current.len());
    for (name, &value) in current {
        let prev_value = previous.and_then(|p| p.get(name).copied()).unwrap_or(0);
        let delta = if value > prev_value {
            StatDelta::Increased
        } else if value < prev_value {
            StatDelta::Decreased
        } else {
            StatDelta::Unchanged
        };
        rows.push(StatRow {
            name: name.clone(),
            icon: resource_icon(name),
            value: format_value(value),
            previous_value: if prev_value != 0 {
                format_value(prev_value)
            } else {
                "-".to_string()
            },
            delta,
            bg_class: delta.bg_class(),
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::format_size;

    fn map(pairs: &[(&str, i64)]) -> BTreeMap<String, i64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn higher_current_value_is_increased() {
        let current = map(&[("video", 10)]);
        let previous = map(&[("video", 4)]);
        let rows = diff_stats(Some(&current), Some(&previous), |v| v.to_string());

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].delta, StatDelta::Increased);
        assert_eq!(rows[0].value, "10");
        assert_eq!(rows[0].previous_value, "4");
        assert_eq!(rows[0].bg_class, "table-success");
    }

    #[test]
    fn lower_current_value_is_decreased() {
        let current = map(&[("video", 4)]);
        let previous = map(&[("video", 10)]);
        let rows = diff_stats(Some(&current), Some(&previous), |v| v.to_string());

        assert_eq!(rows[0].delta, StatDelta::Decreased);
        assert_eq!(rows[0].bg_class, "table-danger");
    }

    #[test]
    fn missing_previous_run_shows_placeholder() {
        let current = map(&[("video", 5)]);
        let rows = diff_stats(Some(&current), None, |v| v.to_string());

        assert_eq!(rows[0].previous_value, "-");
        assert_eq!(rows[0].delta, StatDelta::Increased);
    }

    #[test]
    fn absent_current_stats_yield_no_rows() {
        let previous = map(&[("video", 10)]);
        assert!(diff_stats(None, Some(&previous), |v| v.to_string()).is_empty());
    }

    #[test]
    fn equal_values_are_unchanged() {
        let current = map(&[("exercise", 7)]);
        let previous = map(&[("exercise", 7)]);
        let rows = diff_stats(Some(&current), Some(&previous), |v| v.to_string());

        assert_eq!(rows[0].delta, StatDelta::Unchanged);
    }

    #[test]
    fn size_formatting_can_be_injected() {
        let current = map(&[("video", 1048576)]);
        let rows = diff_stats(Some(&current), None, format_size);

        assert_eq!(rows[0].value, "1.0MB");
    }

    #[test]
    fn stats_map_treats_null_values_as_zero() {
        let value = serde_json::json!({"video": 3, "audio": null});
        let parsed = stats_map(Some(&value)).unwrap();

        assert_eq!(parsed["video"], 3);
        assert_eq!(parsed["audio"], 0);
    }

    #[test]
    fn stats_map_rejects_non_objects() {
        let value = serde_json::json!([1, 2, 3]);
        assert!(stats_map(Some(&value)).is_none());
        assert!(stats_map(None).is_none());
    }
}

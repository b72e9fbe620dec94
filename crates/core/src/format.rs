//! Display formatting helpers shared by the dashboard views.

use std::sync::LazyLock;

use regex::Regex;

/// Trailing `git:<sha>` pin on a chef name, e.g. `...repo.git:abc123`.
static GIT_PIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"git:[\w\d]+$").expect("valid regex"));

/// Format a byte count with binary prefixes and one decimal place.
///
/// `0` renders as `"0"`; everything below 1024 keeps the bare `B` suffix
/// (`"1023.0B"`), then each division by 1024 moves through KB, MB, GB,
/// with TB as the final bucket.
pub fn format_size(num: i64) -> String {
    if num == 0 {
        return "0".to_string();
    }
    let mut value = num as f64;
    for unit in ["", "K", "M", "G"] {
        if value.abs() < 1024.0 {
            return format!("{value:.1}{unit}B");
        }
        value /= 1024.0;
    }
    format!("{value:.1}TB")
}

/// Format a duration in seconds as `H:MM:SS` (sub-second part dropped).
pub fn format_hms(total_seconds: f64) -> String {
    let total = total_seconds.max(0.0) as i64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours}:{minutes:02}:{seconds:02}")
}

/// Short human-readable chef name: strip the git pin, scheme, and host.
pub fn chef_display_name(chef_name: &str) -> String {
    GIT_PIN
        .replace(chef_name, "git")
        .replace("github.com", "")
        .replace("https://", "")
        .replace("git+ssh://git@", "")
}

/// Clickable repository link for a chef name.
pub fn chef_repo_link(chef_name: &str) -> String {
    GIT_PIN
        .replace(chef_name, "git")
        .replace("git+ssh://git@", "https://")
}

/// Render a run's extra options as command-line flags, `--key=value` each.
pub fn format_cli_flags(extra_options: Option<&serde_json::Value>) -> String {
    let Some(options) = extra_options.and_then(|v| v.as_object()) else {
        return String::new();
    };
    options
        .iter()
        .map(|(k, v)| match v {
            serde_json::Value::String(s) => format!("--{k}={s}"),
            other => format!("--{k}={other}"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_bytes_is_bare_zero() {
        assert_eq!(format_size(0), "0");
    }

    #[test]
    fn sizes_below_one_kib_keep_byte_suffix() {
        assert_eq!(format_size(1023), "1023.0B");
    }

    #[test]
    fn exact_boundaries_roll_over() {
        assert_eq!(format_size(1024), "1.0KB");
        assert_eq!(format_size(1048576), "1.0MB");
        assert_eq!(format_size(1073741824), "1.0GB");
    }

    #[test]
    fn terabytes_are_the_final_bucket() {
        assert_eq!(format_size(1024_i64.pow(4) * 3), "3.0TB");
    }

    #[test]
    fn hms_formatting() {
        assert_eq!(format_hms(0.0), "0:00:00");
        assert_eq!(format_hms(3723.9), "1:02:03");
        assert_eq!(format_hms(59.0), "0:00:59");
    }

    #[test]
    fn chef_name_is_shortened_for_display() {
        let name = "https://github.com/openstax/chef-openstax.git:4f2a9b";
        assert_eq!(chef_display_name(name), "/openstax/chef-openstax.git");
    }

    #[test]
    fn ssh_chef_names_become_https_links() {
        let name = "git+ssh://git@github.com/openstax/chef-openstax.git:4f2a9b";
        assert_eq!(
            chef_repo_link(name),
            "https://github.com/openstax/chef-openstax.git"
        );
    }

    #[test]
    fn cli_flags_render_key_value_pairs() {
        let options = serde_json::json!({"staged": true, "token": "abc"});
        let flags = format_cli_flags(Some(&options));
        assert!(flags.contains("--staged=true"));
        assert!(flags.contains("--token=abc"));
    }

    #[test]
    fn cli_flags_empty_without_options() {
        assert_eq!(format_cli_flags(None), "");
    }
}

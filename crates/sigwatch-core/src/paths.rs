//! Snapshot root resolution, snapshot file names and URL joining.

use dirs::data_dir;
use std::path::PathBuf;

/// Environment variable overriding the snapshot root.
pub const HOME_ENV: &str = "SIGWATCH_HOME";

/// Returns the snapshot root from the environment or the platform data dir,
/// or None if neither can be resolved.
pub fn try_sigwatch_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var(HOME_ENV) {
        if !val.is_empty() {
            return Some(PathBuf::from(val));
        }
    }
    data_dir().map(|d| d.join("sigwatch"))
}

/// Returns the default snapshot root, falling back to `./data`.
pub fn default_root() -> PathBuf {
    try_sigwatch_home().unwrap_or_else(|| PathBuf::from("data"))
}

/// Dated index snapshot name: `versions-YYYY-MM-DD.json`
pub fn index_file_name(date: chrono::NaiveDate) -> String {
    format!("versions-{}.json", date.format("%Y-%m-%d"))
}

/// Checksum manifest snapshot name: `<version>.txt`
pub fn manifest_file_name(version: &str) -> String {
    format!("{version}.txt")
}

/// Detached signature snapshot name: `<version>.sig`
pub fn signature_file_name(version: &str) -> String {
    format!("{version}.sig")
}

/// Marker directory, relative to the root.
pub const CHECKED_DIR: &str = "checked";

/// Marker file name for an artifact: `<filename>.checked`
pub fn marker_file_name(filename: &str) -> String {
    format!("{filename}.checked")
}

/// Append one percent-encoded path segment to a base URL.
///
/// A base that does not parse as a URL is joined textually and left for the
/// request to reject.
pub fn join_url(base: &str, segment: &str) -> String {
    let Ok(mut url) = reqwest::Url::parse(base) else {
        return format!("{}/{}", base.trim_end_matches('/'), segment);
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(segment);
    }
    url.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_name_is_dated() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(index_file_name(date), "versions-2024-03-09.json");
    }

    #[test]
    fn join_url_handles_trailing_slash() {
        assert_eq!(join_url("https://a.example/x/", "v1"), "https://a.example/x/v1");
        assert_eq!(join_url("https://a.example/x", "v1.sig"), "https://a.example/x/v1.sig");
        assert_eq!(join_url("https://a.example", "v1"), "https://a.example/v1");
    }

    #[test]
    fn join_url_encodes_reserved_characters() {
        assert_eq!(
            join_url("https://dl.example/releases", "app 1#beta?x%.bin"),
            "https://dl.example/releases/app%201%23beta%3Fx%25.bin"
        );
    }
}

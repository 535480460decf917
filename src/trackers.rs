//! Default trackers and announce list handling.

use tracing::warn;

/// Trackers every created torrent announces to unless configured otherwise.
pub static DEFAULT_TRACKERS: &[&str] = &[
    "udp://exodus.desync.com:6969",
    "udp://tracker.coppersurfer.tk:6969",
    "udp://tracker.internetwarriors.net:1337",
    "udp://tracker.leechers-paradise.org:6969",
    "udp://tracker.openbittorrent.com:80",
    "wss://tracker.btorrent.xyz",
    "wss://tracker.fastcast.nz",
    "wss://tracker.webtorrent.io",
    "wss://tracker.openwebtorrent.com",
];

/// URL schemes a tracker can be reached over.
const SUPPORTED_SCHEMES: &[&str] = &["udp", "http", "https", "ws", "wss"];

pub fn default_announce() -> Vec<String> {
    DEFAULT_TRACKERS.iter().map(|url| url.to_string()).collect()
}

/// Whether `url` looks like an announce URL we can hand to the engine
pub fn is_supported(url: &str) -> bool {
    match url.split_once("://") {
        Some((scheme, rest)) => {
            !rest.is_empty() && SUPPORTED_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str())
        }
        None => false,
    }
}

/// Flatten user-supplied announce values into a clean list.
///
/// Each value may hold several comma separated URLs. Blank and unsupported
/// entries are skipped, duplicates keep their first position. An empty
/// result falls back to [`DEFAULT_TRACKERS`].
pub fn resolve_announce<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    let mut announce: Vec<String> = Vec::new();
    for value in values {
        for url in value.as_ref().split(',') {
            let url = url.trim();
            if url.is_empty() {
                continue;
            }
            if !is_supported(url) {
                warn!(url, "skipping unsupported tracker url");
                continue;
            }
            if !announce.iter().any(|u| u == url) {
                announce.push(url.to_string());
            }
        }
    }

    if announce.is_empty() {
        default_announce()
    } else {
        announce
    }
}

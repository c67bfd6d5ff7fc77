//! The machine-mode `flutter config` query path.
//!
//! Runs `flutter config --machine`, waits up to a bounded timeout, and
//! tolerantly parses a single JSON object from stdout. The tool may print
//! non-JSON preamble lines (such as "Building flutter tool...") before the
//! object; everything up to the first line beginning with `{` is discarded.
//! That tolerance is intentional product behavior; do not tighten it.

use crate::sdk::FlutterSdk;
use flutterkit_command::{executor, CommandEvent};
use flutterkit_core::constants::CONFIG_QUERY_TIMEOUT;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Accumulates stdout lines, skipping any preamble before the JSON object.
#[derive(Default)]
struct JsonLineCollector {
    seen_starting_brace: bool,
    buffer: String,
}

impl JsonLineCollector {
    fn push(&mut self, line: &str) {
        if line.starts_with('{') {
            self.seen_starting_brace = true;
        }
        if self.seen_starting_brace {
            self.buffer.push_str(line);
            self.buffer.push('\n');
        }
    }

    fn into_text(self) -> String {
        self.buffer
    }
}

/// Extract the string value for `key` from config output.
///
/// Malformed JSON, a null root, a non-object root, a missing key, or a
/// non-string value all degrade to `None`; parse errors never propagate.
fn parse_config_value(text: &str, key: &str) -> Option<String> {
    let root: Value = match serde_json::from_str(text) {
        Ok(root) => root,
        Err(e) => {
            debug!(error = %e, "unparseable output from flutter config");
            return None;
        }
    };
    if root.is_null() {
        warn!("invalid JSON from flutter config");
        return None;
    }
    root.as_object()?.get(key)?.as_str().map(str::to_string)
}

impl FlutterSdk {
    /// Query `flutter config` for `key`.
    ///
    /// With `use_cached_value`, any previously observed result for `key` is
    /// returned without spawning a process, including a memoized absent
    /// result. Otherwise the query runs and its outcome is cached
    /// unconditionally, so a timed-out or failed fetch is remembered as
    /// absent for the lifetime of this handle.
    pub async fn query_config(&self, key: &str, use_cached_value: bool) -> Option<String> {
        if use_cached_value {
            if let Some(cached) = self.config_cache.lock().get(key) {
                return cached.clone();
            }
        }

        let value = self.query_config_impl(key).await;
        self.config_cache.lock().insert(key.to_string(), value.clone());
        value
    }

    async fn query_config_impl(&self, key: &str) -> Option<String> {
        let spec = self.flutter_config(&["--machine".to_string()]);
        let mut running = executor::spawn(&spec)?;

        info!("calling flutter config --machine");
        let start = Instant::now();

        let collected = tokio::time::timeout(CONFIG_QUERY_TIMEOUT, async {
            let mut collector = JsonLineCollector::default();
            let mut exit_code = None;
            while let Some(event) = running.next_event().await {
                match event {
                    CommandEvent::Stdout(line) => collector.push(&line),
                    CommandEvent::Stderr(_) => {}
                    CommandEvent::Exited(code) => {
                        exit_code = code;
                        break;
                    }
                }
            }
            (collector.into_text(), exit_code)
        })
        .await;

        match collected {
            Ok((text, exit_code)) => {
                info!(elapsed_ms = start.elapsed().as_millis() as u64, "flutter config --machine finished");
                if exit_code != Some(0) {
                    info!(code = ?exit_code, "nonzero exit from flutter config --machine");
                    return None;
                }
                parse_config_value(&text, key)
            }
            Err(_) => {
                info!("timeout when calling flutter config --machine");
                running.kill();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_skips_preamble() {
        let mut collector = JsonLineCollector::default();
        collector.push("Building flutter tool...");
        collector.push("Downloading engine artifacts...");
        collector.push(r#"{"android-studio-dir":"/opt/AS"}"#);
        assert_eq!(
            collector.into_text(),
            "{\"android-studio-dir\":\"/opt/AS\"}\n"
        );
    }

    #[test]
    fn test_collector_keeps_lines_after_brace() {
        let mut collector = JsonLineCollector::default();
        collector.push("noise");
        collector.push("{");
        collector.push("  \"k\": \"v\"");
        collector.push("}");
        assert_eq!(collector.into_text(), "{\n  \"k\": \"v\"\n}\n");
    }

    #[test]
    fn test_parse_config_value_happy_path() {
        let mut collector = JsonLineCollector::default();
        collector.push("Building flutter tool...");
        collector.push(r#"{"k":"v"}"#);
        assert_eq!(
            parse_config_value(&collector.into_text(), "k"),
            Some("v".to_string())
        );
    }

    #[test]
    fn test_parse_config_value_degrades_to_absent() {
        assert_eq!(parse_config_value("{not json", "k"), None);
        assert_eq!(parse_config_value("null", "k"), None);
        assert_eq!(parse_config_value("[1,2]", "k"), None);
        assert_eq!(parse_config_value(r#"{"other":"v"}"#, "k"), None);
        assert_eq!(parse_config_value(r#"{"k":42}"#, "k"), None);
        assert_eq!(parse_config_value("", "k"), None);
    }
}

//! Report normalization use case
//!
//! Converts a [`RawError`] delivered by the stack-capture collaborator into
//! the canonical [`Report`] shape:
//!
//! 1. Summarize the error (`"Name: message"` in stack mode).
//! 2. Build the base report and merge the ambient [`Context`] over it.
//! 3. Synthesize a UUIDv4 `request_id` if the context supplied none.
//! 4. Reverse the stack (most recent call first) and keep the last
//!    [`MAX_TRACEBACK_FRAMES`] entries of the reversed sequence.
//! 5. Build one [`TracebackLine`] per retained frame, eliding minified lines.
//! 6. Append the summary to the last traceback line.
//!
//! Unreadable frame context never aborts normalization: that frame's
//! `cline` degrades to empty and the remaining frames are processed.

use serde_json::{json, Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::domain::context::REQUEST_ID_KEY;
use crate::domain::{Context, RawError, RawFrame, Report, TracebackLine};
use crate::usecases::timestamp_now;

/// Client identifier expected by the collector for this report family
pub const CLIENT_NAME: &str = "javascript";

/// Language identifier expected by the collector for this report family
pub const LANGUAGE: &str = "javascript";

/// Maximum number of traceback lines per report
pub const MAX_TRACEBACK_FRAMES: usize = 100;

/// Context lines longer than this (in characters) are elided
pub const MAX_CONTEXT_LINE_LEN: usize = 300;

/// Placeholder substituted for an elided context line
pub const MINIFIED_CONTEXT: &str = "<minified-context>";

const DEFAULT_PRIORITY: u32 = 5;
const DEFAULT_HTTP_STATUS: u16 = 500;

/// Outcome of normalizing one captured error
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedReport {
    pub report: Report,
    /// Frames whose context could not be read and degraded to empty
    pub degraded_frames: usize,
}

/// Builds canonical reports from captured errors
#[derive(Debug, Clone)]
pub struct ReportNormalizer {
    user_agent: String,
}

impl ReportNormalizer {
    /// Creates a normalizer stamping `user_agent` on every report
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Normalizes `raw` with the current `context` merged in
    pub fn normalize(&self, raw: &RawError, context: &Context) -> NormalizedReport {
        let error_msg = raw.summary();

        let mut degraded_frames = 0;
        let mut traceback: Vec<TracebackLine> = retained_frames(&raw.stack)
            .map(|frame| {
                let (line, degraded) = traceback_line(frame);
                if degraded {
                    degraded_frames += 1;
                }
                line
            })
            .collect();

        if let Some(last) = traceback.last_mut() {
            if !last.cline.is_empty() && !last.cline.ends_with('\n') {
                last.cline.push('\n');
            }
            last.cline.push_str(&error_msg);
        }

        let mut fields = match json!({
            "client": CLIENT_NAME,
            "language": LANGUAGE,
            "error": error_msg,
            "occurences": 1,
            "priority": DEFAULT_PRIORITY,
            "server": "",
            "http_status": DEFAULT_HTTP_STATUS,
            "request": {},
            "traceback": traceback,
            "user_agent": self.user_agent,
            "start_time": timestamp_now(),
        }) {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };

        for (key, value) in context.as_map() {
            fields.insert(key.clone(), value.clone());
        }

        if fields.get(REQUEST_ID_KEY).map_or(true, is_falsy) {
            fields.insert(
                REQUEST_ID_KEY.to_string(),
                Value::String(Uuid::new_v4().to_string()),
            );
        }

        NormalizedReport {
            report: Report::from_fields(fields),
            degraded_frames,
        }
    }
}

/// Most-recent-first frames, capped to the last [`MAX_TRACEBACK_FRAMES`]
/// entries of the reversed stack
fn retained_frames(stack: &[RawFrame]) -> impl Iterator<Item = &RawFrame> {
    let skip = stack.len().saturating_sub(MAX_TRACEBACK_FRAMES);
    stack.iter().rev().skip(skip)
}

/// Builds a traceback line; the flag is `true` when the context was unreadable
fn traceback_line(frame: &RawFrame) -> (TracebackLine, bool) {
    let (cline, degraded) = match frame.context_lines() {
        Ok(lines) => (render_context(&lines), false),
        Err(e) => {
            debug!(file = %frame.url, function = %frame.function, error = %e, "Dropping unreadable frame context");
            (String::new(), true)
        }
    };

    let line = TracebackLine {
        cline,
        file: frame.url.clone(),
        function: frame.function.clone(),
        line: frame.line.unwrap_or(0),
        vars: Vec::new(),
    };
    (line, degraded)
}

fn render_context(lines: &[&str]) -> String {
    let mut cline = String::new();
    for line in lines {
        if line.chars().count() > MAX_CONTEXT_LINE_LEN {
            cline.push_str(MINIFIED_CONTEXT);
        } else {
            cline.push_str(line);
        }
        cline.push('\n');
    }
    cline
}

/// Absent-equivalent values: `null`, `false`, `0` and `""`
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::ErrorMode;

    fn frames(n: usize) -> Vec<RawFrame> {
        (0..n)
            .map(|i| RawFrame::new("https://cdn.example.com/app.js", format!("f{i}"), i as u32))
            .collect()
    }

    fn normalizer() -> ReportNormalizer {
        ReportNormalizer::new("Mozilla/5.0 (test)")
    }

    fn is_uuid_v4_shape(id: &str) -> bool {
        let parts: Vec<&str> = id.split('-').collect();
        let lens: Vec<usize> = parts.iter().map(|p| p.len()).collect();
        lens == [8, 4, 4, 4, 12]
            && id
                .chars()
                .all(|c| c == '-' || c.is_ascii_digit() || ('a'..='f').contains(&c))
            && parts[2].starts_with('4')
            && matches!(parts[3].chars().next(), Some('8' | '9' | 'a' | 'b'))
    }

    #[test]
    fn test_base_fields_and_summary() {
        let raw = RawError::new("TypeError", "x is undefined");
        let report = normalizer().normalize(&raw, &Context::new()).report;

        assert_eq!(report.error(), Some("TypeError: x is undefined"));
        assert_eq!(report.get("client"), Some(&json!("javascript")));
        assert_eq!(report.get("language"), Some(&json!("javascript")));
        assert_eq!(report.get("occurences"), Some(&json!(1)));
        assert_eq!(report.get("priority"), Some(&json!(5)));
        assert_eq!(report.get("server"), Some(&json!("")));
        assert_eq!(report.get("http_status"), Some(&json!(500)));
        assert_eq!(report.get("request"), Some(&json!({})));
        assert_eq!(report.get("user_agent"), Some(&json!("Mozilla/5.0 (test)")));
        assert!(report.traceback().is_empty());

        let start_time = report.get("start_time").and_then(Value::as_str).unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(start_time).is_ok());
        assert!(start_time.ends_with('Z'));
    }

    #[test]
    fn test_non_stack_mode_uses_bare_message() {
        let raw = RawError::new("Error", "Script error.")
            .with_mode(ErrorMode::Other("onerror".to_string()));
        let report = normalizer().normalize(&raw, &Context::new()).report;
        assert_eq!(report.error(), Some("Script error."));
    }

    #[test]
    fn test_context_overrides_base_fields() {
        let mut context = Context::with_url("https://app.example.com/cart");
        context.merge([("server", json!("web-1")), ("priority", json!(9))]);

        let report = normalizer()
            .normalize(&RawError::new("E", "m"), &context)
            .report;

        assert_eq!(report.get("url"), Some(&json!("https://app.example.com/cart")));
        assert_eq!(report.get("server"), Some(&json!("web-1")));
        assert_eq!(report.get("priority"), Some(&json!(9)));
    }

    #[test]
    fn test_request_id_synthesized_when_missing() {
        let report = normalizer()
            .normalize(&RawError::new("E", "m"), &Context::new())
            .report;
        let id = report.request_id().expect("request_id present");
        assert!(is_uuid_v4_shape(id), "bad request_id shape: {id}");
    }

    #[test]
    fn test_request_id_synthesized_when_falsy() {
        for falsy in [json!(""), json!(null), json!(false), json!(0)] {
            let mut context = Context::new();
            context.insert(REQUEST_ID_KEY, falsy.clone());

            let report = normalizer()
                .normalize(&RawError::new("E", "m"), &context)
                .report;
            let id = report.request_id().expect("request_id present");
            assert!(is_uuid_v4_shape(id), "falsy {falsy} kept: {id}");
        }
    }

    #[test]
    fn test_request_id_from_context_is_kept() {
        let mut context = Context::new();
        context.insert(REQUEST_ID_KEY, json!("req-42"));

        let report = normalizer()
            .normalize(&RawError::new("E", "m"), &context)
            .report;
        assert_eq!(report.request_id(), Some("req-42"));
    }

    #[test]
    fn test_synthesized_request_ids_differ() {
        let n = normalizer();
        let a = n.normalize(&RawError::new("E", "m"), &Context::new()).report;
        let b = n.normalize(&RawError::new("E", "m"), &Context::new()).report;
        assert_ne!(a.request_id(), b.request_id());
    }

    #[test]
    fn test_traceback_is_reversed() {
        let raw = RawError::new("E", "m").with_stack(frames(3));
        let traceback = normalizer().normalize(&raw, &Context::new()).report.traceback();

        let names: Vec<&str> = traceback.iter().map(|l| l.function.as_str()).collect();
        assert_eq!(names, vec!["f2", "f1", "f0"]);
    }

    #[test]
    fn test_traceback_capped_to_last_hundred_of_reversed() {
        let stack = frames(150);
        let raw = RawError::new("E", "m").with_stack(stack.clone());
        let traceback = normalizer().normalize(&raw, &Context::new()).report.traceback();

        assert_eq!(traceback.len(), MAX_TRACEBACK_FRAMES);

        let mut reversed = stack;
        reversed.reverse();
        let expected: Vec<String> = reversed[50..].iter().map(|f| f.function.clone()).collect();
        let actual: Vec<String> = traceback.iter().map(|l| l.function.clone()).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_exactly_hundred_frames_kept_whole() {
        let raw = RawError::new("E", "m").with_stack(frames(100));
        let traceback = normalizer().normalize(&raw, &Context::new()).report.traceback();
        assert_eq!(traceback.len(), 100);
        assert_eq!(traceback[0].function, "f99");
        assert_eq!(traceback[99].function, "f0");
    }

    #[test]
    fn test_cline_joins_context_lines() {
        let frame = RawFrame::new("a.js", "outer", 7).with_context(["var a = 1;", "foo(a);"]);
        let inner = RawFrame::new("a.js", "inner", 3).with_context(["bar();"]);
        // outer was called first; inner is the error site
        let raw = RawError::new("E", "m").with_stack(vec![frame, inner]);
        let traceback = normalizer().normalize(&raw, &Context::new()).report.traceback();

        assert_eq!(traceback[0].cline, "bar();\n");
        assert_eq!(traceback[0].file, "a.js");
        assert_eq!(traceback[0].line, 3);
        assert!(traceback[0].vars.is_empty());
        assert_eq!(traceback[1].cline, "var a = 1;\nfoo(a);\nE: m");
    }

    #[test]
    fn test_long_context_line_replaced_by_placeholder() {
        let long = "x".repeat(MAX_CONTEXT_LINE_LEN + 1);
        let exact = "y".repeat(MAX_CONTEXT_LINE_LEN);
        let frames = vec![
            RawFrame::new("min.js", "a", 1).with_context([long.as_str(), exact.as_str()]),
            RawFrame::new("min.js", "b", 2),
        ];
        let raw = RawError::new("E", "m").with_stack(frames);
        let traceback = normalizer().normalize(&raw, &Context::new()).report.traceback();

        assert_eq!(traceback[1].cline, format!("{MINIFIED_CONTEXT}\n{exact}\nE: m"));
    }

    #[test]
    fn test_summary_appended_to_last_line_without_context() {
        let raw = RawError::new("RangeError", "too deep").with_stack(frames(2));
        let traceback = normalizer().normalize(&raw, &Context::new()).report.traceback();

        assert_eq!(traceback[0].cline, "");
        assert_eq!(traceback[1].cline, "RangeError: too deep");
    }

    #[test]
    fn test_malformed_frame_degrades_without_aborting() {
        let mut bad = RawFrame::new("a.js", "bad", 5);
        bad.context = Some(json!(["fine", {"not": "a string"}]));
        let good = RawFrame::new("a.js", "good", 6).with_context(["ok();"]);
        let raw = RawError::new("E", "m").with_stack(vec![good, bad]);

        let normalized = normalizer().normalize(&raw, &Context::new());
        let traceback = normalized.report.traceback();

        assert_eq!(normalized.degraded_frames, 1);
        assert_eq!(traceback.len(), 2);
        assert_eq!(traceback[0].function, "bad");
        assert_eq!(traceback[0].cline, "");
        assert_eq!(traceback[1].cline, "ok();\nE: m");
    }

    #[test]
    fn test_missing_line_number_becomes_zero() {
        let mut frame = RawFrame::new("a.js", "anon", 1);
        frame.line = None;
        let raw = RawError::new("E", "m").with_stack(vec![frame]);
        let traceback = normalizer().normalize(&raw, &Context::new()).report.traceback();
        assert_eq!(traceback[0].line, 0);
    }

    #[test]
    fn test_wrongly_typed_frame_from_json_keeps_good_frames() {
        let raw: RawError = serde_json::from_value(json!({
            "name": "TypeError",
            "message": "x is undefined",
            "stack": [
                {"url": "app.js", "func": "pay", "line": 12, "context": ["pay();"]},
                {"url": null, "func": {"name": "retry"}, "line": -1},
            ]
        }))
        .unwrap();
        let traceback = normalizer().normalize(&raw, &Context::new()).report.traceback();

        assert_eq!(traceback.len(), 2);
        assert_eq!(traceback[0].file, "");
        assert_eq!(traceback[0].function, "");
        assert_eq!(traceback[0].line, 0);
        assert_eq!(traceback[1].file, "app.js");
        assert_eq!(traceback[1].line, 12);
        assert_eq!(traceback[1].cline, "pay();\nTypeError: x is undefined");
    }

    #[test]
    fn test_is_falsy() {
        assert!(is_falsy(&json!(null)));
        assert!(is_falsy(&json!(false)));
        assert!(is_falsy(&json!(0)));
        assert!(is_falsy(&json!(0.0)));
        assert!(is_falsy(&json!("")));
        assert!(!is_falsy(&json!("0")));
        assert!(!is_falsy(&json!(1)));
        assert!(!is_falsy(&json!([])));
        assert!(!is_falsy(&json!({})));
    }
}

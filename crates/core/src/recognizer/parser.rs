// crates/core/src/recognizer/parser.rs
//! Extracts per-line detections from PaddleOCR's stdout.
//!
//! The CLI logs each detection as a Python literal, usually behind a logger
//! prefix:
//!
//! ```text
//! [2024/03/01 10:00:00] ppocr INFO: [[[28.0, 37.0], [302.0, 39.0], [302.0, 72.0], [27.0, 70.0]], ('HELLO', 0.9935)]
//! ```
//!
//! Anything else (model download chatter, timing lines) is ignored.

use std::sync::OnceLock;

use regex_lite::Regex;

use super::types::RecognizedLine;

fn detection_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"\[\[\[([-0-9.eE+,\s\[\]]+?)\]\],\s*\((?:'((?:[^'\\]|\\.)*)'|"((?:[^"\\]|\\.)*)"),\s*([-0-9.eE+]+)\)\]"#,
        )
        .expect("detection regex is valid")
    })
}

/// Parse every detection line found in `raw`.
pub fn parse_lines(raw: &str) -> Vec<RecognizedLine> {
    raw.lines().filter_map(parse_line).collect()
}

/// Parse a single stdout line, returning `None` when it is not a detection.
pub fn parse_line(line: &str) -> Option<RecognizedLine> {
    let caps = detection_re().captures(line)?;

    let bbox = parse_bbox(caps.get(1)?.as_str())?;
    let quoted = caps.get(2).or_else(|| caps.get(3))?.as_str();
    let confidence: f32 = caps.get(4)?.as_str().parse().ok()?;

    Some(RecognizedLine {
        text: unescape_py(quoted),
        confidence,
        bbox,
    })
}

fn parse_bbox(points: &str) -> Option<[[f32; 2]; 4]> {
    let nums: Vec<f32> = points
        .split(|c: char| c == ',' || c == '[' || c == ']' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    if nums.len() != 8 {
        return None;
    }
    Some([
        [nums[0], nums[1]],
        [nums[2], nums[3]],
        [nums[4], nums[5]],
        [nums[6], nums[7]],
    ])
}

/// Undo the escaping Python applies in `repr()` of a str.
fn unescape_py(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

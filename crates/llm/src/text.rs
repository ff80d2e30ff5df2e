//! Post-processing of model output
//!
//! The model is asked for plain text but still emits markdown now and then.
//! Responses are stored and displayed as plain text, so headers, bold
//! markers and bullet markers are stripped here.

use std::sync::OnceLock;

use regex::Regex;

const BULLET_MARKERS: [char; 3] = ['-', '*', '•'];

fn blank_run() -> &'static Regex {
    static BLANK_RUN: OnceLock<Regex> = OnceLock::new();
    BLANK_RUN.get_or_init(|| Regex::new(r"\n{3,}").expect("valid regex"))
}

/// Remove markdown formatting, leaving clean plain text.
pub fn clean_markdown_formatting(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = text
        .replace("### ", "")
        .replace("## ", "")
        .replace("# ", "")
        .replace("**", "");

    let cleaned = text
        .split('\n')
        .map(|line| {
            let stripped = line.trim();
            match stripped.strip_prefix(BULLET_MARKERS) {
                Some(rest) => rest.trim().to_string(),
                None => line.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    blank_run()
        .replace_all(&cleaned, "\n\n")
        .trim()
        .to_string()
}

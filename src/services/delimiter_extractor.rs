//! Labeled block extraction.
//!
//! Replies carry their payload between a start and an end label
//! (`Start:` ... `End:`, `subtopicsStart:` ... `subtopicsEnd:`). Labels are
//! matched case-insensitively as whole words, so `Start:` never matches the
//! tail of `subtopicsStart:`. Whitespace between a label and its colon is
//! tolerated.

use regex::Regex;

use crate::domain::models::{ErrorLog, LabelPair, ParseIssue};

fn label_pattern(label: &str) -> Result<Regex, ParseIssue> {
    Regex::new(&format!(r"(?i)\b{}\s*:", regex::escape(label)))
        .map_err(|e| ParseIssue::Unexpected(format!("invalid label '{label}': {e}")))
}

/// Normalize Windows line endings so line splitting is uniform.
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Extract the trimmed text between the first start label and the first end
/// label that follows it.
pub fn extract_block(reply: &str, labels: &LabelPair) -> Result<String, ParseIssue> {
    let text = normalize_newlines(reply);
    let start_re = label_pattern(&labels.start)?;
    let end_re = label_pattern(&labels.end)?;

    let start = start_re
        .find(&text)
        .ok_or_else(|| ParseIssue::MissingStartLabel {
            label: labels.start_label(),
        })?;

    let Some(end) = end_re.find_at(&text, start.end()) else {
        if end_re.find(&text[..start.start()]).is_some() {
            return Err(ParseIssue::InvertedLabels {
                start: labels.start_label(),
                end: labels.end_label(),
            });
        }
        return Err(ParseIssue::MissingEndLabel {
            label: labels.end_label(),
        });
    };

    let block = text[start.end()..end.start()].trim();
    if block.is_empty() {
        return Err(ParseIssue::EmptyBlock {
            start: labels.start_label(),
            end: labels.end_label(),
        });
    }
    Ok(block.to_string())
}

/// Like [`extract_block`], recording the failure instead of returning it.
pub fn extract_into(reply: &str, labels: &LabelPair, log: &mut ErrorLog) -> Option<String> {
    match extract_block(reply, labels) {
        Ok(block) => Some(block),
        Err(issue) => {
            log.record(issue);
            None
        }
    }
}

/// Non-empty trimmed lines of a block.
pub fn block_lines(block: &str) -> Vec<&str> {
    block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

//! LaTeX safety checks for generated text.
//!
//! Multi-line environments (`align`, `equation`, `matrix`, ...) break the
//! renderer used for the generated content, so they are rejected wherever
//! they appear: inside `$...$`, `$$...$$`, `\(...\)`, `\[...\]` spans and in
//! the surrounding prose. The first violation wins.

use regex::Regex;
use std::sync::LazyLock;

use crate::domain::models::{ErrorLog, LatexLocation, ParseIssue};

/// Environments that must not appear in generated text.
pub const FORBIDDEN_ENVIRONMENTS: [&str; 7] = [
    "align", "equation", "array", "matrix", "multline", "gather", "flalign",
];

static FORMULA_SPANS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        r"(?s)\$\$(.*?)\$\$",
        r"(?s)\\\[(.*?)\\\]",
        r"(?s)\\\((.*?)\\\)",
        r"(?s)\$(.*?)\$",
    ]
    .map(|pattern| Regex::new(pattern).expect("formula span pattern is valid"))
});

static ANY_FORMULA_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\$\$.*?\$\$|\\\[.*?\\\]|\\\(.*?\\\)|\$.*?\$")
        .expect("combined formula span pattern is valid")
});

static FORBIDDEN_ENV: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = FORBIDDEN_ENVIRONMENTS.join("|");
    Regex::new(&format!(r"\\(?:begin|end)\s*\{{({alternatives})\*?\}}"))
        .expect("forbidden environment pattern is valid")
});

fn forbidden_env_in(text: &str) -> Option<String> {
    FORBIDDEN_ENV
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Check `text` for forbidden environments, inside formula spans first and
/// then in the text that remains once every span is removed.
pub fn check(text: &str) -> Result<(), ParseIssue> {
    for span in FORMULA_SPANS.iter() {
        for caps in span.captures_iter(text) {
            let inner = caps.get(1).map_or("", |m| m.as_str());
            if let Some(env) = forbidden_env_in(inner) {
                let matched = caps.get(0).map_or("", |m| m.as_str());
                return Err(ParseIssue::ForbiddenLatexEnvironment {
                    env,
                    location: LatexLocation::InsideFormula,
                    matched: matched.to_string(),
                });
            }
        }
    }

    let residue = ANY_FORMULA_SPAN.replace_all(text, "");
    if let Some(env) = forbidden_env_in(&residue) {
        return Err(ParseIssue::ForbiddenLatexEnvironment {
            env,
            location: LatexLocation::OutsideFormula,
            matched: text.to_string(),
        });
    }
    Ok(())
}

/// Run [`check`] and record a violation. Returns whether the text is safe.
pub fn is_safe(text: &str, log: &mut ErrorLog) -> bool {
    match check(text) {
        Ok(()) => true,
        Err(issue) => {
            log.record(issue);
            false
        }
    }
}

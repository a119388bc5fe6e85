//! Numbered curriculum outline parsing.
//!
//! ```text
//! 1. Numbers
//! 1.1 Natural numbers
//!     continued description
//! 1.2 Fractions
//! 2. Geometry
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

static SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.\s+(.+)").expect("section pattern is valid"));

static TOPIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.\d+)\s+(.+)").expect("topic pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSection {
    pub section: String,
    pub topics: Vec<String>,
}

impl PlanSection {
    fn new(title: &str) -> Self {
        Self {
            section: title.trim().to_string(),
            topics: Vec::new(),
        }
    }

    fn push_topic(&mut self, lines: &mut Vec<String>) {
        if lines.is_empty() {
            return;
        }
        let topic = lines.join("\n").trim().to_string();
        lines.clear();
        if !topic.is_empty() {
            self.topics.push(topic);
        }
    }

    fn dedup_topics(&mut self) {
        let mut seen = HashSet::new();
        self.topics.retain(|topic| seen.insert(topic.trim().to_string()));
    }
}

/// Parse an outline into sections. Lines before the first section and
/// continuation lines outside any topic are ignored.
pub fn parse_plan(text: &str) -> Vec<PlanSection> {
    let mut sections: Vec<PlanSection> = Vec::new();
    let mut topic_lines: Vec<String> = Vec::new();
    let mut in_topic = false;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(caps) = TOPIC.captures(line) {
            if let Some(section) = sections.last_mut() {
                section.push_topic(&mut topic_lines);
            }
            topic_lines.clear();
            topic_lines.push(caps[2].trim().to_string());
            in_topic = true;
        } else if let Some(caps) = SECTION.captures(line) {
            if let Some(section) = sections.last_mut() {
                section.push_topic(&mut topic_lines);
            }
            topic_lines.clear();
            sections.push(PlanSection::new(&caps[2]));
            in_topic = false;
        } else if in_topic && !sections.is_empty() {
            topic_lines.push(line.to_string());
        }
    }
    if let Some(section) = sections.last_mut() {
        section.push_topic(&mut topic_lines);
    }

    for section in &mut sections {
        section.dedup_topics();
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_and_topics() {
        let plan = parse_plan(
            "Plan:\n1. Numbers\n1.1 Natural numbers\nCounting and order\n1.2 Fractions\n\n\
             2. Geometry\n2.1 Triangles\n",
        );
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].section, "Numbers");
        assert_eq!(
            plan[0].topics,
            vec!["Natural numbers\nCounting and order", "Fractions"]
        );
        assert_eq!(plan[1].topics, vec!["Triangles"]);
    }

    #[test]
    fn test_duplicate_topics_removed_within_section() {
        let plan = parse_plan("1. A\n1.1 X\n1.2 X\n2. B\n2.1 X");
        assert_eq!(plan[0].topics, vec!["X"]);
        assert_eq!(plan[1].topics, vec!["X"]);
    }

    #[test]
    fn test_lines_before_first_section_ignored() {
        let plan = parse_plan("intro\n0.1 Orphan topic\n1. Real\nstray line\n1.1 Kept");
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].topics, vec!["Kept"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_plan("").is_empty());
    }
}

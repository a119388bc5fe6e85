//! `edugen plan`: split a course outline into sections and topics.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::cli::commands::read_input;
use crate::cli::output::{output, single_line, truncate, CommandOutput};
use crate::cli::table::{list_table, render_list};
use crate::services::{parse_plan, PlanSection};

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Outline text file, or `-` for stdin
    #[arg(short, long)]
    pub input: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct PlanOutput {
    pub sections: Vec<PlanSection>,
    pub total_topics: usize,
}

impl CommandOutput for PlanOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["section", "topic"]);
        for section in &self.sections {
            if section.topics.is_empty() {
                table.add_row(vec![section.section.clone(), "-".to_string()]);
            }
            for topic in &section.topics {
                table.add_row(vec![section.section.clone(), truncate(&single_line(topic), 80)]);
            }
        }
        render_list("section", &table, self.sections.len())
    }
}

pub async fn execute(args: PlanArgs, json_mode: bool) -> Result<()> {
    let text = read_input(&args.input)?;
    let sections = parse_plan(&text);
    let total_topics = sections.iter().map(|s| s.topics.len()).sum();
    output(
        &PlanOutput {
            sections,
            total_topics,
        },
        json_mode,
    );
    Ok(())
}

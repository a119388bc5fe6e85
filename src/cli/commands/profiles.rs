//! `edugen profiles`: list the built-in generator profiles.

use anyhow::Result;
use clap::Args;

use crate::cli::output::{output, CommandOutput};
use crate::cli::table::{list_table, render_list};
use crate::domain::models::{Config, FieldSpec};
use crate::services::{GeneratorProfile, ProfileCatalog};

#[derive(Args, Debug)]
pub struct ProfilesArgs {
    /// Show only this profile, with one row per field
    pub name: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct FieldOutput {
    pub name: String,
    pub shape: &'static str,
    pub start_label: String,
    pub end_label: String,
    pub whitelisted: bool,
    pub compared_as_set: bool,
}

impl From<&FieldSpec> for FieldOutput {
    fn from(spec: &FieldSpec) -> Self {
        Self {
            name: spec.name.clone(),
            shape: spec.shape.describe(),
            start_label: spec.labels.start_label(),
            end_label: spec.labels.end_label(),
            whitelisted: spec.whitelist,
            compared_as_set: spec.compare_as_set,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ProfileOutput {
    pub name: &'static str,
    pub description: &'static str,
    pub fields: Vec<FieldOutput>,
}

#[derive(Debug, serde::Serialize)]
pub struct ProfileListOutput {
    pub profiles: Vec<ProfileOutput>,
    pub total: usize,
}

impl CommandOutput for ProfileListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["name", "fields", "description"]);
        for profile in &self.profiles {
            let fields: Vec<&str> = profile.fields.iter().map(|f| f.name.as_str()).collect();
            table.add_row(vec![
                profile.name.to_string(),
                fields.join(", "),
                profile.description.to_string(),
            ]);
        }
        render_list("profile", &table, self.total)
    }
}

impl CommandOutput for ProfileOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["field", "shape", "labels", "whitelist", "set"]);
        for field in &self.fields {
            table.add_row(vec![
                field.name.clone(),
                field.shape.to_string(),
                format!("{} .. {}", field.start_label, field.end_label),
                yes_no(field.whitelisted).to_string(),
                yes_no(field.compared_as_set).to_string(),
            ]);
        }
        format!("{}: {}\n\n{table}", self.name, self.description)
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

impl From<&GeneratorProfile> for ProfileOutput {
    fn from(profile: &GeneratorProfile) -> Self {
        Self {
            name: profile.name,
            description: profile.description,
            fields: profile.fields.iter().map(FieldOutput::from).collect(),
        }
    }
}

fn profile_outputs(catalog: &ProfileCatalog) -> Vec<ProfileOutput> {
    catalog.iter().map(ProfileOutput::from).collect()
}

pub async fn execute(args: ProfilesArgs, config: &Config, json_mode: bool) -> Result<()> {
    let catalog = ProfileCatalog::new(&config.engine);
    match args.name {
        Some(name) => {
            let profile = catalog.get(&name)?;
            output(&ProfileOutput::from(profile), json_mode);
        }
        None => {
            let profiles = profile_outputs(&catalog);
            let total = profiles.len();
            output(&ProfileListOutput { profiles, total }, json_mode);
        }
    }
    Ok(())
}

// `trellis templates` — list, create, and activate templates.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Args, Subcommand};
use serde::Serialize;
use uuid::Uuid;

use trellis_common::types::Template;
use trellis_engine::store::templates::TemplateStore;

use crate::commands::open_db;
use crate::output::{self, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum TemplatesCommand {
    /// List all templates
    List(ListArgs),
    /// Create a new template
    Create(CreateArgs),
    /// Activate or deactivate a template
    Activate(ActivateArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Structure database path override.
    #[arg(long)]
    db: Option<PathBuf>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Template name.
    pub name: String,

    /// Template version.
    #[arg(long, default_value_t = 1)]
    pub version: i64,

    #[arg(long)]
    db: Option<PathBuf>,

    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
pub struct ActivateArgs {
    /// Template id.
    pub template: Uuid,

    /// Deactivate instead of activate.
    #[arg(long)]
    pub off: bool,

    #[arg(long)]
    db: Option<PathBuf>,

    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct TemplateList {
    templates: Vec<Template>,
}

#[derive(Debug, Serialize)]
struct ActivateResult {
    template_id: Uuid,
    is_active: bool,
}

pub fn run(cmd: TemplatesCommand) -> anyhow::Result<()> {
    match cmd {
        TemplatesCommand::List(args) => run_list(args),
        TemplatesCommand::Create(args) => run_create(args),
        TemplatesCommand::Activate(args) => run_activate(args),
    }
}

fn run_list(args: ListArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let db = open_db(args.db.as_deref())?;

    match TemplateStore::list(db.connection()) {
        Ok(templates) => {
            output::print_output(format, &TemplateList { templates }, format_list)?;
            Ok(())
        }
        Err(error) => {
            let error = anyhow::Error::from(error);
            output::print_anyhow_error(format, &error);
            Err(error)
        }
    }
}

fn run_create(args: CreateArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let db = open_db(args.db.as_deref())?;

    let template = Template {
        id: Uuid::new_v4(),
        name: args.name,
        version: args.version,
        is_active: true,
        created_at: Utc::now(),
    };
    match TemplateStore::insert(db.connection(), &template) {
        Ok(()) => {
            output::print_output(format, &template, |t: &Template| {
                format!("Created template {} (v{}): {}", t.id, t.version, t.name)
            })?;
            Ok(())
        }
        Err(error) => {
            let error = anyhow::Error::from(error);
            output::print_anyhow_error(format, &error);
            Err(error)
        }
    }
}

fn run_activate(args: ActivateArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let db = open_db(args.db.as_deref())?;
    let is_active = !args.off;

    match TemplateStore::set_active(db.connection(), args.template, is_active) {
        Ok(true) => {
            let result = ActivateResult { template_id: args.template, is_active };
            output::print_output(format, &result, |r: &ActivateResult| {
                let state = if r.is_active { "active" } else { "inactive" };
                format!("Template {} is now {state}", r.template_id)
            })?;
            Ok(())
        }
        Ok(false) => {
            let error =
                trellis_engine::error::StructureError::TemplateNotFound(args.template);
            output::print_structure_error(format, &error);
            Err(error.into())
        }
        Err(error) => {
            let error = anyhow::Error::from(error);
            output::print_anyhow_error(format, &error);
            Err(error)
        }
    }
}

fn format_list(list: &TemplateList) -> String {
    if list.templates.is_empty() {
        return "No templates.".to_string();
    }
    let mut lines = Vec::new();
    for template in &list.templates {
        let state = if template.is_active { "" } else { "  (inactive)" };
        lines.push(format!("{}  v{}  {}{state}", template.id, template.version, template.name));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn template(name: &str, version: i64, is_active: bool) -> Template {
        Template {
            id: Uuid::nil(),
            name: name.into(),
            version,
            is_active,
            created_at: Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid timestamp"),
        }
    }

    #[test]
    fn list_formats_active_and_inactive() {
        let list = TemplateList {
            templates: vec![template("CSR", 2, true), template("Protocol", 1, false)],
        };
        let rendered = format_list(&list);
        assert!(rendered.contains("v2  CSR"));
        assert!(rendered.contains("v1  Protocol  (inactive)"));
    }

    #[test]
    fn empty_list_renders_placeholder() {
        let list = TemplateList { templates: vec![] };
        assert_eq!(format_list(&list), "No templates.");
    }

    #[test]
    fn json_list_roundtrips() {
        let list = TemplateList { templates: vec![template("CSR", 1, true)] };
        let mut buf = Vec::new();
        output::write_output(&mut buf, OutputFormat::Json, &list, format_list).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed["templates"][0]["name"], "CSR");
    }
}

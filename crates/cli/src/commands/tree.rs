// `trellis tree` — show a template's numbered section structure.

use std::path::PathBuf;

use clap::Args;
use uuid::Uuid;

use trellis_common::tree::SectionNode;
use trellis_engine::view::{template_structure, TemplateStructure};

use crate::commands::open_db;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Template id.
    pub template: Uuid,

    /// Show section ids next to each title.
    #[arg(long)]
    pub ids: bool,

    /// Structure database path override.
    #[arg(long)]
    db: Option<PathBuf>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

pub fn run(args: TreeArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let db = open_db(args.db.as_deref())?;

    match template_structure(db.connection(), args.template) {
        Ok(structure) => {
            let show_ids = args.ids;
            output::print_output(format, &structure, |s| format_human(s, show_ids))?;
            Ok(())
        }
        Err(error) => {
            output::print_structure_error(format, &error);
            Err(error.into())
        }
    }
}

fn format_human(structure: &TemplateStructure, show_ids: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} (v{})",
        structure.template.name, structure.template.version
    ));
    for node in &structure.tree {
        render_node(&mut lines, node, show_ids);
    }
    if structure.tree.is_empty() {
        lines.push("  (no sections)".to_string());
    }
    lines.join("\n")
}

fn render_node(lines: &mut Vec<String>, node: &SectionNode, show_ids: bool) {
    let depth = node.number.matches('.').count();
    let indent = "  ".repeat(depth + 1);
    if show_ids {
        lines.push(format!("{indent}{} {} [{}]", node.number, node.title, node.id));
    } else {
        lines.push(format!("{indent}{} {}", node.number, node.title));
    }
    for child in &node.children {
        render_node(lines, child, show_ids);
    }
}

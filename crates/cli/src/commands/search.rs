// `trellis search` — title search across other templates, for picking
// mapping sources.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use uuid::Uuid;

use trellis_engine::view::{search_sections, SectionHit};

use crate::commands::open_db;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Template whose own sections are excluded from results.
    pub template: Uuid,

    /// Title substring to search for (case-insensitive).
    pub query: String,

    /// Structure database path override.
    #[arg(long)]
    db: Option<PathBuf>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct SearchResult {
    query: String,
    hits: Vec<SectionHit>,
}

pub fn run(args: SearchArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let db = open_db(args.db.as_deref())?;

    match search_sections(db.connection(), args.template, &args.query) {
        Ok(hits) => {
            let result = SearchResult { query: args.query, hits };
            output::print_output(format, &result, format_human)?;
            Ok(())
        }
        Err(error) => {
            output::print_structure_error(format, &error);
            Err(error.into())
        }
    }
}

fn format_human(result: &SearchResult) -> String {
    if result.hits.is_empty() {
        return format!("No sections matching \"{}\"", result.query);
    }
    let mut lines = Vec::new();
    for hit in &result.hits {
        lines.push(format!("{}  {}  ({})", hit.id, hit.title, hit.template_name));
    }
    lines.join("\n")
}

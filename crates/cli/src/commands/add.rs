// `trellis add` — append a section at the end of a sibling group.

use std::path::PathBuf;

use clap::Args;
use uuid::Uuid;

use trellis_common::types::Section;
use trellis_engine::auth::AllowAll;
use trellis_engine::mutator::StructureMutator;

use crate::commands::open_db;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Template id.
    pub template: Uuid,

    /// Section title.
    pub title: String,

    /// Parent section id; omitted means root level.
    #[arg(long)]
    pub parent: Option<Uuid>,

    /// Structure database path override.
    #[arg(long)]
    db: Option<PathBuf>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

pub fn run(args: AddArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let mut db = open_db(args.db.as_deref())?;
    let mutator = StructureMutator::new(&AllowAll);

    match mutator.insert_section(db.connection_mut(), args.template, args.parent, &args.title) {
        Ok(section) => {
            output::print_output(format, &section, format_human)?;
            Ok(())
        }
        Err(error) => {
            output::print_structure_error(format, &error);
            Err(error.into())
        }
    }
}

fn format_human(section: &Section) -> String {
    match section.parent_id {
        Some(parent) => format!(
            "Added \"{}\" under {parent} at position {} [{}]",
            section.title, section.order_index, section.id
        ),
        None => format!(
            "Added \"{}\" at root position {} [{}]",
            section.title, section.order_index, section.id
        ),
    }
}

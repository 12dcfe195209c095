// `trellis rename` — change a section's title in place.

use std::path::PathBuf;

use clap::Args;
use uuid::Uuid;

use trellis_common::types::Section;
use trellis_engine::auth::AllowAll;
use trellis_engine::mutator::StructureMutator;

use crate::commands::open_db;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Section id.
    pub section: Uuid,

    /// New title.
    pub title: String,

    /// Structure database path override.
    #[arg(long)]
    db: Option<PathBuf>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

pub fn run(args: RenameArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let mut db = open_db(args.db.as_deref())?;
    let mutator = StructureMutator::new(&AllowAll);

    match mutator.rename_section(db.connection_mut(), args.section, &args.title) {
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
    format!("Renamed {} to \"{}\"", section.id, section.title)
}

// `trellis map` — manage content mappings between sections.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde::Serialize;
use uuid::Uuid;

use trellis_common::types::Mapping;
use trellis_engine::auth::AllowAll;
use trellis_engine::mutator::{MappingDraft, StructureMutator};
use trellis_engine::store::mappings::MappingStore;

use crate::commands::open_db;
use crate::output::{self, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum MapCommand {
    /// Create a mapping, or edit one with --id
    Save(SaveArgs),
    /// List mappings targeting a section
    List(ListArgs),
    /// Delete a mapping
    Delete(DeleteArgs),
}

#[derive(Debug, Args)]
pub struct SaveArgs {
    /// Target section the generated content lands in.
    pub target: Uuid,

    /// Source section the content is drawn from.
    pub source: Uuid,

    /// Generation instruction.
    pub instruction: String,

    /// Existing mapping id to edit instead of creating.
    #[arg(long)]
    pub id: Option<Uuid>,

    /// Explicit display position (defaults to append / keep current).
    #[arg(long)]
    pub position: Option<u32>,

    /// Structure database path override.
    #[arg(long)]
    db: Option<PathBuf>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Target section id.
    pub target: Uuid,

    #[arg(long)]
    db: Option<PathBuf>,

    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Mapping id.
    pub mapping: Uuid,

    #[arg(long)]
    db: Option<PathBuf>,

    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct MappingList {
    target_section_id: Uuid,
    mappings: Vec<Mapping>,
}

#[derive(Debug, Serialize)]
struct DeleteResult {
    mapping_id: Uuid,
    deleted: bool,
}

pub fn run(cmd: MapCommand) -> anyhow::Result<()> {
    match cmd {
        MapCommand::Save(args) => run_save(args),
        MapCommand::List(args) => run_list(args),
        MapCommand::Delete(args) => run_delete(args),
    }
}

fn run_save(args: SaveArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let mut db = open_db(args.db.as_deref())?;
    let mutator = StructureMutator::new(&AllowAll);

    let draft = MappingDraft {
        id: args.id,
        target_section_id: args.target,
        source_section_id: args.source,
        instruction: args.instruction,
        order_index: args.position,
    };
    let editing = args.id.is_some();

    match mutator.save_mapping(db.connection_mut(), draft) {
        Ok(mapping) => {
            output::print_output(format, &mapping, |m: &Mapping| {
                let verb = if editing { "Updated" } else { "Created" };
                format!(
                    "{verb} mapping {} ({} -> {}, position {})",
                    m.id, m.source_section_id, m.target_section_id, m.order_index
                )
            })?;
            Ok(())
        }
        Err(error) => {
            output::print_structure_error(format, &error);
            Err(error.into())
        }
    }
}

fn run_list(args: ListArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let db = open_db(args.db.as_deref())?;

    match MappingStore::list_for_target(db.connection(), args.target) {
        Ok(mappings) => {
            let list = MappingList { target_section_id: args.target, mappings };
            output::print_output(format, &list, format_list)?;
            Ok(())
        }
        Err(error) => {
            let error = anyhow::Error::from(error);
            output::print_anyhow_error(format, &error);
            Err(error)
        }
    }
}

fn run_delete(args: DeleteArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let mut db = open_db(args.db.as_deref())?;
    let mutator = StructureMutator::new(&AllowAll);

    match mutator.delete_mapping(db.connection_mut(), args.mapping) {
        Ok(()) => {
            let result = DeleteResult { mapping_id: args.mapping, deleted: true };
            output::print_output(format, &result, |r: &DeleteResult| {
                format!("Deleted mapping {}", r.mapping_id)
            })?;
            Ok(())
        }
        Err(error) => {
            output::print_structure_error(format, &error);
            Err(error.into())
        }
    }
}

fn format_list(list: &MappingList) -> String {
    if list.mappings.is_empty() {
        return format!("No mappings target section {}", list.target_section_id);
    }
    let mut lines = Vec::new();
    for mapping in &list.mappings {
        lines.push(format!(
            "{}. {}  from {}  \"{}\"",
            mapping.order_index, mapping.id, mapping.source_section_id, mapping.instruction
        ));
    }
    lines.join("\n")
}

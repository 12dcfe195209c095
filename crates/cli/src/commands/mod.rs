// CLI subcommand dispatch.

use std::path::Path;

use anyhow::Context;
use clap::Subcommand;

use trellis_engine::config::GlobalConfig;
use trellis_engine::store::db::StructureDb;

pub mod add;
pub mod map;
pub mod mv;
pub mod rename;
pub mod rm;
pub mod search;
pub mod templates;
pub mod tree;

#[derive(Subcommand)]
pub enum Command {
    /// List, create, and activate templates
    #[command(subcommand)]
    Templates(templates::TemplatesCommand),
    /// Show a template's numbered section tree
    Tree(tree::TreeArgs),
    /// Add a section at the end of a sibling group
    Add(add::AddArgs),
    /// Rename a section
    Rename(rename::RenameArgs),
    /// Delete a childless section
    Rm(rm::RmArgs),
    /// Move a section: up, down, indent, or outdent
    #[command(name = "move")]
    Move(mv::MoveArgs),
    /// Manage content mappings between sections
    #[command(subcommand)]
    Map(map::MapCommand),
    /// Search section titles across other templates
    Search(search::SearchArgs),
}

pub fn run(cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Templates(cmd) => templates::run(cmd),
        Command::Tree(args) => tree::run(args),
        Command::Add(args) => add::run(args),
        Command::Rename(args) => rename::run(args),
        Command::Rm(args) => rm::run(args),
        Command::Move(args) => mv::run(args),
        Command::Map(cmd) => map::run(cmd),
        Command::Search(args) => search::run(args),
    }
}

/// Open the structure database, honoring `--db` over the config file.
pub(crate) fn open_db(db_flag: Option<&Path>) -> anyhow::Result<StructureDb> {
    let path = GlobalConfig::load()
        .resolve_db_path(db_flag)
        .context("could not determine a structure.db path (no home directory)")?;
    StructureDb::open(&path)
        .with_context(|| format!("failed to open structure database at `{}`", path.display()))
}

// `trellis move` — reposition a section: up, down, indent, or outdent.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use serde::Serialize;
use uuid::Uuid;

use trellis_engine::auth::AllowAll;
use trellis_engine::mutator::StructureMutator;

use crate::commands::open_db;
use crate::output::{self, OutputFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Swap with the previous sibling.
    Up,
    /// Swap with the next sibling.
    Down,
    /// Become the last child of the preceding sibling.
    Indent,
    /// Move up one level, directly after the former parent.
    Outdent,
}

#[derive(Debug, Args)]
pub struct MoveArgs {
    /// Section id.
    pub section: Uuid,

    /// Where to move the section.
    #[arg(value_enum)]
    pub direction: Direction,

    /// Structure database path override.
    #[arg(long)]
    db: Option<PathBuf>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct MoveResult {
    section_id: Uuid,
    direction: Direction,
}

pub fn run(args: MoveArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let mut db = open_db(args.db.as_deref())?;
    let mutator = StructureMutator::new(&AllowAll);

    let outcome = match args.direction {
        Direction::Up => mutator.move_up(db.connection_mut(), args.section),
        Direction::Down => mutator.move_down(db.connection_mut(), args.section),
        Direction::Indent => mutator.indent(db.connection_mut(), args.section),
        Direction::Outdent => mutator.outdent(db.connection_mut(), args.section),
    };

    match outcome {
        Ok(()) => {
            let result = MoveResult { section_id: args.section, direction: args.direction };
            output::print_output(format, &result, format_human)?;
            Ok(())
        }
        Err(error) => {
            output::print_structure_error(format, &error);
            Err(error.into())
        }
    }
}

fn format_human(result: &MoveResult) -> String {
    let verb = match result.direction {
        Direction::Up => "Moved up",
        Direction::Down => "Moved down",
        Direction::Indent => "Indented",
        Direction::Outdent => "Outdented",
    };
    format!("{verb} section {}", result.section_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_direction_has_a_distinct_verb() {
        let verbs: Vec<String> =
            [Direction::Up, Direction::Down, Direction::Indent, Direction::Outdent]
                .into_iter()
                .map(|direction| {
                    format_human(&MoveResult { section_id: Uuid::nil(), direction })
                })
                .collect();
        let unique: std::collections::HashSet<_> = verbs.iter().collect();
        assert_eq!(unique.len(), verbs.len());
    }

    #[test]
    fn json_result_serializes_lowercase_direction() {
        let result = MoveResult { section_id: Uuid::nil(), direction: Direction::Indent };
        let mut buf = Vec::new();
        output::write_output(&mut buf, OutputFormat::Json, &result, format_human).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed["direction"], "indent");
    }
}

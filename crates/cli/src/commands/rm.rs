// `trellis rm` — delete a childless section.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use uuid::Uuid;

use trellis_engine::auth::AllowAll;
use trellis_engine::mutator::StructureMutator;

use crate::commands::open_db;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct RmArgs {
    /// Section id.
    pub section: Uuid,

    /// Structure database path override.
    #[arg(long)]
    db: Option<PathBuf>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct RmResult {
    section_id: Uuid,
    deleted: bool,
}

pub fn run(args: RmArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let mut db = open_db(args.db.as_deref())?;
    let mutator = StructureMutator::new(&AllowAll);

    match mutator.delete_section(db.connection_mut(), args.section) {
        Ok(()) => {
            let result = RmResult { section_id: args.section, deleted: true };
            output::print_output(format, &result, |r: &RmResult| {
                format!("Deleted section {}", r.section_id)
            })?;
            Ok(())
        }
        Err(error) => {
            output::print_structure_error(format, &error);
            Err(error.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_result_has_stable_shape() {
        let result = RmResult { section_id: Uuid::nil(), deleted: true };
        let mut buf = Vec::new();
        output::write_output(&mut buf, OutputFormat::Json, &result, |_| String::new()).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed["deleted"], true);
        assert_eq!(parsed["section_id"], Uuid::nil().to_string());
    }
}

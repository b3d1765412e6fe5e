use std::path::PathBuf;

use crate::output::WritePolicy;

#[derive(Debug, Clone)]
pub struct GenOptions {
    /// Directory receiving `<basename>_commands.{h,c}`.
    pub out_dir: PathBuf,
    pub write_policy: WritePolicy,
    /// Compare against existing artifacts instead of writing them.
    pub check_only: bool,
}

impl Default for GenOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            write_policy: WritePolicy::default(),
            check_only: false,
        }
    }
}

pub mod limits {
    pub const MAX_SCHEMA_BYTES: usize = 4 * 1024 * 1024;

    pub fn max_schema_bytes() -> usize {
        parse_limit(
            std::env::var("CMDWRAP_MAX_SCHEMA_BYTES").ok().as_deref(),
            MAX_SCHEMA_BYTES,
        )
    }

    /// Positive integers override `default`; anything else falls back to it.
    pub(crate) fn parse_limit(raw: Option<&str>, default: usize) -> usize {
        raw.and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(default)
    }

}

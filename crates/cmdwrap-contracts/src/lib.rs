//! Shared, version-pinned identifiers.
//!
//! These constants are the single source of truth for schema/version strings that
//! appear in machine-readable output, and for the fixed names that generated
//! artifacts and the consuming command runtime agree on.

pub const CMDWRAP_REPORT_SCHEMA_VERSION: &str = "cmdwrap.report@0.1.0";
pub const CMDWRAP_DIAG_SCHEMA_VERSION: &str = "cmdwrap.diag@0.1.0";

pub const HEADER_SUFFIX: &str = "_commands.h";
pub const SOURCE_SUFFIX: &str = "_commands.c";

pub const GENERATED_BANNER: &str = "/* Autogenerated file, do not edit!! */";

/// Includes every generated header starts with, in order.
pub const HEADER_INCLUDES: &[&str] = &[
    "<stdbool.h>",
    "<vde3.h>",
    "<vde3/common.h>",
    "<vde3/command.h>",
];

pub const WRAPPER_SUFFIX: &str = "_wrapper";
pub const PARAMS_TABLE_SUFFIX: &str = "_wrapper_params";
pub const COMMANDS_TABLE_SUFFIX: &str = "_commands";

/// Status returned by a generated wrapper when decoding fails.
pub const WRAPPER_FAILURE_CODE: i32 = -1;

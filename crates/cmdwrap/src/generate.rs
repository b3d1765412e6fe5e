use std::path::{Path, PathBuf};

use crate::assemble::{self, Artifacts};
use crate::c_emit;
use crate::diagnostics::{Diagnostic, Location, Stage};
use crate::lint;
use crate::options::GenOptions;
use crate::output::{self, CheckOutcome, WriteOutcome};
use crate::schema::{self, SchemaErrorKind, SchemaModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenErrorKind {
    SchemaLoad,
    SchemaFormat,
    UnknownType,
    Io,
}

impl GenErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            GenErrorKind::SchemaLoad => "CMDWRAP-SCHEMA-LOAD-0001",
            GenErrorKind::SchemaFormat => "CMDWRAP-SCHEMA-FORMAT-0001",
            GenErrorKind::UnknownType => "CMDWRAP-TYPE-UNKNOWN-0001",
            GenErrorKind::Io => "CMDWRAP-IO-WRITE-0001",
        }
    }

    pub fn stage(self) -> Stage {
        match self {
            GenErrorKind::SchemaLoad | GenErrorKind::SchemaFormat | GenErrorKind::UnknownType => {
                Stage::Parse
            }
            GenErrorKind::Io => Stage::Write,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenError {
    pub kind: GenErrorKind,
    pub message: String,
    pub loc: Option<Location>,
}

impl GenError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        let d = Diagnostic::error(self.kind.code(), self.kind.stage(), self.message.clone());
        match &self.loc {
            Some(loc) => d.at(loc.clone()),
            None => d,
        }
    }
}

impl std::error::Error for GenError {}

impl std::fmt::Display for GenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.loc {
            Some(Location::Schema { ptr }) if !ptr.is_empty() => {
                write!(f, "{} at {}", self.message, ptr)
            }
            _ => f.write_str(&self.message),
        }
    }
}

impl From<schema::SchemaError> for GenError {
    fn from(e: schema::SchemaError) -> Self {
        let kind = match e.kind {
            SchemaErrorKind::Load => GenErrorKind::SchemaLoad,
            SchemaErrorKind::Format => GenErrorKind::SchemaFormat,
            SchemaErrorKind::UnknownType => GenErrorKind::UnknownType,
        };
        Self {
            kind,
            message: e.message,
            loc: Some(Location::Schema { ptr: e.ptr }),
        }
    }
}

impl From<output::WriteError> for GenError {
    fn from(e: output::WriteError) -> Self {
        Self {
            kind: GenErrorKind::Io,
            message: e.to_string(),
            loc: Some(Location::File {
                path: e.path.display().to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerateOutput {
    pub model: SchemaModel,
    pub artifacts: Artifacts,
    pub warnings: Vec<Diagnostic>,
}

/// Pure part of the pipeline: schema bytes in, artifact text out.
pub fn generate_from_bytes(bytes: &[u8]) -> Result<GenerateOutput, GenError> {
    let model = schema::parse_schema_json(bytes)?;
    Ok(generate_from_model(model))
}

pub fn generate_from_model(model: SchemaModel) -> GenerateOutput {
    tracing::debug!(
        basename = %model.basename,
        operations = model.operations.len(),
        "emitting artifacts"
    );
    let warnings = lint::lint_schema(&model);
    let sections = c_emit::emit_sections(&model);
    let artifacts = assemble::assemble(&model, &sections);
    GenerateOutput {
        model,
        artifacts,
        warnings,
    }
}

pub fn read_schema(path: &Path) -> Result<Vec<u8>, GenError> {
    std::fs::read(path).map_err(|e| GenError {
        kind: GenErrorKind::SchemaLoad,
        message: format!("read schema {}: {e}", path.display()),
        loc: Some(Location::File {
            path: path.display().to_string(),
        }),
    })
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    Written(Vec<(PathBuf, WriteOutcome)>),
    Checked(Vec<(PathBuf, CheckOutcome)>),
}

impl RunOutcome {
    pub fn up_to_date(&self) -> bool {
        match self {
            RunOutcome::Written(_) => true,
            RunOutcome::Checked(r) => r.iter().all(|(_, o)| *o == CheckOutcome::Fresh),
        }
    }
}

/// Full pipeline: read, parse, emit, then write (or check) both artifacts.
pub fn run(
    schema_path: &Path,
    options: &GenOptions,
) -> Result<(GenerateOutput, RunOutcome), GenError> {
    let bytes = read_schema(schema_path)?;
    let out = generate_from_bytes(&bytes).map_err(|mut e| {
        e.message = format!("{}: {}", schema_path.display(), e.message);
        e
    })?;
    let outcome = if options.check_only {
        RunOutcome::Checked(output::check_artifacts(&options.out_dir, &out.artifacts))
    } else {
        RunOutcome::Written(output::write_artifacts(
            &options.out_dir,
            &out.artifacts,
            options.write_policy,
        )?)
    };
    Ok((out, outcome))
}

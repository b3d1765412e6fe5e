//! Advisory checks over a parsed schema.
//!
//! Generation never depends on these: every finding is a warning, and the
//! artifacts are emitted exactly as the schema describes them.

use std::collections::{BTreeMap, BTreeSet};

use crate::assemble::commands_table_name;
use crate::diagnostics::Diagnostic;
use crate::plan::raw_local_name;
use crate::schema::{OperationSpec, SchemaModel};
use crate::validate::validate_c_identifier;

/// Names the generated wrapper already binds.
const WRAPPER_RESERVED: &[&str] = &["component", "in", "out"];

pub fn lint_schema(model: &SchemaModel) -> Vec<Diagnostic> {
    let mut out = Vec::new();

    if let Err(msg) = validate_c_identifier(&commands_table_name(&model.basename)) {
        out.push(
            Diagnostic::warning(
                "CMDWRAP-LINT-IDENT-0001",
                format!("basename does not yield a valid C table name: {msg}"),
                "/basename",
            )
            .with_note("the dispatch table is declared as <basename>_commands"),
        );
    }

    let mut first_by_name: BTreeMap<&str, usize> = BTreeMap::new();
    let mut first_by_fun: BTreeMap<&str, usize> = BTreeMap::new();
    for (widx, op) in model.operations.iter().enumerate() {
        if let Some(&first) = first_by_name.get(op.name.as_str()) {
            out.push(
                Diagnostic::warning(
                    "CMDWRAP-LINT-DUP-NAME-0001",
                    format!(
                        "duplicate command name {:?} (first declared at /wrappables/{first})",
                        op.name
                    ),
                    format!("/wrappables/{widx}/name"),
                )
                .with_note("both rows are emitted; which one the dispatch layer picks is up to it"),
            );
        } else {
            first_by_name.insert(op.name.as_str(), widx);
        }
        if let Some(&first) = first_by_fun.get(op.fun.as_str()) {
            out.push(Diagnostic::warning(
                "CMDWRAP-LINT-DUP-FUN-0001",
                format!(
                    "duplicate fun {:?} (first declared at /wrappables/{first}); the generated C will not link",
                    op.fun
                ),
                format!("/wrappables/{widx}/fun"),
            ));
        } else {
            first_by_fun.insert(op.fun.as_str(), widx);
        }
        lint_operation(op, widx, &mut out);
    }

    out
}

fn lint_operation(op: &OperationSpec, widx: usize, out: &mut Vec<Diagnostic>) {
    if let Err(msg) = validate_c_identifier(&op.fun) {
        out.push(Diagnostic::warning(
            "CMDWRAP-LINT-IDENT-0002",
            format!("wrappable {:?}: fun is not a C identifier: {msg}", op.name),
            format!("/wrappables/{widx}/fun"),
        ));
    }

    let names: BTreeSet<&str> = op.params.iter().map(|p| p.name.as_str()).collect();
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for (pidx, p) in op.params.iter().enumerate() {
        let ptr = format!("/wrappables/{widx}/parameters/{pidx}/name");
        if let Err(msg) = validate_c_identifier(&p.name) {
            out.push(Diagnostic::warning(
                "CMDWRAP-LINT-IDENT-0003",
                format!("wrappable {:?}: parameter name is not a C identifier: {msg}", op.name),
                ptr.clone(),
            ));
        }
        if !seen.insert(p.name.as_str()) {
            out.push(Diagnostic::warning(
                "CMDWRAP-LINT-DUP-PARAM-0001",
                format!("wrappable {:?}: duplicate parameter {:?}", op.name, p.name),
                ptr.clone(),
            ));
        }
        if WRAPPER_RESERVED.contains(&p.name.as_str()) {
            out.push(Diagnostic::warning(
                "CMDWRAP-LINT-RESERVED-0001",
                format!(
                    "wrappable {:?}: parameter {:?} shadows a wrapper argument",
                    op.name, p.name
                ),
                ptr.clone(),
            ));
        }
        let raw = raw_local_name(&p.name);
        if names.contains(raw.as_str()) {
            out.push(Diagnostic::warning(
                "CMDWRAP-LINT-RESERVED-0002",
                format!(
                    "wrappable {:?}: parameter {raw:?} collides with the raw local of {:?}",
                    op.name, p.name
                ),
                ptr,
            ));
        }
    }
}

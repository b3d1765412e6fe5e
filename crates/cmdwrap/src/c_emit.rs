use cmdwrap_contracts::WRAPPER_FAILURE_CODE;

use crate::plan::{WrapperFault, WrapperPlan};
use crate::schema::{OperationSpec, SchemaModel};
use crate::types::ParamTy;

/// Emitter output for a whole schema, section by section, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmittedSections {
    pub declarations: Vec<String>,
    pub param_tables: Vec<String>,
    pub dispatch_rows: Vec<String>,
    pub wrappers: Vec<String>,
}

pub fn emit_sections(model: &SchemaModel) -> EmittedSections {
    let mut out = EmittedSections::default();
    for op in &model.operations {
        let plan = WrapperPlan::for_operation(op);
        out.declarations.extend(emit_declaration(&plan));
        out.param_tables.extend(emit_param_table(op, &plan));
        out.dispatch_rows.extend(emit_dispatch_row(op, &plan));
        out.wrappers.extend(emit_wrapper(op, &plan));
        out.wrappers.push(String::new());
    }
    out
}

/// Hex escapes are followed by `""` so a following hex digit is not absorbed.
pub(crate) fn c_escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'"' => out.push_str("\\\""),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7E => out.push(b as char),
            _ => out.push_str(&format!("\\x{:02x}\"\"", b)),
        }
    }
    out
}

fn c_str(s: &str) -> String {
    format!("\"{}\"", c_escape_string(s))
}

/// `int x`, `char *x`: pointer declarators bind to the name.
fn c_decl(ty: ParamTy, name: &str) -> String {
    let repr = ty.entry().c_repr;
    if repr.ends_with('*') {
        format!("{}{name}", repr)
    } else {
        format!("{repr} {name}")
    }
}

fn wrapper_signature(plan: &WrapperPlan) -> String {
    format!(
        "int {}(vde_component *component, vde_sobj *in, vde_sobj **out)",
        plan.wrapper_name
    )
}

pub fn target_prototype(op: &OperationSpec) -> String {
    let mut args = vec!["vde_component *component".to_string()];
    args.extend(op.params.iter().map(|p| c_decl(p.ty, &p.name)));
    args.push("vde_sobj **out".to_string());
    format!("int {}({});", op.fun, args.join(", "))
}

pub fn emit_declaration(plan: &WrapperPlan) -> Vec<String> {
    vec![format!("{};", wrapper_signature(plan))]
}

pub fn emit_param_table(op: &OperationSpec, plan: &WrapperPlan) -> Vec<String> {
    let mut lines = Vec::with_capacity(op.params.len() + 3);
    lines.push(format!(
        "static vde_argument {}[] = {{",
        plan.params_table_name
    ));
    for p in &op.params {
        lines.push(format!(
            "  {{ {}, {}, {} }},",
            c_str(&p.name),
            c_str(&p.description),
            c_str(p.ty.name())
        ));
    }
    lines.push(format!("  {},", param_table_sentinel()));
    lines.push("};".to_string());
    lines
}

pub fn param_table_sentinel() -> &'static str {
    "{ NULL, NULL, NULL }"
}

pub fn dispatch_sentinel() -> &'static str {
    "{ NULL, NULL, NULL, NULL }"
}

pub fn emit_dispatch_row(op: &OperationSpec, plan: &WrapperPlan) -> Vec<String> {
    vec![format!(
        "{{ {}, {}, {}, {} }},",
        c_str(&op.name),
        plan.wrapper_name,
        c_str(&op.description),
        plan.params_table_name
    )]
}

fn fail_with(lines: &mut Vec<String>, cond: String, fault: &WrapperFault) {
    lines.push(format!("  if ({cond}) {{"));
    lines.push(format!(
        "    *out = vde_sobj_new_string({});",
        c_str(&fault.message())
    ));
    lines.push(format!("    return {WRAPPER_FAILURE_CODE};"));
    lines.push("  }".to_string());
}

/// Full wrapper: target prototype, then the decoding body.
pub fn emit_wrapper(op: &OperationSpec, plan: &WrapperPlan) -> Vec<String> {
    let mut lines = vec![target_prototype(op), String::new()];
    lines.push(format!("{} {{", wrapper_signature(plan)));

    for step in &plan.steps {
        lines.push(format!("  {};", c_decl(step.ty, &step.param)));
        lines.push(format!("  vde_sobj *{};", step.raw_local));
    }

    fail_with(
        &mut lines,
        "!vde_sobj_is_type(in, vde_sobj_type_array)".to_string(),
        &WrapperFault::ShapeMismatch,
    );
    fail_with(
        &mut lines,
        format!("vde_sobj_array_length(in) != {}", plan.arity),
        &WrapperFault::ArityMismatch {
            expected: plan.arity,
            got: 0,
        },
    );

    for step in &plan.steps {
        let entry = step.ty.entry();
        lines.push(format!(
            "  {} = vde_sobj_array_get_idx(in, {});",
            step.raw_local, step.index
        ));
        fail_with(
            &mut lines,
            format!("!vde_sobj_is_type({}, {})", step.raw_local, entry.sobj_tag),
            &WrapperFault::TypeMismatch {
                index: step.index,
                param: step.param.clone(),
                expected: step.ty,
            },
        );
        lines.push(format!(
            "  {} = {}({});",
            step.param, entry.sobj_getter, step.raw_local
        ));
    }

    lines.push(format!(
        "  return {}({});",
        plan.fun,
        plan.call_args().join(", ")
    ));
    lines.push("}".to_string());
    lines
}

use cmdwrap_contracts::{
    COMMANDS_TABLE_SUFFIX, GENERATED_BANNER, HEADER_INCLUDES, HEADER_SUFFIX, SOURCE_SUFFIX,
};

use crate::c_emit::{self, EmittedSections};
use crate::schema::SchemaModel;

/// The interface/implementation pair produced for one schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub header_name: String,
    pub header_src: String,
    pub source_name: String,
    pub source_src: String,
}

pub fn header_name(basename: &str) -> String {
    format!("{basename}{HEADER_SUFFIX}")
}

pub fn source_name(basename: &str) -> String {
    format!("{basename}{SOURCE_SUFFIX}")
}

pub fn commands_table_name(basename: &str) -> String {
    format!("{basename}{COMMANDS_TABLE_SUFFIX}")
}

/// Include-guard token for a header file name.
///
/// Distinct names can map to the same token (`a-b.h` and `a.b.h`); that is not detected.
pub fn header_guard(header_name: &str) -> String {
    let body: String = header_name
        .to_uppercase()
        .chars()
        .map(|c| if c.is_ascii_uppercase() || c == '_' { c } else { '_' })
        .collect();
    format!("__{body}__")
}

fn push_lines(out: &mut String, lines: &[String], indent: &str) {
    for l in lines {
        if !l.is_empty() {
            out.push_str(indent);
        }
        out.push_str(l);
        out.push('\n');
    }
}

pub fn assemble(model: &SchemaModel, sections: &EmittedSections) -> Artifacts {
    let header_name = header_name(&model.basename);
    let source_name = source_name(&model.basename);
    let guard = header_guard(&header_name);

    let mut h = String::new();
    h.push_str(GENERATED_BANNER);
    h.push_str("\n\n");
    h.push_str(&format!("#ifndef {guard}\n"));
    h.push_str(&format!("#define {guard}\n\n"));
    for inc in HEADER_INCLUDES {
        h.push_str(&format!("#include {inc}\n"));
    }
    h.push('\n');
    push_lines(&mut h, &sections.declarations, "");
    h.push('\n');
    push_lines(&mut h, &sections.param_tables, "");
    h.push('\n');
    h.push_str(&format!(
        "static vde_command {} [] = {{\n",
        commands_table_name(&model.basename)
    ));
    push_lines(&mut h, &sections.dispatch_rows, "  ");
    h.push_str(&format!("  {},\n", c_emit::dispatch_sentinel()));
    h.push_str("};\n\n");
    h.push_str(&format!("#endif /* {guard} */\n\n"));

    let mut c = String::new();
    c.push_str(GENERATED_BANNER);
    c.push_str("\n\n");
    c.push_str(&format!("#include \"{header_name}\"\n\n"));
    push_lines(&mut c, &sections.wrappers, "");

    Artifacts {
        header_name,
        header_src: h,
        source_name,
        source_src: c,
    }
}

#[cfg(test)]
mod tests {
    use super::header_guard;

    #[test]
    fn guard_replaces_everything_outside_upper_and_underscore() {
        assert_eq!(header_guard("net_commands.h"), "__NET_COMMANDS_H__");
        assert_eq!(header_guard("vde2-sw_commands.h"), "__VDE__SW_COMMANDS_H__");
        assert_eq!(header_guard("a.b_commands.h"), header_guard("a-b_commands.h"));
    }

    #[test]
    fn guard_is_a_pure_function_of_the_name() {
        for name in ["x_commands.h", "Ünï_commands.h", ""] {
            assert_eq!(header_guard(name), header_guard(name));
        }
        assert_eq!(header_guard(""), "____");
    }
}

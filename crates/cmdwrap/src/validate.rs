/// C keywords that cannot be used as identifiers (C99 plus the `_Bool`-era reserved words).
const C_KEYWORDS: &[&str] = &[
    "auto", "bool", "break", "case", "char", "const", "continue", "default", "do", "double",
    "else", "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while", "_Bool", "_Complex", "_Imaginary",
];

pub fn validate_c_identifier(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("identifier must be non-empty".to_string());
    }
    let mut chars = name.chars();
    let first = chars.next().unwrap_or('_');
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(format!(
            "invalid identifier start (must be [A-Za-z_]): {name:?}"
        ));
    }
    for c in chars {
        if !(c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!(
                "invalid identifier char (allowed [A-Za-z0-9_]): {name:?}"
            ));
        }
    }
    if C_KEYWORDS.contains(&name) {
        return Err(format!("identifier is a C keyword: {name:?}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_c_identifier;

    #[test]
    fn accepts_plain_identifiers() {
        for ok in ["iface", "_x", "net_up2", "A"] {
            assert!(validate_c_identifier(ok).is_ok(), "{ok}");
        }
    }

    #[test]
    fn rejects_bad_identifiers() {
        for bad in ["", "2x", "net.up", "a-b", "int", "return", "é"] {
            assert!(validate_c_identifier(bad).is_err(), "{bad}");
        }
    }
}

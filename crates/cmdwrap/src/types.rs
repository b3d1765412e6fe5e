use std::fmt::Display;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParamTy {
    Int,
    Double,
    Bool,
    String,
}

/// One row of the type registry: how a schema type maps onto C and onto the
/// structured-value runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeEntry {
    pub ty: ParamTy,
    pub name: &'static str,
    pub c_repr: &'static str,
    pub sobj_tag: &'static str,
    pub sobj_getter: &'static str,
}

pub const REGISTRY: [TypeEntry; 4] = [
    TypeEntry {
        ty: ParamTy::Int,
        name: "int",
        c_repr: "int",
        sobj_tag: "vde_sobj_type_int",
        sobj_getter: "vde_sobj_get_int",
    },
    TypeEntry {
        ty: ParamTy::Double,
        name: "double",
        c_repr: "double",
        sobj_tag: "vde_sobj_type_double",
        sobj_getter: "vde_sobj_get_double",
    },
    TypeEntry {
        ty: ParamTy::Bool,
        name: "bool",
        c_repr: "bool",
        sobj_tag: "vde_sobj_type_boolean",
        sobj_getter: "vde_sobj_get_boolean",
    },
    TypeEntry {
        ty: ParamTy::String,
        name: "string",
        c_repr: "char *",
        sobj_tag: "vde_sobj_type_string",
        sobj_getter: "vde_sobj_get_string",
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTypeError {
    pub name: String,
}

impl std::error::Error for UnknownTypeError {}

impl Display for UnknownTypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown parameter type {:?} (supported: {})",
            self.name,
            supported_names().join(", ")
        )
    }
}

pub fn lookup(name: &str) -> Result<&'static TypeEntry, UnknownTypeError> {
    REGISTRY
        .iter()
        .find(|e| e.name == name)
        .ok_or_else(|| UnknownTypeError {
            name: name.to_string(),
        })
}

pub fn supported_names() -> Vec<&'static str> {
    REGISTRY.iter().map(|e| e.name).collect()
}

/// A decoded argument, as the generated wrapper would hold it in its native local.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Int(i64),
    Double(f64),
    Bool(bool),
    String(String),
}

impl ParamTy {
    pub const ALL: [ParamTy; 4] = [ParamTy::Int, ParamTy::Double, ParamTy::Bool, ParamTy::String];

    pub fn entry(self) -> &'static TypeEntry {
        match self {
            ParamTy::Int => &REGISTRY[0],
            ParamTy::Double => &REGISTRY[1],
            ParamTy::Bool => &REGISTRY[2],
            ParamTy::String => &REGISTRY[3],
        }
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }

    /// Runtime type-tag check, mirroring `vde_sobj_is_type`.
    ///
    /// The structured-value runtime is json-c backed: integer literals carry the
    /// int tag, numbers written with a fraction or exponent carry the double tag.
    pub fn accepts(self, v: &Value) -> bool {
        match self {
            ParamTy::Int => matches!(v, Value::Number(n) if n.is_i64() || n.is_u64()),
            ParamTy::Double => matches!(v, Value::Number(n) if n.is_f64()),
            ParamTy::Bool => v.is_boolean(),
            ParamTy::String => v.is_string(),
        }
    }

    /// Integers beyond the `int64_t` range saturate, as json-c's getter does.
    pub fn extract(self, v: &Value) -> Option<NativeValue> {
        if !self.accepts(v) {
            return None;
        }
        match self {
            ParamTy::Int => v
                .as_i64()
                .or_else(|| v.as_u64().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
                .map(NativeValue::Int),
            ParamTy::Double => v.as_f64().map(NativeValue::Double),
            ParamTy::Bool => v.as_bool().map(NativeValue::Bool),
            ParamTy::String => v.as_str().map(|s| NativeValue::String(s.to_string())),
        }
    }
}

impl Display for ParamTy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

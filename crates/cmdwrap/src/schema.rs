use std::fmt::Display;

use serde_json::{Map, Value};

use crate::options::limits;
use crate::types::{self, ParamTy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: String,
    pub description: String,
    pub ty: ParamTy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSpec {
    /// Dotted command name routed by the dispatch layer, e.g. `net.up`.
    pub name: String,
    /// C identifier of the target function.
    pub fun: String,
    pub description: String,
    /// Declaration order is both the input array order and the call argument order.
    pub params: Vec<ParameterSpec>,
}

impl OperationSpec {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaModel {
    pub basename: String,
    pub operations: Vec<OperationSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorKind {
    /// Input is not well-formed JSON or exceeds the size limit.
    Load,
    /// Well-formed, but a required field is missing or has the wrong shape.
    Format,
    /// A parameter names a type outside the registry.
    UnknownType,
}

#[derive(Debug, Clone)]
pub struct SchemaError {
    pub kind: SchemaErrorKind,
    pub message: String,
    pub ptr: String,
}

impl SchemaError {
    fn format(message: String, ptr: impl Into<String>) -> Self {
        Self {
            kind: SchemaErrorKind::Format,
            message,
            ptr: ptr.into(),
        }
    }

    fn in_operation(mut self, name: &str) -> Self {
        self.message = format!("wrappable {name:?}: {}", self.message);
        self
    }
}

impl std::error::Error for SchemaError {}

impl Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.ptr.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} at {}", self.message, self.ptr)
        }
    }
}

pub fn parse_schema_json(bytes: &[u8]) -> Result<SchemaModel, SchemaError> {
    parse_schema_json_limited(bytes, limits::max_schema_bytes())
}

pub fn parse_schema_json_limited(bytes: &[u8], max: usize) -> Result<SchemaModel, SchemaError> {
    if bytes.len() > max {
        return Err(SchemaError {
            kind: SchemaErrorKind::Load,
            message: format!("schema too large: {} bytes (max {max})", bytes.len()),
            ptr: String::new(),
        });
    }
    let doc: Value = serde_json::from_slice(bytes).map_err(|e| SchemaError {
        kind: SchemaErrorKind::Load,
        message: format!("invalid JSON: {e}"),
        ptr: String::new(),
    })?;
    parse_schema_value(&doc)
}

pub fn parse_schema_value(root: &Value) -> Result<SchemaModel, SchemaError> {
    let root_obj = root
        .as_object()
        .ok_or_else(|| SchemaError::format("schema root must be an object".to_string(), ""))?;

    let basename = get_required_string(root_obj, "/basename", "basename")?;
    if basename.contains(|c: char| matches!(c, '/' | '\\' | '\0')) {
        return Err(SchemaError::format(
            format!("basename must be a file name, not a path: {basename:?}"),
            "/basename",
        ));
    }
    let wrappables = get_required_array(root_obj, "/wrappables", "wrappables")?;

    let mut operations = Vec::with_capacity(wrappables.len());
    for (widx, w) in wrappables.iter().enumerate() {
        operations.push(parse_operation(w, &format!("/wrappables/{widx}"))?);
    }

    Ok(SchemaModel {
        basename,
        operations,
    })
}

fn parse_operation(v: &Value, wptr: &str) -> Result<OperationSpec, SchemaError> {
    let obj = v
        .as_object()
        .ok_or_else(|| SchemaError::format("wrappable must be an object".to_string(), wptr))?;

    let name = get_required_string(obj, &format!("{wptr}/name"), "name")?;
    let rest = || -> Result<OperationSpec, SchemaError> {
        let fun = get_required_string(obj, &format!("{wptr}/fun"), "fun")?;
        let description = get_required_string(obj, &format!("{wptr}/description"), "description")?;
        let params_ptr = format!("{wptr}/parameters");
        let params_a = get_required_array(obj, &params_ptr, "parameters")?;
        let mut params = Vec::with_capacity(params_a.len());
        for (pidx, p) in params_a.iter().enumerate() {
            params.push(parse_parameter(p, &format!("{params_ptr}/{pidx}"))?);
        }
        Ok(OperationSpec {
            name: name.clone(),
            fun,
            description,
            params,
        })
    };
    rest().map_err(|e| e.in_operation(&name))
}

fn parse_parameter(v: &Value, pptr: &str) -> Result<ParameterSpec, SchemaError> {
    let obj = v
        .as_object()
        .ok_or_else(|| SchemaError::format("parameter must be an object".to_string(), pptr))?;
    let name = get_required_string(obj, &format!("{pptr}/name"), "name")?;
    let description = get_required_string(obj, &format!("{pptr}/description"), "description")?;
    let type_ptr = format!("{pptr}/type");
    let type_name = get_required_string(obj, &type_ptr, "type")?;
    let ty = types::lookup(&type_name)
        .map_err(|e| SchemaError {
            kind: SchemaErrorKind::UnknownType,
            message: format!("parameter {name:?}: {e}"),
            ptr: type_ptr,
        })?
        .ty;
    Ok(ParameterSpec {
        name,
        description,
        ty,
    })
}

fn missing_field(ptr: &str, key: &str) -> SchemaError {
    SchemaError::format(
        format!("missing required field: {key}"),
        ptr.rsplit_once('/').map(|(p, _)| p).unwrap_or(""),
    )
}

fn get_required_string(obj: &Map<String, Value>, ptr: &str, key: &str) -> Result<String, SchemaError> {
    let v = obj.get(key).ok_or_else(|| missing_field(ptr, key))?;
    v.as_str()
        .map(str::to_string)
        .ok_or_else(|| SchemaError::format(format!("{key} must be a string"), ptr))
}

fn get_required_array<'a>(
    obj: &'a Map<String, Value>,
    ptr: &str,
    key: &str,
) -> Result<&'a Vec<Value>, SchemaError> {
    let v = obj.get(key).ok_or_else(|| missing_field(ptr, key))?;
    v.as_array()
        .ok_or_else(|| SchemaError::format(format!("{key} must be an array"), ptr))
}

//! Decode plan for a generated wrapper.
//!
//! The C emitter renders a [`WrapperPlan`] line by line, and [`WrapperPlan::decode`]
//! evaluates the same plan against a JSON value the way the generated code would
//! against a `vde_sobj`. Both read the plan, so what the evaluator accepts is what
//! the emitted wrapper accepts.

use std::fmt::Display;

use cmdwrap_contracts::{PARAMS_TABLE_SUFFIX, WRAPPER_SUFFIX};
use serde_json::Value;

use crate::schema::OperationSpec;
use crate::types::{NativeValue, ParamTy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeStep {
    pub index: usize,
    pub param: String,
    pub raw_local: String,
    pub ty: ParamTy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperPlan {
    pub fun: String,
    pub wrapper_name: String,
    pub params_table_name: String,
    pub arity: usize,
    pub steps: Vec<DecodeStep>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WrapperFault {
    ShapeMismatch,
    ArityMismatch {
        expected: usize,
        got: usize,
    },
    TypeMismatch {
        index: usize,
        param: String,
        expected: ParamTy,
    },
}

impl WrapperFault {
    /// Text written into the output slot by the generated wrapper.
    pub fn message(&self) -> String {
        match self {
            WrapperFault::ShapeMismatch => "Did not receive an array".to_string(),
            WrapperFault::ArityMismatch { expected, .. } => format!("Expected {expected} params"),
            WrapperFault::TypeMismatch {
                param, expected, ..
            } => format!("Param {param} not a {expected}"),
        }
    }
}

impl Display for WrapperFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WrapperFault::ArityMismatch { expected, got } => {
                write!(f, "expected {expected} params, got {got}")
            }
            _ => f.write_str(&self.message()),
        }
    }
}

impl std::error::Error for WrapperFault {}

pub fn wrapper_name(fun: &str) -> String {
    format!("{fun}{WRAPPER_SUFFIX}")
}

pub fn params_table_name(fun: &str) -> String {
    format!("{fun}{PARAMS_TABLE_SUFFIX}")
}

pub fn raw_local_name(param: &str) -> String {
    format!("json_{param}")
}

impl WrapperPlan {
    pub fn for_operation(op: &OperationSpec) -> Self {
        let steps = op
            .params
            .iter()
            .enumerate()
            .map(|(index, p)| DecodeStep {
                index,
                param: p.name.clone(),
                raw_local: raw_local_name(&p.name),
                ty: p.ty,
            })
            .collect();
        Self {
            fun: op.fun.clone(),
            wrapper_name: wrapper_name(&op.fun),
            params_table_name: params_table_name(&op.fun),
            arity: op.arity(),
            steps,
        }
    }

    /// Arguments passed to the target function, in call order.
    pub fn call_args(&self) -> Vec<&str> {
        let mut args = Vec::with_capacity(self.steps.len() + 2);
        args.push("component");
        args.extend(self.steps.iter().map(|s| s.param.as_str()));
        args.push("out");
        args
    }

    pub fn decode(&self, input: &Value) -> Result<Vec<NativeValue>, WrapperFault> {
        let items = input.as_array().ok_or(WrapperFault::ShapeMismatch)?;
        if items.len() != self.arity {
            return Err(WrapperFault::ArityMismatch {
                expected: self.arity,
                got: items.len(),
            });
        }
        let mut out = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let v = &items[step.index];
            let native = step.ty.extract(v).ok_or_else(|| WrapperFault::TypeMismatch {
                index: step.index,
                param: step.param.clone(),
                expected: step.ty,
            })?;
            out.push(native);
        }
        Ok(out)
    }
}

pub mod assemble;
pub mod c_emit;
pub mod diagnostics;
pub mod generate;
pub mod lint;
pub mod options;
pub mod output;
pub mod plan;
pub mod schema;
pub mod types;
pub mod validate;

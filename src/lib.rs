//! Generates TypeScript interfaces from PostgreSQL table definitions, read
//! from a live database or from a DDL script.

pub mod ddl;
pub mod emit;
pub mod error;
pub mod format;
pub mod infer;
pub mod naming;
pub mod parser;
pub mod pg;
pub mod source;
pub mod type_map;
pub mod types;

pub use ddl::DdlSchema;
pub use emit::EmitOptions;
pub use error::{GeneratorError, Result};
pub use format::{FormatOptions, QuoteStyle};
pub use infer::{
    infer_schema, infer_schema_from_url, infer_table, infer_table_from_url, InferOptions,
};
pub use pg::Postgres;
pub use source::SchemaSource;
pub use types::{Column, EnumRegistry, NamedTable, Table, TsType};

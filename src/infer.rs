//! Introspection, mapping, emission and printing put together.

use futures_util::future::try_join_all;

use crate::emit::{self, EmitOptions};
use crate::error::{GeneratorError, Result};
use crate::format::{FormatOptions, Printer};
use crate::pg::Postgres;
use crate::source::SchemaSource;
use crate::type_map::TypeMapper;
use crate::types::NamedTable;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InferOptions {
    pub emit: EmitOptions,
    pub format: FormatOptions,
}

/// Generates the interface for a single table.
pub async fn infer_table<S>(source: &S, table: &str, options: &InferOptions) -> Result<String>
where
    S: SchemaSource + ?Sized,
{
    tracing::info!(table, schema = source.schema(), "inferring table");
    let (enums, mut columns) =
        futures_util::try_join!(source.enum_types(), source.columns(table))?;

    TypeMapper::new(&enums).map_table(&mut columns);
    render(
        &[NamedTable {
            name: table.to_string(),
            table: columns,
        }],
        options,
    )
}

/// Generates interfaces for every table of the schema, ordered by name.
pub async fn infer_schema<S>(source: &S, options: &InferOptions) -> Result<String>
where
    S: SchemaSource + ?Sized,
{
    let (names, enums) = futures_util::try_join!(source.table_names(), source.enum_types())?;
    tracing::info!(
        tables = names.len(),
        enums = enums.len(),
        schema = source.schema(),
        "inferring schema"
    );

    // Queries may complete in any order; the sort below fixes the output.
    let mut tables = try_join_all(names.into_iter().map(|name| async move {
        let table = source.columns(&name).await?;
        tracing::debug!(table = %name, columns = table.len(), "introspected table");
        Ok::<_, GeneratorError>(NamedTable { name, table })
    }))
    .await?;
    tables.sort_by(|a, b| a.name.cmp(&b.name));
    tables.dedup_by(|a, b| a.name == b.name);

    let mapper = TypeMapper::new(&enums);
    for table in &mut tables {
        mapper.map_table(&mut table.table);
    }

    render(&tables, options)
}

/// Connects to `connection_string`, generates one table and disconnects.
pub async fn infer_table_from_url(
    connection_string: &str,
    table: &str,
    options: &InferOptions,
) -> Result<String> {
    let db = Postgres::connect(connection_string).await?;
    let result = infer_table(&db, table, options).await;
    db.disconnect().await;
    result
}

/// Connects to `connection_string`, generates the whole schema and
/// disconnects.
pub async fn infer_schema_from_url(
    connection_string: &str,
    options: &InferOptions,
) -> Result<String> {
    let db = Postgres::connect(connection_string).await?;
    let result = infer_schema(&db, options).await;
    db.disconnect().await;
    result
}

fn render(tables: &[NamedTable], options: &InferOptions) -> Result<String> {
    let declarations = emit::declarations(tables, options.emit);
    Printer::new(options.format).print(&declarations)
}

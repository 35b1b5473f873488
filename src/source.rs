use async_trait::async_trait;

use crate::error::Result;
use crate::types::{EnumRegistry, Table};

pub const DEFAULT_SCHEMA: &str = "public";

/// Where table and enum definitions come from.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Schema that table and enum lookups are scoped to.
    fn schema(&self) -> &str;

    /// Deduplicated names of the tables in the schema.
    async fn table_names(&self) -> Result<Vec<String>>;

    /// Columns of `table` in ordinal order. An unknown table has no columns.
    async fn columns(&self, table: &str) -> Result<Table>;

    /// Enum types of the schema with their labels.
    async fn enum_types(&self) -> Result<EnumRegistry>;
}

//! Live introspection through `information_schema` and `pg_catalog`.

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};
use url::{form_urlencoded, Url};

use crate::error::{GeneratorError, Result};
use crate::source::{SchemaSource, DEFAULT_SCHEMA};
use crate::types::{Column, EnumRegistry, Table};

/// Query parameter selecting the schema to introspect.
const CURRENT_SCHEMA_PARAM: &str = "currentSchema";

const TABLE_NAMES_QUERY: &str = r#"
SELECT table_name::text
FROM information_schema.columns
WHERE table_schema = $1
GROUP BY table_name
"#;

const COLUMNS_QUERY: &str = r#"
SELECT column_name::text, udt_name::text, is_nullable::text
FROM information_schema.columns
WHERE table_name = $1 AND table_schema = $2
ORDER BY ordinal_position
"#;

const ENUMS_QUERY: &str = r#"
SELECT t.typname::text AS name, e.enumlabel::text AS value
FROM pg_type t
JOIN pg_enum e ON t.oid = e.enumtypid
JOIN pg_catalog.pg_namespace n ON n.oid = t.typnamespace
WHERE n.nspname = $1
ORDER BY t.typname ASC, e.enumlabel ASC
"#;

pub struct Postgres {
    client: Client,
    connection: JoinHandle<()>,
    schema: String,
}

impl Postgres {
    /// Connects with a `postgres://` URL or a key-value connection string.
    /// The schema comes from the URL's `currentSchema` parameter, `public`
    /// when absent.
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let (config, schema) = split_current_schema(connection_string)?;
        let (client, connection) = tokio_postgres::connect(&config, NoTls).await?;

        let connection = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "postgres connection error");
            }
        });

        let schema = schema.unwrap_or_else(|| DEFAULT_SCHEMA.to_string());
        tracing::info!(schema = %schema, "connected to postgres");

        Ok(Self {
            client,
            connection,
            schema,
        })
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Closes the connection and waits for the driver task to finish.
    pub async fn disconnect(self) {
        drop(self.client);
        if let Err(e) = self.connection.await {
            tracing::warn!(error = %e, "postgres connection task failed");
        }
    }
}

#[async_trait]
impl SchemaSource for Postgres {
    fn schema(&self) -> &str {
        &self.schema
    }

    async fn table_names(&self) -> Result<Vec<String>> {
        let rows = self
            .client
            .query(TABLE_NAMES_QUERY, &[&self.schema])
            .await?;

        let mut names = rows
            .iter()
            .map(|row| row.try_get::<_, String>(0))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        names.sort_unstable();
        names.dedup();
        Ok(names)
    }

    async fn columns(&self, table: &str) -> Result<Table> {
        let rows = self
            .client
            .query(COLUMNS_QUERY, &[&table, &self.schema])
            .await?;

        let mut columns = Table::new();
        for row in rows {
            let name: String = row.try_get(0)?;
            let udt_name: String = row.try_get(1)?;
            let is_nullable: String = row.try_get(2)?;
            columns.insert(Column::new(name, udt_name, is_nullable == "YES"));
        }

        if columns.is_empty() {
            tracing::warn!(table, schema = %self.schema, "table has no columns");
        }
        Ok(columns)
    }

    async fn enum_types(&self) -> Result<EnumRegistry> {
        let rows = self.client.query(ENUMS_QUERY, &[&self.schema]).await?;

        let mut registry = EnumRegistry::new();
        for row in rows {
            let name: String = row.try_get(0)?;
            let value: String = row.try_get(1)?;
            registry.insert(name, value);
        }
        Ok(registry)
    }
}

/// Removes `currentSchema` from a URL connection string, which the driver
/// would otherwise reject as an unknown option.
pub fn split_current_schema(connection_string: &str) -> Result<(String, Option<String>)> {
    if !is_url(connection_string) {
        return Ok((connection_string.to_string(), None));
    }

    let mut url = Url::parse(connection_string)
        .map_err(|e| GeneratorError::InvalidConnectionString(e.to_string()))?;

    let mut schema = None;
    let mut rest = Vec::new();
    for segment in url.query().unwrap_or_default().split('&') {
        if segment.is_empty() {
            continue;
        }
        // other segments reach the driver exactly as written
        match form_urlencoded::parse(segment.as_bytes()).next() {
            Some((key, value)) if key == CURRENT_SCHEMA_PARAM => {
                if !value.is_empty() {
                    schema = Some(value.into_owned());
                }
            }
            _ => rest.push(segment.to_string()),
        }
    }

    if rest.is_empty() {
        url.set_query(None);
    } else {
        url.set_query(Some(&rest.join("&")));
    }

    Ok((url.to_string(), schema))
}

pub fn is_url(connection_string: &str) -> bool {
    connection_string.starts_with("postgres://") || connection_string.starts_with("postgresql://")
}

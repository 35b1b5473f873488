//! Offline schema source: replays a SQL DDL script into tables and enums.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use sqlparser::ast::{
    AlterColumnOperation, AlterTableOperation, ColumnDef, ColumnOption, Ident, ObjectName,
    ObjectType, Statement, TableConstraint,
};
use sqlparser::parser::Parser;
use string_interner::{DefaultSymbol, StringInterner};

use crate::error::{GeneratorError, MultipleGeneratorErrors, Result};
use crate::parser::{self, EnumStatement, PostgresDdlDialect};
use crate::source::SchemaSource;
use crate::type_map::{canonical_udt_name, is_serial};
use crate::types::{Column, EnumRegistry, Table};

/// Tables and enum types declared by a DDL script.
#[derive(Debug, Clone, Default)]
pub struct DdlSchema {
    schema: String,
    tables: BTreeMap<(String, String), Table>,
    enums: BTreeMap<String, EnumRegistry>,
}

impl DdlSchema {
    /// Replays `sql`; unqualified names belong to `default_schema`, which is
    /// also the schema later lookups are scoped to.
    pub fn parse(sql: &str, default_schema: &str) -> Result<Self> {
        let dialect = PostgresDdlDialect::new();
        let ast = Parser::parse_sql(&dialect, sql)?;
        let enum_statements = dialect.take_enum_statements();

        let mut replay = Replay::new(default_schema, &enum_statements);
        replay.process_sql_statements(&ast)?;

        let schema = replay.into_schema();
        tracing::info!(
            tables = schema.tables.len(),
            schema = %schema.schema,
            "loaded ddl schema"
        );
        Ok(schema)
    }

    pub fn from_file(path: impl AsRef<Path>, default_schema: &str) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "reading ddl file");
        let sql = std::fs::read_to_string(path)?;
        Self::parse(&sql, default_schema)
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(&(self.schema.clone(), name.to_string()))
    }
}

#[async_trait]
impl SchemaSource for DdlSchema {
    fn schema(&self) -> &str {
        &self.schema
    }

    async fn table_names(&self) -> Result<Vec<String>> {
        Ok(self
            .tables
            .keys()
            .filter(|(schema, _)| *schema == self.schema)
            .map(|(_, name)| name.clone())
            .collect())
    }

    async fn columns(&self, table: &str) -> Result<Table> {
        match self.table(table) {
            Some(table) => Ok(table.clone()),
            None => {
                tracing::warn!(table, schema = %self.schema, "table has no columns");
                Ok(Table::new())
            }
        }
    }

    async fn enum_types(&self) -> Result<EnumRegistry> {
        Ok(self.enums.get(&self.schema).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Clone)]
struct ColumnDecl {
    name: DefaultSymbol,
    native_type: String,
    nullable: bool,
}

type ColumnDeclList = SmallVec<[ColumnDecl; 16]>;

/// (schema, name)
type QualifiedName = (DefaultSymbol, DefaultSymbol);

struct Replay<'a> {
    strings: StringInterner,
    default_schema: DefaultSymbol,
    tables: FxHashMap<QualifiedName, ColumnDeclList>,
    enums: FxHashMap<QualifiedName, Vec<String>>,
    enum_statements: &'a [EnumStatement],
}

impl<'a> Replay<'a> {
    fn new(default_schema: &str, enum_statements: &'a [EnumStatement]) -> Self {
        let mut strings = StringInterner::default();
        let default_schema = strings.get_or_intern(default_schema);
        Self {
            strings,
            default_schema,
            tables: FxHashMap::default(),
            enums: FxHashMap::default(),
            enum_statements,
        }
    }

    fn process_sql_statements(&mut self, statements: &[Statement]) -> Result<()> {
        let mut errors = Vec::with_capacity(statements.len());
        for (i, statement) in statements.iter().enumerate() {
            if let Err(err) = self.process_sql_statement(statement) {
                errors.push(GeneratorError::Statement {
                    index: i + 1,
                    statement: Box::new(statement.clone()),
                    inner: Box::new(err),
                });
            }
        }

        if !errors.is_empty() {
            return Err(GeneratorError::Multiple(MultipleGeneratorErrors(errors)));
        }

        Ok(())
    }

    fn process_sql_statement(&mut self, statement: &Statement) -> Result<()> {
        if let Some(index) = parser::enum_placeholder(statement) {
            let enum_statements = self.enum_statements;
            let enum_statement = enum_statements
                .get(index)
                .ok_or(GeneratorError::Base("unexpected ASSERT statement"))?;
            return self.process_enum_statement(enum_statement);
        }

        match statement {
            Statement::CreateTable {
                name,
                columns,
                constraints,
                if_not_exists,
                query,
                ..
            } => {
                if query.is_some() {
                    return Err(GeneratorError::Unimplemented("CREATE TABLE .. AS SELECT"));
                }

                let key = self.qualified_name(name)?;
                if *if_not_exists && self.tables.contains_key(&key) {
                    return Ok(());
                }

                let mut decls = ColumnDeclList::new();
                for column in columns {
                    decls.push(self.column_def_to_decl(column));
                }
                for constraint in constraints {
                    self.apply_table_constraint(&mut decls, constraint);
                }
                self.tables.insert(key, decls);
            }
            Statement::AlterTable {
                name, operations, ..
            } => {
                let key = self.qualified_name(name)?;
                for op in operations {
                    self.handle_alter_table_op(key, op)?;
                }
            }
            Statement::Drop {
                object_type: ObjectType::Table,
                names,
                if_exists,
                ..
            } => {
                for name in names {
                    let key = self.qualified_name(name)?;
                    if self.tables.remove(&key).is_none() && !*if_exists {
                        return Err(GeneratorError::TableNotExist(name.to_string()));
                    }
                }
            }

            _ => {}
        }

        Ok(())
    }

    fn process_enum_statement(&mut self, statement: &EnumStatement) -> Result<()> {
        match statement {
            EnumStatement::Create { name, labels } => {
                let key = self.qualified_name(name)?;
                self.enums.insert(key, labels.clone());
            }
            EnumStatement::Drop { names, if_exists } => {
                for name in names {
                    let key = self.qualified_name(name)?;
                    if self.enums.remove(&key).is_none() && !*if_exists {
                        return Err(GeneratorError::TypeNotExist(name.to_string()));
                    }
                }
            }
        }

        Ok(())
    }

    fn handle_alter_table_op(
        &mut self,
        key: QualifiedName,
        op: &AlterTableOperation,
    ) -> Result<()> {
        if let AlterTableOperation::RenameTable { table_name } = op {
            let columns = self.assert_table_exists(key)?;
            let renamed = (key.0, self.intern_name(table_name)?);
            self.tables.insert(renamed, columns);
            return Ok(());
        }

        let new_column = match op {
            AlterTableOperation::AddColumn { column_def, .. } => {
                Some(self.column_def_to_decl(column_def))
            }
            _ => None,
        };
        let ident_symbols = self.alter_op_symbols(op);

        let columns = self.tables.get_mut(&key).ok_or_else(|| {
            GeneratorError::TableNotExist(resolve(&self.strings, key.1).to_string())
        })?;

        match op {
            AlterTableOperation::AddColumn { .. } => {
                if let Some(column) = new_column {
                    match columns.iter_mut().find(|c| c.name == column.name) {
                        Some(existing) => *existing = column,
                        None => columns.push(column),
                    }
                }
            }
            AlterTableOperation::RenameColumn { .. } => {
                let [old_name, new_name] = ident_symbols.as_slice() else {
                    return Err(GeneratorError::Base("expected old and new column names"));
                };
                let column = find_column(columns, &self.strings, *old_name)?;
                column.name = *new_name;
            }
            AlterTableOperation::DropColumn { if_exists, .. } => {
                let [name] = ident_symbols.as_slice() else {
                    return Err(GeneratorError::Base("expected a column name"));
                };
                match columns.iter().position(|c| c.name == *name) {
                    Some(index) => {
                        columns.remove(index);
                    }
                    None if *if_exists => {}
                    None => {
                        return Err(GeneratorError::ColumnNotExist(
                            resolve(&self.strings, *name).to_string(),
                        ))
                    }
                }
            }
            AlterTableOperation::AlterColumn { op, .. } => {
                let [name] = ident_symbols.as_slice() else {
                    return Err(GeneratorError::Base("expected a column name"));
                };
                let column = find_column(columns, &self.strings, *name)?;
                match op {
                    AlterColumnOperation::SetNotNull => column.nullable = false,
                    AlterColumnOperation::DropNotNull => column.nullable = true,
                    AlterColumnOperation::SetDataType { data_type, .. } => {
                        column.native_type = canonical_udt_name(&data_type.to_string());
                    }
                    _ => {}
                }
            }
            AlterTableOperation::AddConstraint(TableConstraint::Unique {
                is_primary: true,
                ..
            }) => {
                for name in ident_symbols {
                    find_column(columns, &self.strings, name)?.nullable = false;
                }
            }

            _ => {}
        }

        Ok(())
    }

    /// Interns the column names an ALTER TABLE operation refers to, in
    /// source order.
    fn alter_op_symbols(&mut self, op: &AlterTableOperation) -> SmallVec<[DefaultSymbol; 4]> {
        let idents: Vec<&Ident> = match op {
            AlterTableOperation::RenameColumn {
                old_column_name,
                new_column_name,
            } => vec![old_column_name, new_column_name],
            AlterTableOperation::DropColumn { column_name, .. } => vec![column_name],
            AlterTableOperation::AlterColumn { column_name, .. } => vec![column_name],
            AlterTableOperation::AddConstraint(TableConstraint::Unique { columns, .. }) => {
                columns.iter().collect()
            }
            _ => vec![],
        };

        idents.into_iter().map(|i| self.intern_ident(i)).collect()
    }

    fn assert_table_exists(&mut self, key: QualifiedName) -> Result<ColumnDeclList> {
        self.tables.remove(&key).ok_or_else(|| {
            GeneratorError::TableNotExist(resolve(&self.strings, key.1).to_string())
        })
    }

    fn column_def_to_decl(&mut self, column: &ColumnDef) -> ColumnDecl {
        let spelling = column.data_type.to_string();
        let name = self.intern_ident(&column.name);
        ColumnDecl {
            name,
            native_type: canonical_udt_name(&spelling),
            nullable: !is_serial(&spelling) && !Self::non_nullable(column),
        }
    }

    fn non_nullable(column: &ColumnDef) -> bool {
        let mut non_nullable = false;
        for option in &column.options {
            match option.option {
                ColumnOption::NotNull => non_nullable = true,
                ColumnOption::Null => non_nullable = false,
                // primary keys are implicitly NOT NULL, plain UNIQUE is not
                ColumnOption::Unique { is_primary: true } => non_nullable = true,
                _ => {}
            }
        }

        non_nullable
    }

    fn apply_table_constraint(&mut self, columns: &mut ColumnDeclList, constraint: &TableConstraint) {
        if let TableConstraint::Unique {
            columns: key_columns,
            is_primary: true,
            ..
        } = constraint
        {
            for ident in key_columns {
                let name = self.intern_ident(ident);
                if let Some(column) = columns.iter_mut().find(|c| c.name == name) {
                    column.nullable = false;
                }
            }
        }
    }

    fn intern_ident(&mut self, ident: &Ident) -> DefaultSymbol {
        self.strings.get_or_intern(fold_ident(ident))
    }

    fn intern_name(&mut self, name: &ObjectName) -> Result<DefaultSymbol> {
        let last = name
            .0
            .last()
            .ok_or(GeneratorError::Base("unexpected name doesn't have elements"))?;
        Ok(self.intern_ident(last))
    }

    fn qualified_name(&mut self, name: &ObjectName) -> Result<QualifiedName> {
        let object = self.intern_name(name)?;
        let schema = match name.0.len() {
            0 | 1 => self.default_schema,
            n => self.intern_ident(&name.0[n - 2]),
        };
        Ok((schema, object))
    }
}

impl Replay<'_> {
    fn into_schema(self) -> DdlSchema {
        let strings = &self.strings;

        let tables: BTreeMap<(String, String), Table> = self
            .tables
            .iter()
            .map(|((schema, name), decls)| {
                let table: Table = decls
                    .iter()
                    .map(|d| {
                        Column::new(resolve(strings, d.name), d.native_type.clone(), d.nullable)
                    })
                    .collect();
                (
                    (resolve(strings, *schema).to_string(), resolve(strings, *name).to_string()),
                    table,
                )
            })
            .collect();

        let mut enums: BTreeMap<String, EnumRegistry> = BTreeMap::new();
        for ((schema, name), labels) in &self.enums {
            let registry = enums.entry(resolve(strings, *schema).to_string()).or_default();
            for label in labels {
                registry.insert(resolve(strings, *name), label.clone());
            }
        }

        DdlSchema {
            schema: resolve(strings, self.default_schema).to_string(),
            tables,
            enums,
        }
    }
}

fn find_column<'c>(
    columns: &'c mut ColumnDeclList,
    strings: &StringInterner,
    name: DefaultSymbol,
) -> Result<&'c mut ColumnDecl> {
    columns
        .iter_mut()
        .find(|c| c.name == name)
        .ok_or_else(|| GeneratorError::ColumnNotExist(resolve(strings, name).to_string()))
}

fn resolve(strings: &StringInterner, symbol: DefaultSymbol) -> &str {
    strings.resolve(symbol).unwrap_or_default()
}

/// Unquoted identifiers fold to lower case, as in PostgreSQL.
fn fold_ident(ident: &Ident) -> String {
    match ident.quote_style {
        Some(_) => ident.value.clone(),
        None => ident.value.to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(schema: &DdlSchema, table: &str) -> Vec<(String, String, bool)> {
        schema
            .table(table)
            .unwrap_or_else(|| panic!("table {table} missing"))
            .iter()
            .map(|c| (c.name.clone(), c.native_type.clone(), c.nullable))
            .collect()
    }

    fn col(name: &str, native: &str, nullable: bool) -> (String, String, bool) {
        (name.to_string(), native.to_string(), nullable)
    }

    #[test]
    fn test_create_table() {
        let schema = DdlSchema::parse(
            "CREATE TABLE account (
                username VARCHAR (50) UNIQUE NOT NULL,
                email VARCHAR (355) UNIQUE NOT NULL,
                created_on TIMESTAMP NOT NULL,
                last_login TIMESTAMP
            );",
            "public",
        )
        .unwrap();

        assert_eq!(
            columns(&schema, "account"),
            [
                col("username", "varchar", false),
                col("email", "varchar", false),
                col("created_on", "timestamp", false),
                col("last_login", "timestamp", true),
            ]
        );
    }

    #[test]
    fn test_primary_keys_and_serials_are_not_null() {
        let schema = DdlSchema::parse(
            "CREATE TABLE items (
                id SERIAL,
                sku TEXT,
                code INTEGER PRIMARY KEY,
                tags TEXT[],
                PRIMARY KEY (sku)
            );",
            "public",
        )
        .unwrap();

        assert_eq!(
            columns(&schema, "items"),
            [
                col("id", "int4", false),
                col("sku", "text", false),
                col("code", "int4", false),
                col("tags", "_text", true),
            ]
        );
    }

    #[test]
    fn test_enum_types() {
        let schema = DdlSchema::parse(
            "DROP TYPE IF EXISTS integration_type_enum CASCADE;
            CREATE TYPE integration_type_enum AS ENUM ('source', 'destination');
            CREATE TYPE point3 AS (x float8, y float8, z float8);
            CREATE TABLE requests (
                name varchar(255) NOT NULL,
                integration_type integration_type_enum NOT NULL
            );",
            "public",
        )
        .unwrap();

        let registry = futures_util::FutureExt::now_or_never(schema.enum_types())
            .unwrap()
            .unwrap();
        assert_eq!(
            registry.labels("integration_type_enum").unwrap(),
            ["destination", "source"]
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(
            columns(&schema, "requests")[1],
            col("integration_type", "integration_type_enum", false)
        );
    }

    #[test]
    fn test_alter_table() {
        let schema = DdlSchema::parse(
            "CREATE TABLE users (id int NOT NULL, name text, nickname text, age int);
            ALTER TABLE users ADD COLUMN email text NOT NULL;
            ALTER TABLE users RENAME COLUMN name TO full_name;
            ALTER TABLE users DROP COLUMN nickname;
            ALTER TABLE users ALTER COLUMN full_name SET NOT NULL;
            ALTER TABLE users ALTER COLUMN age SET DATA TYPE bigint;
            ALTER TABLE users RENAME TO people;",
            "public",
        )
        .unwrap();

        assert!(schema.table("users").is_none());
        assert_eq!(
            columns(&schema, "people"),
            [
                col("id", "int4", false),
                col("full_name", "text", false),
                col("age", "int8", true),
                col("email", "text", false),
            ]
        );
    }

    #[test]
    fn test_drop_table() {
        let schema = DdlSchema::parse(
            "DROP TABLE IF EXISTS account;
            CREATE TABLE account (id int);
            DROP TABLE account;",
            "public",
        )
        .unwrap();
        assert!(schema.table("account").is_none());
    }

    #[test]
    fn test_errors_are_collected() {
        let err = DdlSchema::parse(
            "DROP TABLE missing;
            CREATE TABLE t (id int);
            ALTER TABLE t DROP COLUMN nope;",
            "public",
        )
        .unwrap_err();

        match err {
            GeneratorError::Multiple(MultipleGeneratorErrors(errors)) => {
                assert_eq!(errors.len(), 2);
                assert!(matches!(errors[0], GeneratorError::Statement { index: 1, .. }));
                assert!(matches!(errors[1], GeneratorError::Statement { index: 3, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_schemas_and_identifier_folding() {
        let schema = DdlSchema::parse(
            "CREATE TABLE Account (UserName text);
            CREATE TABLE \"Mixed\" (\"Id\" int);
            CREATE TABLE audit.log (id int);
            CREATE TYPE audit.level AS ENUM ('info');",
            "public",
        )
        .unwrap();

        assert_eq!(columns(&schema, "account"), [col("username", "text", true)]);
        assert_eq!(columns(&schema, "Mixed"), [col("Id", "int4", true)]);
        assert!(schema.table("log").is_none());

        let audit = schema.with_schema("audit");
        assert_eq!(columns(&audit, "log"), [col("id", "int4", true)]);
        let registry = futures_util::FutureExt::now_or_never(audit.enum_types())
            .unwrap()
            .unwrap();
        assert_eq!(registry.labels("level").unwrap(), ["info"]);
    }

    #[test]
    fn test_skipped_statements() {
        let schema = DdlSchema::parse(
            "CREATE EXTENSION IF NOT EXISTS citext;
            CREATE TABLE t (email citext);
            CREATE INDEX t_email ON t (email);",
            "public",
        )
        .unwrap();
        assert_eq!(columns(&schema, "t"), [col("email", "citext", true)]);
    }
}

use crate::types::{Column, EnumRegistry, Table, TsType};

/// Maps PostgreSQL udt names to TypeScript types.
#[derive(Debug, Clone, Copy)]
pub struct TypeMapper<'a> {
    enums: &'a EnumRegistry,
}

impl<'a> TypeMapper<'a> {
    pub fn new(enums: &'a EnumRegistry) -> Self {
        Self { enums }
    }

    pub fn map(&self, native_type: &str) -> TsType {
        match native_type {
            "bpchar" | "char" | "varchar" | "text" | "citext" | "uuid" | "bytea" | "inet"
            | "time" | "timetz" | "interval" | "name" => TsType::String,

            "int2" | "int4" | "int8" | "float4" | "float8" | "numeric" | "money" | "oid" => {
                TsType::Number
            }

            "bool" => TsType::Boolean,

            "json" | "jsonb" => TsType::Json,

            "date" | "timestamp" | "timestamptz" => TsType::Date,

            "_int2" | "_int4" | "_int8" | "_float4" | "_float8" | "_numeric" | "_money" => {
                TsType::array(TsType::Number)
            }
            "_bool" => TsType::array(TsType::Boolean),
            "_varchar" | "_text" | "_citext" | "_uuid" | "_bytea" => TsType::array(TsType::String),
            "_json" | "_jsonb" => TsType::array(TsType::Json),
            "_timestamptz" => TsType::array(TsType::Date),

            other => match self.enums.labels(other) {
                Some(labels) if !labels.is_empty() => TsType::Literals(labels.to_vec()),
                _ => {
                    tracing::debug!(native_type = other, "no mapping for native type, using any");
                    TsType::Unknown(other.to_string())
                }
            },
        }
    }

    pub fn map_column(&self, column: &Column) -> TsType {
        let ty = self.map(&column.native_type);
        if column.nullable {
            ty.nullable()
        } else {
            ty
        }
    }

    /// Fills in `mapped_type` for every column of the table.
    pub fn map_table(&self, table: &mut Table) {
        for column in table.iter_mut() {
            column.mapped_type = Some(self.map_column(column));
        }
    }
}

/// Converts a SQL type spelling into the udt name PostgreSQL reports for it:
/// `VARCHAR(50)` -> `varchar`, `integer[]` -> `_int4`,
/// `timestamp(3) with time zone` -> `timestamptz`, `public."Mood"` -> `Mood`.
pub fn canonical_udt_name(spelling: &str) -> String {
    let spelling = spelling.trim();

    if let Some(element) = array_element(spelling) {
        return format!("_{}", canonical_udt_name(element));
    }

    let mut s = spelling.to_string();
    while let Some(start) = s.find('(') {
        let Some(end) = s[start..].find(')') else {
            break;
        };
        s.replace_range(start..start + end + 1, "");
    }

    let last = last_name_part(&s);
    if let Some(quoted) = last.strip_prefix('"').and_then(|q| q.strip_suffix('"')) {
        return quoted.replace("\"\"", "\"");
    }

    let words = last
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let udt = match words.as_str() {
        "character varying" | "varchar" => "varchar",
        "character" | "char" | "bpchar" => "bpchar",
        "smallint" | "int2" | "smallserial" | "serial2" => "int2",
        "integer" | "int" | "int4" | "serial" | "serial4" => "int4",
        "bigint" | "int8" | "bigserial" | "serial8" => "int8",
        "real" | "float4" => "float4",
        "double precision" | "double" | "float" | "float8" => "float8",
        "decimal" | "dec" | "numeric" => "numeric",
        "boolean" | "bool" => "bool",
        "timestamp" | "timestamp without time zone" => "timestamp",
        "timestamp with time zone" | "timestamptz" => "timestamptz",
        "time" | "time without time zone" => "time",
        "time with time zone" | "timetz" => "timetz",
        _ => "",
    };

    if udt.is_empty() {
        words
    } else {
        udt.to_string()
    }
}

/// Serial pseudo-types carry an implicit `NOT NULL`.
pub fn is_serial(spelling: &str) -> bool {
    matches!(
        canonical_spelling(spelling).as_str(),
        "serial" | "serial2" | "serial4" | "serial8" | "smallserial" | "bigserial"
    )
}

fn canonical_spelling(spelling: &str) -> String {
    last_name_part(spelling.trim()).trim().to_lowercase()
}

fn array_element(spelling: &str) -> Option<&str> {
    if let Some(inner) = spelling
        .strip_suffix(']')
        .and_then(|s| s.rfind('[').map(|i| &s[..i]))
    {
        return Some(inner.trim_end());
    }

    let upper = spelling.get(..6)?;
    if upper.eq_ignore_ascii_case("array<") {
        return spelling[6..].strip_suffix('>');
    }

    None
}

/// `public.mood` -> `mood`; dots inside double quotes are not separators.
fn last_name_part(s: &str) -> &str {
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '.' if !in_quotes => start = i + 1,
            _ => {}
        }
    }
    &s[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> EnumRegistry {
        let mut registry = EnumRegistry::new();
        registry.insert("integration_type_enum", "source");
        registry.insert("integration_type_enum", "destination");
        registry
    }

    #[test]
    fn test_scalar_families() {
        let enums = EnumRegistry::new();
        let mapper = TypeMapper::new(&enums);

        for native in ["bpchar", "varchar", "text", "uuid", "bytea", "inet", "interval", "name"] {
            assert_eq!(mapper.map(native), TsType::String, "{native}");
        }
        for native in ["int2", "int4", "int8", "float8", "numeric", "money", "oid"] {
            assert_eq!(mapper.map(native), TsType::Number, "{native}");
        }
        assert_eq!(mapper.map("bool"), TsType::Boolean);
        assert_eq!(mapper.map("jsonb"), TsType::Json);
        assert_eq!(mapper.map("date"), TsType::Date);
        assert_eq!(mapper.map("timestamptz"), TsType::Date);
    }

    #[test]
    fn test_array_families() {
        let enums = EnumRegistry::new();
        let mapper = TypeMapper::new(&enums);

        assert_eq!(mapper.map("_int4"), TsType::array(TsType::Number));
        assert_eq!(mapper.map("_bool"), TsType::array(TsType::Boolean));
        assert_eq!(mapper.map("_uuid"), TsType::array(TsType::String));
        assert_eq!(mapper.map("_jsonb"), TsType::array(TsType::Json));
        assert_eq!(mapper.map("_timestamptz"), TsType::array(TsType::Date));
        // Only the timezone-aware timestamp array is mapped.
        assert_eq!(
            mapper.map("_timestamp"),
            TsType::Unknown("_timestamp".to_string())
        );
    }

    #[test]
    fn test_enum_lookup_and_fallback() {
        let enums = registry();
        let mapper = TypeMapper::new(&enums);

        assert_eq!(
            mapper.map("integration_type_enum"),
            TsType::Literals(vec!["destination".into(), "source".into()])
        );
        assert_eq!(mapper.map("geometry"), TsType::Unknown("geometry".into()));
    }

    #[test]
    fn test_nullability() {
        let enums = registry();
        let mapper = TypeMapper::new(&enums);

        let mut table: Table = [
            Column::new("username", "varchar", false),
            Column::new("last_login", "timestamp", true),
        ]
        .into_iter()
        .collect();
        mapper.map_table(&mut table);

        assert_eq!(
            table.get("username").unwrap().mapped_type,
            Some(TsType::String)
        );
        assert_eq!(
            table.get("last_login").unwrap().mapped_type,
            Some(TsType::Date.nullable())
        );
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let enums = registry();
        let mapper = TypeMapper::new(&enums);
        for native in ["text", "_int8", "integration_type_enum", "whatever"] {
            assert_eq!(mapper.map(native), mapper.map(native));
        }
    }

    #[test]
    fn test_canonical_udt_name() {
        assert_eq!(canonical_udt_name("VARCHAR(50)"), "varchar");
        assert_eq!(canonical_udt_name("CHARACTER VARYING(355)"), "varchar");
        assert_eq!(canonical_udt_name("INTEGER"), "int4");
        assert_eq!(canonical_udt_name("NUMERIC(10,2)"), "numeric");
        assert_eq!(canonical_udt_name("DOUBLE PRECISION"), "float8");
        assert_eq!(canonical_udt_name("TIMESTAMP"), "timestamp");
        assert_eq!(
            canonical_udt_name("TIMESTAMP(3) WITH TIME ZONE"),
            "timestamptz"
        );
        assert_eq!(canonical_udt_name("JSON"), "json");
        assert_eq!(canonical_udt_name("TEXT[]"), "_text");
        assert_eq!(canonical_udt_name("integer[3]"), "_int4");
        assert_eq!(canonical_udt_name("ARRAY<BIGINT>"), "_int8");
        assert_eq!(canonical_udt_name("public.integration_type_enum"), "integration_type_enum");
        assert_eq!(canonical_udt_name("public.\"Mood\""), "Mood");
        assert_eq!(canonical_udt_name("serial"), "int4");
    }

    #[test]
    fn test_is_serial() {
        assert!(is_serial("SERIAL"));
        assert!(is_serial("bigserial"));
        assert!(!is_serial("integer"));
    }
}

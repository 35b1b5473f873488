use rustc_hash::FxHashMap;

use crate::format::{Declaration, Member};
use crate::naming::{self, CaseOptions};
use crate::types::{NamedTable, Table, TsType};

/// The `JSONValue` family referenced by json and jsonb columns.
pub const JSON_TYPES: [(&str, &str); 4] = [
    ("JSONPrimitive", "string | number | boolean | null"),
    ("JSONValue", "JSONPrimitive | JSONObject | JSONArray"),
    ("JSONObject", "{ [member: string]: JSONValue }"),
    ("JSONArray", "Array<JSONValue>"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitOptions {
    /// PascalCase interface names and camelCase member names.
    pub camel_case: bool,
}

/// Builds one interface per table, preceded by the JSON type family when any
/// member needs it.
pub fn declarations(tables: &[NamedTable], options: EmitOptions) -> Vec<Declaration> {
    let interfaces: Vec<Declaration> = tables
        .iter()
        .map(|t| interface(&t.name, &t.table, options))
        .collect();
    report_collisions(
        "interface",
        tables.iter().map(|t| t.name.as_str()).zip(interfaces.iter().map(|d| match d {
            Declaration::Interface { name, .. } | Declaration::TypeAlias { name, .. } => {
                name.as_str()
            }
        })),
    );

    let needs_json = tables
        .iter()
        .flat_map(|t| t.table.iter())
        .any(|c| c.mapped_type.as_ref().is_some_and(TsType::uses_json));

    let mut out = Vec::with_capacity(interfaces.len() + JSON_TYPES.len());
    if needs_json {
        out.extend(JSON_TYPES.iter().map(|(name, body)| Declaration::TypeAlias {
            name: name.to_string(),
            body: body.to_string(),
        }));
    }
    out.extend(interfaces);
    out
}

pub fn interface(name: &str, table: &Table, options: EmitOptions) -> Declaration {
    let members: Vec<Member> = table
        .iter()
        .map(|column| Member {
            key: member_name(&column.name, options),
            ty: column
                .mapped_type
                .clone()
                .unwrap_or_else(|| TsType::Unknown(column.native_type.clone())),
        })
        .collect();
    report_collisions(
        "member",
        table
            .iter()
            .map(|c| c.name.as_str())
            .zip(members.iter().map(|m| m.key.as_str())),
    );

    Declaration::Interface {
        name: type_name(name, options),
        members,
    }
}

pub fn type_name(table: &str, options: EmitOptions) -> String {
    let name = if options.camel_case {
        naming::pascal_case(table)
    } else {
        table.to_string()
    };
    if naming::is_identifier(&name) {
        return naming::safe_name(&name);
    }

    let name = naming::pascal_case(&name);
    match name.chars().next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => naming::safe_name(&name),
        _ => format!("_{name}"),
    }
}

pub fn member_name(column: &str, options: EmitOptions) -> String {
    if options.camel_case {
        naming::safe_name(&naming::camel_case(column, CaseOptions::default()))
    } else {
        naming::safe_name(column)
    }
}

/// Warns about distinct source names that normalize to the same output name
/// and returns how many there were.
fn report_collisions<'a>(kind: &str, names: impl Iterator<Item = (&'a str, &'a str)>) -> usize {
    let mut seen: FxHashMap<&str, &str> = FxHashMap::default();
    let mut collisions = 0;
    for (source, output) in names {
        match seen.get(output) {
            Some(first) if *first != source => {
                tracing::warn!(
                    kind,
                    first = *first,
                    second = source,
                    name = output,
                    "names collide after normalization"
                );
                collisions += 1;
            }
            Some(_) => {}
            None => {
                seen.insert(output, source);
            }
        }
    }
    collisions
}

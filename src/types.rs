use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// TypeScript type expression chosen for a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TsType {
    String,
    Number,
    Boolean,
    Date,
    /// The recursive `JSONValue` family.
    Json,
    Array(Box<TsType>),
    /// Union of string literals, one per enum label.
    Literals(Vec<String>),
    /// A native type with no mapping; rendered as `any`.
    Unknown(String),
    Nullable(Box<TsType>),
}

impl TsType {
    pub fn array(inner: TsType) -> Self {
        TsType::Array(Box::new(inner))
    }

    pub fn nullable(self) -> Self {
        match self {
            TsType::Nullable(_) => self,
            other => TsType::Nullable(Box::new(other)),
        }
    }

    pub fn uses_json(&self) -> bool {
        match self {
            TsType::Json => true,
            TsType::Array(inner) | TsType::Nullable(inner) => inner.uses_json(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    /// udt name as reported by the database, e.g. `varchar` or `_int4`.
    pub native_type: String,
    pub nullable: bool,
    pub mapped_type: Option<TsType>,
}

impl Column {
    pub fn new(name: impl Into<String>, native_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            native_type: native_type.into(),
            nullable,
            mapped_type: None,
        }
    }
}

pub type ColumnList = SmallVec<[Column; 16]>;

/// Columns of one table, unique by name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: ColumnList,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column; a column with the same name is replaced in place.
    pub fn insert(&mut self, column: Column) {
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Column> {
        self.columns.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl FromIterator<Column> for Table {
    fn from_iter<I: IntoIterator<Item = Column>>(iter: I) -> Self {
        let mut table = Table::new();
        for column in iter {
            table.insert(column);
        }
        table
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedTable {
    pub name: String,
    pub table: Table,
}

/// Enum type name -> labels, labels sorted and unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumRegistry {
    types: FxHashMap<String, SmallVec<[String; 8]>>,
}

impl EnumRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, type_name: impl Into<String>, label: impl Into<String>) {
        let labels = self.types.entry(type_name.into()).or_default();
        let label = label.into();
        if let Err(index) = labels.binary_search(&label) {
            labels.insert(index, label);
        }
    }

    pub fn labels(&self, type_name: &str) -> Option<&[String]> {
        self.types.get(type_name).map(|labels| labels.as_slice())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

//! Static table descriptors for every entity kind.
//!
//! Both store backends and the generic handlers read column metadata from
//! here: which columns exist, their SQL type, whether they may be null and
//! which entity a foreign key points at.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Variable,
    DateRecord,
    Record,
    Element,
    ElementInt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
    /// No two rows may hold the same value
    pub unique: bool,
    pub references: Option<EntityKind>,
}

impl Column {
    const fn required(name: &'static str, ty: ColumnType) -> Self {
        Self { name, ty, nullable: false, unique: false, references: None }
    }

    const fn unique(self) -> Self {
        Self { unique: true, ..self }
    }

    const fn foreign_key(name: &'static str, target: EntityKind) -> Self {
        Self { name, ty: ColumnType::Integer, nullable: false, unique: false, references: Some(target) }
    }
}

/// Primary key column shared by every table
pub const ID_COLUMN: &str = "id";

const USER_COLUMNS: &[Column] = &[
    Column::required("email", ColumnType::Text).unique(),
    Column::required("nick", ColumnType::Text),
    Column::required("password", ColumnType::Text),
];

const VARIABLE_COLUMNS: &[Column] = &[Column::required("name", ColumnType::Text)];

const DATE_RECORD_COLUMNS: &[Column] = &[Column::required("date", ColumnType::Date)];

const RECORD_COLUMNS: &[Column] = &[
    Column::required("record", ColumnType::Integer),
    Column::foreign_key("VariableId", EntityKind::Variable),
    Column::foreign_key("DateRecordId", EntityKind::DateRecord),
];

const ELEMENT_COLUMNS: &[Column] = &[Column::required("name", ColumnType::Text)];

const ELEMENT_INT_COLUMNS: &[Column] = &[
    Column::required("record", ColumnType::Integer),
    Column::foreign_key("ElementId", EntityKind::Element),
];

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::User,
        EntityKind::Variable,
        EntityKind::DateRecord,
        EntityKind::Record,
        EntityKind::Element,
        EntityKind::ElementInt,
    ];

    pub fn table(self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Variable => "variables",
            EntityKind::DateRecord => "dateRecords",
            EntityKind::Record => "records",
            EntityKind::Element => "elements",
            EntityKind::ElementInt => "elementInts",
        }
    }

    /// Collection route for the kind. Users are only reachable through /auth.
    pub fn path(self) -> &'static str {
        match self {
            EntityKind::User => "/auth",
            EntityKind::Variable => "/variables",
            EntityKind::DateRecord => "/dateRecords",
            EntityKind::Record => "/records",
            EntityKind::Element => "/elements",
            EntityKind::ElementInt => "/elementInts",
        }
    }

    pub fn columns(self) -> &'static [Column] {
        match self {
            EntityKind::User => USER_COLUMNS,
            EntityKind::Variable => VARIABLE_COLUMNS,
            EntityKind::DateRecord => DATE_RECORD_COLUMNS,
            EntityKind::Record => RECORD_COLUMNS,
            EntityKind::Element => ELEMENT_COLUMNS,
            EntityKind::ElementInt => ELEMENT_INT_COLUMNS,
        }
    }

    pub fn column(self, name: &str) -> Option<&'static Column> {
        self.columns().iter().find(|c| c.name == name)
    }

    /// Columns that must be supplied (and non-empty) on create
    pub fn required_fields(self) -> impl Iterator<Item = &'static str> {
        self.columns().iter().filter(|c| !c.nullable).map(|c| c.name)
    }

    pub fn foreign_keys(self) -> impl Iterator<Item = &'static Column> {
        self.columns().iter().filter(|c| c.references.is_some())
    }

    /// Foreign-key columns in other tables that point at this kind
    pub fn referenced_by(self) -> Vec<(EntityKind, &'static str)> {
        EntityKind::ALL
            .iter()
            .flat_map(|kind| {
                kind.foreign_keys()
                    .filter(move |c| c.references == Some(self))
                    .map(move |c| (*kind, c.name))
            })
            .collect()
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::User => "User",
            EntityKind::Variable => "Variable",
            EntityKind::DateRecord => "DateRecord",
            EntityKind::Record => "Record",
            EntityKind::Element => "Element",
            EntityKind::ElementInt => "ElementInt",
        };
        f.write_str(name)
    }
}

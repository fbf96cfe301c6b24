//! Table definitions built fluently, one column or constraint at a time.
//!
//! A [`Blueprint`] only records what a migration asked for. Turning it into
//! DDL is the grammar's job; checking it against existing tables is the
//! catalog's.

use serde_json::Value;

/// Storage type of a column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
    /// Auto-incrementing big integer primary key.
    Id,
    BigInteger,
    UnsignedBigInteger,
    Integer,
    UnsignedInteger,
    String(u32),
    Text,
    Decimal(u8, u8),
    Boolean,
    Date,
    Timestamp,
    Json,
    Uuid,
    /// Text restricted to a fixed set of values.
    Enum(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub kind: ColumnType,
    pub nullable: bool,
    pub default: Option<Value>,
    pub primary: bool,
    pub comment: Option<String>,
}

impl ColumnDefinition {
    fn new(name: &str, kind: ColumnType) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            nullable: false,
            default: None,
            primary: false,
            comment: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Primary,
    Unique,
    Index,
    Fulltext,
}

impl IndexKind {
    fn suffix(self) -> &'static str {
        match self {
            IndexKind::Primary => "primary",
            IndexKind::Unique => "unique",
            IndexKind::Index => "index",
            IndexKind::Fulltext => "fulltext",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexDefinition {
    pub name: String,
    pub kind: IndexKind,
    pub columns: Vec<String>,
}

/// What happens to child rows when the parent row goes away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    Restrict,
    NoAction,
}

impl ReferentialAction {
    pub fn as_sql(self) -> &'static str {
        match self {
            ReferentialAction::Cascade => "cascade",
            ReferentialAction::SetNull => "set null",
            ReferentialAction::Restrict => "restrict",
            ReferentialAction::NoAction => "no action",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub name: String,
    pub column: String,
    pub on_table: String,
    pub references: String,
    pub on_delete: Option<ReferentialAction>,
}

/// Table-level operations, in the order they were declared.
#[derive(Debug, Clone, PartialEq)]
pub enum TableCommand {
    Index(IndexDefinition),
    Foreign(ForeignKey),
    Check { name: String, expression: String },
    DropColumn(Vec<String>),
    RenameColumn { from: String, to: String },
    DropIndex(String),
    DropForeign(String),
}

/// `{table}_{columns}_{suffix}`, lowercased with separators normalized.
pub fn index_name(table: &str, columns: &[&str], suffix: &str) -> String {
    let mut parts = vec![table];
    parts.extend_from_slice(columns);
    parts.push(suffix);
    parts
        .join("_")
        .to_lowercase()
        .replace(['-', '.'], "_")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    table: String,
    columns: Vec<ColumnDefinition>,
    commands: Vec<TableCommand>,
}

impl Blueprint {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn commands(&self) -> &[TableCommand] {
        &self.commands
    }

    fn add(&mut self, name: &str, kind: ColumnType) -> ColumnBuilder<'_> {
        self.columns.push(ColumnDefinition::new(name, kind));
        let position = self.columns.len() - 1;
        ColumnBuilder {
            blueprint: self,
            position,
        }
    }

    pub fn id(&mut self) -> ColumnBuilder<'_> {
        let mut column = self.add("id", ColumnType::Id);
        column.definition().primary = true;
        column
    }

    /// Unsigned big integer meant to reference another table's `id`.
    pub fn foreign_id(&mut self, name: &str) -> ForeignIdBuilder<'_> {
        self.columns
            .push(ColumnDefinition::new(name, ColumnType::UnsignedBigInteger));
        ForeignIdBuilder {
            column: name.to_owned(),
            blueprint: self,
        }
    }

    pub fn string(&mut self, name: &str, length: u32) -> ColumnBuilder<'_> {
        self.add(name, ColumnType::String(length))
    }

    pub fn text(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.add(name, ColumnType::Text)
    }

    pub fn integer(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.add(name, ColumnType::Integer)
    }

    pub fn unsigned_integer(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.add(name, ColumnType::UnsignedInteger)
    }

    pub fn big_integer(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.add(name, ColumnType::BigInteger)
    }

    pub fn decimal(&mut self, name: &str, precision: u8, scale: u8) -> ColumnBuilder<'_> {
        self.add(name, ColumnType::Decimal(precision, scale))
    }

    pub fn boolean(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.add(name, ColumnType::Boolean)
    }

    pub fn date(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.add(name, ColumnType::Date)
    }

    pub fn timestamp(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.add(name, ColumnType::Timestamp)
    }

    pub fn json(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.add(name, ColumnType::Json)
    }

    pub fn uuid(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.add(name, ColumnType::Uuid)
    }

    pub fn enum_(&mut self, name: &str, values: &[&str]) -> ColumnBuilder<'_> {
        let values = values.iter().map(|v| (*v).to_owned()).collect();
        self.add(name, ColumnType::Enum(values))
    }

    /// Nullable `created_at` / `updated_at`.
    pub fn timestamps(&mut self) {
        self.timestamp("created_at").nullable();
        self.timestamp("updated_at").nullable();
    }

    pub fn soft_deletes(&mut self) {
        self.timestamp("deleted_at").nullable();
    }

    /// `{name}_type` + `{name}_id` with a composite index.
    pub fn morphs(&mut self, name: &str) {
        let kind = format!("{name}_type");
        let id = format!("{name}_id");
        self.string(&kind, 255);
        self.add(&id, ColumnType::UnsignedBigInteger);
        self.index(&[&kind, &id]);
    }

    fn push_index(&mut self, kind: IndexKind, columns: &[&str]) {
        let name = index_name(&self.table, columns, kind.suffix());
        self.commands.push(TableCommand::Index(IndexDefinition {
            name,
            kind,
            columns: columns.iter().map(|c| (*c).to_owned()).collect(),
        }));
    }

    pub fn index(&mut self, columns: &[&str]) {
        self.push_index(IndexKind::Index, columns);
    }

    pub fn unique(&mut self, columns: &[&str]) {
        self.push_index(IndexKind::Unique, columns);
    }

    pub fn fulltext(&mut self, columns: &[&str]) {
        self.push_index(IndexKind::Fulltext, columns);
    }

    pub fn check(&mut self, name: &str, expression: &str) {
        self.commands.push(TableCommand::Check {
            name: name.to_owned(),
            expression: expression.to_owned(),
        });
    }

    pub fn drop_column(&mut self, columns: &[&str]) {
        self.commands.push(TableCommand::DropColumn(
            columns.iter().map(|c| (*c).to_owned()).collect(),
        ));
    }

    pub fn rename_column(&mut self, from: &str, to: &str) {
        self.commands.push(TableCommand::RenameColumn {
            from: from.to_owned(),
            to: to.to_owned(),
        });
    }

    pub fn drop_index(&mut self, name: &str) {
        self.commands.push(TableCommand::DropIndex(name.to_owned()));
    }

    /// Drops the foreign key on `column` by its conventional name.
    pub fn drop_foreign(&mut self, column: &str) {
        let name = index_name(&self.table, &[column], "foreign");
        self.commands.push(TableCommand::DropForeign(name));
    }
}

/// Modifiers for the column just added.
pub struct ColumnBuilder<'a> {
    blueprint: &'a mut Blueprint,
    position: usize,
}

impl ColumnBuilder<'_> {
    fn definition(&mut self) -> &mut ColumnDefinition {
        &mut self.blueprint.columns[self.position]
    }

    fn name(&self) -> String {
        self.blueprint.columns[self.position].name.clone()
    }

    pub fn nullable(mut self) -> Self {
        self.definition().nullable = true;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.definition().default = Some(value.into());
        self
    }

    pub fn primary(mut self) -> Self {
        self.definition().primary = true;
        self
    }

    pub fn comment(mut self, text: &str) -> Self {
        self.definition().comment = Some(text.to_owned());
        self
    }

    pub fn unique(self) -> Self {
        let name = self.name();
        self.blueprint.push_index(IndexKind::Unique, &[&name]);
        self
    }

    pub fn index(self) -> Self {
        let name = self.name();
        self.blueprint.push_index(IndexKind::Index, &[&name]);
        self
    }
}

/// A `foreign_id` column, optionally constrained to a parent table.
pub struct ForeignIdBuilder<'a> {
    blueprint: &'a mut Blueprint,
    column: String,
}

impl<'a> ForeignIdBuilder<'a> {
    pub fn nullable(self) -> Self {
        if let Some(c) = self
            .blueprint
            .columns
            .iter_mut()
            .rev()
            .find(|c| c.name == self.column)
        {
            c.nullable = true;
        }
        self
    }

    pub fn constrained(self, table: &str) -> ForeignKeyBuilder<'a> {
        let name = index_name(&self.blueprint.table, &[&self.column], "foreign");
        self.blueprint.commands.push(TableCommand::Foreign(ForeignKey {
            name,
            column: self.column,
            on_table: table.to_owned(),
            references: "id".to_owned(),
            on_delete: None,
        }));
        let position = self.blueprint.commands.len() - 1;
        ForeignKeyBuilder {
            blueprint: self.blueprint,
            position,
        }
    }
}

pub struct ForeignKeyBuilder<'a> {
    blueprint: &'a mut Blueprint,
    position: usize,
}

impl ForeignKeyBuilder<'_> {
    pub fn on_delete(self, action: ReferentialAction) -> Self {
        if let Some(TableCommand::Foreign(fk)) = self.blueprint.commands.get_mut(self.position) {
            fk.on_delete = Some(action);
        }
        self
    }

    pub fn cascade_on_delete(self) -> Self {
        self.on_delete(ReferentialAction::Cascade)
    }

    pub fn null_on_delete(self) -> Self {
        self.on_delete(ReferentialAction::SetNull)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifiers_and_indexes_follow_naming_convention() {
        let mut t = Blueprint::new("providers");
        t.id();
        t.string("email", 255).unique();
        t.enum_("status", &["pending", "active"]).default("pending");
        t.string("provider_type", 50);
        t.index(&["status", "provider_type"]);
        t.foreign_id("user_id").nullable().constrained("users").null_on_delete();

        let email = &t.columns()[1];
        assert!(!email.nullable);
        assert_eq!(t.columns()[2].default, Some(Value::from("pending")));
        assert!(t.columns()[4].nullable);

        let names: Vec<String> = t
            .commands()
            .iter()
            .filter_map(|c| match c {
                TableCommand::Index(i) => Some(i.name.clone()),
                TableCommand::Foreign(f) => Some(f.name.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            names,
            [
                "providers_email_unique",
                "providers_status_provider_type_index",
                "providers_user_id_foreign"
            ]
        );
    }

    #[test]
    fn morphs_add_type_id_and_index() {
        let mut t = Blueprint::new("notifications");
        t.morphs("notifiable");
        assert_eq!(t.columns()[0].name, "notifiable_type");
        assert_eq!(t.columns()[1].kind, ColumnType::UnsignedBigInteger);
        assert!(matches!(
            &t.commands()[0],
            TableCommand::Index(i) if i.name == "notifications_notifiable_type_notifiable_id_index"
        ));
    }
}

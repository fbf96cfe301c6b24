//! In-memory model of the database schema.
//!
//! Applying commands here catches the mistakes a real database would reject
//! (duplicate tables, unknown columns, dangling foreign keys) without needing
//! one, and lets tests inspect the resulting tables.

use std::collections::BTreeMap;

use crate::blueprint::{Blueprint, ColumnDefinition, ForeignKey, IndexDefinition, IndexKind, TableCommand};
use crate::{SchemaCommand, SchemaError};

#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    pub indexes: Vec<IndexDefinition>,
    pub foreign_keys: Vec<ForeignKey>,
    pub checks: Vec<(String, String)>,
}

impl TableSchema {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            checks: Vec::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn index(&self, name: &str) -> Option<&IndexDefinition> {
        self.indexes.iter().find(|i| i.name == name)
    }

    /// Whether an index of `kind` covers exactly `columns`, in order.
    pub fn has_index_on(&self, kind: IndexKind, columns: &[&str]) -> bool {
        self.indexes
            .iter()
            .any(|i| i.kind == kind && i.columns.iter().map(String::as_str).eq(columns.iter().copied()))
    }

    pub fn foreign_key(&self, column: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|f| f.column == column)
    }

    fn has_constraint(&self, name: &str) -> bool {
        self.indexes.iter().any(|i| i.name == name)
            || self.foreign_keys.iter().any(|f| f.name == name)
            || self.checks.iter().any(|(n, _)| n == name)
    }

    fn require_column(&self, column: &str) -> Result<(), SchemaError> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(SchemaError::UnknownColumn {
                table: self.name.clone(),
                column: column.to_owned(),
            })
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaCatalog {
    tables: BTreeMap<String, TableSchema>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Applies one command. On error the catalog is left unchanged.
    pub fn apply(&mut self, command: &SchemaCommand) -> Result<(), SchemaError> {
        match command {
            SchemaCommand::Create(blueprint) => {
                if self.has_table(blueprint.table()) {
                    return Err(SchemaError::TableExists(blueprint.table().to_owned()));
                }
                let mut table = TableSchema::new(blueprint.table());
                self.apply_blueprint(&mut table, blueprint)?;
                self.tables.insert(table.name.clone(), table);
            }
            SchemaCommand::Alter(blueprint) => {
                let mut table = self
                    .table(blueprint.table())
                    .cloned()
                    .ok_or_else(|| SchemaError::UnknownTable(blueprint.table().to_owned()))?;
                self.apply_blueprint(&mut table, blueprint)?;
                self.tables.insert(table.name.clone(), table);
            }
            SchemaCommand::Drop { table, if_exists } => {
                if self.tables.remove(table).is_none() && !if_exists {
                    return Err(SchemaError::UnknownTable(table.clone()));
                }
            }
            SchemaCommand::Rename { from, to } => {
                if self.has_table(to) {
                    return Err(SchemaError::TableExists(to.clone()));
                }
                let mut table = self
                    .tables
                    .remove(from)
                    .ok_or_else(|| SchemaError::UnknownTable(from.clone()))?;
                table.name = to.clone();
                self.tables.insert(to.clone(), table);
            }
        }
        Ok(())
    }

    pub fn apply_all<'a>(
        &mut self,
        commands: impl IntoIterator<Item = &'a SchemaCommand>,
    ) -> Result<(), SchemaError> {
        for command in commands {
            self.apply(command)?;
        }
        Ok(())
    }

    fn apply_blueprint(&self, table: &mut TableSchema, blueprint: &Blueprint) -> Result<(), SchemaError> {
        for column in blueprint.columns() {
            if table.has_column(&column.name) {
                return Err(SchemaError::DuplicateColumn {
                    table: table.name.clone(),
                    column: column.name.clone(),
                });
            }
            table.columns.push(column.clone());
        }

        for command in blueprint.commands() {
            match command {
                TableCommand::Index(index) => {
                    index.columns.iter().try_for_each(|c| table.require_column(c))?;
                    if table.has_constraint(&index.name) {
                        return Err(SchemaError::DuplicateIndex {
                            table: table.name.clone(),
                            index: index.name.clone(),
                        });
                    }
                    table.indexes.push(index.clone());
                }
                TableCommand::Foreign(fk) => {
                    table.require_column(&fk.column)?;
                    // Self-references resolve against the table being built.
                    let parent = if fk.on_table == table.name {
                        Some(&*table)
                    } else {
                        self.table(&fk.on_table)
                    };
                    match parent {
                        Some(p) if p.has_column(&fk.references) => {}
                        Some(_) => {
                            return Err(SchemaError::UnknownColumn {
                                table: fk.on_table.clone(),
                                column: fk.references.clone(),
                            });
                        }
                        None => {
                            return Err(SchemaError::UnknownReference {
                                table: table.name.clone(),
                                references: fk.on_table.clone(),
                            });
                        }
                    }
                    table.foreign_keys.push(fk.clone());
                }
                TableCommand::Check { name, expression } => {
                    table.checks.push((name.clone(), expression.clone()));
                }
                TableCommand::DropColumn(columns) => {
                    for column in columns {
                        table.require_column(column)?;
                        table.columns.retain(|c| &c.name != column);
                        table.indexes.retain(|i| !i.columns.contains(column));
                    }
                }
                TableCommand::RenameColumn { from, to } => {
                    table.require_column(from)?;
                    if table.has_column(to) {
                        return Err(SchemaError::DuplicateColumn {
                            table: table.name.clone(),
                            column: to.clone(),
                        });
                    }
                    for c in table.columns.iter_mut().filter(|c| &c.name == from) {
                        c.name = to.clone();
                    }
                    for i in &mut table.indexes {
                        for c in i.columns.iter_mut().filter(|c| *c == from) {
                            *c = to.clone();
                        }
                    }
                }
                TableCommand::DropIndex(name) => {
                    let before = table.indexes.len();
                    table.indexes.retain(|i| &i.name != name);
                    if table.indexes.len() == before {
                        return Err(SchemaError::UnknownIndex {
                            table: table.name.clone(),
                            index: name.clone(),
                        });
                    }
                }
                TableCommand::DropForeign(name) => {
                    let before = table.foreign_keys.len();
                    table.foreign_keys.retain(|f| &f.name != name);
                    if table.foreign_keys.len() == before {
                        return Err(SchemaError::UnknownIndex {
                            table: table.name.clone(),
                            index: name.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Schema;

    fn users() -> SchemaCommand {
        Schema::create("users", |t| {
            t.id();
            t.string("email", 255).unique();
            t.timestamps();
        })
    }

    #[test]
    fn create_alter_and_drop_round_out_a_table() {
        let mut catalog = SchemaCatalog::new();
        catalog.apply(&users()).unwrap();
        assert_eq!(catalog.apply(&users()), Err(SchemaError::TableExists("users".into())));

        catalog
            .apply(&Schema::table("users", |t| {
                t.rename_column("email", "login");
                t.string("name", 100).nullable();
            }))
            .unwrap();
        let users = catalog.table("users").unwrap();
        assert!(users.has_column("login"));
        assert!(users.has_index_on(IndexKind::Unique, &["login"]));

        catalog.apply(&Schema::drop("users")).unwrap();
        assert!(catalog.is_empty());
        assert!(catalog.apply(&Schema::drop("users")).is_err());
        assert!(catalog.apply(&Schema::drop_if_exists("users")).is_ok());
    }

    #[test]
    fn foreign_keys_need_an_existing_parent() {
        let mut catalog = SchemaCatalog::new();
        let orders = Schema::create("orders", |t| {
            t.id();
            t.foreign_id("user_id").constrained("users");
        });
        assert_eq!(
            catalog.apply(&orders),
            Err(SchemaError::UnknownReference {
                table: "orders".into(),
                references: "users".into()
            })
        );
        assert!(!catalog.has_table("orders"));
        catalog.apply(&users()).unwrap();
        catalog.apply(&orders).unwrap();
    }

    #[test]
    fn failed_alter_leaves_the_table_untouched() {
        let mut catalog = SchemaCatalog::new();
        catalog.apply(&users()).unwrap();
        let before = catalog.clone();
        let bad = Schema::table("users", |t| {
            t.string("name", 100);
            t.index(&["missing"]);
        });
        assert!(matches!(catalog.apply(&bad), Err(SchemaError::UnknownColumn { .. })));
        assert_eq!(catalog, before);
    }

    #[test]
    fn self_references_resolve() {
        let mut catalog = SchemaCatalog::new();
        let categories = Schema::create("categories", |t| {
            t.id();
            t.foreign_id("parent_id").nullable().constrained("categories").null_on_delete();
        });
        catalog.apply(&categories).unwrap();
        assert!(catalog.table("categories").unwrap().foreign_key("parent_id").is_some());
    }
}

//! `tradeerp-schema`: table definitions and the migrations that build the
//! TradeERP database.
//!
//! Migrations describe changes with a [`Blueprint`]; [`PostgresGrammar`]
//! turns them into DDL and [`SchemaCatalog`] replays them in memory.

pub mod blueprint;
pub mod catalog;
pub mod grammar;
pub mod migration;
pub mod migrations;

use thiserror::Error;

pub use blueprint::{
    Blueprint, ColumnDefinition, ColumnType, ForeignKey, IndexDefinition, IndexKind, ReferentialAction,
    TableCommand,
};
pub use catalog::{SchemaCatalog, TableSchema};
pub use grammar::PostgresGrammar;
pub use migration::Migration;

/// One schema change.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaCommand {
    Create(Blueprint),
    Alter(Blueprint),
    Drop { table: String, if_exists: bool },
    Rename { from: String, to: String },
}

impl SchemaCommand {
    pub fn table(&self) -> &str {
        match self {
            SchemaCommand::Create(b) | SchemaCommand::Alter(b) => b.table(),
            SchemaCommand::Drop { table, .. } => table,
            SchemaCommand::Rename { from, .. } => from,
        }
    }
}

/// Entry points for building [`SchemaCommand`]s.
pub struct Schema;

impl Schema {
    pub fn create(table: &str, define: impl FnOnce(&mut Blueprint)) -> SchemaCommand {
        let mut blueprint = Blueprint::new(table);
        define(&mut blueprint);
        SchemaCommand::Create(blueprint)
    }

    pub fn table(table: &str, define: impl FnOnce(&mut Blueprint)) -> SchemaCommand {
        let mut blueprint = Blueprint::new(table);
        define(&mut blueprint);
        SchemaCommand::Alter(blueprint)
    }

    pub fn drop(table: &str) -> SchemaCommand {
        SchemaCommand::Drop {
            table: table.to_owned(),
            if_exists: false,
        }
    }

    pub fn drop_if_exists(table: &str) -> SchemaCommand {
        SchemaCommand::Drop {
            table: table.to_owned(),
            if_exists: true,
        }
    }

    pub fn rename(from: &str, to: &str) -> SchemaCommand {
        SchemaCommand::Rename {
            from: from.to_owned(),
            to: to.to_owned(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("table {0} already exists")]
    TableExists(String),

    #[error("table {0} does not exist")]
    UnknownTable(String),

    #[error("column {column} already exists on {table}")]
    DuplicateColumn { table: String, column: String },

    #[error("column {column} does not exist on {table}")]
    UnknownColumn { table: String, column: String },

    #[error("index {index} already exists on {table}")]
    DuplicateIndex { table: String, index: String },

    #[error("index {index} does not exist on {table}")]
    UnknownIndex { table: String, index: String },

    #[error("{table} references missing table {references}")]
    UnknownReference { table: String, references: String },
}

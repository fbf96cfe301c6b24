//! PostgreSQL DDL for schema commands.

use serde_json::Value;

use crate::blueprint::{
    Blueprint, ColumnDefinition, ColumnType, ForeignKey, IndexDefinition, IndexKind, TableCommand,
};
use crate::SchemaCommand;

/// Text search configuration used by fulltext indexes.
const TEXT_SEARCH_LANGUAGE: &str = "english";

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresGrammar;

fn wrap(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn column_list(columns: &[String]) -> String {
    columns.iter().map(|c| wrap(c)).collect::<Vec<_>>().join(", ")
}

impl PostgresGrammar {
    /// Statements for one command, in execution order.
    pub fn compile(&self, command: &SchemaCommand) -> Vec<String> {
        match command {
            SchemaCommand::Create(blueprint) => self.compile_create(blueprint),
            SchemaCommand::Alter(blueprint) => self.compile_alter(blueprint),
            SchemaCommand::Drop { table, if_exists } => {
                let guard = if *if_exists { "if exists " } else { "" };
                vec![format!("drop table {guard}{}", wrap(table))]
            }
            SchemaCommand::Rename { from, to } => {
                vec![format!("alter table {} rename to {}", wrap(from), wrap(to))]
            }
        }
    }

    pub fn compile_all<'a>(&self, commands: impl IntoIterator<Item = &'a SchemaCommand>) -> Vec<String> {
        commands.into_iter().flat_map(|c| self.compile(c)).collect()
    }

    fn compile_create(&self, blueprint: &Blueprint) -> Vec<String> {
        let table = blueprint.table();
        let mut parts: Vec<String> = blueprint
            .columns()
            .iter()
            .map(|c| self.column_sql(c))
            .collect();
        // Composite primary keys only; single-column keys are inline.
        let primary: Vec<String> = blueprint
            .commands()
            .iter()
            .filter_map(|c| match c {
                TableCommand::Index(i) if i.kind == IndexKind::Primary => Some(column_list(&i.columns)),
                _ => None,
            })
            .collect();
        parts.extend(primary.into_iter().map(|cols| format!("primary key ({cols})")));

        let mut statements = vec![format!("create table {} ({})", wrap(table), parts.join(", "))];
        statements.extend(self.comments(table, blueprint.columns()));
        statements.extend(
            blueprint
                .commands()
                .iter()
                .filter_map(|c| self.table_command(table, c)),
        );
        statements
    }

    fn compile_alter(&self, blueprint: &Blueprint) -> Vec<String> {
        let table = blueprint.table();
        let mut statements = Vec::new();
        if !blueprint.columns().is_empty() {
            let adds = blueprint
                .columns()
                .iter()
                .map(|c| format!("add column {}", self.column_sql(c)))
                .collect::<Vec<_>>()
                .join(", ");
            statements.push(format!("alter table {} {adds}", wrap(table)));
        }
        statements.extend(self.comments(table, blueprint.columns()));
        statements.extend(
            blueprint
                .commands()
                .iter()
                .filter_map(|c| self.table_command(table, c)),
        );
        statements
    }

    fn comments(&self, table: &str, columns: &[ColumnDefinition]) -> Vec<String> {
        columns
            .iter()
            .filter_map(|c| {
                c.comment.as_ref().map(|text| {
                    format!("comment on column {}.{} is {}", wrap(table), wrap(&c.name), quote(text))
                })
            })
            .collect()
    }

    fn table_command(&self, table: &str, command: &TableCommand) -> Option<String> {
        let sql = match command {
            TableCommand::Index(index) => return self.index_sql(table, index),
            TableCommand::Foreign(fk) => self.foreign_sql(table, fk),
            TableCommand::Check { name, expression } => format!(
                "alter table {} add constraint {} check ({expression})",
                wrap(table),
                wrap(name)
            ),
            TableCommand::DropColumn(columns) => {
                let drops = columns
                    .iter()
                    .map(|c| format!("drop column {}", wrap(c)))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("alter table {} {drops}", wrap(table))
            }
            TableCommand::RenameColumn { from, to } => format!(
                "alter table {} rename column {} to {}",
                wrap(table),
                wrap(from),
                wrap(to)
            ),
            TableCommand::DropIndex(name) if name.ends_with("_unique") => {
                format!("alter table {} drop constraint {}", wrap(table), wrap(name))
            }
            TableCommand::DropIndex(name) => format!("drop index {}", wrap(name)),
            TableCommand::DropForeign(name) => {
                format!("alter table {} drop constraint {}", wrap(table), wrap(name))
            }
        };
        Some(sql)
    }

    fn index_sql(&self, table: &str, index: &IndexDefinition) -> Option<String> {
        let columns = column_list(&index.columns);
        match index.kind {
            IndexKind::Primary => None,
            IndexKind::Unique => Some(format!(
                "alter table {} add constraint {} unique ({columns})",
                wrap(table),
                wrap(&index.name)
            )),
            IndexKind::Index => Some(format!(
                "create index {} on {} ({columns})",
                wrap(&index.name),
                wrap(table)
            )),
            IndexKind::Fulltext => {
                let vectors = index
                    .columns
                    .iter()
                    .map(|c| format!("to_tsvector({}, {})", quote(TEXT_SEARCH_LANGUAGE), wrap(c)))
                    .collect::<Vec<_>>()
                    .join(" || ");
                Some(format!(
                    "create index {} on {} using gin (({vectors}))",
                    wrap(&index.name),
                    wrap(table)
                ))
            }
        }
    }

    fn foreign_sql(&self, table: &str, fk: &ForeignKey) -> String {
        let mut sql = format!(
            "alter table {} add constraint {} foreign key ({}) references {} ({})",
            wrap(table),
            wrap(&fk.name),
            wrap(&fk.column),
            wrap(&fk.on_table),
            wrap(&fk.references)
        );
        if let Some(action) = fk.on_delete {
            sql.push_str(" on delete ");
            sql.push_str(action.as_sql());
        }
        sql
    }

    fn column_sql(&self, column: &ColumnDefinition) -> String {
        let mut sql = format!("{} {}", wrap(&column.name), self.type_sql(column));
        if column.kind == ColumnType::Id {
            sql.push_str(" not null primary key");
            return sql;
        }
        sql.push_str(if column.nullable { " null" } else { " not null" });
        if let Some(default) = &column.default {
            sql.push_str(" default ");
            sql.push_str(&default_sql(default));
        }
        if column.primary {
            sql.push_str(" primary key");
        }
        sql
    }

    fn type_sql(&self, column: &ColumnDefinition) -> String {
        match &column.kind {
            ColumnType::Id => "bigserial".into(),
            ColumnType::BigInteger | ColumnType::UnsignedBigInteger => "bigint".into(),
            ColumnType::Integer | ColumnType::UnsignedInteger => "integer".into(),
            ColumnType::String(len) => format!("varchar({len})"),
            ColumnType::Text => "text".into(),
            ColumnType::Decimal(p, s) => format!("decimal({p}, {s})"),
            ColumnType::Boolean => "boolean".into(),
            ColumnType::Date => "date".into(),
            ColumnType::Timestamp => "timestamp(0) without time zone".into(),
            ColumnType::Json => "json".into(),
            ColumnType::Uuid => "uuid".into(),
            ColumnType::Enum(values) => {
                let allowed = values.iter().map(|v| quote(v)).collect::<Vec<_>>().join(", ");
                format!("varchar(255) check ({} in ({allowed}))", wrap(&column.name))
            }
        }
    }
}

fn default_sql(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        other => quote(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Schema;

    #[test]
    fn create_emits_table_then_constraints() {
        let command = Schema::create("providers", |t| {
            t.id();
            t.string("email", 255).unique();
            t.enum_("status", &["pending", "active"]).default("pending");
            t.boolean("is_verified").default(false);
            t.index(&["status"]);
        });
        let sql = PostgresGrammar.compile(&command);
        assert_eq!(
            sql[0],
            "create table \"providers\" (\"id\" bigserial not null primary key, \
             \"email\" varchar(255) not null, \
             \"status\" varchar(255) check (\"status\" in ('pending', 'active')) not null default 'pending', \
             \"is_verified\" boolean not null default false)"
        );
        assert_eq!(
            sql[1],
            "alter table \"providers\" add constraint \"providers_email_unique\" unique (\"email\")"
        );
        assert_eq!(sql[2], "create index \"providers_status_index\" on \"providers\" (\"status\")");
    }

    #[test]
    fn fulltext_uses_gin_over_tsvector() {
        let command = Schema::table("products", |t| t.fulltext(&["name", "description"]));
        assert_eq!(
            PostgresGrammar.compile(&command),
            ["create index \"products_name_description_fulltext\" on \"products\" using gin \
              ((to_tsvector('english', \"name\") || to_tsvector('english', \"description\")))"]
        );
    }

    #[test]
    fn alter_adds_columns_and_drops() {
        let add = Schema::table("customers", |t| {
            t.integer("loyalty_points").default(0);
            t.decimal("lifetime_value", 12, 2).default(0);
        });
        assert_eq!(
            PostgresGrammar.compile(&add),
            ["alter table \"customers\" add column \"loyalty_points\" integer not null default 0, \
              add column \"lifetime_value\" decimal(12, 2) not null default 0"]
        );
        let drop = Schema::table("customers", |t| {
            t.drop_index("customers_email_unique");
            t.drop_column(&["loyalty_points", "lifetime_value"]);
        });
        assert_eq!(
            PostgresGrammar.compile(&drop),
            [
                "alter table \"customers\" drop constraint \"customers_email_unique\"",
                "alter table \"customers\" drop column \"loyalty_points\", drop column \"lifetime_value\"",
            ]
        );
        assert_eq!(
            PostgresGrammar.compile(&Schema::drop_if_exists("customers")),
            ["drop table if exists \"customers\""]
        );
    }

    #[test]
    fn foreign_keys_carry_delete_action_and_quotes_escape() {
        let command = Schema::create("provider_locations", |t| {
            t.foreign_id("provider_id").constrained("providers").cascade_on_delete();
            t.string("name", 100).comment("Shown on the provider's map");
        });
        let sql = PostgresGrammar.compile(&command);
        assert_eq!(
            sql[1],
            "comment on column \"provider_locations\".\"name\" is 'Shown on the provider''s map'"
        );
        assert_eq!(
            sql[2],
            "alter table \"provider_locations\" add constraint \"provider_locations_provider_id_foreign\" \
             foreign key (\"provider_id\") references \"providers\" (\"id\") on delete cascade"
        );
    }

    proptest::proptest! {
        #[test]
        fn quoted_literals_never_close_early(text in ".{0,40}") {
            let quoted = quote(&text);
            let inner = &quoted[1..quoted.len() - 1];
            proptest::prop_assert!(quoted.starts_with('\'') && quoted.ends_with('\''));
            proptest::prop_assert_eq!(inner.replace("''", ""), text.replace('\'', ""));
        }
    }
}

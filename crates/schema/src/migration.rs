use crate::SchemaCommand;

/// A reversible schema change.
///
/// `name` is the stable key recorded once the migration has run; names sort
/// in the order migrations must be applied.
pub trait Migration: Send + Sync {
    fn name(&self) -> &'static str;

    fn up(&self) -> Vec<SchemaCommand>;

    fn down(&self) -> Vec<SchemaCommand>;
}

/// Declares a migration that creates one table and drops it on the way down.
#[macro_export]
macro_rules! create_table_migration {
    ($(#[$meta:meta])* $ty:ident, $name:literal, $table:literal, |$t:ident| $body:block) => {
        $(#[$meta])*
        pub struct $ty;

        impl $crate::Migration for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            fn up(&self) -> Vec<$crate::SchemaCommand> {
                vec![$crate::Schema::create($table, |$t: &mut $crate::Blueprint| $body)]
            }

            fn down(&self) -> Vec<$crate::SchemaCommand> {
                vec![$crate::Schema::drop_if_exists($table)]
            }
        }
    };
}

// スナップショットビルダー
//
// DDLイベント列を順に適用して Migration（スキーマスナップショット）を構築します。
// 同一バッチ内の追加→削除は取り消し、リネームは観測したものだけを記録します。

use crate::adapters::sql_parser::SqlStatementParser;
use crate::core::config::MigrationOptions;
use crate::core::error::MigrationError;
use crate::core::event::{AlterTableOp, DdlEvent, TableConstraintDefinition};
use crate::core::schema::{Action, Index, Migration, Table};
use tracing::{debug, trace};

/// スナップショットビルダー
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    migration: Migration,
}

impl SnapshotBuilder {
    /// 新しいSnapshotBuilderを作成
    pub fn new(options: MigrationOptions) -> Self {
        Self {
            migration: Migration::new(options),
        }
    }

    /// DDLスクリプトからスナップショットを構築
    pub fn build(sql: &str, options: MigrationOptions) -> Result<Migration, MigrationError> {
        let mut builder = Self::new(options);
        builder.parse(sql)?;
        Ok(builder.finish())
    }

    /// DDLスクリプトを解析してイベントを適用
    ///
    /// スクリプト全体を解析してから適用するため、構文エラーの場合は何も適用しません。
    pub fn parse(&mut self, sql: &str) -> Result<(), MigrationError> {
        let events = SqlStatementParser::new(self.migration.options().dialect).parse(sql)?;
        debug!(events = events.len(), "parsed DDL script");
        self.apply_all(events);
        Ok(())
    }

    /// 構築中のスナップショットを参照
    pub fn migration(&self) -> &Migration {
        &self.migration
    }

    /// 構築を完了してスナップショットを取得
    pub fn finish(self) -> Migration {
        self.migration
    }

    /// 複数のイベントを順に適用
    pub fn apply_all(&mut self, events: impl IntoIterator<Item = DdlEvent>) {
        for event in events {
            self.apply(event);
        }
    }

    /// イベントを1件適用
    pub fn apply(&mut self, event: DdlEvent) {
        trace!(kind = event.kind(), "applying DDL event");

        match event {
            DdlEvent::TableNameReference { table } => self.migration.using(&table),
            DdlEvent::CreateTable {
                table,
                columns,
                constraints,
            } => {
                self.migration.using(&table);
                let mut created = Table::new(table);
                for column in columns {
                    created.add_column(column.into_column(Action::Add));
                }
                for constraint in constraints {
                    apply_constraint(&mut created, constraint);
                }
                self.migration.add_table(created);
            }
            DdlEvent::DropTable { table } => self.migration.remove_table(&table),
            DdlEvent::AlterTable { table, operation } => {
                self.migration.using(&table);
                self.apply_alter_table(&table, operation);
            }
            DdlEvent::CreateIndex {
                table,
                name,
                kind,
                columns,
            } => {
                if let Some(table) = self.resolve_table(table) {
                    self.migration
                        .table_entry(&table)
                        .add_index(Index::new(name, kind, columns));
                }
            }
            DdlEvent::DropIndex { table, name } => {
                if let Some(table) = self.resolve_index_table(table, &name) {
                    self.migration.table_entry(&table).remove_index(&name);
                }
            }
            DdlEvent::RenameIndex {
                table,
                old_name,
                new_name,
            } => {
                if let Some(table) = self.resolve_index_table(table, &old_name) {
                    self.migration
                        .table_entry(&table)
                        .rename_index(&old_name, &new_name);
                }
            }
            DdlEvent::ColumnDefinition { table, column } => {
                if let Some(table) = self.resolve_table(table) {
                    self.migration
                        .table_entry(&table)
                        .add_column(column.into_column(Action::Add));
                }
            }
        }
    }

    fn apply_alter_table(&mut self, table: &str, operation: AlterTableOp) {
        if let AlterTableOp::RenameTable { new_name } = &operation {
            self.migration.rename_table(table, new_name);
            return;
        }

        let entry = self.migration.table_entry(table);
        match operation {
            AlterTableOp::AddColumn { column, position } => {
                entry.insert_column(column.into_column(Action::Add), position)
            }
            AlterTableOp::DropColumn { name } => entry.remove_column(&name),
            AlterTableOp::ModifyColumn { column } => {
                entry.modify_column(column.into_column(Action::Modify))
            }
            AlterTableOp::AlterColumnType { name, column_type } => {
                entry.change_column_type(&name, column_type)
            }
            AlterTableOp::RenameColumn { old_name, new_name } => {
                entry.rename_column(&old_name, &new_name)
            }
            AlterTableOp::RenameTable { .. } => {}
        }
    }

    /// 対象テーブルを解決（指定がなければ現在のテーブル）
    fn resolve_table(&self, table: Option<String>) -> Option<String> {
        let resolved = self.migration.resolve_table_name(table.as_deref());
        if resolved.is_none() {
            debug!("no table in scope for unqualified event, skipping");
        }
        resolved
    }

    /// インデックスの所属テーブルを解決
    ///
    /// テーブル指定がなければ、同名のインデックスを持つテーブル、
    /// 次に現在のテーブルの順に探します。
    fn resolve_index_table(&self, table: Option<String>, index_name: &str) -> Option<String> {
        if let Some(table) = table.filter(|t| !t.is_empty()) {
            return Some(table);
        }

        self.migration
            .tables
            .values()
            .find(|t| t.indexes.contains_key(index_name))
            .map(|t| t.node.name.clone())
            .or_else(|| self.resolve_table(None))
    }
}

/// CREATE TABLE 内の制約をテーブルに取り込む
fn apply_constraint(table: &mut Table, constraint: TableConstraintDefinition) {
    match constraint {
        TableConstraintDefinition::PrimaryKey { columns } => table.set_primary_key(columns),
        TableConstraintDefinition::Index {
            name,
            kind,
            columns,
        } => {
            let Some(name) = name.or_else(|| columns.first().cloned()) else {
                debug!(table = %table.node.name, "skipping index constraint without columns");
                return;
            };
            table.add_index(Index::new(name, kind, columns));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::ColumnDefinition;
    use crate::core::schema::{ColumnOption, ColumnPosition, ColumnType, IndexKind};

    fn column(name: &str, native: &str) -> ColumnDefinition {
        ColumnDefinition::new(name, Some(ColumnType::new(native)), Vec::new())
    }

    fn create_users() -> DdlEvent {
        DdlEvent::CreateTable {
            table: "users".to_string(),
            columns: vec![column("id", "INT"), column("name", "VARCHAR(50)")],
            constraints: vec![TableConstraintDefinition::PrimaryKey {
                columns: vec!["id".to_string()],
            }],
        }
    }

    #[test]
    fn test_create_table_with_primary_key() {
        let mut builder = SnapshotBuilder::new(MigrationOptions::default());
        builder.apply(create_users());

        let migration = builder.finish();
        let table = migration.get_table("users").unwrap();
        assert_eq!(table.node.action, Action::Add);
        assert_eq!(table.column_names(), vec!["id", "name"]);
        assert!(table.get_column("id").unwrap().is_primary_key());
        assert_eq!(migration.current_table(), Some("users"));
    }

    #[test]
    fn test_unnamed_unique_constraint_uses_first_column() {
        let mut builder = SnapshotBuilder::new(MigrationOptions::default());
        builder.apply(DdlEvent::CreateTable {
            table: "users".to_string(),
            columns: vec![column("email", "VARCHAR(255)")],
            constraints: vec![TableConstraintDefinition::Index {
                name: None,
                kind: IndexKind::Unique,
                columns: vec!["email".to_string()],
            }],
        });

        let migration = builder.finish();
        let index = migration.get_table("users").unwrap().get_index("email").unwrap();
        assert_eq!(index.kind, IndexKind::Unique);
    }

    #[test]
    fn test_create_then_drop_cancels() {
        let mut builder = SnapshotBuilder::new(MigrationOptions::default());
        builder.apply(create_users());
        builder.apply(DdlEvent::DropTable {
            table: "users".to_string(),
        });

        assert_eq!(builder.migration().table_count(), 0);
    }

    #[test]
    fn test_unqualified_column_definition_uses_current_table() {
        let mut builder = SnapshotBuilder::new(MigrationOptions::default());
        builder.apply(DdlEvent::TableNameReference {
            table: "users".to_string(),
        });
        builder.apply(DdlEvent::ColumnDefinition {
            table: None,
            column: ColumnDefinition::new(
                "age",
                Some(ColumnType::new("INT")),
                vec![ColumnOption::NotNull],
            ),
        });

        let migration = builder.finish();
        let table = migration.get_table("users").unwrap();
        assert_eq!(table.node.action, Action::NoAction);
        assert_eq!(table.get_column("age").unwrap().node.action, Action::Add);
    }

    #[test]
    fn test_unqualified_event_without_scope_is_skipped() {
        let mut builder = SnapshotBuilder::new(MigrationOptions::default());
        builder.apply(DdlEvent::CreateIndex {
            table: None,
            name: "idx".to_string(),
            kind: IndexKind::Plain,
            columns: vec!["a".to_string()],
        });

        assert_eq!(builder.migration().table_count(), 0);
    }

    #[test]
    fn test_alter_table_add_column_after() {
        let mut builder = SnapshotBuilder::new(MigrationOptions::default());
        builder.apply(create_users());
        builder.apply(DdlEvent::AlterTable {
            table: "users".to_string(),
            operation: AlterTableOp::AddColumn {
                column: column("email", "TEXT"),
                position: ColumnPosition::After("id".to_string()),
            },
        });

        let migration = builder.finish();
        assert_eq!(
            migration.get_table("users").unwrap().column_names(),
            vec!["id", "email", "name"]
        );
    }

    #[test]
    fn test_rename_table_updates_scope() {
        let mut builder = SnapshotBuilder::new(MigrationOptions::default());
        builder.apply(DdlEvent::AlterTable {
            table: "users".to_string(),
            operation: AlterTableOp::RenameTable {
                new_name: "members".to_string(),
            },
        });
        builder.apply(DdlEvent::CreateIndex {
            table: None,
            name: "idx_name".to_string(),
            kind: IndexKind::Plain,
            columns: vec!["name".to_string()],
        });

        let migration = builder.finish();
        let table = migration.get_table("members").unwrap();
        assert_eq!(table.node.old_name(), Some("users"));
        assert!(table.get_index("idx_name").is_some());
    }

    #[test]
    fn test_drop_index_finds_owning_table() {
        let mut builder = SnapshotBuilder::new(MigrationOptions::default());
        builder.apply(DdlEvent::CreateIndex {
            table: Some("users".to_string()),
            name: "idx_name".to_string(),
            kind: IndexKind::Plain,
            columns: vec!["name".to_string()],
        });
        builder.apply(DdlEvent::TableNameReference {
            table: "posts".to_string(),
        });
        builder.apply(DdlEvent::DropIndex {
            table: None,
            name: "idx_name".to_string(),
        });

        let migration = builder.finish();
        assert!(migration
            .get_table("users")
            .unwrap()
            .get_index("idx_name")
            .is_none());
        assert!(migration.get_table("posts").is_none());
    }

    #[test]
    fn test_parse_error_applies_nothing() {
        let mut builder = SnapshotBuilder::new(MigrationOptions::default());
        let result = builder.parse("CREATE TABLE users (id INT); CREATE TABLE broken (id INT;");

        assert!(result.is_err());
        assert_eq!(builder.migration().table_count(), 0);
    }

    #[test]
    fn test_build_from_sql() {
        let migration = SnapshotBuilder::build(
            "CREATE TABLE users (id INT PRIMARY KEY, name VARCHAR(50));
             CREATE INDEX idx_name ON users(name);",
            MigrationOptions::default(),
        )
        .unwrap();

        let table = migration.get_table("users").unwrap();
        assert_eq!(table.column_names(), vec!["id", "name"]);
        assert_eq!(
            table.get_index("idx_name").unwrap().columns,
            vec!["name".to_string()]
        );
    }

    #[test]
    fn test_build_propagates_parse_error() {
        let result = SnapshotBuilder::build("CREATE TABLE (", MigrationOptions::default());
        assert!(result.is_err());
    }
}

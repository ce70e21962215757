// スキーマ差分
//
// 新しいスナップショットを古いスナップショットと照合し、
// 各テーブル、カラム、インデックスにアクションを付与します。
// リネームは推測せず、スナップショットビルダーが観測したものだけを保持します。

use serde::Serialize;
use std::collections::HashMap;

use crate::adapters::sql_generator::{generator_for, SqlGenerator};
use crate::core::schema::{Action, Entity, Migration, Table};
use indexmap::IndexMap;

impl Migration {
    /// 古いスナップショットとの差分をこのマイグレーションに反映する
    ///
    /// - 両方に存在するテーブル: 内容を比較し、テーブル自体はNoAction
    /// - 新しい側のみのテーブル: ビルダーが付与したアクションを維持
    /// - 古い側のみのテーブル: Removeとして末尾に追加
    pub fn diff(&mut self, old: &Migration) {
        let generator = generator_for(self.options());

        for table in self.tables.values_mut() {
            if let Some(old_table) = old.tables.get(table.name()) {
                table.diff(old_table, generator.as_ref());
                table.node.action = Action::NoAction;
            } else if let Some(old_table) = table
                .node
                .old_name()
                .and_then(|old_name| old.tables.get(old_name))
            {
                table.diff(old_table, generator.as_ref());
            }
        }

        let renamed_from = rename_sources(&self.tables);
        let removed: Vec<Table> = old
            .tables
            .values()
            .filter(|old_table| {
                !self.tables.contains_key(old_table.name())
                    && !renamed_from.contains_key(old_table.name())
            })
            .map(|old_table| {
                let mut table = old_table.clone();
                table.node.action = Action::Remove;
                table
            })
            .collect();

        for table in removed {
            self.tables.insert(table.node.name.clone(), table);
        }
    }

    /// 変更の一覧を取得（NoActionは除く）
    pub fn changes(&self) -> Vec<EntityChange> {
        let mut changes = Vec::new();

        for table in self.tables.values() {
            if table.node.action != Action::NoAction {
                changes.push(EntityChange::new(EntityKind::Table, table, None));
            }
            if table.node.action == Action::Remove {
                continue;
            }
            for column in table.columns.values() {
                if column.node.action != Action::NoAction {
                    changes.push(EntityChange::new(EntityKind::Column, column, Some(table)));
                }
            }
            for index in table.indexes.values() {
                if index.node.action != Action::NoAction {
                    changes.push(EntityChange::new(EntityKind::Index, index, Some(table)));
                }
            }
        }

        changes
    }

    /// 変更が存在するか
    pub fn has_changes(&self) -> bool {
        !self.changes().is_empty()
    }
}

impl Table {
    /// 古いテーブルとの差分をカラムとインデックスに反映する
    ///
    /// カラムはフィンガープリント、インデックスは種類と対象カラム列で比較します。
    /// テーブル自体のアクションは変更しません。
    pub fn diff(&mut self, old: &Table, generator: &dyn SqlGenerator) {
        for column in self.columns.values_mut() {
            if let Some(old_column) = old.columns.get(column.name()) {
                column.node.action =
                    if column.fingerprint(generator) != old_column.fingerprint(generator) {
                        Action::Modify
                    } else {
                        Action::NoAction
                    };
            }
        }

        for index in self.indexes.values_mut() {
            if let Some(old_index) = old.indexes.get(index.name()) {
                index.node.action = if index.same_structure(old_index) {
                    Action::NoAction
                } else {
                    Action::Modify
                };
            }
        }

        self.insert_removed_columns(old);

        let renamed_from = rename_sources(&self.indexes);
        let removed_indexes: Vec<_> = old
            .indexes
            .values()
            .filter(|index| {
                !self.indexes.contains_key(index.name()) && !renamed_from.contains_key(index.name())
            })
            .cloned()
            .collect();
        for mut index in removed_indexes {
            index.node.action = Action::Remove;
            self.indexes.insert(index.node.name.clone(), index);
        }
    }

    /// 古い側のみのカラムをRemoveとして、旧スナップショット上の直前カラムの後ろに挿入する
    ///
    /// 直前カラムがなければ先頭に挿入します。
    fn insert_removed_columns(&mut self, old: &Table) {
        let renamed_from = rename_sources(&self.columns);
        let mut anchor: Option<String> = None;

        for old_column in old.columns.values() {
            let name = old_column.name();
            if self.columns.contains_key(name) {
                anchor = Some(name.to_string());
                continue;
            }
            if let Some(current) = renamed_from.get(name) {
                anchor = Some(current.clone());
                continue;
            }

            let mut column = old_column.clone();
            column.node.action = Action::Remove;
            let index = anchor
                .as_deref()
                .and_then(|a| self.columns.get_index_of(a))
                .map_or(0, |i| i + 1);
            self.columns.shift_insert(index, name.to_string(), column);
            anchor = Some(name.to_string());
        }
    }
}

/// リネーム元の名前から現在の名前への対応
fn rename_sources<V: Entity>(map: &IndexMap<String, V>) -> HashMap<String, String> {
    map.iter()
        .filter_map(|(key, entity)| {
            entity
                .node()
                .old_name()
                .map(|old_name| (old_name.to_string(), key.clone()))
        })
        .collect()
}

/// エンティティの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Table,
    Column,
    Index,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Table => write!(f, "table"),
            EntityKind::Column => write!(f, "column"),
            EntityKind::Index => write!(f, "index"),
        }
    }
}

/// 1エンティティの変更
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityChange {
    pub kind: EntityKind,
    /// 所属テーブル（テーブル自体の変更ではNone）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub name: String,
    pub action: Action,
}

impl EntityChange {
    fn new(kind: EntityKind, entity: &impl Entity, table: Option<&Table>) -> Self {
        Self {
            kind,
            table: table.map(|t| t.node.name.clone()),
            name: entity.name().to_string(),
            action: entity.action().clone(),
        }
    }

    /// 人間向けの1行表現
    pub fn describe(&self) -> String {
        let target = match &self.table {
            Some(table) => format!("{}.{}", table, self.name),
            None => self.name.clone(),
        };
        match &self.action {
            Action::Rename { old_name } => {
                format!("{} {}: {} -> {}", self.action.label(), self.kind, old_name, target)
            }
            action => format!("{} {}: {}", action.label(), self.kind, target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::MigrationOptions;
    use crate::core::schema::{Column, ColumnType, Index, IndexKind};

    fn column(name: &str, native: &str) -> Column {
        Column::new(name, Some(ColumnType::new(native)), Vec::new())
    }

    fn users(columns: &[(&str, &str)]) -> Migration {
        let mut migration = Migration::new(MigrationOptions::default());
        let mut table = Table::new("users");
        for (name, native) in columns {
            table.add_column(column(name, native));
        }
        migration.add_table(table);
        migration
    }

    #[test]
    fn test_diff_identical_is_no_action() {
        let old = users(&[("id", "INT"), ("name", "VARCHAR(50)")]);
        let mut new = old.clone();
        new.diff(&old);

        let table = new.get_table("users").unwrap();
        assert_eq!(table.node.action, Action::NoAction);
        assert!(table
            .columns
            .values()
            .all(|c| c.node.action == Action::NoAction));
        assert!(!new.has_changes());
    }

    #[test]
    fn test_diff_detects_modify_add_remove() {
        let old = users(&[("id", "INT"), ("name", "VARCHAR(50)"), ("legacy", "TEXT")]);
        let mut new = users(&[("id", "INT"), ("name", "VARCHAR(100)"), ("age", "INT")]);
        new.diff(&old);

        let table = new.get_table("users").unwrap();
        assert_eq!(table.column_names(), vec!["id", "name", "legacy", "age"]);
        assert_eq!(table.get_column("id").unwrap().node.action, Action::NoAction);
        assert_eq!(table.get_column("name").unwrap().node.action, Action::Modify);
        assert_eq!(table.get_column("age").unwrap().node.action, Action::Add);
        assert_eq!(table.get_column("legacy").unwrap().node.action, Action::Remove);
    }

    #[test]
    fn test_diff_removed_table_is_appended() {
        let mut old = users(&[("id", "INT")]);
        old.add_table(Table::new("sessions"));
        let mut new = users(&[("id", "INT")]);
        new.add_table(Table::new("posts"));
        new.diff(&old);

        let names: Vec<&str> = new.tables.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["users", "posts", "sessions"]);
        assert_eq!(new.get_table("posts").unwrap().node.action, Action::Add);
        assert_eq!(new.get_table("sessions").unwrap().node.action, Action::Remove);
    }

    #[test]
    fn test_diff_index_structure() {
        let mut old = users(&[("id", "INT"), ("name", "TEXT")]);
        old.table_entry("users")
            .add_index(Index::new("idx_name", IndexKind::Plain, vec!["name".to_string()]));
        old.table_entry("users")
            .add_index(Index::new("idx_gone", IndexKind::Plain, vec!["id".to_string()]));

        let mut new = users(&[("id", "INT"), ("name", "TEXT")]);
        new.table_entry("users")
            .add_index(Index::new("idx_name", IndexKind::Unique, vec!["name".to_string()]));
        new.diff(&old);

        let table = new.get_table("users").unwrap();
        assert_eq!(table.get_index("idx_name").unwrap().node.action, Action::Modify);
        assert_eq!(table.get_index("idx_gone").unwrap().node.action, Action::Remove);
    }

    #[test]
    fn test_diff_keeps_observed_rename() {
        let old = users(&[("id", "INT"), ("mail", "TEXT")]);
        let mut new = users(&[("id", "INT"), ("mail", "TEXT")]);
        {
            let table = new.table_entry("users");
            for c in table.columns.values_mut() {
                c.node.action = Action::NoAction;
            }
            table.rename_column("mail", "email");
        }
        new.diff(&old);

        let table = new.get_table("users").unwrap();
        assert_eq!(table.column_names(), vec!["id", "email"]);
        assert_eq!(
            table.get_column("email").unwrap().node.old_name(),
            Some("mail")
        );
    }

    #[test]
    fn test_diff_removed_column_follows_old_predecessor() {
        let old = users(&[("id", "INT"), ("legacy", "INT"), ("name", "TEXT")]);
        let mut new = users(&[("id", "INT"), ("name", "TEXT")]);
        new.diff(&old);

        let table = new.get_table("users").unwrap();
        assert_eq!(table.column_names(), vec!["id", "legacy", "name"]);
        assert_eq!(table.get_column("legacy").unwrap().node.action, Action::Remove);
    }

    #[test]
    fn test_diff_removed_leading_columns_keep_order() {
        let old = users(&[("a", "INT"), ("b", "INT"), ("id", "INT")]);
        let mut new = users(&[("id", "INT"), ("x", "INT")]);
        new.diff(&old);

        let table = new.get_table("users").unwrap();
        assert_eq!(table.column_names(), vec!["a", "b", "id", "x"]);
    }

    #[test]
    fn test_diff_does_not_infer_rename() {
        let old = users(&[("mail", "TEXT")]);
        let mut new = users(&[("email", "TEXT")]);
        new.diff(&old);

        let table = new.get_table("users").unwrap();
        assert_eq!(table.get_column("email").unwrap().node.action, Action::Add);
        assert_eq!(table.get_column("mail").unwrap().node.action, Action::Remove);
    }

    #[test]
    fn test_changes_describe() {
        let old = users(&[("id", "INT")]);
        let mut new = users(&[("id", "INT"), ("age", "INT")]);
        new.diff(&old);

        let changes = new.changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, EntityKind::Column);
        assert_eq!(changes[0].describe(), "add column: users.age");
    }
}

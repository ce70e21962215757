// マイグレーション生成サービス
//
// アクション付きの Migration から UP / DOWN のSQLを組み立てます。
// DOWNは UP方向のアクションの逆操作のみから導出し、古いスナップショットは参照しません。

use crate::adapters::sql_generator::templates::StatementTemplate;
use crate::adapters::sql_generator::{generator_for, MigrationDirection, SqlGenerator};
use crate::core::config::MigrationOptions;
use crate::core::schema::{Action, Column, Entity, Index, IndexKind, Migration, Table};
use chrono::Utc;

/// マイグレーション生成サービス
pub struct MigrationGenerator {
    options: MigrationOptions,
    generator: Box<dyn SqlGenerator>,
}

impl MigrationGenerator {
    /// 新しいMigrationGeneratorを作成
    pub fn new(options: MigrationOptions) -> Self {
        Self {
            options,
            generator: generator_for(options),
        }
    }

    /// レンダリングオプションを取得
    pub fn options(&self) -> MigrationOptions {
        self.options
    }

    /// UP SQLを生成
    pub fn migration_up(&self, migration: &Migration) -> String {
        self.generate(migration, MigrationDirection::Up)
    }

    /// DOWN SQLを生成
    pub fn migration_down(&self, migration: &Migration) -> String {
        self.generate(migration, MigrationDirection::Down)
    }

    /// 指定方向のSQLを生成
    ///
    /// テーブルごとに文を改行で連結し、テーブル間は空行で区切ります。
    /// 文を持たないテーブルは出力しません。
    pub fn generate(&self, migration: &Migration, direction: MigrationDirection) -> String {
        migration
            .tables
            .values()
            .map(|table| self.table_statements(table, direction))
            .filter(|statements| !statements.is_empty())
            .map(|statements| statements.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// 1テーブル分の文を生成
    pub fn table_statements(&self, table: &Table, direction: MigrationDirection) -> Vec<String> {
        match direction {
            MigrationDirection::Up => self.table_up(table),
            MigrationDirection::Down => self.table_down(table),
        }
    }

    fn table_up(&self, table: &Table) -> Vec<String> {
        let name = self.escape(table.name());

        match table.action() {
            Action::Add => self.create_table(table),
            Action::Remove => vec![self.statement(StatementTemplate::DropTable, &[&name])],
            Action::Rename { old_name } => {
                let mut statements = vec![self.statement(
                    StatementTemplate::RenameTable,
                    &[&self.escape(old_name), &name],
                )];
                statements.extend(self.alter_table_up(table, &name));
                statements
            }
            Action::NoAction | Action::Modify => self.alter_table_up(table, &name),
        }
    }

    fn table_down(&self, table: &Table) -> Vec<String> {
        let name = self.escape(table.name());

        match table.action() {
            Action::Add => vec![self.statement(StatementTemplate::DropTable, &[&name])],
            // 削除されたテーブルの再作成は行わない
            Action::Remove => Vec::new(),
            Action::Rename { old_name } => {
                let mut statements = self.alter_table_down(table, &name);
                statements.push(self.statement(
                    StatementTemplate::RenameTable,
                    &[&name, &self.escape(old_name)],
                ));
                statements
            }
            Action::NoAction | Action::Modify => self.alter_table_down(table, &name),
        }
    }

    /// 既存テーブルへの変更（カラム → インデックスの順）
    fn alter_table_up(&self, table: &Table, table_name: &str) -> Vec<String> {
        let mut statements = Vec::new();

        // 追加カラムの直前に位置する、UP適用後も存在するカラム
        let mut previous: Option<&str> = None;
        for column in table.columns.values() {
            statements.extend(self.column_statements(table_name, column, previous));
            if column.node.exists_after_up() {
                previous = Some(column.name());
            }
        }

        for index in table.indexes.values() {
            statements.extend(self.index_statements(table_name, index));
        }

        statements
    }

    /// 既存テーブルへの変更の巻き戻し
    ///
    /// 追加インデックスの削除とインデックス名の復元 → カラム → 削除インデックスの再作成の順。
    /// 再作成するインデックスは復元後のカラムを参照します。
    fn alter_table_down(&self, table: &Table, table_name: &str) -> Vec<String> {
        let mut statements = Vec::new();

        let reversed_indexes: Vec<Index> = table
            .indexes
            .values()
            .filter_map(|index| index.reversed())
            .collect();
        for index in reversed_indexes.iter().filter(|i| *i.action() != Action::Add) {
            statements.extend(self.index_statements(table_name, index));
        }

        // 復元カラムの直前に位置する、UP適用前から存在するカラム（UP適用前の名前）
        let mut previous: Option<&str> = None;
        for column in table.columns.values() {
            if let Some(reversed) = column.reversed() {
                statements.extend(self.column_statements(table_name, &reversed, previous));
            }
            if column.node.exists_before_up() {
                previous = Some(column.node.name_before_up());
            }
        }

        for index in reversed_indexes.iter().filter(|i| *i.action() == Action::Add) {
            statements.extend(self.index_statements(table_name, index));
        }

        statements
    }

    fn column_statements(
        &self,
        table_name: &str,
        column: &Column,
        anchor: Option<&str>,
    ) -> Vec<String> {
        let name = self.escape(column.name());

        let statement = match column.action() {
            Action::NoAction => return Vec::new(),
            Action::Add => {
                let definition = format!("{}{}", name, self.generator.column_definition(column));
                match anchor {
                    Some(anchor) => self.statement(
                        StatementTemplate::AddColumnAfter,
                        &[table_name, &definition, &self.escape(anchor)],
                    ),
                    None => self.statement(
                        StatementTemplate::AddColumnFirst,
                        &[table_name, &definition],
                    ),
                }
            }
            Action::Remove => self.statement(StatementTemplate::DropColumn, &[table_name, &name]),
            Action::Modify => {
                let type_name = column
                    .column_type
                    .as_ref()
                    .map(|t| self.generator.fold(&self.generator.type_name(t)))
                    .unwrap_or_default();
                self.statement(
                    StatementTemplate::ModifyColumn,
                    &[
                        table_name,
                        &name,
                        &self.generator.column_definition(column),
                        &type_name,
                    ],
                )
            }
            Action::Rename { old_name } => self.statement(
                StatementTemplate::RenameColumn,
                &[table_name, &self.escape(old_name), &name],
            ),
        };

        vec![statement]
    }

    fn index_statements(&self, table_name: &str, index: &Index) -> Vec<String> {
        match index.action() {
            Action::NoAction => Vec::new(),
            Action::Add => vec![self.create_index(table_name, index)],
            Action::Remove => vec![self.drop_index(table_name, index)],
            Action::Modify => vec![
                self.drop_index(table_name, index),
                self.create_index(table_name, index),
            ],
            Action::Rename { old_name } => vec![self.statement(
                StatementTemplate::RenameIndex,
                &[table_name, &self.escape(old_name), &self.escape(index.name())],
            )],
        }
    }

    /// CREATE TABLE文と、そのテーブルのCREATE INDEX文
    fn create_table(&self, table: &Table) -> Vec<String> {
        let name = self.escape(table.name());
        let columns: Vec<(String, &Column)> = table
            .columns
            .values()
            .filter(|c| c.node.exists_after_up())
            .map(|c| (self.escape(c.name()), c))
            .collect();
        let width = columns
            .iter()
            .map(|(escaped, _)| escaped.chars().count())
            .max()
            .unwrap_or(0);

        let mut lines: Vec<String> = columns
            .iter()
            .map(|(escaped, column)| {
                format!(
                    "  {:<width$}{}",
                    escaped,
                    self.generator.column_definition(column),
                    width = width
                )
            })
            .collect();
        if !table.primary_key.is_empty() {
            lines.push(format!(
                "  {}",
                self.generator.primary_key_clause(&table.primary_key)
            ));
        }

        let mut statements = vec![self.statement(
            StatementTemplate::CreateTable,
            &[&name, &lines.join(",\n")],
        )];
        statements.extend(
            table
                .indexes
                .values()
                .filter(|index| index.node.exists_after_up())
                .map(|index| self.create_index(&name, index)),
        );
        statements
    }

    fn create_index(&self, table_name: &str, index: &Index) -> String {
        let template = match index.kind {
            IndexKind::Plain => StatementTemplate::CreateIndex,
            IndexKind::Unique => StatementTemplate::CreateUniqueIndex,
        };
        self.statement(
            template,
            &[
                &self.escape(index.name()),
                table_name,
                &self.generator.escape_columns(&index.columns),
            ],
        )
    }

    fn drop_index(&self, table_name: &str, index: &Index) -> String {
        self.statement(
            StatementTemplate::DropIndex,
            &[&self.escape(index.name()), table_name],
        )
    }

    fn statement(&self, template: StatementTemplate, args: &[&str]) -> String {
        self.generator.statement(template, args)
    }

    fn escape(&self, name: &str) -> String {
        self.generator.escape_identifier(name)
    }

    /// タイムスタンプを生成
    ///
    /// YYYYMMDDHHmmss形式のタイムスタンプを生成します。
    pub fn generate_timestamp(&self) -> String {
        Utc::now().format("%Y%m%d%H%M%S").to_string()
    }

    /// マイグレーションディレクトリ名を生成
    ///
    /// 例: 20260122120000_add_users_age
    pub fn generate_migration_filename(&self, timestamp: &str, description: &str) -> String {
        format!("{}_{}", timestamp, description)
    }

    /// 説明文をファイル名用にサニタイズ
    ///
    /// 小文字化し、英数字以外をアンダースコアにまとめます。
    pub fn sanitize_description(&self, description: &str) -> String {
        description
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect::<String>()
            .split('_')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("_")
    }
}

impl Default for MigrationGenerator {
    fn default() -> Self {
        Self::new(MigrationOptions::default())
    }
}

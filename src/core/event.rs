// DDLイベント
//
// SQLパーサーアダプターがスナップショットビルダーへ渡すイベント列の定義。
// パーサーのASTには依存せず、差分エンジンが必要とする情報のみを保持します。

use crate::core::schema::{Action, Column, ColumnOption, ColumnPosition, ColumnType, IndexKind};

/// カラム定義イベントの内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    /// カラム名
    pub name: String,
    /// カラム型
    pub column_type: Option<ColumnType>,
    /// カラムオプション
    pub options: Vec<ColumnOption>,
}

impl ColumnDefinition {
    pub fn new(
        name: impl Into<String>,
        column_type: Option<ColumnType>,
        options: Vec<ColumnOption>,
    ) -> Self {
        Self {
            name: name.into(),
            column_type,
            options,
        }
    }

    /// アクションを指定してカラムに変換
    pub fn into_column(self, action: Action) -> Column {
        Column::new(self.name, self.column_type, self.options).with_action(action)
    }
}

/// テーブル制約
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableConstraintDefinition {
    /// PRIMARY KEY (...)
    PrimaryKey { columns: Vec<String> },
    /// KEY / INDEX / UNIQUE (...)
    Index {
        name: Option<String>,
        kind: IndexKind,
        columns: Vec<String>,
    },
}

/// ALTER TABLE の操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterTableOp {
    AddColumn {
        column: ColumnDefinition,
        position: ColumnPosition,
    },
    DropColumn {
        name: String,
    },
    /// カラム定義全体の置き換え
    ModifyColumn {
        column: ColumnDefinition,
    },
    /// 型のみの変更（オプションは維持）
    AlterColumnType {
        name: String,
        column_type: ColumnType,
    },
    RenameColumn {
        old_name: String,
        new_name: String,
    },
    RenameTable {
        new_name: String,
    },
}

/// スナップショットビルダーが受け取るイベント
///
/// テーブル名がNoneのイベントは、直前に参照されたテーブルを対象とします。
/// インデックスのイベントは、同名のインデックスを持つテーブルを優先します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DdlEvent {
    /// CREATE TABLE
    CreateTable {
        table: String,
        columns: Vec<ColumnDefinition>,
        constraints: Vec<TableConstraintDefinition>,
    },
    /// DROP TABLE
    DropTable { table: String },
    /// ALTER TABLE（1操作ごとに1イベント）
    AlterTable {
        table: String,
        operation: AlterTableOp,
    },
    /// CREATE [UNIQUE] INDEX
    CreateIndex {
        table: Option<String>,
        name: String,
        kind: IndexKind,
        columns: Vec<String>,
    },
    /// DROP INDEX
    DropIndex { table: Option<String>, name: String },
    /// RENAME INDEX / ALTER INDEX ... RENAME TO
    RenameIndex {
        table: Option<String>,
        old_name: String,
        new_name: String,
    },
    /// 単独のカラム定義
    ColumnDefinition {
        table: Option<String>,
        column: ColumnDefinition,
    },
    /// テーブル名の参照（現在のテーブルを切り替える）
    TableNameReference { table: String },
}

impl DdlEvent {
    /// ログ出力用のイベント種別
    pub fn kind(&self) -> &'static str {
        match self {
            DdlEvent::CreateTable { .. } => "create_table",
            DdlEvent::DropTable { .. } => "drop_table",
            DdlEvent::AlterTable { .. } => "alter_table",
            DdlEvent::CreateIndex { .. } => "create_index",
            DdlEvent::DropIndex { .. } => "drop_index",
            DdlEvent::RenameIndex { .. } => "rename_index",
            DdlEvent::ColumnDefinition { .. } => "column_definition",
            DdlEvent::TableNameReference { .. } => "table_name_reference",
        }
    }
}

// スキーマドメインモデル
//
// 差分検出の対象となるエンティティ（Table, Column, Index）と、
// それらをまとめた Migration を表現する型システム。
// 各エンティティは Node を持ち、名前と今回のマイグレーションでのアクションを保持します。

use crate::adapters::sql_generator::SqlGenerator;
use crate::adapters::type_mapping::TypeMappingService;
use crate::core::config::MigrationOptions;
use indexmap::IndexMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

/// エンティティのアクション
///
/// 旧名はリネームの場合にのみ存在します。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// 変更なし
    #[default]
    NoAction,
    /// 追加
    Add,
    /// 削除
    Remove,
    /// 定義の変更
    Modify,
    /// リネーム
    Rename {
        /// リネーム前の名前
        old_name: String,
    },
}

impl Action {
    /// ラベル文字列を取得
    pub fn label(&self) -> &'static str {
        match self {
            Action::NoAction => "no_action",
            Action::Add => "add",
            Action::Remove => "remove",
            Action::Modify => "modify",
            Action::Rename { .. } => "rename",
        }
    }
}

/// エンティティ共通のノード
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    /// 現在の名前
    pub name: String,
    /// アクション
    pub action: Action,
}

impl Node {
    /// 新しいNodeを作成
    pub fn new(name: impl Into<String>, action: Action) -> Self {
        Self {
            name: name.into(),
            action,
        }
    }

    /// リネーム前の名前（リネーム以外はNone）
    pub fn old_name(&self) -> Option<&str> {
        match &self.action {
            Action::Rename { old_name } => Some(old_name.as_str()),
            _ => None,
        }
    }

    /// UP適用前の名前
    pub fn name_before_up(&self) -> &str {
        self.old_name().unwrap_or(&self.name)
    }

    /// UP適用後もエンティティが存在するか
    pub fn exists_after_up(&self) -> bool {
        self.action != Action::Remove
    }

    /// UP適用前からエンティティが存在していたか
    pub fn exists_before_up(&self) -> bool {
        self.action != Action::Add
    }

    /// DOWN方向のノードを作成
    ///
    /// UP方向のアクションのみから逆操作を導出します。
    /// Modifyは変更前の定義を保持しないため逆操作を持ちません。
    pub fn reversed(&self) -> Option<Node> {
        match &self.action {
            Action::NoAction | Action::Modify => None,
            Action::Add => Some(Node::new(self.name.clone(), Action::Remove)),
            Action::Remove => Some(Node::new(self.name.clone(), Action::Add)),
            Action::Rename { old_name } => Some(Node::new(
                old_name.clone(),
                Action::Rename {
                    old_name: self.name.clone(),
                },
            )),
        }
    }
}

/// Nodeを持つエンティティ
pub trait Entity: Clone {
    /// ノードを取得
    fn node(&self) -> &Node;

    /// ノードを可変で取得
    fn node_mut(&mut self) -> &mut Node;

    /// 名前を取得
    fn name(&self) -> &str {
        &self.node().name
    }

    /// アクションを取得
    fn action(&self) -> &Action {
        &self.node().action
    }

    /// DOWN方向のエンティティを作成
    fn reversed(&self) -> Option<Self> {
        self.node().reversed().map(|node| {
            let mut entity = self.clone();
            *entity.node_mut() = node;
            entity
        })
    }
}

/// 型ファミリ
///
/// 方言をまたいで型を比較・変換するための分類です。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeFamily {
    /// 整数型（バイト数）
    Integer { bytes: u8 },
    /// 固定小数点数型
    Decimal {
        precision: Option<u32>,
        scale: Option<u32>,
    },
    /// 単精度浮動小数点型
    Float,
    /// 倍精度浮動小数点型
    Double,
    /// 真偽値型
    Boolean,
    /// 固定長文字列型
    Char { length: Option<u32> },
    /// 可変長文字列型
    Varchar { length: Option<u32> },
    /// テキスト型
    Text,
    /// バイナリ型
    Binary,
    /// 日付型
    Date,
    /// 時刻型
    Time,
    /// タイムスタンプ型
    Timestamp,
    /// JSON型
    Json,
    /// UUID型
    Uuid,
    /// 分類できない型（記述どおり）
    Other { name: String },
}

/// カラム型
///
/// 記述されたままの型表現（MySQL系の出力に使用）と、
/// 型ファミリ（PostgreSQL系の出力に使用）を保持します。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnType {
    /// 記述どおりの型表現（例: "VARCHAR(100)"）
    pub native: String,
    /// 型ファミリ
    pub family: TypeFamily,
}

impl ColumnType {
    /// 型表現からカラム型を作成
    pub fn new(native: impl Into<String>) -> Self {
        let native = native.into().trim().to_string();
        let family = TypeMappingService::classify(&native);
        Self { native, family }
    }
}

/// カラムオプション
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ColumnOption {
    /// NULL
    Null,
    /// NOT NULL
    NotNull,
    /// PRIMARY KEY
    PrimaryKey,
    /// UNIQUE
    Unique,
    /// AUTO_INCREMENT / IDENTITY
    AutoIncrement,
    /// DEFAULT式
    Default(String),
    /// コメント（クォートなしの本文）
    Comment(String),
    /// その他（記述どおり）
    Other(String),
}

/// カラム定義
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    /// ノード
    #[serde(flatten)]
    pub node: Node,

    /// カラム型（PRIMARY KEY制約やDROPイベントのみで知られたカラムはNone）
    #[serde(rename = "type")]
    pub column_type: Option<ColumnType>,

    /// カラムオプション（記述順）
    pub options: Vec<ColumnOption>,

    /// コメント
    pub comment: String,
}

impl Column {
    /// 新しいカラムを作成（アクションはAdd）
    pub fn new(
        name: impl Into<String>,
        column_type: Option<ColumnType>,
        options: Vec<ColumnOption>,
    ) -> Self {
        let comment = comment_of(&options);
        Self {
            node: Node::new(name, Action::Add),
            column_type,
            options,
            comment,
        }
    }

    /// アクションを指定してカラムを作成
    pub fn with_action(mut self, action: Action) -> Self {
        self.node.action = action;
        self
    }

    /// デフォルト値を持つか
    pub fn has_default_value(&self) -> bool {
        self.options
            .iter()
            .any(|opt| matches!(opt, ColumnOption::Default(_)))
    }

    /// プライマリキーか
    pub fn is_primary_key(&self) -> bool {
        self.options.contains(&ColumnOption::PrimaryKey)
    }

    /// コンテンツのフィンガープリント
    ///
    /// エスケープ済みのカラム名と方言ごとの型名のみから計算します。
    /// オプション（デフォルト値、コメントなど）は含みません。
    pub fn fingerprint(&self, generator: &dyn SqlGenerator) -> String {
        let mut source = generator.escape_identifier(&self.node.name);
        if let Some(column_type) = &self.column_type {
            source.push(' ');
            source.push_str(&generator.type_name(column_type));
        }

        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// 別の定義を取り込む
    ///
    /// 型は後勝ち、オプションは未登録のもののみ追加します。
    fn merge(&mut self, other: Column) {
        if other.column_type.is_some() {
            self.column_type = other.column_type;
        }
        for option in other.options {
            if !self.options.contains(&option) {
                self.options.push(option);
            }
        }
        self.comment = comment_of(&self.options);
    }

    /// 定義を置き換える（名前とアクションは維持）
    fn redefine(&mut self, other: Column) {
        self.column_type = other.column_type;
        self.options = other.options;
        self.comment = other.comment;
    }
}

impl Entity for Column {
    fn node(&self) -> &Node {
        &self.node
    }

    fn node_mut(&mut self) -> &mut Node {
        &mut self.node
    }
}

fn comment_of(options: &[ColumnOption]) -> String {
    options
        .iter()
        .rev()
        .find_map(|opt| match opt {
            ColumnOption::Comment(text) => Some(text.clone()),
            _ => None,
        })
        .unwrap_or_default()
}

/// インデックスの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// 通常のインデックス
    #[default]
    Plain,
    /// ユニークインデックス
    Unique,
}

/// インデックス定義
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Index {
    /// ノード
    #[serde(flatten)]
    pub node: Node,

    /// インデックスの種類
    pub kind: IndexKind,

    /// 対象カラム名（順序に意味あり）
    pub columns: Vec<String>,
}

impl Index {
    /// 新しいインデックスを作成（アクションはAdd）
    pub fn new(name: impl Into<String>, kind: IndexKind, columns: Vec<String>) -> Self {
        Self {
            node: Node::new(name, Action::Add),
            kind,
            columns,
        }
    }

    /// 種類と対象カラム列が一致するか
    pub fn same_structure(&self, other: &Index) -> bool {
        self.kind == other.kind && self.columns == other.columns
    }
}

impl Entity for Index {
    fn node(&self) -> &Node {
        &self.node
    }

    fn node_mut(&mut self) -> &mut Node {
        &mut self.node
    }
}

/// ADD COLUMN の挿入位置
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ColumnPosition {
    /// 末尾
    #[default]
    Last,
    /// 先頭
    First,
    /// 指定カラムの直後
    After(String),
}

/// テーブル定義
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    /// ノード
    #[serde(flatten)]
    pub node: Node,

    /// カラム定義（挿入順）
    pub columns: IndexMap<String, Column>,

    /// インデックス定義（挿入順）
    pub indexes: IndexMap<String, Index>,

    /// 複合プライマリキー（2カラム以上の場合のみ）
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,
}

impl Table {
    /// 新しいテーブルを作成（アクションはAdd）
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            node: Node::new(name, Action::Add),
            columns: IndexMap::new(),
            indexes: IndexMap::new(),
            primary_key: Vec::new(),
        }
    }

    /// アクションを指定してテーブルを作成
    pub fn with_action(mut self, action: Action) -> Self {
        self.node.action = action;
        self
    }

    /// 指定されたカラムを取得
    pub fn get_column(&self, column_name: &str) -> Option<&Column> {
        self.columns.get(column_name)
    }

    /// 指定されたインデックスを取得
    pub fn get_index(&self, index_name: &str) -> Option<&Index> {
        self.indexes.get(index_name)
    }

    /// カラム名の一覧（順序どおり）
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    /// カラムを追加
    ///
    /// 同名のカラムが既にある場合は定義を取り込みます。
    /// 同一バッチで削除済みのカラムを再追加した場合は定義変更として扱います。
    pub fn add_column(&mut self, column: Column) {
        match self.columns.get_mut(column.name()) {
            Some(existing) => {
                if existing.node.action == Action::Remove {
                    existing.redefine(column);
                    existing.node.action = Action::Modify;
                } else {
                    existing.merge(column);
                }
            }
            None => {
                self.columns.insert(column.node.name.clone(), column);
            }
        }
    }

    /// 位置を指定してカラムを追加
    pub fn insert_column(&mut self, column: Column, position: ColumnPosition) {
        if self.columns.contains_key(column.name()) {
            self.add_column(column);
            return;
        }

        let index = match &position {
            ColumnPosition::Last => self.columns.len(),
            ColumnPosition::First => 0,
            ColumnPosition::After(anchor) => self
                .columns
                .get_index_of(anchor)
                .map_or(self.columns.len(), |i| i + 1),
        };
        self.columns
            .shift_insert(index, column.node.name.clone(), column);
    }

    /// カラムを削除
    pub fn remove_column(&mut self, column_name: &str) {
        remove_entry(&mut self.columns, column_name, |name| {
            Column::new(name, None, Vec::new())
        });
    }

    /// カラム定義を変更
    ///
    /// 同一バッチで追加されたカラムはAddのまま、既存カラムはModifyになります。
    pub fn modify_column(&mut self, column: Column) {
        match self.columns.get_mut(column.name()) {
            Some(existing) => {
                existing.redefine(column);
                if matches!(existing.node.action, Action::NoAction | Action::Remove) {
                    existing.node.action = Action::Modify;
                }
            }
            None => {
                let column = column.with_action(Action::Modify);
                self.columns.insert(column.node.name.clone(), column);
            }
        }
    }

    /// カラムの型のみを変更
    pub fn change_column_type(&mut self, column_name: &str, column_type: ColumnType) {
        match self.columns.get_mut(column_name) {
            Some(existing) => {
                existing.column_type = Some(column_type);
                if matches!(existing.node.action, Action::NoAction | Action::Remove) {
                    existing.node.action = Action::Modify;
                }
            }
            None => {
                let column = Column::new(column_name, Some(column_type), Vec::new())
                    .with_action(Action::Modify);
                self.columns.insert(column_name.to_string(), column);
            }
        }
    }

    /// カラムをリネーム
    pub fn rename_column(&mut self, old_name: &str, new_name: &str) {
        rename_entry(&mut self.columns, old_name, new_name, |name| {
            Column::new(name, None, Vec::new())
        });
    }

    /// インデックスを追加（同名のものは置き換え）
    pub fn add_index(&mut self, index: Index) {
        match self.indexes.get_mut(index.name()) {
            Some(existing) => {
                let action = if existing.node.action == Action::Remove {
                    Action::Modify
                } else {
                    existing.node.action.clone()
                };
                *existing = index;
                existing.node.action = action;
            }
            None => {
                self.indexes.insert(index.node.name.clone(), index);
            }
        }
    }

    /// インデックスを削除
    pub fn remove_index(&mut self, index_name: &str) {
        remove_entry(&mut self.indexes, index_name, |name| {
            Index::new(name, IndexKind::Plain, Vec::new())
        });
    }

    /// インデックスをリネーム
    pub fn rename_index(&mut self, old_name: &str, new_name: &str) {
        rename_entry(&mut self.indexes, old_name, new_name, |name| {
            Index::new(name, IndexKind::Plain, Vec::new())
        });
    }

    /// プライマリキー制約を適用
    ///
    /// 単一カラムの場合はカラムオプションとして取り込み、
    /// 複合キーの場合はテーブルレベルで保持します。
    pub fn set_primary_key(&mut self, columns: Vec<String>) {
        match columns.as_slice() {
            [] => {}
            [single] => {
                let column = Column::new(single.clone(), None, vec![ColumnOption::PrimaryKey]);
                self.add_column(column);
            }
            _ => self.primary_key = columns,
        }
    }
}

impl Entity for Table {
    fn node(&self) -> &Node {
        &self.node
    }

    fn node_mut(&mut self) -> &mut Node {
        &mut self.node
    }
}

/// マイグレーション
///
/// 1時点のスキーマスナップショット、あるいは差分適用後の
/// アクション付きテーブル集合を表現します。
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Migration {
    /// テーブル定義（挿入順）
    pub tables: IndexMap<String, Table>,

    /// 修飾なしのイベントが対象とするテーブル
    #[serde(skip)]
    current_table: Option<String>,

    /// レンダリングオプション
    #[serde(skip)]
    options: MigrationOptions,
}

impl Migration {
    /// 新しいマイグレーションを作成
    pub fn new(options: MigrationOptions) -> Self {
        Self {
            tables: IndexMap::new(),
            current_table: None,
            options,
        }
    }

    /// レンダリングオプションを取得
    pub fn options(&self) -> MigrationOptions {
        self.options
    }

    /// 現在のテーブル名を取得
    pub fn current_table(&self) -> Option<&str> {
        self.current_table.as_deref()
    }

    /// 現在のテーブルを切り替える（空の名前は無視）
    pub fn using(&mut self, table_name: &str) {
        if !table_name.is_empty() {
            self.current_table = Some(table_name.to_string());
        }
    }

    /// テーブル名を解決（指定がなければ現在のテーブル）
    pub fn resolve_table_name(&self, table_name: Option<&str>) -> Option<String> {
        match table_name {
            Some(name) if !name.is_empty() => Some(name.to_string()),
            _ => self.current_table.clone(),
        }
    }

    /// 指定されたテーブルを取得
    pub fn get_table(&self, table_name: &str) -> Option<&Table> {
        self.tables.get(table_name)
    }

    /// テーブル数を取得
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// テーブルを追加（同名のテーブルは位置を維持して置き換え）
    pub fn add_table(&mut self, table: Table) {
        match self.tables.get_mut(table.name()) {
            Some(existing) => *existing = table,
            None => {
                self.tables.insert(table.node.name.clone(), table);
            }
        }
    }

    /// テーブルを取得（未知のテーブルはNoActionで作成）
    pub fn table_entry(&mut self, table_name: &str) -> &mut Table {
        self.tables
            .entry(table_name.to_string())
            .or_insert_with(|| {
                debug!(table = table_name, "unknown table referenced, tracking it without action");
                Table::new(table_name).with_action(Action::NoAction)
            })
    }

    /// テーブルを削除
    pub fn remove_table(&mut self, table_name: &str) {
        remove_entry(&mut self.tables, table_name, Table::new);
    }

    /// テーブルをリネーム
    pub fn rename_table(&mut self, old_name: &str, new_name: &str) {
        rename_entry(&mut self.tables, old_name, new_name, Table::new);
        if self.current_table.as_deref() == Some(old_name) {
            self.current_table = Some(new_name.to_string());
        }
    }
}

/// エンティティを削除としてマークする
///
/// 同一バッチで追加されたものは取り消し、リネーム済みのものは旧名で削除します。
/// 旧名が同一バッチで別のエンティティに再利用されている場合は、
/// そのエンティティを旧エンティティの置き換え（Modify）とします。
/// 未知のエンティティはRemoveとして末尾に記録します。
fn remove_entry<V: Entity>(
    map: &mut IndexMap<String, V>,
    name: &str,
    missing: impl FnOnce(String) -> V,
) {
    let Some(position) = map.get_index_of(name) else {
        let mut entity = missing(name.to_string());
        entity.node_mut().action = Action::Remove;
        map.insert(name.to_string(), entity);
        return;
    };

    let action = map[position].action().clone();
    match action {
        Action::Add => {
            map.shift_remove_index(position);
        }
        Action::Rename { old_name } => {
            let Some((_, mut entity)) = map.shift_remove_index(position) else {
                return;
            };

            if let Some(occupant) = map.get_mut(&old_name) {
                let current = occupant.action().clone();
                match current {
                    Action::Add => occupant.node_mut().action = Action::Modify,
                    Action::Modify | Action::Remove => {}
                    _ => debug!(
                        name = %old_name,
                        "dropped entity's original name is taken by a rename, keeping it"
                    ),
                }
                return;
            }

            *entity.node_mut() = Node::new(old_name.clone(), Action::Remove);
            let index = position.min(map.len());
            map.shift_insert(index, old_name, entity);
        }
        _ => map[position].node_mut().action = Action::Remove,
    }
}

/// エンティティをリネームする
///
/// 挿入位置は維持します。元の名前に戻した場合はリネームを取り消します。
/// 新しい名前が既に使われている場合は、その位置の定義を置き換えます。
fn rename_entry<V: Entity>(
    map: &mut IndexMap<String, V>,
    old_name: &str,
    new_name: &str,
    missing: impl FnOnce(String) -> V,
) {
    if old_name == new_name {
        return;
    }

    let Some(position) = map.get_index_of(old_name) else {
        let mut entity = missing(new_name.to_string());
        entity.node_mut().action = Action::Rename {
            old_name: old_name.to_string(),
        };
        map.insert(new_name.to_string(), entity);
        return;
    };

    let Some((_, mut entity)) = map.shift_remove_index(position) else {
        return;
    };
    let action = match entity.action() {
        Action::Add => Action::Add,
        Action::Rename { old_name: original } if original == new_name => Action::NoAction,
        Action::Rename { old_name: original } => Action::Rename {
            old_name: original.clone(),
        },
        _ => Action::Rename {
            old_name: old_name.to_string(),
        },
    };
    *entity.node_mut() = Node::new(new_name, action);

    if let Some(occupant) = map.get_mut(new_name) {
        debug!(name = %new_name, "rename target already exists, replacing it");
        *occupant = entity;
        return;
    }

    let index = position.min(map.len());
    map.shift_insert(index, new_name.to_string(), entity);
}

// SQL生成アダプター
//
// スキーマ定義から各データベース方言用のDDL断片と文を生成するアダプター層。

pub mod mysql;
pub mod postgres;
pub mod templates;

use crate::core::config::{Dialect, MigrationOptions};
use crate::core::schema::{Column, ColumnOption, ColumnType};
use mysql::MysqlSqlGenerator;
use postgres::PostgresSqlGenerator;
use templates::{fill_template, KeywordCase, StatementTemplate};

/// マイグレーション方向
///
/// マイグレーションの適用方向を表現します。
/// up/down SQLの生成時に使用されます。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationDirection {
    /// 順方向のマイグレーション（up.sql）
    Up,
    /// 逆方向のマイグレーション（down.sql）
    Down,
}

/// SQLジェネレータートレイト
///
/// 各データベース方言用のSQLジェネレーターが実装すべきインターフェース。
/// 方言固有なのは識別子のクォート、型名、カラムオプションの表現のみで、
/// 文の組み立てはテンプレートを介して共通化されています。
pub trait SqlGenerator {
    /// 対象方言
    fn dialect(&self) -> Dialect;

    /// キーワードの大文字/小文字
    fn keyword_case(&self) -> KeywordCase;

    /// 識別子をエスケープ
    fn escape_identifier(&self, name: &str) -> String;

    /// 型名を取得（大文字/小文字の変換前）
    fn type_name(&self, column_type: &ColumnType) -> String;

    /// カラムオプションを描画（方言で表現しないものはNone）
    fn render_option(&self, option: &ColumnOption) -> Option<String>;

    /// DDL文を生成
    fn statement(&self, template: StatementTemplate, args: &[&str]) -> String {
        let template = template.render(self.dialect(), self.keyword_case());
        fill_template(&template, args)
    }

    /// SQL断片にキーワードの大文字/小文字を適用
    fn fold(&self, fragment: &str) -> String {
        self.keyword_case().fold(fragment)
    }

    /// カラム名リストをエスケープしてカンマ区切りで結合
    fn escape_columns(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.escape_identifier(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// カラム定義（型とオプション、先頭に空白）
    ///
    /// 型もオプションもない場合は空文字列を返します。
    fn column_definition(&self, column: &Column) -> String {
        let mut definition = String::new();

        if let Some(column_type) = &column.column_type {
            definition.push(' ');
            definition.push_str(&self.fold(&self.type_name(column_type)));
        }

        for option in &column.options {
            if let Some(rendered) = self.render_option(option) {
                definition.push(' ');
                definition.push_str(&self.fold(&rendered));
            }
        }

        definition
    }

    /// 複合プライマリキー行
    fn primary_key_clause(&self, columns: &[String]) -> String {
        format!(
            "{} ({})",
            self.fold("PRIMARY KEY"),
            self.escape_columns(columns)
        )
    }
}

/// 方言に対応するSQLジェネレーターを作成
pub fn generator_for(options: MigrationOptions) -> Box<dyn SqlGenerator> {
    match options.dialect {
        Dialect::MySQL => Box::new(MysqlSqlGenerator::new(
            options.keyword_case,
            options.quote_identifiers,
        )),
        Dialect::PostgreSQL => Box::new(PostgresSqlGenerator::new(
            options.keyword_case,
            options.quote_identifiers,
        )),
    }
}

/// 文字列リテラルを描画（シングルクォートは二重にエスケープ）
pub(crate) fn string_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

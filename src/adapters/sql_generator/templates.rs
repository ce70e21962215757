// DDLテンプレート
//
// 方言ごとのDDL文テンプレートと、キーワードの大文字/小文字切り替えを提供します。
// テンプレートは位置指定のプレースホルダー（{0}, {1}, ...）を持ち、
// 引数は1パスで埋め込まれます（引数内のプレースホルダー風の文字列は再展開しません）。

use crate::core::config::Dialect;
use serde::{Deserialize, Serialize};

/// キーワードの大文字/小文字
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordCase {
    /// 大文字（既定）
    #[default]
    Upper,
    /// 小文字
    Lower,
}

impl KeywordCase {
    /// テンプレート全体に適用
    ///
    /// テンプレートにはプレースホルダー以外の識別子を含まないため、
    /// 全体を変換して問題ありません。
    pub fn apply(&self, template: &str) -> String {
        match self {
            KeywordCase::Upper => template.to_string(),
            KeywordCase::Lower => template.to_lowercase(),
        }
    }

    /// 型名やオプションなどのSQL断片に適用
    ///
    /// クォート（' " `）の内側は変換しません。
    pub fn fold(&self, fragment: &str) -> String {
        let mut folded = String::with_capacity(fragment.len());
        let mut state = FoldState::Normal;

        for c in fragment.chars() {
            match state {
                FoldState::Quoted(quote) => {
                    if c == quote {
                        state = FoldState::Normal;
                    }
                    folded.push(c);
                }
                FoldState::Normal => {
                    if matches!(c, '\'' | '"' | '`') {
                        state = FoldState::Quoted(c);
                        folded.push(c);
                        continue;
                    }
                    match self {
                        KeywordCase::Upper => folded.extend(c.to_uppercase()),
                        KeywordCase::Lower => folded.extend(c.to_lowercase()),
                    }
                }
            }
        }

        folded
    }
}

/// 断片変換の状態
///
/// 連続したクォート（'' など）は閉じて開き直すのと同じ扱いになります。
#[derive(Debug, Clone, Copy)]
enum FoldState {
    Normal,
    Quoted(char),
}

/// DDL文の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementTemplate {
    /// {0}: テーブル名, {1}: カラム定義行
    CreateTable,
    /// {0}: テーブル名
    DropTable,
    /// {0}: 旧テーブル名, {1}: 新テーブル名
    RenameTable,
    /// {0}: テーブル名, {1}: カラム定義
    AddColumnFirst,
    /// {0}: テーブル名, {1}: カラム定義, {2}: 直前のカラム名
    AddColumnAfter,
    /// {0}: テーブル名, {1}: カラム名
    DropColumn,
    /// {0}: テーブル名, {1}: カラム名, {2}: 定義（先頭に空白）, {3}: 型名
    ModifyColumn,
    /// {0}: テーブル名, {1}: 旧カラム名, {2}: 新カラム名
    RenameColumn,
    /// {0}: インデックス名, {1}: テーブル名, {2}: カラム名リスト
    CreateIndex,
    /// {0}: インデックス名, {1}: テーブル名, {2}: カラム名リスト
    CreateUniqueIndex,
    /// {0}: インデックス名, {1}: テーブル名
    DropIndex,
    /// {0}: テーブル名, {1}: 旧インデックス名, {2}: 新インデックス名
    RenameIndex,
}

impl StatementTemplate {
    /// 方言ごとのテンプレート文字列
    pub fn template(&self, dialect: Dialect) -> &'static str {
        match (self, dialect) {
            (StatementTemplate::CreateTable, _) => "CREATE TABLE {0} (\n{1}\n);",
            (StatementTemplate::DropTable, _) => "DROP TABLE IF EXISTS {0};",
            (StatementTemplate::RenameTable, _) => "ALTER TABLE {0} RENAME TO {1};",
            (StatementTemplate::AddColumnFirst, Dialect::MySQL) => {
                "ALTER TABLE {0} ADD COLUMN {1} FIRST;"
            }
            (StatementTemplate::AddColumnAfter, Dialect::MySQL) => {
                "ALTER TABLE {0} ADD COLUMN {1} AFTER {2};"
            }
            (StatementTemplate::AddColumnFirst, Dialect::PostgreSQL)
            | (StatementTemplate::AddColumnAfter, Dialect::PostgreSQL) => {
                "ALTER TABLE {0} ADD COLUMN {1};"
            }
            (StatementTemplate::DropColumn, _) => "ALTER TABLE {0} DROP COLUMN {1};",
            (StatementTemplate::ModifyColumn, Dialect::MySQL) => {
                "ALTER TABLE {0} MODIFY COLUMN {1}{2};"
            }
            (StatementTemplate::ModifyColumn, Dialect::PostgreSQL) => {
                "ALTER TABLE {0} ALTER COLUMN {1} TYPE {3};"
            }
            (StatementTemplate::RenameColumn, _) => "ALTER TABLE {0} RENAME COLUMN {1} TO {2};",
            (StatementTemplate::CreateIndex, _) => "CREATE INDEX {0} ON {1}({2});",
            (StatementTemplate::CreateUniqueIndex, _) => "CREATE UNIQUE INDEX {0} ON {1}({2});",
            (StatementTemplate::DropIndex, Dialect::MySQL) => "DROP INDEX {0} ON {1};",
            (StatementTemplate::DropIndex, Dialect::PostgreSQL) => "DROP INDEX IF EXISTS {0};",
            (StatementTemplate::RenameIndex, Dialect::MySQL) => {
                "ALTER TABLE {0} RENAME INDEX {1} TO {2};"
            }
            (StatementTemplate::RenameIndex, Dialect::PostgreSQL) => {
                "ALTER INDEX {1} RENAME TO {2};"
            }
        }
    }

    /// キーワードの大文字/小文字を適用したテンプレート
    pub fn render(&self, dialect: Dialect, case: KeywordCase) -> String {
        case.apply(self.template(dialect))
    }
}

/// テンプレートに引数を埋め込む
///
/// 範囲外のプレースホルダーは空文字列に、余分な引数は無視されます。
///
/// # Examples
/// ```
/// use strata_delta::adapters::sql_generator::templates::fill_template;
/// assert_eq!(fill_template("DROP TABLE {0};", &["users"]), "DROP TABLE users;");
/// ```
pub fn fill_template(template: &str, args: &[&str]) -> String {
    let mut result = String::with_capacity(template.len() + args.iter().map(|a| a.len()).sum::<usize>());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        result.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let placeholder = after
            .find('}')
            .and_then(|close| after[..close].parse::<usize>().ok().map(|n| (n, close)));

        match placeholder {
            Some((n, close)) => {
                result.push_str(args.get(n).copied().unwrap_or_default());
                rest = &after[close + 1..];
            }
            None => {
                result.push('{');
                rest = after;
            }
        }
    }

    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_template_positional() {
        let sql = fill_template(
            StatementTemplate::AddColumnAfter.template(Dialect::MySQL),
            &["users", "age INT", "name"],
        );
        assert_eq!(sql, "ALTER TABLE users ADD COLUMN age INT AFTER name;");
    }

    #[test]
    fn test_fill_template_ignores_extra_args() {
        let sql = fill_template(
            StatementTemplate::ModifyColumn.template(Dialect::PostgreSQL),
            &["users", "name", " VARCHAR(100) NOT NULL", "VARCHAR(100)"],
        );
        assert_eq!(sql, "ALTER TABLE users ALTER COLUMN name TYPE VARCHAR(100);");
    }

    #[test]
    fn test_fill_template_single_pass() {
        let sql = fill_template("DROP TABLE {0};", &["{1}", "boom"]);
        assert_eq!(sql, "DROP TABLE {1};");
    }

    #[test]
    fn test_render_lowercase() {
        let template = StatementTemplate::CreateUniqueIndex.render(Dialect::MySQL, KeywordCase::Lower);
        assert_eq!(template, "create unique index {0} on {1}({2});");
    }

    #[test]
    fn test_fold_preserves_quoted() {
        assert_eq!(
            KeywordCase::Lower.fold("DEFAULT 'Alice' COMMENT 'Full Name'"),
            "default 'Alice' comment 'Full Name'"
        );
        assert_eq!(
            KeywordCase::Upper.fold("enum('a','B')"),
            "ENUM('a','B')"
        );
        assert_eq!(KeywordCase::Upper.fold("DEFAULT 'it''s'"), "DEFAULT 'it''s'");
    }

    #[test]
    fn test_postgres_templates_differ() {
        assert_eq!(
            StatementTemplate::DropIndex.template(Dialect::PostgreSQL),
            "DROP INDEX IF EXISTS {0};"
        );
        assert_eq!(
            StatementTemplate::AddColumnFirst.template(Dialect::PostgreSQL),
            "ALTER TABLE {0} ADD COLUMN {1};"
        );
    }
}

// SQL識別子クォートユーティリティ
//
// 各データベース方言用の識別子クォート関数を提供します。
// 識別子は必要な場合（予約語・特殊文字を含む場合）のみクォートし、
// 常にクォートする設定も選択できます。

use regex::Regex;
use std::sync::LazyLock;

static PLAIN_IDENTIFIER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").ok());

/// MySQLの予約語（識別子として使われやすいもの）
const MYSQL_RESERVED: &[&str] = &[
    "add", "all", "alter", "and", "as", "asc", "between", "by", "case", "change", "check",
    "column", "constraint", "create", "cross", "database", "default", "delete", "desc",
    "distinct", "drop", "else", "exists", "foreign", "from", "group", "having", "in", "index",
    "inner", "insert", "interval", "into", "is", "join", "key", "keys", "left", "like", "limit",
    "match", "not", "null", "on", "or", "order", "outer", "primary", "range", "references",
    "rename", "right", "select", "set", "table", "then", "to", "union", "unique", "update",
    "usage", "use", "using", "values", "when", "where", "with",
];

/// PostgreSQLの予約語（識別子として使われやすいもの）
const POSTGRES_RESERVED: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "both", "case", "cast",
    "check", "collate", "column", "constraint", "create", "current_date", "current_time",
    "current_timestamp", "current_user", "default", "desc", "distinct", "do", "else", "end",
    "except", "false", "fetch", "for", "foreign", "from", "grant", "group", "having", "in",
    "into", "leading", "limit", "not", "null", "offset", "on", "only", "or", "order", "primary",
    "references", "returning", "select", "session_user", "some", "table", "then", "to",
    "trailing", "true", "union", "unique", "user", "using", "when", "where", "window", "with",
];

/// PostgreSQL用識別子クォート（ダブルクォート）
///
/// 識別子内のダブルクォートは二重にエスケープします。
///
/// # Examples
/// ```
/// use strata_delta::adapters::sql_quote::quote_identifier_postgres;
/// assert_eq!(quote_identifier_postgres("users"), r#""users""#);
/// assert_eq!(quote_identifier_postgres(r#"table"name"#), r#""table""name""#);
/// ```
pub fn quote_identifier_postgres(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// MySQL用識別子クォート（バッククォート）
///
/// 識別子内のバッククォートは二重にエスケープします。
///
/// # Examples
/// ```
/// use strata_delta::adapters::sql_quote::quote_identifier_mysql;
/// assert_eq!(quote_identifier_mysql("users"), "`users`");
/// assert_eq!(quote_identifier_mysql("table`name"), "`table``name`");
/// ```
pub fn quote_identifier_mysql(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// MySQLでクォートが必要な識別子か
pub fn mysql_needs_quoting(name: &str) -> bool {
    !is_plain(name) || is_reserved(name, MYSQL_RESERVED)
}

/// PostgreSQLでクォートが必要な識別子か
///
/// クォートなしの識別子は小文字に畳み込まれるため、大文字を含む場合もクォートします。
pub fn postgres_needs_quoting(name: &str) -> bool {
    !is_plain(name)
        || name.chars().any(|c| c.is_ascii_uppercase())
        || is_reserved(name, POSTGRES_RESERVED)
}

/// クォートなしで書ける識別子か
fn is_plain(name: &str) -> bool {
    PLAIN_IDENTIFIER
        .as_ref()
        .is_some_and(|re| re.is_match(name))
}

fn is_reserved(name: &str, reserved: &[&str]) -> bool {
    let lower = name.to_ascii_lowercase();
    reserved.contains(&lower.as_str())
}

/// 識別子クォート方式からクォート済みの識別子を組み立てる
pub fn escape_with(
    name: &str,
    always: bool,
    needs_quoting: fn(&str) -> bool,
    quote: fn(&str) -> String,
) -> String {
    if always || needs_quoting(name) {
        quote(name)
    } else {
        name.to_string()
    }
}

// SQLパーサーアダプター
//
// DDLスクリプトを文ごとに分割し、sqlparserでAST化したうえで
// スナップショットビルダーが受け取るDdlEvent列に変換します。
// sqlparserが扱えないMySQL固有の構文（DROP INDEX ... ON, RENAME INDEX）は
// 文単位で先に認識します。

use crate::core::config::Dialect;
use crate::core::error::MigrationError;
use crate::core::event::{AlterTableOp, ColumnDefinition, DdlEvent, TableConstraintDefinition};
use crate::core::schema::{ColumnOption, ColumnPosition, ColumnType, IndexKind};
use regex::Regex;
use sqlparser::ast::{
    AlterColumnOperation, AlterIndexOperation, AlterTableOperation, ColumnDef,
    ColumnOption as AstColumnOption, MySQLColumnPosition, ObjectName, ObjectType, Statement,
    TableConstraint,
};
use sqlparser::dialect::{MySqlDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;
use std::fmt::Display;
use std::sync::LazyLock;
use tracing::trace;

static DROP_INDEX_ON: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?is)^DROP\s+INDEX\s+(?:IF\s+EXISTS\s+)?(\S+)\s+ON\s+(\S+)$").ok()
});

static RENAME_INDEX: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?is)^ALTER\s+TABLE\s+(\S+)\s+RENAME\s+(?:INDEX|KEY)\s+(\S+)\s+TO\s+(\S+)$").ok()
});

/// DDLスクリプトパーサー
pub struct SqlStatementParser {
    dialect: Dialect,
}

impl SqlStatementParser {
    /// 新しいSqlStatementParserを作成
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// DDLスクリプトをイベント列に変換
    ///
    /// 構文エラーは最初に発生したものをそのまま返します。
    /// DDL以外の文は無視します。
    pub fn parse(&self, sql: &str) -> Result<Vec<DdlEvent>, MigrationError> {
        let mut events = Vec::new();

        for statement in split_sql_statements(sql, self.dialect) {
            if let Some(event) = recognize_mysql_index_statement(&statement) {
                events.push(event);
                continue;
            }

            let parsed = match self.dialect {
                Dialect::MySQL => Parser::parse_sql(&MySqlDialect {}, &statement)?,
                Dialect::PostgreSQL => Parser::parse_sql(&PostgreSqlDialect {}, &statement)?,
            };
            for ast in parsed {
                statement_events(ast, &mut events);
            }
        }

        Ok(events)
    }
}

/// DROP INDEX ... ON / ALTER TABLE ... RENAME INDEX を認識する
fn recognize_mysql_index_statement(statement: &str) -> Option<DdlEvent> {
    if let Some(caps) = DROP_INDEX_ON.as_ref().and_then(|re| re.captures(statement)) {
        return Some(DdlEvent::DropIndex {
            table: Some(last_part(&caps[2])),
            name: last_part(&caps[1]),
        });
    }

    if let Some(caps) = RENAME_INDEX.as_ref().and_then(|re| re.captures(statement)) {
        return Some(DdlEvent::RenameIndex {
            table: Some(last_part(&caps[1])),
            old_name: unquote(&caps[2]),
            new_name: unquote(&caps[3]),
        });
    }

    None
}

fn statement_events(statement: Statement, events: &mut Vec<DdlEvent>) {
    match statement {
        Statement::CreateTable(create) => {
            let table = object_name(&create.name);
            let columns = create.columns.iter().map(column_definition).collect();
            let constraints = create
                .constraints
                .iter()
                .filter_map(table_constraint)
                .collect();
            events.push(DdlEvent::CreateTable {
                table,
                columns,
                constraints,
            });
        }
        Statement::AlterTable {
            name, operations, ..
        } => {
            let table = object_name(&name);
            events.push(DdlEvent::TableNameReference {
                table: table.clone(),
            });
            for operation in operations {
                alter_table_events(&table, operation, events);
            }
        }
        Statement::CreateIndex(index) => {
            let columns: Vec<String> = index.columns.iter().map(index_column).collect();
            let name = match &index.name {
                Some(name) => object_name(name),
                None => columns.first().cloned().unwrap_or_default(),
            };
            events.push(DdlEvent::CreateIndex {
                table: Some(object_name(&index.table_name)),
                name,
                kind: if index.unique {
                    IndexKind::Unique
                } else {
                    IndexKind::Plain
                },
                columns,
            });
        }
        Statement::Drop {
            object_type: ObjectType::Table,
            names,
            ..
        } => {
            for name in names {
                events.push(DdlEvent::DropTable {
                    table: object_name(&name),
                });
            }
        }
        Statement::Drop {
            object_type: ObjectType::Index,
            names,
            ..
        } => {
            // 修飾子はスキーマ名なので、テーブルは名前から解決する
            for name in names {
                let mut parts = name_parts(&name);
                events.push(DdlEvent::DropIndex {
                    table: None,
                    name: parts.pop().unwrap_or_default(),
                });
            }
        }
        Statement::AlterIndex {
            name,
            operation: AlterIndexOperation::RenameIndex { index_name },
        } => {
            let mut parts = name_parts(&name);
            let old_name = parts.pop().unwrap_or_default();
            events.push(DdlEvent::RenameIndex {
                table: None,
                old_name,
                new_name: object_name(&index_name),
            });
        }
        other => trace!(statement = %other, "ignoring non-DDL statement"),
    }
}

fn alter_table_events(table: &str, operation: AlterTableOperation, events: &mut Vec<DdlEvent>) {
    let alter = |operation| DdlEvent::AlterTable {
        table: table.to_string(),
        operation,
    };

    match operation {
        AlterTableOperation::AddColumn {
            column_def,
            column_position,
            ..
        } => events.push(alter(AlterTableOp::AddColumn {
            column: column_definition(&column_def),
            position: column_position
                .as_ref()
                .map_or(ColumnPosition::Last, column_position_of),
        })),
        AlterTableOperation::DropColumn { column_name, .. } => {
            events.push(alter(AlterTableOp::DropColumn {
                name: column_name.value,
            }))
        }
        AlterTableOperation::RenameColumn {
            old_column_name,
            new_column_name,
        } => events.push(alter(AlterTableOp::RenameColumn {
            old_name: old_column_name.value,
            new_name: new_column_name.value,
        })),
        AlterTableOperation::RenameTable { table_name } => {
            events.push(alter(AlterTableOp::RenameTable {
                new_name: object_name(&table_name),
            }))
        }
        AlterTableOperation::ModifyColumn {
            col_name,
            data_type,
            options,
            ..
        } => events.push(alter(AlterTableOp::ModifyColumn {
            column: ColumnDefinition::new(
                col_name.value,
                Some(ColumnType::new(data_type.to_string())),
                options.iter().map(column_option).collect(),
            ),
        })),
        AlterTableOperation::ChangeColumn {
            old_name,
            new_name,
            data_type,
            options,
            ..
        } => {
            if old_name.value != new_name.value {
                events.push(alter(AlterTableOp::RenameColumn {
                    old_name: old_name.value,
                    new_name: new_name.value.clone(),
                }));
            }
            events.push(alter(AlterTableOp::ModifyColumn {
                column: ColumnDefinition::new(
                    new_name.value,
                    Some(ColumnType::new(data_type.to_string())),
                    options.iter().map(column_option).collect(),
                ),
            }));
        }
        AlterTableOperation::AlterColumn {
            column_name,
            op: AlterColumnOperation::SetDataType { data_type, .. },
        } => events.push(alter(AlterTableOp::AlterColumnType {
            name: column_name.value,
            column_type: ColumnType::new(data_type.to_string()),
        })),
        AlterTableOperation::AddConstraint(constraint) => match table_constraint(&constraint) {
            Some(TableConstraintDefinition::Index {
                name,
                kind,
                columns,
            }) => events.push(DdlEvent::CreateIndex {
                table: Some(table.to_string()),
                name: name
                    .or_else(|| columns.first().cloned())
                    .unwrap_or_default(),
                kind,
                columns,
            }),
            _ => trace!(table, constraint = %constraint, "ignoring table constraint"),
        },
        other => trace!(table, operation = %other, "ignoring ALTER TABLE operation"),
    }
}

fn column_definition(def: &ColumnDef) -> ColumnDefinition {
    ColumnDefinition::new(
        def.name.value.clone(),
        Some(ColumnType::new(def.data_type.to_string())),
        def.options
            .iter()
            .map(|option| column_option(&option.option))
            .collect(),
    )
}

fn column_option(option: &AstColumnOption) -> ColumnOption {
    match option {
        AstColumnOption::Null => ColumnOption::Null,
        AstColumnOption::NotNull => ColumnOption::NotNull,
        AstColumnOption::Default(expr) => ColumnOption::Default(expr.to_string()),
        AstColumnOption::Comment(text) => ColumnOption::Comment(text.clone()),
        AstColumnOption::Unique {
            is_primary: true, ..
        } => ColumnOption::PrimaryKey,
        AstColumnOption::Unique { .. } => ColumnOption::Unique,
        other => {
            let raw = other.to_string();
            if raw.eq_ignore_ascii_case("AUTO_INCREMENT") || raw.eq_ignore_ascii_case("AUTOINCREMENT")
            {
                ColumnOption::AutoIncrement
            } else {
                ColumnOption::Other(raw)
            }
        }
    }
}

fn column_position_of(position: &MySQLColumnPosition) -> ColumnPosition {
    match position {
        MySQLColumnPosition::First => ColumnPosition::First,
        MySQLColumnPosition::After(ident) => ColumnPosition::After(ident.value.clone()),
    }
}

fn table_constraint(constraint: &TableConstraint) -> Option<TableConstraintDefinition> {
    match constraint {
        TableConstraint::PrimaryKey { columns, .. } => Some(TableConstraintDefinition::PrimaryKey {
            columns: columns.iter().map(index_column).collect(),
        }),
        TableConstraint::Unique {
            name,
            index_name,
            columns,
            ..
        } => Some(TableConstraintDefinition::Index {
            name: index_name.as_ref().or(name.as_ref()).map(|n| n.value.clone()),
            kind: IndexKind::Unique,
            columns: columns.iter().map(index_column).collect(),
        }),
        TableConstraint::Index { name, columns, .. } => Some(TableConstraintDefinition::Index {
            name: name.as_ref().map(|n| n.value.clone()),
            kind: IndexKind::Plain,
            columns: columns.iter().map(index_column).collect(),
        }),
        _ => None,
    }
}

/// インデックス対象の表現からカラム名を取り出す（ASC/DESCやプレフィックス長は除く）
fn index_column(column: impl Display) -> String {
    let text = column.to_string();
    let head = text.split_whitespace().next().unwrap_or_default();
    let head = head.split('(').next().unwrap_or_default();
    unquote(head)
}

fn object_name(name: &ObjectName) -> String {
    name_parts(name).pop().unwrap_or_default()
}

fn name_parts(name: &ObjectName) -> Vec<String> {
    name.to_string().split('.').map(unquote).collect()
}

fn last_part(name: &str) -> String {
    name.rsplit('.').next().map(unquote).unwrap_or_default()
}

/// 識別子のクォートを外す
fn unquote(name: &str) -> String {
    let name = name.trim();
    let mut chars = name.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open @ ('`' | '"')), Some(close)) if open == close && name.len() >= 2 => {
            let inner = &name[1..name.len() - 1];
            inner.replace(&format!("{open}{open}"), &open.to_string())
        }
        (Some('['), Some(']')) => name[1..name.len() - 1].to_string(),
        _ => name.to_string(),
    }
}

/// 文字列の分割状態
#[derive(Debug, Clone, PartialEq, Eq)]
enum SplitState {
    Normal,
    Quoted(char),
    /// PostgreSQLのドル引用符（`$$` や `$tag$`）
    DollarQuoted(String),
    LineComment,
    /// ブロックコメント（ネスト深さを保持）
    BlockComment(u32),
}

/// SQL文字列を個別のステートメントに分割
///
/// クォート内、ドル引用符内、コメント内のセミコロンは区切りとして扱いません。
/// MySQLでは文字列内のバックスラッシュエスケープを、PostgreSQLではドル引用符を認識します。
/// コメントは出力から取り除きます。末尾のセミコロンは含みません。
pub(crate) fn split_sql_statements(sql: &str, dialect: Dialect) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut state = SplitState::Normal;
    let chars: Vec<(usize, char)> = sql.char_indices().collect();
    let next_is = |i: usize, expected: char| chars.get(i + 1).map(|(_, c)| *c) == Some(expected);
    let mut i = 0;

    while i < chars.len() {
        let (byte_pos, c) = chars[i];

        match &state {
            SplitState::Quoted(quote) => {
                let quote = *quote;
                if c == '\\' && dialect == Dialect::MySQL && quote != '`' {
                    // エスケープされた文字はそのまま取り込む
                    current.push(c);
                    if let Some((_, escaped)) = chars.get(i + 1) {
                        current.push(*escaped);
                    }
                    i += 2;
                    continue;
                }
                current.push(c);
                if c == quote {
                    if next_is(i, quote) {
                        // 二重化されたクォート
                        current.push(quote);
                        i += 2;
                        continue;
                    }
                    state = SplitState::Normal;
                }
                i += 1;
            }
            SplitState::DollarQuoted(tag) => {
                if c == '$' && sql[byte_pos..].starts_with(tag.as_str()) {
                    current.push_str(tag);
                    i += tag.chars().count();
                    state = SplitState::Normal;
                } else {
                    current.push(c);
                    i += 1;
                }
            }
            SplitState::LineComment => {
                if c == '\n' {
                    current.push('\n');
                    state = SplitState::Normal;
                }
                i += 1;
            }
            SplitState::BlockComment(depth) => {
                let depth = *depth;
                if c == '/' && next_is(i, '*') {
                    state = SplitState::BlockComment(depth + 1);
                    i += 2;
                } else if c == '*' && next_is(i, '/') {
                    if depth == 1 {
                        current.push(' ');
                        state = SplitState::Normal;
                    } else {
                        state = SplitState::BlockComment(depth - 1);
                    }
                    i += 2;
                } else {
                    i += 1;
                }
            }
            SplitState::Normal => match c {
                '\'' | '"' | '`' => {
                    current.push(c);
                    state = SplitState::Quoted(c);
                    i += 1;
                }
                '$' if dialect == Dialect::PostgreSQL => {
                    i = start_dollar_quote(&mut current, sql, &chars, i, &mut state);
                }
                '-' if next_is(i, '-') => {
                    state = SplitState::LineComment;
                    i += 2;
                }
                '#' => {
                    state = SplitState::LineComment;
                    i += 1;
                }
                '/' if next_is(i, '*') => {
                    state = SplitState::BlockComment(1);
                    i += 2;
                }
                ';' => {
                    push_statement(&mut statements, &mut current);
                    i += 1;
                }
                _ => {
                    current.push(c);
                    i += 1;
                }
            },
        }
    }

    push_statement(&mut statements, &mut current);
    statements
}

/// ドル引用符の開始を試行
///
/// `$tag$` の形であればドル引用符状態に遷移し、そうでなければ `$` をそのまま取り込みます。
/// `$1` のような位置パラメータはタグとして扱いません。
fn start_dollar_quote(
    current: &mut String,
    sql: &str,
    chars: &[(usize, char)],
    i: usize,
    state: &mut SplitState,
) -> usize {
    let (byte_pos, _) = chars[i];
    if let Some(end) = sql[byte_pos + 1..].find('$') {
        let tag = &sql[byte_pos..=byte_pos + end + 1];
        let inner = &tag[1..tag.len() - 1];
        let is_tag = !inner.starts_with(|ch: char| ch.is_ascii_digit())
            && inner.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
        if is_tag {
            *state = SplitState::DollarQuoted(tag.to_string());
            current.push_str(tag);
            return i + tag.chars().count();
        }
    }
    current.push('$');
    i + 1
}

fn push_statement(statements: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
    current.clear();
}

// MySQL用SQLジェネレーター
//
// MySQL系（MySQL / MariaDB / TiDB）のDDL断片を生成します。

use crate::adapters::sql_generator::templates::KeywordCase;
use crate::adapters::sql_generator::{string_literal, SqlGenerator};
use crate::adapters::sql_quote::{escape_with, mysql_needs_quoting, quote_identifier_mysql};
use crate::adapters::type_mapping::TypeMappingService;
use crate::core::config::Dialect;
use crate::core::schema::{ColumnOption, ColumnType};

/// MySQL用SQLジェネレーター
pub struct MysqlSqlGenerator {
    keyword_case: KeywordCase,
    quote_identifiers: bool,
    type_mapping: TypeMappingService,
}

impl MysqlSqlGenerator {
    /// 新しいMysqlSqlGeneratorを作成
    pub fn new(keyword_case: KeywordCase, quote_identifiers: bool) -> Self {
        Self {
            keyword_case,
            quote_identifiers,
            type_mapping: TypeMappingService::new(Dialect::MySQL),
        }
    }
}

impl Default for MysqlSqlGenerator {
    fn default() -> Self {
        Self::new(KeywordCase::Upper, false)
    }
}

impl SqlGenerator for MysqlSqlGenerator {
    fn dialect(&self) -> Dialect {
        Dialect::MySQL
    }

    fn keyword_case(&self) -> KeywordCase {
        self.keyword_case
    }

    fn escape_identifier(&self, name: &str) -> String {
        escape_with(
            name,
            self.quote_identifiers,
            mysql_needs_quoting,
            quote_identifier_mysql,
        )
    }

    fn type_name(&self, column_type: &ColumnType) -> String {
        self.type_mapping.to_sql_type(column_type)
    }

    fn render_option(&self, option: &ColumnOption) -> Option<String> {
        let rendered = match option {
            ColumnOption::Null => "NULL".to_string(),
            ColumnOption::NotNull => "NOT NULL".to_string(),
            ColumnOption::PrimaryKey => "PRIMARY KEY".to_string(),
            ColumnOption::Unique => "UNIQUE".to_string(),
            ColumnOption::AutoIncrement => "AUTO_INCREMENT".to_string(),
            ColumnOption::Default(expr) => format!("DEFAULT {}", expr),
            ColumnOption::Comment(text) => format!("COMMENT {}", string_literal(text)),
            ColumnOption::Other(raw) => raw.clone(),
        };
        Some(rendered)
    }
}

// PostgreSQL用SQLジェネレーター
//
// PostgreSQL系のDDL断片を生成します。
// 型名は型ファミリから組み立て、インラインのCOMMENTは出力しません。

use crate::adapters::sql_generator::templates::KeywordCase;
use crate::adapters::sql_generator::SqlGenerator;
use crate::adapters::sql_quote::{escape_with, postgres_needs_quoting, quote_identifier_postgres};
use crate::adapters::type_mapping::TypeMappingService;
use crate::core::config::Dialect;
use crate::core::schema::{ColumnOption, ColumnType};

/// PostgreSQL用SQLジェネレーター
pub struct PostgresSqlGenerator {
    keyword_case: KeywordCase,
    quote_identifiers: bool,
    type_mapping: TypeMappingService,
}

impl PostgresSqlGenerator {
    /// 新しいPostgresSqlGeneratorを作成
    pub fn new(keyword_case: KeywordCase, quote_identifiers: bool) -> Self {
        Self {
            keyword_case,
            quote_identifiers,
            type_mapping: TypeMappingService::new(Dialect::PostgreSQL),
        }
    }
}

impl Default for PostgresSqlGenerator {
    fn default() -> Self {
        Self::new(KeywordCase::Upper, false)
    }
}

impl SqlGenerator for PostgresSqlGenerator {
    fn dialect(&self) -> Dialect {
        Dialect::PostgreSQL
    }

    fn keyword_case(&self) -> KeywordCase {
        self.keyword_case
    }

    fn escape_identifier(&self, name: &str) -> String {
        escape_with(
            name,
            self.quote_identifiers,
            postgres_needs_quoting,
            quote_identifier_postgres,
        )
    }

    fn type_name(&self, column_type: &ColumnType) -> String {
        self.type_mapping.to_sql_type(column_type)
    }

    fn render_option(&self, option: &ColumnOption) -> Option<String> {
        match option {
            ColumnOption::Null => Some("NULL".to_string()),
            ColumnOption::NotNull => Some("NOT NULL".to_string()),
            ColumnOption::PrimaryKey => Some("PRIMARY KEY".to_string()),
            ColumnOption::Unique => Some("UNIQUE".to_string()),
            ColumnOption::AutoIncrement => Some("GENERATED BY DEFAULT AS IDENTITY".to_string()),
            ColumnOption::Default(expr) => Some(format!("DEFAULT {}", expr)),
            // COMMENT ON COLUMN は別文のため対象外
            ColumnOption::Comment(_) => None,
            ColumnOption::Other(raw) => Some(raw.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::Column;

    #[test]
    fn test_escape_identifier() {
        let generator = PostgresSqlGenerator::default();
        assert_eq!(generator.escape_identifier("users"), "users");
        assert_eq!(generator.escape_identifier("user"), r#""user""#);
        assert_eq!(generator.escape_identifier("UserId"), r#""UserId""#);
    }

    #[test]
    fn test_column_definition_maps_types() {
        let generator = PostgresSqlGenerator::default();
        let column = Column::new(
            "id",
            Some(ColumnType::new("INT")),
            vec![
                ColumnOption::NotNull,
                ColumnOption::AutoIncrement,
                ColumnOption::Comment("identifier".to_string()),
            ],
        );

        assert_eq!(
            generator.column_definition(&column),
            " INTEGER NOT NULL GENERATED BY DEFAULT AS IDENTITY"
        );
    }

    #[test]
    fn test_type_name_lowercase() {
        let generator = PostgresSqlGenerator::new(KeywordCase::Lower, false);
        let column = Column::new("flag", Some(ColumnType::new("TINYINT(1)")), Vec::new());
        assert_eq!(generator.column_definition(&column), " boolean");
    }
}

// 型マッピングサービス
//
// 記述された型文字列を型ファミリへ分類し、
// 型ファミリから各方言の型名を組み立てます。

use crate::core::config::Dialect;
use crate::core::schema::{ColumnType, TypeFamily};

/// 型マッピングサービス
///
/// 方言に依存しない型ファミリを介して型名を変換します。
pub struct TypeMappingService {
    dialect: Dialect,
}

impl TypeMappingService {
    /// 新しいTypeMappingServiceを作成
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// カラム型を方言の型名に変換
    ///
    /// MySQLは記述どおりの型表現を、PostgreSQLは型ファミリから組み立てた型名を返します。
    pub fn to_sql_type(&self, column_type: &ColumnType) -> String {
        match self.dialect {
            Dialect::MySQL => column_type.native.clone(),
            Dialect::PostgreSQL => Self::postgres_type_name(&column_type.family),
        }
    }

    /// 型文字列を型ファミリに分類
    ///
    /// # Examples
    /// ```
    /// use strata_delta::adapters::type_mapping::TypeMappingService;
    /// use strata_delta::core::schema::TypeFamily;
    /// assert_eq!(
    ///     TypeMappingService::classify("varchar(100)"),
    ///     TypeFamily::Varchar { length: Some(100) }
    /// );
    /// ```
    pub fn classify(native: &str) -> TypeFamily {
        let upper = native.trim().to_ascii_uppercase();
        let base = upper
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or_default();
        let params = parse_params(&upper);
        let first = params.first().copied();

        match base {
            "TINYINT" if first == Some(1) => TypeFamily::Boolean,
            "TINYINT" => TypeFamily::Integer { bytes: 1 },
            "SMALLINT" | "INT2" | "SMALLSERIAL" => TypeFamily::Integer { bytes: 2 },
            "MEDIUMINT" => TypeFamily::Integer { bytes: 3 },
            "INT" | "INTEGER" | "INT4" | "SERIAL" => TypeFamily::Integer { bytes: 4 },
            "BIGINT" | "INT8" | "BIGSERIAL" => TypeFamily::Integer { bytes: 8 },
            "DECIMAL" | "NUMERIC" | "DEC" => TypeFamily::Decimal {
                precision: first,
                scale: params.get(1).copied(),
            },
            "FLOAT" | "REAL" | "FLOAT4" => TypeFamily::Float,
            "DOUBLE" | "FLOAT8" => TypeFamily::Double,
            "BOOL" | "BOOLEAN" => TypeFamily::Boolean,
            "CHARACTER" if upper.starts_with("CHARACTER VARYING") => {
                TypeFamily::Varchar { length: first }
            }
            "CHAR" | "CHARACTER" | "NCHAR" => TypeFamily::Char { length: first },
            "VARCHAR" | "NVARCHAR" => TypeFamily::Varchar { length: first },
            "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" => TypeFamily::Text,
            "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" | "BYTEA" => {
                TypeFamily::Binary
            }
            "DATE" => TypeFamily::Date,
            "TIME" => TypeFamily::Time,
            "DATETIME" | "TIMESTAMP" | "TIMESTAMPTZ" => TypeFamily::Timestamp,
            "JSON" | "JSONB" => TypeFamily::Json,
            "UUID" => TypeFamily::Uuid,
            _ => TypeFamily::Other {
                name: native.trim().to_string(),
            },
        }
    }

    /// 型ファミリからPostgreSQLの型名を組み立てる
    pub fn postgres_type_name(family: &TypeFamily) -> String {
        match family {
            TypeFamily::Integer { bytes } if *bytes <= 2 => "SMALLINT".to_string(),
            TypeFamily::Integer { bytes } if *bytes <= 4 => "INTEGER".to_string(),
            TypeFamily::Integer { .. } => "BIGINT".to_string(),
            TypeFamily::Decimal {
                precision: Some(precision),
                scale: Some(scale),
            } => format!("NUMERIC({}, {})", precision, scale),
            TypeFamily::Decimal {
                precision: Some(precision),
                scale: None,
            } => format!("NUMERIC({})", precision),
            TypeFamily::Decimal { .. } => "NUMERIC".to_string(),
            TypeFamily::Float => "REAL".to_string(),
            TypeFamily::Double => "DOUBLE PRECISION".to_string(),
            TypeFamily::Boolean => "BOOLEAN".to_string(),
            TypeFamily::Char { length } => with_length("CHAR", *length),
            TypeFamily::Varchar { length } => with_length("VARCHAR", *length),
            TypeFamily::Text => "TEXT".to_string(),
            TypeFamily::Binary => "BYTEA".to_string(),
            TypeFamily::Date => "DATE".to_string(),
            TypeFamily::Time => "TIME".to_string(),
            TypeFamily::Timestamp => "TIMESTAMP".to_string(),
            TypeFamily::Json => "JSON".to_string(),
            TypeFamily::Uuid => "UUID".to_string(),
            TypeFamily::Other { name } => name.clone(),
        }
    }
}

fn with_length(name: &str, length: Option<u32>) -> String {
    match length {
        Some(length) => format!("{}({})", name, length),
        None => name.to_string(),
    }
}

/// 最初の括弧内の数値パラメータを取り出す
fn parse_params(upper: &str) -> Vec<u32> {
    let Some(start) = upper.find('(') else {
        return Vec::new();
    };
    let Some(end) = upper[start..].find(')') else {
        return Vec::new();
    };

    upper[start + 1..start + end]
        .split(',')
        .filter_map(|p| p.trim().parse().ok())
        .collect()
}

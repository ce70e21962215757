// エラー型定義
//
// ライブラリ全体で使用されるカスタムエラー型を提供します。
// thiserrorを使用して、MigrationError と IoError を定義します。

use sqlparser::parser::ParserError;
use thiserror::Error;

/// マイグレーション生成エラー
///
/// 差分エンジン自体はI/Oを持たないため、発生し得るのは
/// パーサーから伝播した構文エラーのみです。
#[derive(Debug, Clone, Error)]
pub enum MigrationError {
    /// パーサーが報告したエラー（そのまま伝播）
    #[error(transparent)]
    Parse(#[from] ParserError),
}

impl MigrationError {
    /// 構文エラーかどうか
    pub fn is_parse(&self) -> bool {
        matches!(self, MigrationError::Parse(_))
    }
}

/// I/Oエラー
///
/// ファイル操作時に発生するエラーを表現します。
#[derive(Debug, Error)]
pub enum IoError {
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound {
        /// ファイルパス
        path: String,
    },

    /// File read error
    #[error("Failed to read file: {path} (cause: {cause})")]
    FileRead {
        /// ファイルパス
        path: String,
        /// エラー原因
        cause: String,
    },

    /// File write error
    #[error("Failed to write file: {path} (cause: {cause})")]
    FileWrite {
        /// ファイルパス
        path: String,
        /// エラー原因
        cause: String,
    },

    /// Directory creation error
    #[error("Failed to create directory: {path} (cause: {cause})")]
    DirectoryCreate {
        /// ディレクトリパス
        path: String,
        /// エラー原因
        cause: String,
    },
}

impl IoError {
    /// ファイルが見つからないエラーかどうか
    pub fn is_file_not_found(&self) -> bool {
        matches!(self, IoError::FileNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_is_transparent() {
        let error = MigrationError::from(ParserError::ParserError(
            "Expected: an SQL statement, found: FOO".to_string(),
        ));

        assert!(error.is_parse());
        assert_eq!(
            error.to_string(),
            "sql parser error: Expected: an SQL statement, found: FOO"
        );
    }

    #[test]
    fn test_io_error_display() {
        let error = IoError::FileNotFound {
            path: "schema/old.sql".to_string(),
        };

        assert!(error.is_file_not_found());
        assert_eq!(error.to_string(), "File not found: schema/old.sql");
    }
}

// diffコマンドハンドラー
//
// 2つのDDLスナップショットのエンティティ単位の差分を表示します。

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::config::Dialect;
use crate::core::schema_diff::EntityChange;
use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

/// diffコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct DiffOutput {
    /// 変更一覧
    pub changes: Vec<EntityChange>,
}

impl CommandOutput for DiffOutput {
    fn to_text(&self) -> String {
        if self.changes.is_empty() {
            return "No schema changes found.".to_string();
        }

        self.changes
            .iter()
            .map(EntityChange::describe)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// diffコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct DiffCommand {
    pub project_path: PathBuf,
    pub config_path: Option<PathBuf>,
    pub old: PathBuf,
    pub new: PathBuf,
    pub dialect: Option<Dialect>,
    pub format: OutputFormat,
}

/// diffコマンドハンドラー
#[derive(Debug, Default)]
pub struct DiffCommandHandler {}

impl DiffCommandHandler {
    pub fn new() -> Self {
        Self {}
    }

    /// diffコマンドを実行
    pub fn execute(&self, command: &DiffCommand) -> Result<String> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;
        let options = context.migration_options(command.dialect, false);

        let migration = context.load_diff(Some(command.old.as_path()), &command.new, options)?;
        let output = DiffOutput {
            changes: migration.changes(),
        };
        debug!(changes = output.changes.len(), "Diff computed");

        render_output(&output, &command.format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup(old_sql: &str, new_sql: &str) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("old.sql"), old_sql).unwrap();
        fs::write(temp_dir.path().join("new.sql"), new_sql).unwrap();
        temp_dir
    }

    fn command(temp_dir: &TempDir, format: OutputFormat) -> DiffCommand {
        DiffCommand {
            project_path: temp_dir.path().to_path_buf(),
            config_path: None,
            old: PathBuf::from("old.sql"),
            new: PathBuf::from("new.sql"),
            dialect: None,
            format,
        }
    }

    #[test]
    fn test_diff_text_output() {
        let temp_dir = setup(
            "CREATE TABLE users (id INT, name VARCHAR(50));\nCREATE TABLE posts (id INT);",
            "CREATE TABLE users (id INT, name VARCHAR(100));",
        );

        let output = DiffCommandHandler::new()
            .execute(&command(&temp_dir, OutputFormat::Text))
            .unwrap();

        assert_eq!(output, "modify column: users.name\nremove table: posts");
    }

    #[test]
    fn test_diff_without_changes() {
        let temp_dir = setup("CREATE TABLE t (a INT);", "CREATE TABLE t (a INT);");

        let output = DiffCommandHandler::new()
            .execute(&command(&temp_dir, OutputFormat::Text))
            .unwrap();

        assert_eq!(output, "No schema changes found.");
    }

    #[test]
    fn test_diff_json_output() {
        let temp_dir = setup("CREATE TABLE t (a INT);", "CREATE TABLE t (a INT, b INT);");

        let output = DiffCommandHandler::new()
            .execute(&command(&temp_dir, OutputFormat::Json))
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["changes"][0]["kind"], "column");
        assert_eq!(value["changes"][0]["table"], "t");
        assert_eq!(value["changes"][0]["name"], "b");
        assert_eq!(value["changes"][0]["action"]["kind"], "add");
    }
}

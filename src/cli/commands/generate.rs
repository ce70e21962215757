// generateコマンドハンドラー
//
// 2つのDDLスナップショットからマイグレーションファイルを生成します。
// - 旧/新スナップショットの読み込みと差分計算
// - up/down SQLの生成
// - マイグレーションディレクトリへの書き出し（dry-run時は表示のみ）

use crate::cli::command_context::CommandContext;
use crate::cli::commands::dry_run_formatter::DryRunFormatter;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::config::Dialect;
use crate::core::error::IoError;
use crate::core::naming::{DOWN_FILE, UP_FILE};
use crate::core::schema::Migration;
use crate::services::migration_generator::MigrationGenerator;
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// generateコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct GenerateOutput {
    /// Dry runモードかどうか
    pub dry_run: bool,
    /// マイグレーション名
    pub migration_name: String,
    /// マイグレーションパス
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migration_path: Option<String>,
    /// UP SQL
    pub up_sql: String,
    /// DOWN SQL
    pub down_sql: String,
    /// メッセージ
    #[serde(skip)]
    pub message: String,
}

impl CommandOutput for GenerateOutput {
    fn to_text(&self) -> String {
        self.message.clone()
    }
}

/// generateコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct GenerateCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// 旧スナップショット（未指定なら空のスキーマ）
    pub old: Option<PathBuf>,
    /// 新スナップショット
    pub new: PathBuf,
    /// マイグレーションの説明（オプション）
    pub description: Option<String>,
    /// ドライラン（SQLを表示するがファイルは作成しない）
    pub dry_run: bool,
    /// 方言の上書き
    pub dialect: Option<Dialect>,
    /// キーワードを小文字で出力
    pub lowercase: bool,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// generateコマンドハンドラー
#[derive(Debug, Default)]
pub struct GenerateCommandHandler {}

impl GenerateCommandHandler {
    /// 新しいGenerateCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// generateコマンドを実行
    ///
    /// # Returns
    ///
    /// 成功時は生成されたマイグレーション名（dry-run時はプレビュー）、
    /// 差分がない場合はエラー
    pub fn execute(&self, command: &GenerateCommand) -> Result<String> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;
        let options = context.migration_options(command.dialect, command.lowercase);

        debug!(dialect = %options.dialect, "Loading snapshots");
        let migration = context.load_diff(command.old.as_deref(), &command.new, options)?;
        if !migration.has_changes() {
            return Err(anyhow!("No schema changes found. Schema is up to date."));
        }

        let generator = MigrationGenerator::new(options);
        let up_sql = generator.migration_up(&migration);
        let down_sql = generator.migration_down(&migration);

        let timestamp = generator.generate_timestamp();
        let description = self.resolve_description(&generator, command, &migration);
        let migration_name = generator.generate_migration_filename(&timestamp, &description);

        if command.dry_run {
            let message =
                DryRunFormatter::format(&migration_name, &up_sql, &down_sql, &migration.changes());
            let output = GenerateOutput {
                dry_run: true,
                migration_name,
                migration_path: None,
                up_sql,
                down_sql,
                message,
            };
            return render_output(&output, &command.format);
        }

        let migration_dir = context.migrations_dir().join(&migration_name);
        self.write_migration_files(&migration_dir, &up_sql, &down_sql)?;
        info!(migration = %migration_name, "Migration files written");

        let mut message = migration_name.clone();
        message.push_str("\n\nChanges:\n");
        for change in migration.changes() {
            message.push_str("  ");
            message.push_str(&change.describe());
            message.push('\n');
        }

        let output = GenerateOutput {
            dry_run: false,
            migration_name,
            migration_path: Some(migration_dir.to_string_lossy().to_string()),
            up_sql,
            down_sql,
            message: message.trim_end().to_string(),
        };
        render_output(&output, &command.format)
    }

    /// 説明文を決定（未指定なら変更内容から自動生成）
    fn resolve_description(
        &self,
        generator: &MigrationGenerator,
        command: &GenerateCommand,
        migration: &Migration,
    ) -> String {
        let raw = match &command.description {
            Some(description) => description.clone(),
            None => self.generate_auto_description(migration),
        };
        let sanitized = generator.sanitize_description(&raw);
        if sanitized.is_empty() {
            "schema_changes".to_string()
        } else {
            sanitized
        }
    }

    /// 変更内容から説明文を自動生成
    ///
    /// 変更が1件ならその内容、複数なら件数を使います。
    pub(crate) fn generate_auto_description(&self, migration: &Migration) -> String {
        let changes = migration.changes();
        match changes.as_slice() {
            [single] => format!("{} {} {}", single.action.label(), single.kind, single.name),
            many => format!("{} schema changes", many.len()),
        }
    }

    /// up.sql / down.sql を書き出す
    fn write_migration_files(&self, migration_dir: &Path, up_sql: &str, down_sql: &str) -> Result<()> {
        fs::create_dir_all(migration_dir).map_err(|e| IoError::DirectoryCreate {
            path: migration_dir.display().to_string(),
            cause: e.to_string(),
        })?;

        for (file_name, sql) in [(UP_FILE, up_sql), (DOWN_FILE, down_sql)] {
            let path = migration_dir.join(file_name);
            debug!(path = %path.display(), "Writing migration file");
            fs::write(&path, format!("{}\n", sql)).map_err(|e| IoError::FileWrite {
                path: path.display().to_string(),
                cause: e.to_string(),
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn command(project: &Path, old: Option<&str>, new: &str) -> GenerateCommand {
        GenerateCommand {
            project_path: project.to_path_buf(),
            config_path: None,
            old: old.map(PathBuf::from),
            new: PathBuf::from(new),
            description: None,
            dry_run: false,
            dialect: None,
            lowercase: false,
            format: OutputFormat::Text,
        }
    }

    fn write(dir: &Path, name: &str, sql: &str) {
        fs::write(dir.join(name), sql).unwrap();
    }

    #[test]
    fn test_generate_auto_description_single_change() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "old.sql", "CREATE TABLE users (id INT);");
        write(temp_dir.path(), "new.sql", "CREATE TABLE users (id INT, age INT);");
        let context = CommandContext::load(temp_dir.path().to_path_buf()).unwrap();
        let migration = context
            .load_diff(
                Some(Path::new("old.sql")),
                Path::new("new.sql"),
                Default::default(),
            )
            .unwrap();

        let handler = GenerateCommandHandler::new();
        assert_eq!(handler.generate_auto_description(&migration), "add column age");
    }

    #[test]
    fn test_execute_writes_files() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "old.sql", "CREATE TABLE users (id INT, name VARCHAR(50));");
        write(
            temp_dir.path(),
            "new.sql",
            "CREATE TABLE users (id INT, name VARCHAR(50), age INT);",
        );

        let mut cmd = command(temp_dir.path(), Some("old.sql"), "new.sql");
        cmd.description = Some("Add user age".to_string());
        let output = GenerateCommandHandler::new().execute(&cmd).unwrap();

        let migration_name = output.lines().next().unwrap();
        assert!(migration_name.ends_with("_add_user_age"));

        let dir = temp_dir.path().join("migrations").join(migration_name);
        assert_eq!(
            fs::read_to_string(dir.join(UP_FILE)).unwrap(),
            "ALTER TABLE users ADD COLUMN age INT AFTER name;\n"
        );
        assert_eq!(
            fs::read_to_string(dir.join(DOWN_FILE)).unwrap(),
            "ALTER TABLE users DROP COLUMN age;\n"
        );
    }

    #[test]
    fn test_execute_dry_run_creates_nothing() {
        colored::control::set_override(false);
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "new.sql", "CREATE TABLE users (id INT);");

        let mut cmd = command(temp_dir.path(), None, "new.sql");
        cmd.dry_run = true;
        let output = GenerateCommandHandler::new().execute(&cmd).unwrap();

        assert!(output.contains("--- UP SQL ---"));
        assert!(output.contains("CREATE TABLE users"));
        assert!(!temp_dir.path().join("migrations").exists());
    }

    #[test]
    fn test_execute_without_changes_fails() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "schema.sql", "CREATE TABLE users (id INT);");

        let cmd = command(temp_dir.path(), Some("schema.sql"), "schema.sql");
        let error = GenerateCommandHandler::new().execute(&cmd).unwrap_err();
        assert!(error.to_string().contains("No schema changes found"));
    }

    #[test]
    fn test_execute_json_output() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "new.sql", "CREATE TABLE users (id INT);");

        let mut cmd = command(temp_dir.path(), None, "new.sql");
        cmd.dry_run = true;
        cmd.format = OutputFormat::Json;
        let output = GenerateCommandHandler::new().execute(&cmd).unwrap();

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["dry_run"], true);
        assert_eq!(value["down_sql"], "DROP TABLE IF EXISTS users;");
        assert!(value.get("migration_path").is_none());
    }
}

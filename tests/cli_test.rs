/// CLI エントリーポイントのテスト
///
/// CLIの構造が正しく定義されていること、ビルド済みバイナリが
/// スナップショットからマイグレーションファイルを書き出すことを確認します。
use clap::Parser;

#[cfg(test)]
mod cli_tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use std::process::Command;
    use strata_delta::cli::{Cli, Commands, OutputFormat};
    use tempfile::TempDir;

    fn strata_delta(project: &Path) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_strata-delta"));
        command.current_dir(project).arg("--no-color");
        command
    }

    fn write_snapshots(project: &Path) {
        fs::write(
            project.join("v1.sql"),
            "CREATE TABLE users (id INT, name VARCHAR(50));",
        )
        .unwrap();
        fs::write(
            project.join("v2.sql"),
            "CREATE TABLE users (id INT, name VARCHAR(100), age INT);",
        )
        .unwrap();
    }

    /// ヘルプとバージョン
    #[test]
    fn test_cli_can_parse() {
        let result = Cli::try_parse_from(["strata-delta", "--help"]);
        assert!(result.is_err());

        let result = Cli::try_parse_from(["strata-delta", "--version"]);
        assert!(result.is_err());
    }

    /// newの指定は必須
    #[test]
    fn test_generate_requires_new_snapshot() {
        let result = Cli::try_parse_from(["strata-delta", "generate"]);
        assert!(result.is_err());
    }

    /// グローバルオプションはサブコマンドの後でも指定できる
    #[test]
    fn test_diff_command_parses_global_options() {
        let cli = Cli::try_parse_from([
            "strata-delta",
            "diff",
            "--old",
            "v1.sql",
            "--new",
            "v2.sql",
            "--format",
            "json",
            "--verbose",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert!(matches!(cli.format, OutputFormat::Json));
        assert!(matches!(cli.command, Commands::Diff { .. }));
    }

    /// 未知の方言はパースエラー
    #[test]
    fn test_unknown_dialect_is_rejected() {
        let result = Cli::try_parse_from([
            "strata-delta",
            "generate",
            "--new",
            "v2.sql",
            "--dialect",
            "oracle",
        ]);
        assert!(result.is_err());
    }

    /// generateがマイグレーションファイルを書き出す
    #[test]
    fn test_generate_writes_migration_files() {
        let temp_dir = TempDir::new().unwrap();
        write_snapshots(temp_dir.path());

        let output = strata_delta(temp_dir.path())
            .args(["generate", "--old", "v1.sql", "--new", "v2.sql", "-d", "widen name"])
            .output()
            .unwrap();
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

        let stdout = String::from_utf8_lossy(&output.stdout);
        let migration_name = stdout.lines().next().unwrap().to_string();
        assert!(migration_name.ends_with("_widen_name"));
        assert!(stdout.contains("modify column: users.name"));
        assert!(stdout.contains("add column: users.age"));

        let dir = temp_dir.path().join("migrations").join(&migration_name);
        let up = fs::read_to_string(dir.join("up.sql")).unwrap();
        let down = fs::read_to_string(dir.join("down.sql")).unwrap();
        assert_eq!(
            up,
            "ALTER TABLE users MODIFY COLUMN name VARCHAR(100);\n\
             ALTER TABLE users ADD COLUMN age INT AFTER name;\n"
        );
        assert_eq!(down, "ALTER TABLE users DROP COLUMN age;\n");
    }

    /// 設定ファイルの方言とマイグレーションディレクトリが使われる
    #[test]
    fn test_generate_uses_config_file() {
        let temp_dir = TempDir::new().unwrap();
        write_snapshots(temp_dir.path());
        fs::write(
            temp_dir.path().join(".strata-delta.yaml"),
            "version: \"1.0\"\ndialect: postgresql\nlowercase: true\nmigrations_dir: db/migrate\n",
        )
        .unwrap();

        let output = strata_delta(temp_dir.path())
            .args(["generate", "--old", "v1.sql", "--new", "v2.sql", "-d", "pg"])
            .output()
            .unwrap();
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

        let stdout = String::from_utf8_lossy(&output.stdout);
        let migration_name = stdout.lines().next().unwrap().to_string();
        let up = fs::read_to_string(
            temp_dir
                .path()
                .join("db/migrate")
                .join(&migration_name)
                .join("up.sql"),
        )
        .unwrap();
        assert_eq!(
            up,
            "alter table users alter column name type varchar(100);\n\
             alter table users add column age integer;\n"
        );
    }

    /// dry-runではファイルを作成しない
    #[test]
    fn test_generate_dry_run() {
        let temp_dir = TempDir::new().unwrap();
        write_snapshots(temp_dir.path());

        let output = strata_delta(temp_dir.path())
            .args(["generate", "--old", "v1.sql", "--new", "v2.sql", "--dry-run"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("=== Dry Run: Migration Preview ==="));
        assert!(stdout.contains("ALTER TABLE users ADD COLUMN age INT AFTER name;"));
        assert!(!temp_dir.path().join("migrations").exists());
    }

    /// 変更がない場合は終了コード1
    #[test]
    fn test_generate_without_changes_fails() {
        let temp_dir = TempDir::new().unwrap();
        write_snapshots(temp_dir.path());

        let output = strata_delta(temp_dir.path())
            .args(["generate", "--old", "v1.sql", "--new", "v1.sql"])
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(1));
        assert!(String::from_utf8_lossy(&output.stderr).contains("No schema changes found"));
    }

    /// 存在しないスナップショットはエラー
    #[test]
    fn test_missing_snapshot_fails() {
        let temp_dir = TempDir::new().unwrap();

        let output = strata_delta(temp_dir.path())
            .args(["diff", "--old", "nope.sql", "--new", "nope.sql"])
            .output()
            .unwrap();

        assert!(!output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("File not found"));
    }

    /// diffのJSON出力
    #[test]
    fn test_diff_json_output() {
        let temp_dir = TempDir::new().unwrap();
        write_snapshots(temp_dir.path());

        let output = strata_delta(temp_dir.path())
            .args(["diff", "--old", "v1.sql", "--new", "v2.sql", "--format", "json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let changes = value["changes"].as_array().unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0]["name"], "name");
        assert_eq!(changes[0]["action"]["kind"], "modify");
        assert_eq!(changes[1]["name"], "age");
        assert_eq!(changes[1]["action"]["kind"], "add");
    }
}

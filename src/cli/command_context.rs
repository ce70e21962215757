// コマンド共通コンテキスト
//
// 設定ファイル読み込み、パス解決、スナップショットの読み込みと差分計算を
// CLI層で集約する。

use crate::adapters::sql_generator::templates::KeywordCase;
use crate::core::config::{Config, Dialect, MigrationOptions};
use crate::core::error::IoError;
use crate::core::schema::Migration;
use crate::services::snapshot_builder::SnapshotBuilder;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// CLIコマンド共通の実行コンテキスト
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub project_path: PathBuf,
    pub config: Config,
}

impl CommandContext {
    /// プロジェクトルートから設定を読み込んでコンテキストを作成
    pub fn load(project_path: PathBuf) -> Result<Self> {
        Self::load_with_config(project_path, None)
    }

    /// カスタム設定ファイルパスを指定してコンテキストを作成
    ///
    /// 既定の設定ファイルが存在しない場合はデフォルト設定を使用します。
    /// 明示的に指定された設定ファイルが存在しない場合はエラーです。
    pub fn load_with_config(
        project_path: PathBuf,
        custom_config_path: Option<PathBuf>,
    ) -> Result<Self> {
        let config = match custom_config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(anyhow!("Config file not found: {:?}", path));
                }
                Config::from_file(&path)?
            }
            None => {
                let default_path = project_path.join(Config::DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Config::from_file(&default_path)?
                } else {
                    debug!(path = ?default_path, "config file not found, using defaults");
                    Config::default()
                }
            }
        };

        Ok(Self {
            project_path,
            config,
        })
    }

    /// マイグレーションディレクトリの絶対パス
    pub fn migrations_dir(&self) -> PathBuf {
        self.project_path.join(&self.config.migrations_dir)
    }

    /// プロジェクトルートからの相対パスを解決
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_path.join(path)
        }
    }

    /// コマンドラインの指定で上書きしたレンダリングオプション
    pub fn migration_options(&self, dialect: Option<Dialect>, lowercase: bool) -> MigrationOptions {
        let mut options = self.config.migration_options();
        if let Some(dialect) = dialect {
            options.dialect = dialect;
        }
        if lowercase {
            options.keyword_case = KeywordCase::Lower;
        }
        options
    }

    /// SQLファイルを読み込む
    pub fn read_sql(&self, path: &Path) -> Result<String> {
        let path = self.resolve_path(path);
        if !path.exists() {
            return Err(IoError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        fs::read_to_string(&path).map_err(|e| {
            IoError::FileRead {
                path: path.display().to_string(),
                cause: e.to_string(),
            }
            .into()
        })
    }

    /// スナップショットを読み込む（未指定なら空のスナップショット）
    pub fn load_snapshot(&self, path: Option<&Path>, options: MigrationOptions) -> Result<Migration> {
        let Some(path) = path else {
            return Ok(Migration::new(options));
        };

        let sql = self.read_sql(path)?;
        SnapshotBuilder::build(&sql, options)
            .with_context(|| format!("Failed to parse snapshot: {:?}", path))
    }

    /// 2つのスナップショットを読み込み、差分を反映した新しいスナップショットを返す
    pub fn load_diff(
        &self,
        old: Option<&Path>,
        new: &Path,
        options: MigrationOptions,
    ) -> Result<Migration> {
        let old_snapshot = self.load_snapshot(old, options)?;
        let mut new_snapshot = self.load_snapshot(Some(new), options)?;
        new_snapshot.diff(&old_snapshot);

        debug!(
            old_tables = old_snapshot.table_count(),
            new_tables = new_snapshot.table_count(),
            "computed schema diff"
        );
        Ok(new_snapshot)
    }
}

// 設定ファイル管理
//
// プロジェクトの設定ファイル（YAML形式）の読み込みと検証、
// 差分エンジンへ渡すレンダリングオプションの組み立てを行います。

use crate::adapters::sql_generator::templates::KeywordCase;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// データベース方言
///
/// MySQL系を既定とし、PostgreSQL系を代替方言として扱います。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    #[serde(rename = "mysql")]
    MySQL,
    #[serde(rename = "postgresql")]
    PostgreSQL,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::MySQL => write!(f, "mysql"),
            Dialect::PostgreSQL => write!(f, "postgresql"),
        }
    }
}

impl FromStr for Dialect {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" | "tidb" => Ok(Dialect::MySQL),
            "postgresql" | "postgres" | "pg" => Ok(Dialect::PostgreSQL),
            other => Err(anyhow!(
                "Unsupported database dialect: {}. Please specify one of: mysql, postgresql.",
                other
            )),
        }
    }
}

/// レンダリングオプション
///
/// スナップショット構築とマイグレーション生成の両方に
/// コンストラクタ経由で渡されます。プロセス全体の状態は持ちません。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MigrationOptions {
    /// 対象方言
    pub dialect: Dialect,
    /// キーワードの大文字/小文字
    pub keyword_case: KeywordCase,
    /// 識別子を常にクォートするか
    pub quote_identifiers: bool,
}

impl MigrationOptions {
    /// 2つのモードフラグからオプションを作成
    pub fn from_flags(lowercase: bool, postgres: bool) -> Self {
        Self {
            dialect: if postgres {
                Dialect::PostgreSQL
            } else {
                Dialect::MySQL
            },
            keyword_case: if lowercase {
                KeywordCase::Lower
            } else {
                KeywordCase::Upper
            },
            quote_identifiers: false,
        }
    }

    /// 識別子クォートを常に行う設定に切り替える
    pub fn with_quoted_identifiers(mut self, quote: bool) -> Self {
        self.quote_identifiers = quote;
        self
    }
}

/// プロジェクト設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 設定ファイルのバージョン
    pub version: String,

    /// データベース方言
    #[serde(default)]
    pub dialect: Dialect,

    /// キーワードを小文字で出力するか
    #[serde(default)]
    pub lowercase: bool,

    /// 識別子を常にクォートするか
    #[serde(default)]
    pub quote_identifiers: bool,

    /// マイグレーションディレクトリ
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: PathBuf,
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("migrations")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            dialect: Dialect::default(),
            lowercase: false,
            quote_identifiers: false,
            migrations_dir: default_migrations_dir(),
        }
    }
}

impl Config {
    /// デフォルトの設定ファイルパス
    pub const DEFAULT_CONFIG_PATH: &'static str = crate::core::naming::CONFIG_FILE;

    /// 設定ファイルを読み込む
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = content.parse()?;
        config.validate()?;
        Ok(config)
    }

    /// 設定の妥当性を検証
    pub fn validate(&self) -> Result<()> {
        if self.version.is_empty() {
            return Err(anyhow!("Config file version is not specified"));
        }

        if self.migrations_dir.as_os_str().is_empty() {
            return Err(anyhow!("migrations_dir must not be empty"));
        }

        Ok(())
    }

    /// 差分エンジン用のオプションに変換
    pub fn migration_options(&self) -> MigrationOptions {
        MigrationOptions::from_flags(self.lowercase, self.dialect == Dialect::PostgreSQL)
            .with_quoted_identifiers(self.quote_identifiers)
    }
}

/// std::str::FromStrトレイトの実装
impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(yaml: &str) -> Result<Self, Self::Err> {
        serde_saphyr::from_str(yaml).with_context(|| "Failed to parse config file")
    }
}

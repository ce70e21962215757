// 命名ポリシー
//
// アプリケーション名と関連パスの単一ソースを提供します。

/// 現行アプリケーション名
pub const APP_NAME: &str = "strata-delta";

/// 既定の設定ファイル名
pub const CONFIG_FILE: &str = ".strata-delta.yaml";

/// UPマイグレーションのファイル名
pub const UP_FILE: &str = "up.sql";

/// DOWNマイグレーションのファイル名
pub const DOWN_FILE: &str = "down.sql";

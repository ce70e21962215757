// strata-deltaライブラリのエントリーポイント
//
// モジュール構造:
// - cli: CLIレイヤー（ユーザー入力の受付とコマンドルーティング）
// - core: コアドメインロジック（スキーマモデル、差分検出、設定、エラー型）
// - adapters: SQLテキストの解析とSQL文字列の生成
// - services: スナップショット構築とマイグレーション生成

pub mod adapters;
pub mod cli;
pub mod core;
pub mod services;

// Core Domain
// スキーマモデル、差分検出、設定、エラー型などの純粋なドメインロジック

pub mod config;
pub mod error;
pub mod event;
pub mod naming;
pub mod schema;
pub mod schema_diff;

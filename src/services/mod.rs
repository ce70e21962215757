// Services Layer
// スナップショット構築とマイグレーション生成を行うサービス層

pub mod migration_generator;
pub mod snapshot_builder;

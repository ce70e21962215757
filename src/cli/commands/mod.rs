// コマンドハンドラー層
// 各CLIコマンドの実装

pub mod diff;
pub mod dry_run_formatter;
pub mod generate;

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::Serialize;

/// コマンド出力の共通インターフェース
///
/// テキスト表現はコマンドごとに定義し、JSON表現はSerializeから導出します。
pub trait CommandOutput {
    /// テキスト形式の出力
    fn to_text(&self) -> String;
}

/// 出力フォーマットに応じてコマンド出力を文字列化
pub fn render_output<T: CommandOutput + Serialize>(
    output: &T,
    format: &OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(output.to_text()),
        OutputFormat::Json => {
            serde_json::to_string_pretty(output).context("Failed to serialize output as JSON")
        }
    }
}

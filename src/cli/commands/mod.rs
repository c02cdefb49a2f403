// コマンドハンドラー層
// 各CLIコマンドの実装

pub mod down;
pub mod init;
pub mod new;
pub mod status;
pub mod up;

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;

/// コマンド出力（テキストとJSONの両方に対応）
pub trait CommandOutput: Serialize {
    /// テキスト形式の出力
    fn to_text(&self) -> String;
}

/// 出力フォーマットに応じて出力文字列を生成
pub fn render_output<T: CommandOutput>(output: &T, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(output.to_text()),
        OutputFormat::Json => {
            serde_json::to_string_pretty(output).with_context(|| "Failed to serialize output")
        }
    }
}

/// 新しいスクリプトID（ローカル時刻 YYYYMMDDHHmmss）
pub(crate) fn generate_script_id() -> String {
    Local::now().format("%Y%m%d%H%M%S").to_string()
}

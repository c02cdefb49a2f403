// downコマンドハンドラー
//
// 最後に適用されたスクリプトから順に、UNDOセクションを実行して取り消します。

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::output::OutputSink;
use crate::services::operations::{DownOperation, DownReport};
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

/// downコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct DownCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// 設定ファイルのパス（省略時は既定）
    pub config_path: Option<PathBuf>,
    /// 取り消すスクリプト数
    pub steps: usize,
    /// 対象環境
    pub env: String,
    /// スクリプト実行ログを標準出力へ出すか
    pub verbose: bool,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// down の出力
#[derive(Debug, Clone, Serialize)]
pub struct DownOutput {
    pub reverted: Vec<String>,
    pub drift: Vec<String>,
}

impl From<&DownReport> for DownOutput {
    fn from(report: &DownReport) -> Self {
        Self {
            reverted: report.reverted.iter().map(|change| change.filename()).collect(),
            drift: report.drift.lines().map(str::to_string).collect(),
        }
    }
}

impl CommandOutput for DownOutput {
    fn to_text(&self) -> String {
        let mut output = String::new();

        for line in &self.drift {
            output.push_str(&format!("{}\n", line.yellow()));
        }

        if self.reverted.is_empty() {
            output.push_str("No applied migration scripts to undo.\n");
            return output;
        }

        for filename in &self.reverted {
            output.push_str(&format!("  {} {}\n", "↩".yellow(), filename));
        }
        output.push_str(&format!(
            "{}\n",
            format!("Undid {} migration script(s)", self.reverted.len())
                .green()
                .bold()
        ));

        output
    }
}

/// downコマンドハンドラー
#[derive(Debug, Clone)]
pub struct DownCommandHandler {}

impl DownCommandHandler {
    /// 新しいDownCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// downコマンドを実行
    ///
    /// # Arguments
    ///
    /// * `command` - downコマンドのパラメータ
    ///
    /// # Returns
    ///
    /// 成功時は取り消したスクリプトの概要、失敗時はエラーメッセージ
    pub async fn execute(&self, command: &DownCommand) -> Result<String> {
        let context = CommandContext::load(command.project_path.clone(), command.config_path.clone())?;
        let scripts = context.load_scripts()?;
        let options = context.operation_options(&command.env)?;
        let mut conn = context.connect(&command.env).await?;

        let sink = if command.verbose {
            OutputSink::stdout()
        } else {
            OutputSink::silent()
        };

        let mut operation = DownOperation::new(options, sink, command.steps);
        let result = operation.run(&mut conn, &scripts).await;
        let _ = conn.close().await;

        let report = result.with_context(|| "Failed to undo migration scripts")?;
        render_output(&DownOutput::from(&report), &command.format)
    }
}

impl Default for DownCommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

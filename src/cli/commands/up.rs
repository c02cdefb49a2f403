// upコマンドハンドラー
//
// 未適用のマイグレーションスクリプトを適用します。
// - データベース接続の確立
// - チェンジログとスクリプトの照合（ドリフト警告）
// - スクリプトの順次実行と記録

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::output::OutputSink;
use crate::services::operations::{UpOperation, UpReport};
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

/// upコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct UpCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// 設定ファイルのパス（省略時は既定）
    pub config_path: Option<PathBuf>,
    /// 適用するスクリプト数の上限
    pub steps: Option<usize>,
    /// 対象環境
    pub env: String,
    /// スクリプト実行ログを標準出力へ出すか
    pub verbose: bool,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// up の出力
#[derive(Debug, Clone, Serialize)]
pub struct UpOutput {
    pub applied: Vec<AppliedScript>,
    pub pending: usize,
    pub drift: Vec<String>,
}

/// 適用したスクリプト
#[derive(Debug, Clone, Serialize)]
pub struct AppliedScript {
    pub id: String,
    pub filename: String,
    pub applied_at: Option<String>,
    pub duration_ms: i64,
}

impl From<&UpReport> for UpOutput {
    fn from(report: &UpReport) -> Self {
        Self {
            applied: report
                .applied
                .iter()
                .map(|(change, duration)| AppliedScript {
                    id: change.id().to_string(),
                    filename: change.filename(),
                    applied_at: change.applied_at().map(str::to_string),
                    duration_ms: duration.num_milliseconds(),
                })
                .collect(),
            pending: report.pending,
            drift: report.drift.lines().map(str::to_string).collect(),
        }
    }
}

impl CommandOutput for UpOutput {
    fn to_text(&self) -> String {
        let mut output = String::new();

        for line in &self.drift {
            output.push_str(&format!("{}\n", line.yellow()));
        }

        if self.applied.is_empty() {
            output.push_str(&format!("{}\n", "Database is up to date.".green()));
            return output;
        }

        for script in &self.applied {
            output.push_str(&format!(
                "  {} {} ({}ms)\n",
                "✓".green(),
                script.filename,
                script.duration_ms
            ));
        }

        let remaining = self.pending.saturating_sub(self.applied.len());
        output.push_str(&format!(
            "{}\n",
            format!("Applied {} migration script(s)", self.applied.len())
                .green()
                .bold()
        ));
        if remaining > 0 {
            output.push_str(&format!("{} script(s) still pending\n", remaining));
        }

        output
    }
}

/// upコマンドハンドラー
#[derive(Debug, Clone)]
pub struct UpCommandHandler {}

impl UpCommandHandler {
    /// 新しいUpCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// upコマンドを実行
    ///
    /// # Arguments
    ///
    /// * `command` - upコマンドのパラメータ
    ///
    /// # Returns
    ///
    /// 成功時は適用したスクリプトの概要、失敗時はエラーメッセージ
    pub async fn execute(&self, command: &UpCommand) -> Result<String> {
        let context = CommandContext::load(command.project_path.clone(), command.config_path.clone())?;
        let scripts = context.load_scripts()?;
        let options = context.operation_options(&command.env)?;
        let mut conn = context.connect(&command.env).await?;

        let sink = if command.verbose {
            OutputSink::stdout()
        } else {
            OutputSink::silent()
        };

        let mut operation = UpOperation::new(options, sink, command.steps);
        let result = operation.run(&mut conn, &scripts).await;
        // 切断エラーは無視
        let _ = conn.close().await;

        let report = result.with_context(|| "Failed to apply migration scripts")?;
        render_output(&UpOutput::from(&report), &command.format)
    }
}

impl Default for UpCommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

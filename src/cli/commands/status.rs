// statusコマンドハンドラー
//
// マイグレーションの状態表示機能を実装します。
// - 適用済み / 未適用スクリプトの一覧
// - スクリプトの欠落や適用漏れ（ドリフト）の報告

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::output::OutputSink;
use crate::services::operations::{StatusOperation, StatusReport};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

/// statusコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct StatusCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// 設定ファイルのパス（省略時は既定）
    pub config_path: Option<PathBuf>,
    /// 対象環境
    pub env: String,
    /// 出力フォーマット
    pub format: OutputFormat,
}

impl CommandOutput for StatusReport {
    fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}\n",
            format!(
                "{:<20} {:<21} {}",
                "ID", "Applied At", "Description"
            )
            .bold()
        ));
        output.push_str(&format!("{}\n", "-".repeat(70)));

        for entry in &self.entries {
            let applied_at = match &entry.applied_at {
                Some(at) => format!("{:<21}", at).green().to_string(),
                None => format!("{:<21}", "...pending...").yellow().to_string(),
            };
            let mut line = format!(
                "{:<20} {} {}",
                entry.id.to_string(),
                applied_at,
                entry.description.as_deref().unwrap_or("")
            );
            if !entry.has_script {
                line.push_str(&format!(" {}", "(script missing)".red()));
            }
            output.push_str(&line);
            output.push('\n');
        }

        output.push('\n');
        output.push_str(&format!(
            "Applied: {}, Pending: {}\n",
            self.applied.to_string().green(),
            self.pending.to_string().yellow()
        ));

        if !self.drift.is_empty() {
            output.push('\n');
            for line in self.drift.lines() {
                output.push_str(&format!("{}\n", line.yellow()));
            }
        }

        output
    }
}

/// statusコマンドハンドラー
#[derive(Debug, Clone)]
pub struct StatusCommandHandler {}

impl StatusCommandHandler {
    /// 新しいStatusCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// statusコマンドを実行
    ///
    /// # Arguments
    ///
    /// * `command` - statusコマンドのパラメータ
    ///
    /// # Returns
    ///
    /// 成功時はマイグレーション状態の一覧、失敗時はエラーメッセージ
    pub async fn execute(&self, command: &StatusCommand) -> Result<String> {
        let context = CommandContext::load(command.project_path.clone(), command.config_path.clone())?;
        let scripts = context.load_scripts()?;
        let options = context.operation_options(&command.env)?;
        let mut conn = context.connect(&command.env).await?;

        let mut operation = StatusOperation::new(options, OutputSink::silent());
        let result = operation.run(&mut conn, &scripts).await;
        let _ = conn.close().await;

        let report = result.with_context(|| "Failed to read migration status")?;
        render_output(&report, &command.format)
    }
}

impl Default for StatusCommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

// スクリプト実行セッションのファクトリ
//
// 操作オプションと接続から、構成済みのScriptRunnerを組み立てる。
// エスケープ処理は常に無効（マイグレーションSQL内のプレースホルダー置換を避けるため）。

use crate::adapters::connection::MigrationConnection;
use crate::adapters::script_runner::{ScriptRunner, ScriptRunnerSettings};
use crate::core::error::OperationError;
use crate::core::options::OperationOptions;
use crate::core::output::OutputSink;
use tracing::debug;

/// スクリプト実行セッションのファクトリ
#[derive(Debug, Clone, Default)]
pub struct ScriptExecutorFactory;

impl ScriptExecutorFactory {
    pub fn new() -> Self {
        Self
    }

    /// 操作オプションからランナー設定を生成
    pub fn settings(&self, options: &OperationOptions) -> ScriptRunnerSettings {
        ScriptRunnerSettings {
            delimiter: options.delimiter.clone(),
            full_line_delimiter: options.full_line_delimiter,
            stop_on_error: options.stop_on_error,
            throw_warning: options.throw_warning,
            auto_commit: options.auto_commit,
            send_full_script: options.send_full_script,
            remove_crs: options.remove_crs,
            escape_processing: false,
        }
    }

    /// スクリプト実行セッションを構築
    ///
    /// # Arguments
    ///
    /// * `conn` - データベース接続（生存確認を行う）
    /// * `options` - 操作オプション
    /// * `output` - ログとエラーの出力先（silentの場合は出力しない）
    ///
    /// # Returns
    ///
    /// 構成済みのScriptRunner。構築できない場合は構成エラー
    pub async fn build<C>(
        &self,
        conn: &mut C,
        options: &OperationOptions,
        output: OutputSink,
    ) -> Result<ScriptRunner, OperationError>
    where
        C: MigrationConnection + ?Sized,
    {
        conn.ping()
            .await
            .map_err(|e| OperationError::configuration("Error creating script runner", e))?;

        let runner = ScriptRunner::new(self.settings(options), output)
            .map_err(|e| OperationError::configuration("Error creating script runner", e))?;

        debug!(settings = ?runner.settings(), "Script runner created");
        Ok(runner)
    }
}

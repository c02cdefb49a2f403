// up 操作
//
// 最後に適用されたチェンジより新しいスクリプトを、ID昇順で適用する。

use super::{DatabaseOperation, OperationState};
use crate::adapters::connection::MigrationConnection;
use crate::core::change::Change;
use crate::core::error::OperationError;
use crate::core::options::OperationOptions;
use crate::core::output::OutputSink;
use crate::services::script_discovery::MigrationScript;
use chrono::Duration;
use tracing::info;

/// up 操作の結果
#[derive(Debug, Clone)]
pub struct UpReport {
    /// 今回適用したチェンジと所要時間
    pub applied: Vec<(Change, Duration)>,
    /// ドリフトレポート（ドリフトが無い場合は空）
    pub drift: String,
    /// 実行前の未適用スクリプト数
    pub pending: usize,
}

impl UpReport {
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }
}

/// up 操作
#[derive(Debug)]
pub struct UpOperation {
    operation: DatabaseOperation,
    steps: Option<usize>,
}

impl UpOperation {
    /// 新しいup操作を作成
    ///
    /// `steps` を指定した場合、適用するスクリプト数をその件数までに制限します。
    pub fn new(options: OperationOptions, output: OutputSink, steps: Option<usize>) -> Self {
        Self {
            operation: DatabaseOperation::new(options, output),
            steps,
        }
    }

    /// 現在の状態
    pub fn state(&self) -> OperationState {
        self.operation.state()
    }

    /// 操作を実行
    ///
    /// # Arguments
    ///
    /// * `conn` - データベース接続
    /// * `scripts` - 利用可能なスクリプト（ID昇順）
    pub async fn run<C>(
        &mut self,
        conn: &mut C,
        scripts: &[MigrationScript],
    ) -> Result<UpReport, OperationError>
    where
        C: MigrationConnection + ?Sized,
    {
        let history = self.operation.load_history(conn).await?;
        let drift = self.operation.reconcile(&history, scripts)?;

        self.operation.transition(OperationState::ExecuteScripts);

        let last_applied = history.iter().max();
        let pending: Vec<&MigrationScript> = scripts
            .iter()
            .filter(|script| last_applied.is_none_or(|last| script.change > *last))
            .collect();
        let pending_count = pending.len();
        let limit = self.steps.unwrap_or(pending_count);

        let mut applied = Vec::new();
        for script in pending.into_iter().take(limit) {
            let started = chrono::Utc::now();
            let change = self.operation.apply_script(conn, script).await?;
            let elapsed = chrono::Utc::now().signed_duration_since(started);

            self.operation.output().println(&format!(
                "Applied {} ({}ms)",
                script.filename(),
                elapsed.num_milliseconds()
            ));
            applied.push((change, elapsed));
        }

        self.operation.transition(OperationState::Done);
        info!(applied = applied.len(), pending = pending_count, "Up operation completed");

        Ok(UpReport {
            applied,
            drift,
            pending: pending_count,
        })
    }
}

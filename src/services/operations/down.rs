// down 操作
//
// 最後に適用されたチェンジから順に、指定件数だけUNDOセクションを実行して取り消す。

use super::{DatabaseOperation, OperationState};
use crate::adapters::connection::MigrationConnection;
use crate::core::change::Change;
use crate::core::error::OperationError;
use crate::core::options::OperationOptions;
use crate::core::output::OutputSink;
use crate::services::script_discovery::MigrationScript;
use tracing::info;

/// down 操作の結果
#[derive(Debug, Clone)]
pub struct DownReport {
    /// 取り消したチェンジ（取り消した順）
    pub reverted: Vec<Change>,
    /// ドリフトレポート
    pub drift: String,
}

/// down 操作
#[derive(Debug)]
pub struct DownOperation {
    operation: DatabaseOperation,
    steps: usize,
}

impl DownOperation {
    /// 新しいdown操作を作成
    pub fn new(options: OperationOptions, output: OutputSink, steps: usize) -> Self {
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
    pub async fn run<C>(
        &mut self,
        conn: &mut C,
        scripts: &[MigrationScript],
    ) -> Result<DownReport, OperationError>
    where
        C: MigrationConnection + ?Sized,
    {
        let history = self.operation.load_history(conn).await?;
        let drift = self.operation.reconcile(&history, scripts)?;

        self.operation.transition(OperationState::ExecuteScripts);

        let mut reverted = Vec::new();
        for change in history.iter().rev().take(self.steps) {
            let Some(script) = scripts.iter().find(|script| script.change == *change) else {
                return self.operation.fail(OperationError::Discovery {
                    message: format!(
                        "Cannot undo change {}: migration script '{}' not found",
                        change.id(),
                        change.filename()
                    ),
                });
            };

            self.operation.revert_script(conn, change, script).await?;
            self.operation
                .output()
                .println(&format!("Undid {}", script.filename()));
            reverted.push(change.clone());
        }

        self.operation.transition(OperationState::Done);
        info!(reverted = reverted.len(), "Down operation completed");

        Ok(DownReport { reverted, drift })
    }
}

// status 操作
//
// 適用履歴とスクリプトを突き合わせ、各チェンジの適用状況とドリフトを報告する。

use super::{DatabaseOperation, OperationState};
use crate::adapters::connection::MigrationConnection;
use crate::core::change::{Change, ChangeId};
use crate::core::error::OperationError;
use crate::core::options::OperationOptions;
use crate::core::output::OutputSink;
use crate::services::script_discovery::MigrationScript;
use serde::Serialize;
use std::collections::BTreeMap;

/// status のエントリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub id: ChangeId,
    /// 適用日時（未適用の場合はNone）
    pub applied_at: Option<String>,
    pub description: Option<String>,
    pub filename: String,
    /// スクリプトが存在するか
    pub has_script: bool,
}

/// status 操作の結果
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub entries: Vec<StatusEntry>,
    pub applied: usize,
    pub pending: usize,
    pub drift: String,
}

/// status 操作
#[derive(Debug)]
pub struct StatusOperation {
    operation: DatabaseOperation,
}

impl StatusOperation {
    pub fn new(options: OperationOptions, output: OutputSink) -> Self {
        Self {
            operation: DatabaseOperation::new(options, output),
        }
    }

    /// 現在の状態
    pub fn state(&self) -> OperationState {
        self.operation.state()
    }

    /// 操作を実行
    ///
    /// strictモードでもドリフトはエラーにせず、レポートに含めます。
    pub async fn run<C>(
        &mut self,
        conn: &mut C,
        scripts: &[MigrationScript],
    ) -> Result<StatusReport, OperationError>
    where
        C: MigrationConnection + ?Sized,
    {
        let history = self.operation.load_history(conn).await?;

        self.operation.transition(OperationState::Reconcile);
        let available: Vec<Change> = scripts.iter().map(|s| s.change.clone()).collect();
        let drift = self.operation.reconciler.diagnose(&history, &available);

        let mut merged: BTreeMap<ChangeId, StatusEntry> = BTreeMap::new();
        for script in scripts {
            merged.insert(
                script.change.id().clone(),
                StatusEntry {
                    id: script.change.id().clone(),
                    applied_at: None,
                    description: script.change.description().map(str::to_string),
                    filename: script.filename(),
                    has_script: true,
                },
            );
        }
        for change in &history {
            let entry = merged
                .entry(change.id().clone())
                .or_insert_with(|| StatusEntry {
                    id: change.id().clone(),
                    applied_at: None,
                    description: change.description().map(str::to_string),
                    filename: change.filename(),
                    has_script: false,
                });
            entry.applied_at = change.applied_at().map(str::to_string);
        }

        let entries: Vec<StatusEntry> = merged.into_values().collect();
        let applied = entries.iter().filter(|e| e.applied_at.is_some()).count();
        let pending = entries.len() - applied;

        self.operation.transition(OperationState::Done);

        Ok(StatusReport {
            entries,
            applied,
            pending,
            drift,
        })
    }
}

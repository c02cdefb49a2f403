// データベース操作（オーケストレーター）
//
// チェンジログの読み込み → 照合 → スクリプト実行 → 記録 の流れを
// 状態機械として管理する。各操作（up / down / status）はこれを組み合わせる。

mod down;
mod status;
mod up;

pub use down::{DownOperation, DownReport};
pub use status::{StatusEntry, StatusOperation, StatusReport};
pub use up::{UpOperation, UpReport};

use crate::adapters::connection::MigrationConnection;
use crate::core::change::Change;
use crate::core::error::OperationError;
use crate::core::options::OperationOptions;
use crate::core::output::OutputSink;
use crate::services::changelog_store::ChangelogStore;
use crate::services::reconciler::Reconciler;
use crate::services::script_discovery::MigrationScript;
use crate::services::script_executor_factory::ScriptExecutorFactory;
use std::fmt;
use tracing::{debug, info, warn};

/// 操作の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Start,
    LoadHistory,
    Reconcile,
    ExecuteScripts,
    Done,
    Failed,
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationState::Start => "start",
            OperationState::LoadHistory => "load_history",
            OperationState::Reconcile => "reconcile",
            OperationState::ExecuteScripts => "execute_scripts",
            OperationState::Done => "done",
            OperationState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// データベース操作の共通部分
///
/// 1回の呼び出しにつき1つの接続を排他的に使用します。呼び出し間で状態は
/// 共有せず、毎回チェンジログを読み直します。
#[derive(Debug)]
pub struct DatabaseOperation {
    options: OperationOptions,
    output: OutputSink,
    store: ChangelogStore,
    reconciler: Reconciler,
    factory: ScriptExecutorFactory,
    state: OperationState,
}

impl DatabaseOperation {
    /// 新しい操作を作成
    pub fn new(options: OperationOptions, output: OutputSink) -> Self {
        Self {
            options,
            output,
            store: ChangelogStore::new(),
            reconciler: Reconciler::new(),
            factory: ScriptExecutorFactory::new(),
            state: OperationState::Start,
        }
    }

    /// 現在の状態
    pub fn state(&self) -> OperationState {
        self.state
    }

    pub fn options(&self) -> &OperationOptions {
        &self.options
    }

    pub fn output(&self) -> &OutputSink {
        &self.output
    }

    fn transition(&mut self, next: OperationState) {
        debug!(from = %self.state, to = %next, "Operation state transition");
        self.state = next;
    }

    /// 失敗状態へ遷移してエラーを返す
    fn fail<T>(&mut self, error: OperationError) -> Result<T, OperationError> {
        warn!(state = %self.state, error = %error, "Operation failed");
        self.transition(OperationState::Failed);
        Err(error)
    }

    /// 適用履歴を読み込む
    ///
    /// チェンジログテーブルが無い場合は初回実行とみなし、空の履歴を返します。
    async fn load_history<C>(&mut self, conn: &mut C) -> Result<Vec<Change>, OperationError>
    where
        C: MigrationConnection + ?Sized,
    {
        self.transition(OperationState::LoadHistory);

        if !self.store.table_exists(conn, &self.options).await {
            info!(table = %self.options.changelog_table, "Changelog table not found, assuming first run");
            return Ok(Vec::new());
        }

        match self.store.load_history(conn, &self.options).await {
            Ok(history) => Ok(history),
            Err(e) => self.fail(e),
        }
    }

    /// 適用履歴とスクリプトを照合する
    ///
    /// ドリフトは警告として出力し、strictモードの場合のみエラーとします。
    fn reconcile(
        &mut self,
        history: &[Change],
        scripts: &[MigrationScript],
    ) -> Result<String, OperationError> {
        self.transition(OperationState::Reconcile);

        let available: Vec<Change> = scripts.iter().map(|s| s.change.clone()).collect();
        let report = self.reconciler.diagnose(history, &available);

        if !report.is_empty() {
            for line in report.lines() {
                warn!("{}", line);
            }
            if self.options.strict {
                return self.fail(OperationError::Drift { report });
            }
            self.output.println(report.trim_end());
        }

        Ok(report)
    }

    /// スクリプトを1件適用する
    ///
    /// スクリプト実行とチェンジログへの記録を1つの単位として扱い、どちらかが
    /// 失敗した場合はロールバックして失敗状態へ遷移します。
    async fn apply_script<C>(
        &mut self,
        conn: &mut C,
        script: &MigrationScript,
    ) -> Result<Change, OperationError>
    where
        C: MigrationConnection + ?Sized,
    {
        let result = self.apply_script_unit(conn, script).await;
        match result {
            Ok(applied) => Ok(applied),
            Err(e) => {
                rollback_quietly(conn).await;
                self.fail(e)
            }
        }
    }

    async fn apply_script_unit<C>(
        &mut self,
        conn: &mut C,
        script: &MigrationScript,
    ) -> Result<Change, OperationError>
    where
        C: MigrationConnection + ?Sized,
    {
        let runner = self
            .factory
            .build(conn, &self.options, self.output.clone())
            .await?;

        self.begin_unit(conn).await?;

        info!(id = %script.change.id(), script = %script.filename(), "Applying migration script");
        runner
            .run_script(conn, &script.filename(), script.do_section())
            .await?;

        self.store
            .record_application(conn, &script.change, &self.options)
            .await
    }

    /// スクリプトを1件取り消す
    ///
    /// チェンジログからの記録削除とUNDOセクションの実行を1つの単位として扱います。
    async fn revert_script<C>(
        &mut self,
        conn: &mut C,
        change: &Change,
        script: &MigrationScript,
    ) -> Result<(), OperationError>
    where
        C: MigrationConnection + ?Sized,
    {
        let result = self.revert_script_unit(conn, change, script).await;
        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                rollback_quietly(conn).await;
                self.fail(e)
            }
        }
    }

    /// トランザクション内では記録を先に削除してからUNDOセクションを実行する。
    /// UNDOセクションがチェンジログテーブル自体を削除しても確定できる。
    /// 自動コミットの場合はUNDOセクションの成功後に削除する。
    async fn revert_script_unit<C>(
        &mut self,
        conn: &mut C,
        change: &Change,
        script: &MigrationScript,
    ) -> Result<(), OperationError>
    where
        C: MigrationConnection + ?Sized,
    {
        let runner = self
            .factory
            .build(conn, &self.options, self.output.clone())
            .await?;

        info!(id = %change.id(), script = %script.filename(), "Reverting migration script");

        if self.options.auto_commit {
            runner
                .run_script(conn, &script.filename(), script.undo_section())
                .await?;
            if self.store.table_exists(conn, &self.options).await {
                self.store
                    .remove_application(conn, change, &self.options)
                    .await?;
            }
            return Ok(());
        }

        self.begin_unit(conn).await?;
        self.store
            .remove_application(conn, change, &self.options)
            .await?;
        runner
            .run_script(conn, &script.filename(), script.undo_section())
            .await?;

        conn.commit().await.map_err(|e| {
            OperationError::persistence(format!("Error committing undo of change {}", change.id()), e)
        })
    }

    async fn begin_unit<C>(&self, conn: &mut C) -> Result<(), OperationError>
    where
        C: MigrationConnection + ?Sized,
    {
        if self.options.auto_commit {
            return Ok(());
        }
        conn.begin()
            .await
            .map_err(|e| OperationError::persistence("Error starting transaction", e))
    }
}

async fn rollback_quietly<C>(conn: &mut C)
where
    C: MigrationConnection + ?Sized,
{
    if let Err(e) = conn.rollback().await {
        warn!(error = %e, "Rollback after failed migration unit did not succeed");
    }
}

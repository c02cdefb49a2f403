// データベース操作オプション
//
// チェンジログテーブル名とスクリプト実行セッションの設定をまとめた値。

use crate::core::config::Dialect;
use crate::core::naming;

/// データベース操作オプション
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationOptions {
    /// データベース方言（プレースホルダー形式とDDLに影響）
    pub dialect: Dialect,
    /// チェンジログテーブル名
    pub changelog_table: String,
    /// ステートメント区切り文字
    pub delimiter: String,
    /// 区切り文字が単独行である必要があるか
    pub full_line_delimiter: bool,
    /// スクリプト全体を1ステートメントとして送信するか
    pub send_full_script: bool,
    /// ステートメント毎に自動コミットするか
    pub auto_commit: bool,
    /// エラー発生時に停止するか
    pub stop_on_error: bool,
    /// SQL警告をエラーとして扱うか
    pub throw_warning: bool,
    /// 実行前にCRを除去するか
    pub remove_crs: bool,
    /// ドリフト警告を致命的エラーとして扱うか
    pub strict: bool,
}

impl OperationOptions {
    /// 方言を指定して既定値で作成
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }
}

impl Default for OperationOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            changelog_table: naming::CHANGELOG_TABLE.to_string(),
            delimiter: ";".to_string(),
            full_line_delimiter: false,
            send_full_script: false,
            auto_commit: false,
            stop_on_error: true,
            throw_warning: true,
            remove_crs: false,
            strict: false,
        }
    }
}

// エラー型定義
//
// アプリケーション全体で使用されるカスタムエラー型を提供します。
// thiserrorを使用して、DatabaseError, ScriptExecutionError, OperationError を定義します。

use thiserror::Error;

/// データベースエラー
///
/// 接続アダプター層で発生するエラーを表現します。
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Connection error
    #[error("Database connection error: {message} (cause: {cause})")]
    Connection {
        /// エラーメッセージ
        message: String,
        /// エラー原因
        cause: String,
    },

    /// Query execution error
    #[error("Query execution error: {message}")]
    Query {
        /// エラーメッセージ
        message: String,
        /// 失敗したSQL
        sql: Option<String>,
    },

    /// Transaction error
    #[error("Transaction error: {message}")]
    Transaction {
        /// エラーメッセージ
        message: String,
    },

    /// Column decode error
    #[error("Failed to decode column '{column}': {message}")]
    Decode {
        /// カラム名
        column: String,
        /// エラーメッセージ
        message: String,
    },
}

impl DatabaseError {
    /// 接続エラーかどうか
    pub fn is_connection(&self) -> bool {
        matches!(self, DatabaseError::Connection { .. })
    }

    /// クエリエラーかどうか
    pub fn is_query(&self) -> bool {
        matches!(self, DatabaseError::Query { .. })
    }

    /// トランザクションエラーかどうか
    pub fn is_transaction(&self) -> bool {
        matches!(self, DatabaseError::Transaction { .. })
    }

    /// デコードエラーかどうか
    pub fn is_decode(&self) -> bool {
        matches!(self, DatabaseError::Decode { .. })
    }
}

/// スクリプト実行エラー
///
/// マイグレーションスクリプトの実行中に発生したエラーを表現します。
#[derive(Debug, Clone, Error)]
#[error("Migration script {script} failed: {error}")]
pub struct ScriptExecutionError {
    /// スクリプト名
    pub script: String,
    /// エラーメッセージ
    pub error: String,
    /// 失敗したSQL文
    pub sql_statement: Option<String>,
}

impl ScriptExecutionError {
    /// 新しいスクリプト実行エラーを作成
    pub fn new(script: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            error: error.into(),
            sql_statement: None,
        }
    }

    /// SQL文を指定してスクリプト実行エラーを作成
    pub fn with_sql(
        script: impl Into<String>,
        error: impl Into<String>,
        sql_statement: impl Into<String>,
    ) -> Self {
        Self {
            script: script.into(),
            error: error.into(),
            sql_statement: Some(sql_statement.into()),
        }
    }

    /// SQL文が含まれているかどうか
    pub fn has_sql_statement(&self) -> bool {
        self.sql_statement.is_some()
    }
}

/// 区切り文字の設定エラー
#[derive(Debug, Clone, Error)]
#[error("Invalid delimiter '{delimiter}': {reason}")]
pub struct DelimiterError {
    /// 指定された区切り文字
    pub delimiter: String,
    /// 不正な理由
    pub reason: String,
}

/// マイグレーション操作エラー
///
/// チェンジログの読み書き、スクリプト実行セッションの構築、
/// スクリプト実行、ドリフト検出（strictモード時）の失敗を区別して表現します。
#[derive(Debug, Error)]
pub enum OperationError {
    /// Changelog read/write failure
    #[error("{message}. Cause: {cause}")]
    Persistence {
        /// 試行していた操作
        message: String,
        /// エラー原因
        cause: String,
    },

    /// Script session construction failure
    #[error("{message}. Cause: {cause}")]
    Configuration {
        /// 試行していた操作
        message: String,
        /// エラー原因
        cause: String,
    },

    /// Migration script failure
    #[error(transparent)]
    ScriptExecution(#[from] ScriptExecutionError),

    /// Drift escalated by strict mode
    #[error("Changelog drift detected in strict mode:\n{report}")]
    Drift {
        /// ドリフトレポート
        report: String,
    },

    /// Migration script directory problem
    #[error("{message}")]
    Discovery {
        /// エラーメッセージ
        message: String,
    },
}

impl OperationError {
    /// 永続化エラーを作成
    pub fn persistence(message: impl Into<String>, cause: impl ToString) -> Self {
        OperationError::Persistence {
            message: message.into(),
            cause: cause.to_string(),
        }
    }

    /// 構成エラーを作成
    pub fn configuration(message: impl Into<String>, cause: impl ToString) -> Self {
        OperationError::Configuration {
            message: message.into(),
            cause: cause.to_string(),
        }
    }

    /// 永続化エラーかどうか
    pub fn is_persistence(&self) -> bool {
        matches!(self, OperationError::Persistence { .. })
    }

    /// 構成エラーかどうか
    pub fn is_configuration(&self) -> bool {
        matches!(self, OperationError::Configuration { .. })
    }

    /// スクリプト実行エラーかどうか
    pub fn is_script_execution(&self) -> bool {
        matches!(self, OperationError::ScriptExecution(_))
    }

    /// ドリフトエラーかどうか
    pub fn is_drift(&self) -> bool {
        matches!(self, OperationError::Drift { .. })
    }

    /// スクリプト探索エラーかどうか
    pub fn is_discovery(&self) -> bool {
        matches!(self, OperationError::Discovery { .. })
    }
}

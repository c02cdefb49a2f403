// データベース接続アダプター
//
// SQLxを使用したデータベース接続の確立を行います。
// マイグレーション操作は単一の接続を排他的に使用するため、プールではなく
// 1本の接続を返します。

use crate::adapters::connection::SqlxConnection;
use crate::adapters::connection_string::build_connection_string;
use crate::core::config::{DatabaseConfig, Dialect};
use crate::core::error::DatabaseError;
use sqlx::{AnyConnection, Connection};
use std::time::Duration;
use tracing::debug;

/// 既定の接続タイムアウト（秒）
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// データベース接続サービス
#[derive(Debug, Clone)]
pub struct DatabaseConnectionService {}

impl DatabaseConnectionService {
    /// 新しいDatabaseConnectionServiceを作成
    pub fn new() -> Self {
        Self {}
    }

    /// データベース接続文字列を構築
    pub fn build_connection_string(&self, dialect: Dialect, config: &DatabaseConfig) -> String {
        build_connection_string(dialect, config)
    }

    /// データベースに接続
    ///
    /// # Arguments
    ///
    /// * `dialect` - データベース方言
    /// * `config` - データベース設定
    ///
    /// # Returns
    ///
    /// マイグレーション用の接続またはエラー
    pub async fn connect(
        &self,
        dialect: Dialect,
        config: &DatabaseConfig,
    ) -> Result<SqlxConnection, DatabaseError> {
        sqlx::any::install_default_drivers();

        let connection_string = self.build_connection_string(dialect, config);
        let timeout = Duration::from_secs(config.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS));
        debug!(dialect = %dialect, timeout_secs = timeout.as_secs(), "Connecting to database");

        let conn = tokio::time::timeout(timeout, AnyConnection::connect(&connection_string))
            .await
            .map_err(|_| DatabaseError::Connection {
                message: format!("Failed to connect to {} database", dialect),
                cause: format!("timed out after {}s", timeout.as_secs()),
            })?
            .map_err(|e| DatabaseError::Connection {
                message: format!("Failed to connect to {} database", dialect),
                cause: e.to_string(),
            })?;

        Ok(SqlxConnection::new(conn, dialect))
    }
}

impl Default for DatabaseConnectionService {
    fn default() -> Self {
        Self::new()
    }
}

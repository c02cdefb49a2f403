// マイグレーション用データベース接続
//
// チェンジログの読み書き（行ランナー）とスクリプト実行が利用する接続の抽象化。
// SQLxのAnyConnectionを使用した実装を提供します。

use crate::core::config::Dialect;
use crate::core::error::DatabaseError;
use async_trait::async_trait;
use sqlx::any::AnyRow;
use sqlx::{AnyConnection, Column, Connection, Executor, Row};
use std::collections::HashMap;
use tracing::debug;

/// SQLの値
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlValue {
    /// 文字列表現を取得（NULLの場合はNone）
    pub fn as_text(&self) -> Option<String> {
        match self {
            SqlValue::Null => None,
            SqlValue::Integer(value) => Some(value.to_string()),
            SqlValue::Real(value) => Some(value.to_string()),
            SqlValue::Text(value) => Some(value.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

/// 1行分の結果（大文字のカラム名 → 値）
pub type SqlRow = HashMap<String, SqlValue>;

/// マイグレーション用データベース接続
///
/// 接続は1つの操作に排他的に借用されます。トランザクションは
/// `begin` で明示的に開始した場合のみ存在し、`commit` / `rollback` は
/// トランザクションが無い場合は何もしません。
#[async_trait]
pub trait MigrationConnection: Send {
    /// 接続先の方言
    fn dialect(&self) -> Dialect;

    /// パラメータ付きステートメントを実行し、影響行数を返す
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, DatabaseError>;

    /// クエリを実行し、全行を返す
    async fn query_all(&mut self, sql: &str) -> Result<Vec<SqlRow>, DatabaseError>;

    /// プリペアせずにステートメントを実行する（プレースホルダー置換なし）
    async fn run_statement(&mut self, sql: &str) -> Result<u64, DatabaseError>;

    /// 直前のステートメントで発生したサーバー警告
    async fn warnings(&mut self) -> Result<Vec<String>, DatabaseError>;

    /// トランザクションを開始
    async fn begin(&mut self) -> Result<(), DatabaseError>;

    /// トランザクションをコミット
    async fn commit(&mut self) -> Result<(), DatabaseError>;

    /// トランザクションをロールバック
    async fn rollback(&mut self) -> Result<(), DatabaseError>;

    /// 接続の生存確認
    async fn ping(&mut self) -> Result<(), DatabaseError>;
}

/// SQLxベースの接続
#[derive(Debug)]
pub struct SqlxConnection {
    conn: AnyConnection,
    dialect: Dialect,
    in_transaction: bool,
}

impl SqlxConnection {
    /// 確立済みの接続をラップ
    pub fn new(conn: AnyConnection, dialect: Dialect) -> Self {
        Self {
            conn,
            dialect,
            in_transaction: false,
        }
    }

    /// トランザクション中かどうか
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// 接続を閉じる
    pub async fn close(self) -> Result<(), DatabaseError> {
        self.conn
            .close()
            .await
            .map_err(|e| DatabaseError::Connection {
                message: "Failed to close database connection".to_string(),
                cause: e.to_string(),
            })
    }

    async fn run_transaction_sql(&mut self, sql: &str) -> Result<(), DatabaseError> {
        Executor::execute(&mut self.conn, sql)
            .await
            .map(|_| ())
            .map_err(|e| DatabaseError::Transaction {
                message: format!("{} failed: {}", sql, e),
            })
    }
}

#[async_trait]
impl MigrationConnection for SqlxConnection {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, DatabaseError> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = match param {
                SqlValue::Null => query.bind(Option::<String>::None),
                SqlValue::Integer(value) => query.bind(*value),
                SqlValue::Real(value) => query.bind(*value),
                SqlValue::Text(value) => query.bind(value.clone()),
            };
        }

        let result = query
            .execute(&mut self.conn)
            .await
            .map_err(|e| DatabaseError::Query {
                message: e.to_string(),
                sql: Some(sql.to_string()),
            })?;

        Ok(result.rows_affected())
    }

    async fn query_all(&mut self, sql: &str) -> Result<Vec<SqlRow>, DatabaseError> {
        let rows = sqlx::query(sql)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| DatabaseError::Query {
                message: e.to_string(),
                sql: Some(sql.to_string()),
            })?;

        rows.iter().map(map_row).collect()
    }

    async fn run_statement(&mut self, sql: &str) -> Result<u64, DatabaseError> {
        // 引数なしの&strはプリペアされずにそのまま送信される
        let result = Executor::execute(&mut self.conn, sql)
            .await
            .map_err(|e| DatabaseError::Query {
                message: e.to_string(),
                sql: Some(sql.to_string()),
            })?;

        Ok(result.rows_affected())
    }

    async fn warnings(&mut self) -> Result<Vec<String>, DatabaseError> {
        // サーバー警告を取得できるのはMySQLのみ
        if self.dialect != Dialect::MySQL {
            return Ok(Vec::new());
        }

        let rows = Executor::fetch_all(&mut self.conn, "SHOW WARNINGS")
            .await
            .map_err(|e| DatabaseError::Query {
                message: e.to_string(),
                sql: Some("SHOW WARNINGS".to_string()),
            })?;

        let mut warnings = Vec::new();
        for row in &rows {
            let row = map_row(row)?;
            let field = |name: &str| {
                row.get(name)
                    .and_then(SqlValue::as_text)
                    .unwrap_or_default()
            };
            warnings.push(format!(
                "{} {}: {}",
                field("LEVEL"),
                field("CODE"),
                field("MESSAGE")
            ));
        }

        Ok(warnings)
    }

    async fn begin(&mut self) -> Result<(), DatabaseError> {
        if self.in_transaction {
            return Ok(());
        }
        self.run_transaction_sql("BEGIN").await?;
        self.in_transaction = true;
        debug!("Transaction started");
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DatabaseError> {
        if !self.in_transaction {
            return Ok(());
        }
        self.in_transaction = false;
        self.run_transaction_sql("COMMIT").await?;
        debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DatabaseError> {
        if !self.in_transaction {
            return Ok(());
        }
        self.in_transaction = false;
        self.run_transaction_sql("ROLLBACK").await?;
        debug!("Transaction rolled back");
        Ok(())
    }

    async fn ping(&mut self) -> Result<(), DatabaseError> {
        self.conn
            .ping()
            .await
            .map_err(|e| DatabaseError::Connection {
                message: "Database connection is not usable".to_string(),
                cause: e.to_string(),
            })
    }
}

/// AnyRowをカラム名（大文字）→値のマップに変換
fn map_row(row: &AnyRow) -> Result<SqlRow, DatabaseError> {
    let mut mapped = SqlRow::new();
    for column in row.columns() {
        let index = column.ordinal();
        let value = if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
            value.map_or(SqlValue::Null, SqlValue::Integer)
        } else if let Ok(value) = row.try_get::<Option<f64>, _>(index) {
            value.map_or(SqlValue::Null, SqlValue::Real)
        } else if let Ok(value) = row.try_get::<Option<String>, _>(index) {
            value.map_or(SqlValue::Null, SqlValue::Text)
        } else {
            return Err(DatabaseError::Decode {
                column: column.name().to_string(),
                message: "unsupported column type".to_string(),
            });
        };
        mapped.insert(column.name().to_uppercase(), value);
    }
    Ok(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_value_as_text() {
        assert_eq!(SqlValue::Null.as_text(), None);
        assert_eq!(SqlValue::Integer(42).as_text(), Some("42".to_string()));
        assert_eq!(SqlValue::Real(1.5).as_text(), Some("1.5".to_string()));
        assert_eq!(
            SqlValue::Text("abc".to_string()).as_text(),
            Some("abc".to_string())
        );
        assert!(SqlValue::Null.is_null());
    }
}

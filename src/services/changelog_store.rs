// チェンジログストア
//
// チェンジログテーブルに対するチェンジレコードの読み書きを担当するサービス。
// 行ランナー（MigrationConnection）を通じてSQLを発行し、失敗は操作内容を
// 付加した永続化エラーとして返します。

use crate::adapters::connection::{MigrationConnection, SqlRow, SqlValue};
use crate::core::change::{generate_applied_timestamp, Change, ChangeId};
use crate::core::config::Dialect;
use crate::core::error::OperationError;
use crate::core::options::OperationOptions;
use tracing::{debug, info};

/// チェンジログストア
#[derive(Debug, Clone)]
pub struct ChangelogStore {}

impl ChangelogStore {
    /// 新しいChangelogStoreを作成
    pub fn new() -> Self {
        Self {}
    }

    /// チェンジログテーブル作成SQLを生成
    ///
    /// `init` が最初のスクリプトに書き出すDDLです。IDは10進数をそのまま
    /// 保持できる型で作成します（SQLiteは数値アフィニティで丸められるためTEXT）。
    pub fn generate_create_table_sql(&self, options: &OperationOptions) -> String {
        let id_type = match options.dialect {
            Dialect::PostgreSQL => "NUMERIC",
            Dialect::MySQL => MYSQL_ID_TYPE,
            Dialect::SQLite => "TEXT",
        };
        format!(
            "CREATE TABLE {} (\n    ID {} NOT NULL PRIMARY KEY,\n    APPLIED_AT VARCHAR(25) NOT NULL,\n    DESCRIPTION VARCHAR(255) NOT NULL\n)",
            options.changelog_table, id_type
        )
    }

    /// チェンジログテーブル削除SQLを生成
    pub fn generate_drop_table_sql(&self, options: &OperationOptions) -> String {
        format!("DROP TABLE {}", options.changelog_table)
    }

    /// チェンジ記録のINSERT SQLを生成（3つの位置パラメータ）
    pub fn generate_insert_sql(&self, options: &OperationOptions) -> String {
        let dialect = options.dialect;
        format!(
            "insert into {} (ID, APPLIED_AT, DESCRIPTION) values ({},{},{})",
            options.changelog_table,
            id_value_sql(dialect, 1),
            dialect.placeholder(2),
            dialect.placeholder(3)
        )
    }

    /// チェンジ削除のDELETE SQLを生成
    pub fn generate_delete_sql(&self, options: &OperationOptions) -> String {
        format!(
            "delete from {} where ID = {}",
            options.changelog_table,
            id_value_sql(options.dialect, 1)
        )
    }

    /// 適用履歴取得のSELECT SQLを生成（ID昇順）
    pub fn generate_select_history_sql(&self, options: &OperationOptions) -> String {
        format!("{} order by ID", self.generate_probe_sql(options))
    }

    /// テーブル存在確認用のSELECT SQLを生成（順序指定なし）
    pub fn generate_probe_sql(&self, options: &OperationOptions) -> String {
        let id_column = match options.dialect {
            Dialect::PostgreSQL => "CAST(ID AS VARCHAR) AS ID",
            Dialect::MySQL => "CAST(ID AS CHAR) AS ID",
            Dialect::SQLite => "ID",
        };
        format!(
            "select {}, APPLIED_AT, DESCRIPTION from {}",
            id_column, options.changelog_table
        )
    }

    /// チェンジの適用を記録
    ///
    /// 現在時刻で適用日時を付与した行をINSERTし、囲んでいるトランザクションを
    /// コミットします。
    ///
    /// # Returns
    ///
    /// 適用済みとなったチェンジ。失敗した場合は永続化エラー
    pub async fn record_application<C>(
        &self,
        conn: &mut C,
        change: &Change,
        options: &OperationOptions,
    ) -> Result<Change, OperationError>
    where
        C: MigrationConnection + ?Sized,
    {
        let applied = change.applied(generate_applied_timestamp());
        let sql = self.generate_insert_sql(options);
        let params = [
            id_param(applied.id()),
            applied
                .applied_at()
                .map_or(SqlValue::Null, |at| SqlValue::Text(at.to_string())),
            applied
                .description()
                .map_or(SqlValue::Null, |d| SqlValue::Text(d.to_string())),
        ];

        conn.execute(&sql, &params).await.map_err(|e| {
            OperationError::persistence(
                format!("Error recording change {} in {}", applied.id(), options.changelog_table),
                e,
            )
        })?;

        conn.commit().await.map_err(|e| {
            OperationError::persistence(
                format!("Error committing change {}", applied.id()),
                e,
            )
        })?;

        info!(id = %applied.id(), applied_at = ?applied.applied_at(), "Recorded change");
        Ok(applied)
    }

    /// チェンジの適用記録を削除
    ///
    /// コミットは行いません。囲んでいるトランザクションの確定は呼び出し側が行います。
    pub async fn remove_application<C>(
        &self,
        conn: &mut C,
        change: &Change,
        options: &OperationOptions,
    ) -> Result<(), OperationError>
    where
        C: MigrationConnection + ?Sized,
    {
        let sql = self.generate_delete_sql(options);

        conn.execute(&sql, &[id_param(change.id())])
            .await
            .map_err(|e| {
                OperationError::persistence(
                    format!("Error removing change {} from {}", change.id(), options.changelog_table),
                    e,
                )
            })?;

        info!(id = %change.id(), "Removed change");
        Ok(())
    }

    /// 適用履歴をID昇順で取得
    pub async fn load_history<C>(
        &self,
        conn: &mut C,
        options: &OperationOptions,
    ) -> Result<Vec<Change>, OperationError>
    where
        C: MigrationConnection + ?Sized,
    {
        let sql = self.generate_select_history_sql(options);

        let rows = conn.query_all(&sql).await.map_err(|e| {
            OperationError::persistence(
                format!("Error querying changelog table {}", options.changelog_table),
                e,
            )
        })?;

        let mut changes = rows
            .iter()
            .map(row_to_change)
            .collect::<Result<Vec<_>, _>>()?;
        // TEXT列ではSQLの並びが文字列順になるため、数値順に並べ直す
        changes.sort_by(|a, b| a.id().cmp(b.id()));

        debug!(count = changes.len(), "Loaded changelog history");
        Ok(changes)
    }

    /// チェンジログテーブルが存在するか確認
    ///
    /// 初回実行ではテーブルが無いことが想定されるため、どのような失敗も
    /// `false` として扱います。
    pub async fn table_exists<C>(&self, conn: &mut C, options: &OperationOptions) -> bool
    where
        C: MigrationConnection + ?Sized,
    {
        let sql = self.generate_probe_sql(options);
        match conn.query_all(&sql).await {
            Ok(_) => true,
            Err(e) => {
                debug!(table = %options.changelog_table, error = %e, "Changelog table probe failed");
                false
            }
        }
    }
}

impl Default for ChangelogStore {
    fn default() -> Self {
        Self::new()
    }
}

/// MySQLのID列型（整数部35桁・小数部30桁）
const MYSQL_ID_TYPE: &str = "DECIMAL(65,30)";

/// IDのバインド値
///
/// 精度を失わないよう常に10進表記の文字列として渡します。
fn id_param(id: &ChangeId) -> SqlValue {
    SqlValue::Text(id.to_string())
}

/// IDパラメータのSQL表現（数値列には文字列からキャストする）
fn id_value_sql(dialect: Dialect, index: usize) -> String {
    let placeholder = dialect.placeholder(index);
    match dialect {
        Dialect::PostgreSQL => format!("CAST({} AS NUMERIC)", placeholder),
        Dialect::MySQL => format!("CAST({} AS {})", placeholder, MYSQL_ID_TYPE),
        Dialect::SQLite => placeholder,
    }
}

/// 小数部の末尾の0を取り除く（DECIMAL列は固定スケールで返るため）
fn trim_id_text(raw: &str) -> &str {
    let raw = raw.trim();
    if raw.contains('.') {
        raw.trim_end_matches('0').trim_end_matches('.')
    } else {
        raw
    }
}

fn row_to_change(row: &SqlRow) -> Result<Change, OperationError> {
    let column = |name: &str| row.get(name).and_then(SqlValue::as_text);

    let raw_id = column("ID").ok_or_else(|| {
        OperationError::persistence("Malformed changelog row", "ID column is null or missing")
    })?;
    let id: ChangeId = trim_id_text(&raw_id).parse().map_err(|e| {
        OperationError::persistence(format!("Malformed changelog ID '{}'", raw_id), e)
    })?;

    Ok(Change::from_history(
        id,
        column("APPLIED_AT"),
        column("DESCRIPTION"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_options() -> OperationOptions {
        OperationOptions::new(Dialect::SQLite)
    }

    #[test]
    fn test_generate_insert_sql_sqlite() {
        let store = ChangelogStore::new();
        let sql = store.generate_insert_sql(&sqlite_options());

        assert_eq!(
            sql,
            "insert into CHANGELOG (ID, APPLIED_AT, DESCRIPTION) values (?,?,?)"
        );
    }

    #[test]
    fn test_generate_insert_sql_postgres() {
        let store = ChangelogStore::new();
        let mut options = OperationOptions::new(Dialect::PostgreSQL);
        options.changelog_table = "app_changelog".to_string();

        let sql = store.generate_insert_sql(&options);
        assert!(sql.starts_with("insert into app_changelog"));
        assert!(sql.contains("(CAST($1 AS NUMERIC),$2,$3)"));
    }

    #[test]
    fn test_generate_select_sql() {
        let store = ChangelogStore::new();
        let options = sqlite_options();

        assert_eq!(
            store.generate_select_history_sql(&options),
            "select ID, APPLIED_AT, DESCRIPTION from CHANGELOG order by ID"
        );
        assert!(!store.generate_probe_sql(&options).contains("order by"));
    }

    #[test]
    fn test_generate_create_table_sql() {
        let store = ChangelogStore::new();
        let sql = store.generate_create_table_sql(&OperationOptions::new(Dialect::PostgreSQL));

        assert!(sql.contains("CREATE TABLE CHANGELOG"));
        assert!(sql.contains("ID NUMERIC NOT NULL PRIMARY KEY"));
        assert!(sql.contains("APPLIED_AT"));
        assert!(sql.contains("DESCRIPTION"));

        let sql = store.generate_create_table_sql(&sqlite_options());
        assert!(sql.contains("ID TEXT NOT NULL PRIMARY KEY"));
    }

    #[test]
    fn test_mysql_id_is_cast_both_ways() {
        let store = ChangelogStore::new();
        let options = OperationOptions::new(Dialect::MySQL);

        assert_eq!(
            store.generate_delete_sql(&options),
            "delete from CHANGELOG where ID = CAST(? AS DECIMAL(65,30))"
        );
        assert!(store
            .generate_select_history_sql(&options)
            .starts_with("select CAST(ID AS CHAR) AS ID, APPLIED_AT"));
    }

    #[test]
    fn test_id_param() {
        assert_eq!(
            id_param(&"20240101000000".parse().unwrap()),
            SqlValue::Text("20240101000000".to_string())
        );
        assert_eq!(
            id_param(&"123456789012345678901.000000001".parse().unwrap()),
            SqlValue::Text("123456789012345678901.000000001".to_string())
        );
    }

    #[test]
    fn test_row_to_change_trims_decimal_scale() {
        let mut row = SqlRow::new();
        row.insert(
            "ID".to_string(),
            SqlValue::Text("20240101000000.500000000000000000000000000000".to_string()),
        );
        row.insert("APPLIED_AT".to_string(), SqlValue::Text("2024-01-01 00:00:00".to_string()));
        row.insert("DESCRIPTION".to_string(), SqlValue::Text("half".to_string()));

        let change = row_to_change(&row).unwrap();
        assert_eq!(change.id().to_string(), "20240101000000.5");

        assert_eq!(trim_id_text("42.000"), "42");
        assert_eq!(trim_id_text("0.000"), "0");
        assert_eq!(trim_id_text("100"), "100");
    }

    #[test]
    fn test_row_to_change_maps_nulls() {
        let mut row = SqlRow::new();
        row.insert("ID".to_string(), SqlValue::Integer(3));
        row.insert("APPLIED_AT".to_string(), SqlValue::Null);
        row.insert("DESCRIPTION".to_string(), SqlValue::Null);

        let change = row_to_change(&row).unwrap();
        assert_eq!(change.id().to_string(), "3");
        assert_eq!(change.applied_at(), None);
        assert_eq!(change.description(), None);
    }

    #[test]
    fn test_row_to_change_rejects_null_id() {
        let mut row = SqlRow::new();
        row.insert("ID".to_string(), SqlValue::Null);

        let error = row_to_change(&row).unwrap_err();
        assert!(error.is_persistence());
    }
}

/// チェンジログストアの統合テスト
///
/// SQLiteデータベースに対して、チェンジの記録・削除・履歴取得・
/// テーブル存在確認が正しく動作することを確認します。
#[cfg(test)]
mod changelog_store_tests {
    use migralog::adapters::connection::{MigrationConnection, SqlxConnection};
    use migralog::adapters::database::DatabaseConnectionService;
    use migralog::core::change::{Change, ChangeId};
    use migralog::core::config::{DatabaseConfig, Dialect};
    use migralog::core::options::OperationOptions;
    use migralog::services::changelog_store::ChangelogStore;
    use regex::Regex;
    use tempfile::TempDir;

    async fn connect(temp_dir: &TempDir) -> SqlxConnection {
        sqlx::any::install_default_drivers();
        let db_path = temp_dir.path().join("changelog.db");
        let config = DatabaseConfig::new(db_path.to_string_lossy().into_owned());
        DatabaseConnectionService::new()
            .connect(Dialect::SQLite, &config)
            .await
            .unwrap()
    }

    async fn create_table(conn: &mut SqlxConnection, store: &ChangelogStore, options: &OperationOptions) {
        conn.run_statement(&store.generate_create_table_sql(options))
            .await
            .unwrap();
    }

    /// 記録したチェンジが履歴としてID昇順で読み戻せる
    #[tokio::test]
    async fn test_record_and_load_history() {
        let temp_dir = TempDir::new().unwrap();
        let mut conn = connect(&temp_dir).await;
        let store = ChangelogStore::new();
        let options = OperationOptions::new(Dialect::SQLite);
        create_table(&mut conn, &store, &options).await;

        for id in [3, 1, 2] {
            let change = Change::pending(ChangeId::from(id), format!("change {}", id));
            store
                .record_application(&mut conn, &change, &options)
                .await
                .unwrap();
        }

        let history = store.load_history(&mut conn, &options).await.unwrap();
        let ids: Vec<String> = history.iter().map(|c| c.id().to_string()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert!(history.iter().all(Change::is_applied));
        assert_eq!(history[0].description(), Some("change 1"));
    }

    /// 64ビット整数に収まらないIDや小数IDも精度を失わずに読み戻せる
    #[tokio::test]
    async fn test_high_precision_ids_survive_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let mut conn = connect(&temp_dir).await;
        let store = ChangelogStore::new();
        let options = OperationOptions::new(Dialect::SQLite);
        create_table(&mut conn, &store, &options).await;

        for raw in ["123456789012345678901", "20240101000000.123456789", "9", "10"] {
            let change = Change::pending(raw.parse::<ChangeId>().unwrap(), "precise");
            store
                .record_application(&mut conn, &change, &options)
                .await
                .unwrap();
        }

        let history = store.load_history(&mut conn, &options).await.unwrap();
        let ids: Vec<String> = history.iter().map(|c| c.id().to_string()).collect();
        assert_eq!(
            ids,
            vec!["9", "10", "20240101000000.123456789", "123456789012345678901"]
        );

        let target = Change::pending("20240101000000.123456789".parse::<ChangeId>().unwrap(), "precise");
        store.remove_application(&mut conn, &target, &options).await.unwrap();
        assert_eq!(store.load_history(&mut conn, &options).await.unwrap().len(), 3);
    }

    /// 記録は入力を変更せず、適用日時付きのコピーを返す
    #[tokio::test]
    async fn test_record_returns_applied_copy() {
        let temp_dir = TempDir::new().unwrap();
        let mut conn = connect(&temp_dir).await;
        let store = ChangelogStore::new();
        let options = OperationOptions::new(Dialect::SQLite);
        create_table(&mut conn, &store, &options).await;

        let change = Change::pending(ChangeId::from(20240101120000), "create users");
        let applied = store
            .record_application(&mut conn, &change, &options)
            .await
            .unwrap();

        assert!(!change.is_applied());
        assert!(applied.is_applied());

        let timestamp = Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$").unwrap();
        assert!(timestamp.is_match(applied.applied_at().unwrap()));

        let history = store.load_history(&mut conn, &options).await.unwrap();
        assert_eq!(history[0].applied_at(), applied.applied_at());
    }

    /// テーブルへの書き込みに失敗した場合、入力のチェンジは未適用のまま
    #[tokio::test]
    async fn test_record_failure_leaves_change_pending() {
        let temp_dir = TempDir::new().unwrap();
        let mut conn = connect(&temp_dir).await;
        let store = ChangelogStore::new();
        let options = OperationOptions::new(Dialect::SQLite);

        let change = Change::pending(ChangeId::from(1), "first");
        let error = store
            .record_application(&mut conn, &change, &options)
            .await
            .unwrap_err();

        assert!(error.is_persistence());
        assert!(!change.is_applied());
    }

    /// 同じIDの二重記録は永続化エラー
    #[tokio::test]
    async fn test_duplicate_record_is_persistence_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut conn = connect(&temp_dir).await;
        let store = ChangelogStore::new();
        let options = OperationOptions::new(Dialect::SQLite);
        create_table(&mut conn, &store, &options).await;

        let change = Change::pending(ChangeId::from(1), "first");
        store
            .record_application(&mut conn, &change, &options)
            .await
            .unwrap();
        let error = store
            .record_application(&mut conn, &change, &options)
            .await
            .unwrap_err();

        assert!(error.is_persistence());
        assert!(error.to_string().contains("Cause:"));
    }

    /// テーブルが無い場合、存在確認はfalse、履歴取得は永続化エラー
    #[tokio::test]
    async fn test_missing_table() {
        let temp_dir = TempDir::new().unwrap();
        let mut conn = connect(&temp_dir).await;
        let store = ChangelogStore::new();
        let options = OperationOptions::new(Dialect::SQLite);

        assert!(!store.table_exists(&mut conn, &options).await);

        let error = store.load_history(&mut conn, &options).await.unwrap_err();
        assert!(error.is_persistence());
    }

    /// 空のテーブルは存在扱いで、履歴は空
    #[tokio::test]
    async fn test_empty_table_exists() {
        let temp_dir = TempDir::new().unwrap();
        let mut conn = connect(&temp_dir).await;
        let store = ChangelogStore::new();
        let options = OperationOptions::new(Dialect::SQLite);
        create_table(&mut conn, &store, &options).await;

        assert!(store.table_exists(&mut conn, &options).await);
        assert!(store.load_history(&mut conn, &options).await.unwrap().is_empty());
    }

    /// 記録の削除
    #[tokio::test]
    async fn test_remove_application() {
        let temp_dir = TempDir::new().unwrap();
        let mut conn = connect(&temp_dir).await;
        let store = ChangelogStore::new();
        let options = OperationOptions::new(Dialect::SQLite);
        create_table(&mut conn, &store, &options).await;

        let first = Change::pending(ChangeId::from(1), "first");
        let second = Change::pending(ChangeId::from(2), "second");
        store.record_application(&mut conn, &first, &options).await.unwrap();
        store.record_application(&mut conn, &second, &options).await.unwrap();

        store.remove_application(&mut conn, &second, &options).await.unwrap();

        let history = store.load_history(&mut conn, &options).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id().to_string(), "1");
    }

    /// 独自のテーブル名を使用できる
    #[tokio::test]
    async fn test_custom_table_name() {
        let temp_dir = TempDir::new().unwrap();
        let mut conn = connect(&temp_dir).await;
        let store = ChangelogStore::new();
        let mut options = OperationOptions::new(Dialect::SQLite);
        options.changelog_table = "schema_log".to_string();
        create_table(&mut conn, &store, &options).await;

        let change = Change::pending(ChangeId::from(1), "first");
        store.record_application(&mut conn, &change, &options).await.unwrap();

        let default_options = OperationOptions::new(Dialect::SQLite);
        assert!(!store.table_exists(&mut conn, &default_options).await);
        assert_eq!(store.load_history(&mut conn, &options).await.unwrap().len(), 1);
    }
}

/// PostgreSQL / MySQL に対する統合テスト
///
/// testcontainersで起動した実データベースに対して、チェンジログテーブルの
/// 作成から up / status / down までを実行します。
///
/// 注意: Docker必須のテストは #[ignore] アトリビュートでマークされています。
/// Docker起動時に実行するには: `cargo test -- --ignored`
#[cfg(test)]
mod database_integration_tests {
    use migralog::adapters::connection::SqlxConnection;
    use migralog::adapters::database::DatabaseConnectionService;
    use migralog::cli::commands::init::InitCommandHandler;
    use migralog::core::config::{DatabaseConfig, Dialect};
    use migralog::core::options::OperationOptions;
    use migralog::core::output::OutputSink;
    use migralog::services::changelog_store::ChangelogStore;
    use migralog::services::operations::{DownOperation, StatusOperation, UpOperation};
    use migralog::services::script_discovery::MigrationScript;
    use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
    use testcontainers_modules::mysql::Mysql as MysqlImage;
    use testcontainers_modules::postgres::Postgres as PostgresImage;

    fn scripts(dialect: Dialect) -> Vec<MigrationScript> {
        let bootstrap = InitCommandHandler::new().generate_bootstrap_script(dialect);
        vec![
            MigrationScript::from_source("20240101000000_create_changelog.sql", &bootstrap)
                .unwrap(),
            MigrationScript::from_source(
                "20240102000000_create_users.sql",
                "CREATE TABLE users (id INTEGER PRIMARY KEY, name VARCHAR(100));\n\n-- //@UNDO\nDROP TABLE users;\n",
            )
            .unwrap(),
            MigrationScript::from_source(
                "20240103000000_seed_users.sql",
                "INSERT INTO users (id, name) VALUES (1, 'alice');\nINSERT INTO users (id, name) VALUES (2, 'bob');\n\n-- //@UNDO\nDELETE FROM users;\n",
            )
            .unwrap(),
        ]
    }

    /// 適用・状態確認・全取り消しを一通り実行
    async fn run_lifecycle(conn: &mut SqlxConnection, dialect: Dialect) {
        let options = OperationOptions::new(dialect);
        let available = scripts(dialect);
        let store = ChangelogStore::new();

        let report = UpOperation::new(options.clone(), OutputSink::silent(), None)
            .run(conn, &available)
            .await
            .unwrap();
        assert_eq!(report.applied_count(), 3);

        let history = store.load_history(conn, &options).await.unwrap();
        let ids: Vec<String> = history.iter().map(|c| c.id().to_string()).collect();
        assert_eq!(ids, vec!["20240101000000", "20240102000000", "20240103000000"]);
        assert_eq!(history[1].description(), Some("create users"));

        let status = StatusOperation::new(options.clone(), OutputSink::silent())
            .run(conn, &available)
            .await
            .unwrap();
        assert_eq!(status.applied, 3);
        assert!(status.drift.is_empty());

        let report = DownOperation::new(options.clone(), OutputSink::silent(), 3)
            .run(conn, &available)
            .await
            .unwrap();
        assert_eq!(report.reverted.len(), 3);
        assert!(!store.table_exists(conn, &options).await);
    }

    /// PostgreSQLコンテナを起動して接続
    async fn setup_postgres() -> (ContainerAsync<PostgresImage>, SqlxConnection) {
        let container = PostgresImage::default()
            .with_tag("16-alpine")
            .start()
            .await
            .unwrap();

        let mut config = DatabaseConfig::new("postgres");
        config.host = container.get_host().await.unwrap().to_string();
        config.port = container.get_host_port_ipv4(5432).await.unwrap();
        config.user = Some("postgres".to_string());
        config.password = Some("postgres".to_string());

        let conn = DatabaseConnectionService::new()
            .connect(Dialect::PostgreSQL, &config)
            .await
            .unwrap();
        (container, conn)
    }

    /// MySQLコンテナを起動して接続
    async fn setup_mysql() -> (ContainerAsync<MysqlImage>, SqlxConnection) {
        let container = MysqlImage::default().with_tag("8.0").start().await.unwrap();

        let mut config = DatabaseConfig::new("test");
        config.host = container.get_host().await.unwrap().to_string();
        config.port = container.get_host_port_ipv4(3306).await.unwrap();
        config.user = Some("root".to_string());

        let conn = DatabaseConnectionService::new()
            .connect(Dialect::MySQL, &config)
            .await
            .unwrap();
        (container, conn)
    }

    /// PostgreSQLでのライフサイクル
    #[tokio::test]
    #[ignore] // Docker必須
    async fn test_postgres_lifecycle() {
        let (_container, mut conn) = setup_postgres().await;
        run_lifecycle(&mut conn, Dialect::PostgreSQL).await;
    }

    /// PostgreSQLではDDLもロールバックされる
    #[tokio::test]
    #[ignore] // Docker必須
    async fn test_postgres_failed_script_rolls_back() {
        let (_container, mut conn) = setup_postgres().await;
        let options = OperationOptions::new(Dialect::PostgreSQL);

        let mut available = scripts(Dialect::PostgreSQL);
        available.push(
            MigrationScript::from_source(
                "20240104000000_broken.sql",
                "CREATE TABLE orders (id INTEGER);\nINSERT INTO no_such_table VALUES (1);\n",
            )
            .unwrap(),
        );

        let error = UpOperation::new(options.clone(), OutputSink::silent(), None)
            .run(&mut conn, &available)
            .await
            .unwrap_err();
        assert!(error.is_script_execution());

        let history = ChangelogStore::new()
            .load_history(&mut conn, &options)
            .await
            .unwrap();
        assert_eq!(history.len(), 3);
    }

    /// MySQLでのライフサイクル
    #[tokio::test]
    #[ignore] // Docker必須
    async fn test_mysql_lifecycle() {
        let (_container, mut conn) = setup_mysql().await;
        run_lifecycle(&mut conn, Dialect::MySQL).await;
    }
}

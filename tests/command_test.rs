/// コマンドハンドラーの統合テスト
///
/// init → up → status → down の流れを、一時ディレクトリ内のSQLite
/// プロジェクトに対して実行します。
#[cfg(test)]
mod command_tests {
    use migralog::cli::commands::down::{DownCommand, DownCommandHandler};
    use migralog::cli::commands::init::{InitCommand, InitCommandHandler};
    use migralog::cli::commands::status::{StatusCommand, StatusCommandHandler};
    use migralog::cli::commands::up::{UpCommand, UpCommandHandler};
    use migralog::cli::OutputFormat;
    use migralog::core::config::Dialect;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// テスト用のプロジェクトを初期化し、テーブル作成スクリプトを1件追加する
    fn setup_project() -> (TempDir, PathBuf) {
        sqlx::any::install_default_drivers();
        colored::control::set_override(false);

        let temp_dir = TempDir::new().unwrap();
        let project_path = temp_dir.path().to_path_buf();

        InitCommandHandler::new()
            .execute(&InitCommand {
                project_path: project_path.clone(),
                dialect: Dialect::SQLite,
                force: false,
                database_name: "app.db".to_string(),
            })
            .unwrap();

        fs::write(
            project_path.join("scripts").join("99990101000000_create_users.sql"),
            "-- // create users\nCREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);\n\n-- //@UNDO\nDROP TABLE users;\n",
        )
        .unwrap();

        (temp_dir, project_path)
    }

    fn up(project_path: &Path) -> UpCommand {
        UpCommand {
            project_path: project_path.to_path_buf(),
            config_path: None,
            steps: None,
            env: "development".to_string(),
            verbose: false,
            format: OutputFormat::Text,
        }
    }

    fn status(project_path: &Path, format: OutputFormat) -> StatusCommand {
        StatusCommand {
            project_path: project_path.to_path_buf(),
            config_path: None,
            env: "development".to_string(),
            format,
        }
    }

    /// up で初期化スクリプトと追加スクリプトが適用される
    #[tokio::test]
    async fn test_up_applies_all_scripts() {
        let (_temp_dir, project_path) = setup_project();

        let output = UpCommandHandler::new()
            .execute(&up(&project_path))
            .await
            .unwrap();

        assert!(output.contains("Applied 2 migration script(s)"));
        assert!(output.contains("99990101000000_create_users.sql"));
        assert!(project_path.join("app.db").exists());

        let output = UpCommandHandler::new()
            .execute(&up(&project_path))
            .await
            .unwrap();
        assert!(output.contains("Database is up to date."));
    }

    /// status はJSONで適用状況を返す
    #[tokio::test]
    async fn test_status_json() {
        let (_temp_dir, project_path) = setup_project();

        let command = UpCommand {
            steps: Some(1),
            ..up(&project_path)
        };
        UpCommandHandler::new().execute(&command).await.unwrap();

        let output = StatusCommandHandler::new()
            .execute(&status(&project_path, OutputFormat::Json))
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(json["applied"], 1);
        assert_eq!(json["pending"], 1);
        assert_eq!(json["entries"].as_array().unwrap().len(), 2);
        assert_eq!(json["entries"][1]["id"], "99990101000000");
        assert!(json["entries"][1]["applied_at"].is_null());
    }

    /// status のテキスト出力
    #[tokio::test]
    async fn test_status_text() {
        let (_temp_dir, project_path) = setup_project();

        let output = StatusCommandHandler::new()
            .execute(&status(&project_path, OutputFormat::Text))
            .await
            .unwrap();

        assert!(output.contains("...pending..."));
        assert!(output.contains("create users"));
        assert!(output.contains("Applied: 0, Pending: 2"));
    }

    /// down で最後のスクリプトが取り消される
    #[tokio::test]
    async fn test_down_reverts_last_script() {
        let (_temp_dir, project_path) = setup_project();
        UpCommandHandler::new()
            .execute(&up(&project_path))
            .await
            .unwrap();

        let output = DownCommandHandler::new()
            .execute(&DownCommand {
                project_path: project_path.clone(),
                config_path: None,
                steps: 1,
                env: "development".to_string(),
                verbose: false,
                format: OutputFormat::Text,
            })
            .await
            .unwrap();

        assert!(output.contains("99990101000000_create_users.sql"));
        assert!(output.contains("Undid 1 migration script(s)"));

        let output = StatusCommandHandler::new()
            .execute(&status(&project_path, OutputFormat::Text))
            .await
            .unwrap();
        assert!(output.contains("Applied: 1, Pending: 1"));
    }

    /// 初期化されていないプロジェクトではエラー
    #[tokio::test]
    async fn test_up_without_config() {
        let temp_dir = TempDir::new().unwrap();

        let error = UpCommandHandler::new()
            .execute(&up(temp_dir.path()))
            .await
            .unwrap_err();

        assert!(error.to_string().contains("Config file not found"));
    }

    /// 失敗したスクリプトはエラーとして報告され、記録されない
    #[tokio::test]
    async fn test_up_reports_failed_script() {
        let (_temp_dir, project_path) = setup_project();
        fs::write(
            project_path.join("scripts").join("99990102000000_broken.sql"),
            "INSERT INTO missing_table VALUES (1);\n",
        )
        .unwrap();

        let error = UpCommandHandler::new()
            .execute(&up(&project_path))
            .await
            .unwrap_err();
        assert!(format!("{:#}", error).contains("99990102000000_broken.sql"));

        let output = StatusCommandHandler::new()
            .execute(&status(&project_path, OutputFormat::Text))
            .await
            .unwrap();
        assert!(output.contains("Applied: 2, Pending: 1"));
    }
}

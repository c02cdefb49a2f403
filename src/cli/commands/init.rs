// initコマンドハンドラー
//
// プロジェクトの初期化機能を実装します。
// - 設定ファイルの生成
// - スクリプトディレクトリの作成
// - チェンジログテーブルを作成する最初のスクリプトの生成

use crate::cli::commands::generate_script_id;
use crate::core::config::{Config, DatabaseConfig, Dialect};
use crate::core::naming;
use crate::core::options::OperationOptions;
use crate::services::changelog_store::ChangelogStore;
use crate::services::config_loader::ConfigLoader;
use crate::services::script_discovery::ScriptDiscovery;
use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// initコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct InitCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// データベース方言
    pub dialect: Dialect,
    /// 既存の設定を上書きするか
    pub force: bool,
    /// データベース名
    pub database_name: String,
}

/// initコマンドハンドラー
#[derive(Debug, Clone)]
pub struct InitCommandHandler {}

impl InitCommandHandler {
    /// 新しいInitCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// initコマンドを実行
    ///
    /// # Returns
    ///
    /// 成功時は生成したファイルの概要
    pub fn execute(&self, command: &InitCommand) -> Result<String> {
        let config_path = command.project_path.join(Config::DEFAULT_CONFIG_PATH);
        if config_path.exists() && !command.force {
            return Err(anyhow!(
                "Project is already initialized: {:?}. Use --force to overwrite.",
                config_path
            ));
        }

        let config = self.generate_config(command);
        ConfigLoader::to_file(&config_path, &config)?;

        let scripts_dir = command.project_path.join(&config.scripts_dir);
        fs::create_dir_all(&scripts_dir)
            .with_context(|| format!("Failed to create scripts directory: {:?}", scripts_dir))?;

        let discovery = ScriptDiscovery::new();
        let filename = discovery.script_filename(&generate_script_id(), "create changelog");
        let script_path = scripts_dir.join(&filename);
        fs::write(&script_path, self.generate_bootstrap_script(command.dialect))
            .with_context(|| format!("Failed to write migration script: {:?}", script_path))?;

        info!(config = %config_path.display(), script = %filename, "Project initialized");

        Ok(format!(
            "Created {}\nCreated {}\n",
            config_path.display(),
            script_path.display()
        ))
    }

    /// 既定の設定を生成
    pub fn generate_config(&self, command: &InitCommand) -> Config {
        let mut db_config = DatabaseConfig::new(command.database_name.clone());
        db_config.port = match command.dialect {
            Dialect::PostgreSQL => 5432,
            Dialect::MySQL => 3306,
            Dialect::SQLite => 0,
        };

        let mut environments = HashMap::new();
        environments.insert(naming::DEFAULT_ENVIRONMENT.to_string(), db_config);

        Config {
            version: "1.0".to_string(),
            dialect: command.dialect,
            scripts_dir: PathBuf::from(naming::SCRIPTS_DIR),
            environments,
        }
    }

    /// チェンジログテーブルを作成するスクリプト本文を生成
    pub fn generate_bootstrap_script(&self, dialect: Dialect) -> String {
        let store = ChangelogStore::new();
        let options = OperationOptions::new(dialect);
        ScriptDiscovery::new().script_template(
            "Create Changelog",
            &format!("{};", store.generate_create_table_sql(&options)),
            &format!("{};", store.generate_drop_table_sql(&options)),
        )
    }
}

impl Default for InitCommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

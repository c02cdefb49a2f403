// コマンド共通コンテキスト
//
// 設定ファイル読み込み、パス解決、DB接続の重複をCLI層で集約する。

use crate::adapters::connection::SqlxConnection;
use crate::adapters::database::DatabaseConnectionService;
use crate::core::config::{Config, Dialect};
use crate::core::options::OperationOptions;
use crate::services::config_loader::ConfigLoader;
use crate::services::script_discovery::{MigrationScript, ScriptDiscovery};
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// CLIコマンド共通の実行コンテキスト
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub project_path: PathBuf,
    pub config_path: PathBuf,
    pub config: Config,
}

impl CommandContext {
    /// 設定ファイルを読み込んでコンテキストを作成
    ///
    /// `config_path` が指定されない場合はプロジェクトルートの既定ファイルを使用します。
    pub fn load(project_path: PathBuf, config_path: Option<PathBuf>) -> Result<Self> {
        let config_path =
            config_path.unwrap_or_else(|| project_path.join(Config::DEFAULT_CONFIG_PATH));
        if !config_path.exists() {
            return Err(anyhow!(
                "Config file not found: {:?}. Please initialize the project first with the `init` command.",
                config_path
            ));
        }

        let config =
            ConfigLoader::from_file(&config_path).with_context(|| "Failed to read config file")?;
        debug!(config = %config_path.display(), dialect = %config.dialect, "Loaded config");

        Ok(Self {
            project_path,
            config_path,
            config,
        })
    }

    /// スクリプトディレクトリの絶対パス
    pub fn scripts_dir(&self) -> PathBuf {
        self.project_path.join(&self.config.scripts_dir)
    }

    /// スクリプトディレクトリが存在することを確認して返す
    pub fn require_scripts_dir(&self) -> Result<PathBuf> {
        let path = self.scripts_dir();
        if !path.exists() {
            return Err(anyhow!("Scripts directory not found: {:?}", path));
        }
        Ok(path)
    }

    /// 利用可能なスクリプトを読み込む
    pub fn load_scripts(&self) -> Result<Vec<MigrationScript>> {
        let dir = self.require_scripts_dir()?;
        ScriptDiscovery::new()
            .load(&dir)
            .with_context(|| "Failed to load migration scripts")
    }

    /// 環境の操作オプション
    pub fn operation_options(&self, env: &str) -> Result<OperationOptions> {
        self.config.operation_options(env)
    }

    /// 環境のデータベースに接続
    ///
    /// SQLiteの相対パスはプロジェクトルート基準で解決します。
    pub async fn connect(&self, env: &str) -> Result<SqlxConnection> {
        let mut db_config = self
            .config
            .get_database_config(env)
            .with_context(|| format!("Config for environment '{}' not found", env))?;

        if self.config.dialect == Dialect::SQLite && db_config.database != ":memory:" {
            let path = Path::new(&db_config.database);
            if path.is_relative() {
                db_config.database = self.project_path.join(path).to_string_lossy().into_owned();
            }
        }

        DatabaseConnectionService::new()
            .connect(self.config.dialect, &db_config)
            .await
            .with_context(|| "Failed to connect to database")
    }
}

// 設定ファイル管理
//
// プロジェクトの設定ファイル（YAML形式）の読み込み、検証、
// 環境別のデータベース接続設定とスクリプト実行オプションの管理を行います。

use crate::core::naming;
use crate::core::options::OperationOptions;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

/// データベース方言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[serde(rename = "postgresql")]
    PostgreSQL,
    #[serde(rename = "mysql")]
    MySQL,
    #[default]
    #[serde(rename = "sqlite")]
    SQLite,
}

impl Dialect {
    /// n番目（1始まり）の位置パラメータのプレースホルダー
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::PostgreSQL => format!("${}", index),
            Dialect::MySQL | Dialect::SQLite => "?".to_string(),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::PostgreSQL => write!(f, "postgresql"),
            Dialect::MySQL => write!(f, "mysql"),
            Dialect::SQLite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for Dialect {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgresql" | "postgres" => Ok(Dialect::PostgreSQL),
            "mysql" => Ok(Dialect::MySQL),
            "sqlite" => Ok(Dialect::SQLite),
            other => Err(anyhow!(
                "Unsupported database dialect: {}. Please specify one of: postgresql, mysql, sqlite.",
                other
            )),
        }
    }
}

/// プロジェクト設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 設定ファイルのバージョン
    pub version: String,

    /// データベース方言
    pub dialect: Dialect,

    /// マイグレーションスクリプトディレクトリ
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,

    /// 環境別のデータベース設定
    pub environments: HashMap<String, DatabaseConfig>,
}

fn default_scripts_dir() -> PathBuf {
    PathBuf::from(naming::SCRIPTS_DIR)
}

impl Config {
    /// デフォルトの設定ファイルパス
    pub const DEFAULT_CONFIG_PATH: &'static str = naming::CONFIG_FILE;

    /// 指定された環境のデータベース設定を取得
    pub fn get_database_config(&self, environment: &str) -> Result<DatabaseConfig> {
        self.environments.get(environment).cloned().ok_or_else(|| {
            anyhow!(
                "Environment '{}' not found. Available environments: {:?}",
                environment,
                self.environments.keys().collect::<Vec<_>>()
            )
        })
    }

    /// 指定された環境の実行オプションを構築
    pub fn operation_options(&self, environment: &str) -> Result<OperationOptions> {
        let db_config = self.get_database_config(environment)?;
        Ok(db_config.operation_options(self.dialect))
    }

    /// 設定の妥当性を検証
    pub fn validate(&self) -> Result<()> {
        if self.version.is_empty() {
            return Err(anyhow!("Config file version is not specified"));
        }

        if self.environments.is_empty() {
            return Err(anyhow!(
                "At least one environment configuration is required"
            ));
        }

        for (env_name, db_config) in &self.environments {
            db_config
                .validate()
                .with_context(|| format!("Invalid config for environment '{}'", env_name))?;
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(yaml: &str) -> Result<Self, Self::Err> {
        serde_saphyr::from_str(yaml).with_context(|| "Failed to parse config file")
    }
}

/// データベース接続設定
///
/// 接続情報に加えて、チェンジログテーブル名とスクリプト実行オプションを持ちます。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// ホスト名（SQLiteの場合は不要）
    #[serde(default = "default_host")]
    pub host: String,

    /// ポート番号
    #[serde(default = "default_port")]
    pub port: u16,

    /// データベース名（SQLiteの場合はファイルパス）
    pub database: String,

    /// ユーザー名
    pub user: Option<String>,

    /// パスワード
    pub password: Option<String>,

    /// 接続タイムアウト（秒）
    pub timeout: Option<u64>,

    /// チェンジログテーブル名
    #[serde(default = "default_changelog_table")]
    pub changelog_table: String,

    /// ステートメント区切り文字
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// 区切り文字が単独行である必要があるか
    #[serde(default)]
    pub full_line_delimiter: bool,

    /// スクリプト全体を1ステートメントとして送信するか
    #[serde(default)]
    pub send_full_script: bool,

    /// ステートメント毎に自動コミットするか
    #[serde(default)]
    pub auto_commit: bool,

    /// エラー発生時に停止するか
    #[serde(default = "default_true")]
    pub stop_on_error: bool,

    /// SQL警告をエラーとして扱うか
    #[serde(default = "default_true")]
    pub throw_warning: bool,

    /// 実行前にCRを除去するか
    #[serde(default)]
    pub remove_crs: bool,

    /// ドリフト警告を致命的エラーとして扱うか
    #[serde(default)]
    pub strict: bool,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432 // PostgreSQLのデフォルトポート
}

fn default_changelog_table() -> String {
    naming::CHANGELOG_TABLE.to_string()
}

fn default_delimiter() -> String {
    ";".to_string()
}

fn default_true() -> bool {
    true
}

impl DatabaseConfig {
    /// 接続情報のみを指定して作成（実行オプションは既定値）
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: database.into(),
            user: None,
            password: None,
            timeout: None,
            changelog_table: default_changelog_table(),
            delimiter: default_delimiter(),
            full_line_delimiter: false,
            send_full_script: false,
            auto_commit: false,
            stop_on_error: true,
            throw_warning: true,
            remove_crs: false,
            strict: false,
        }
    }

    /// Validate database configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.is_empty() {
            return Err(anyhow!("Database name is not specified"));
        }

        validate_table_name(&self.changelog_table)?;

        if self.delimiter.trim().is_empty() {
            return Err(anyhow!("Statement delimiter must not be empty"));
        }

        Ok(())
    }

    /// 実行オプションに変換
    pub fn operation_options(&self, dialect: Dialect) -> OperationOptions {
        OperationOptions {
            dialect,
            changelog_table: self.changelog_table.clone(),
            delimiter: self.delimiter.clone(),
            full_line_delimiter: self.full_line_delimiter,
            send_full_script: self.send_full_script,
            auto_commit: self.auto_commit,
            stop_on_error: self.stop_on_error,
            throw_warning: self.throw_warning,
            remove_crs: self.remove_crs,
            strict: self.strict,
        }
    }
}

/// チェンジログテーブル名を検証
///
/// テーブル名はSQLに直接埋め込まれるため、英数字・アンダースコア・
/// スキーマ修飾のドットのみを許可します。
pub fn validate_table_name(name: &str) -> Result<()> {
    let first = name
        .chars()
        .next()
        .ok_or_else(|| anyhow!("Changelog table name is not specified"))?;

    if first.is_ascii_digit() {
        return Err(anyhow!(
            "Invalid changelog table name '{}': must not start with a digit",
            name
        ));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return Err(anyhow!(
            "Invalid changelog table name '{}': only letters, digits, '_' and '.' are allowed",
            name
        ));
    }

    Ok(())
}

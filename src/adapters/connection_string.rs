// 接続文字列ビルダー
//
// DatabaseConfig と Dialect から接続文字列を生成する。

use crate::core::config::{DatabaseConfig, Dialect};

/// 接続文字列を生成
///
/// SQLiteはファイルが存在しない場合に作成するモードで接続します。
pub fn build_connection_string(dialect: Dialect, config: &DatabaseConfig) -> String {
    match dialect {
        Dialect::PostgreSQL => {
            let user = config.user.as_deref().unwrap_or("postgres");
            format!(
                "postgresql://{}@{}:{}/{}",
                auth_part(user, config.password.as_deref()),
                config.host,
                config.port,
                config.database
            )
        }
        Dialect::MySQL => {
            let user = config.user.as_deref().unwrap_or("root");
            format!(
                "mysql://{}@{}:{}/{}",
                auth_part(user, config.password.as_deref()),
                config.host,
                config.port,
                config.database
            )
        }
        Dialect::SQLite => {
            if config.database == ":memory:" {
                "sqlite::memory:".to_string()
            } else {
                format!("sqlite://{}?mode=rwc", config.database)
            }
        }
    }
}

fn auth_part(user: &str, password: Option<&str>) -> String {
    match password {
        Some(password) if !password.is_empty() => format!("{}:{}", user, password),
        _ => user.to_string(),
    }
}

// Adapters
// データベース接続とスクリプト実行へのアクセスを抽象化

pub mod connection;
pub mod connection_string;
pub mod database;
pub mod script_runner;

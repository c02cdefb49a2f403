// Services Layer
// チェンジログ、照合、スクリプト実行を組み合わせるサービス層

pub mod changelog_store;
pub mod config_loader;
pub mod operations;
pub mod reconciler;
pub mod script_discovery;
pub mod script_executor_factory;

// Migralogライブラリのエントリーポイント
//
// モジュール構造:
// - cli: CLIレイヤー（ユーザー入力の受付とコマンドルーティング）
// - core: コアドメイン（チェンジレコード、設定、エラー、出力シンク）
// - adapters: データベース接続とスクリプト実行
// - services: チェンジログ管理、照合、マイグレーション操作

pub mod adapters;
pub mod cli;
pub mod core;
pub mod services;

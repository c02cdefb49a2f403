// 命名ポリシー
//
// アプリケーション名と関連パスの単一ソースを提供します。

/// 現行アプリケーション名
pub const APP_NAME: &str = "migralog";

/// 既定の設定ファイル名
pub const CONFIG_FILE: &str = "migralog.yaml";

/// 既定のスクリプトディレクトリ
pub const SCRIPTS_DIR: &str = "scripts";

/// 既定のチェンジログテーブル名
pub const CHANGELOG_TABLE: &str = "CHANGELOG";

/// 既定の環境名
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// スクリプト内のUNDOセクション開始マーカー
pub const UNDO_MARKER: &str = "-- //@UNDO";

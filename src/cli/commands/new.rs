// newコマンドハンドラー
//
// タイムスタンプIDを持つ空のマイグレーションスクリプトを生成します。

use crate::cli::command_context::CommandContext;
use crate::cli::commands::generate_script_id;
use crate::services::script_discovery::ScriptDiscovery;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// newコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct NewCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// 設定ファイルのパス（省略時は既定）
    pub config_path: Option<PathBuf>,
    /// チェンジの説明
    pub description: String,
}

/// newコマンドハンドラー
#[derive(Debug, Clone)]
pub struct NewCommandHandler {}

impl NewCommandHandler {
    /// 新しいNewCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// newコマンドを実行
    ///
    /// # Returns
    ///
    /// 成功時は生成したスクリプトのパス
    pub fn execute(&self, command: &NewCommand) -> Result<String> {
        if command.description.trim().is_empty() {
            return Err(anyhow!("Description must not be empty"));
        }

        let context = CommandContext::load(command.project_path.clone(), command.config_path.clone())?;
        let scripts_dir = context.scripts_dir();
        fs::create_dir_all(&scripts_dir)
            .with_context(|| format!("Failed to create scripts directory: {:?}", scripts_dir))?;

        let discovery = ScriptDiscovery::new();
        let id = generate_script_id();
        if let Some(existing) = discovery
            .load(&scripts_dir)?
            .iter()
            .find(|script| script.change.id().to_string() == id)
        {
            return Err(anyhow!(
                "Migration id {} is already used by '{}'. Please retry in a moment.",
                id,
                existing.filename()
            ));
        }

        let filename = discovery.script_filename(&id, &command.description);
        let script_path = scripts_dir.join(&filename);

        let content = discovery.script_template(command.description.trim(), "", "");
        fs::write(&script_path, content)
            .with_context(|| format!("Failed to write migration script: {:?}", script_path))?;

        info!(script = %filename, "Created migration script");
        Ok(format!("Created {}\n", script_path.display()))
    }
}

impl Default for NewCommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

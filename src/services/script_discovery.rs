// マイグレーションスクリプト探索
//
// スクリプトディレクトリから `<id>_<description>.sql` 形式のファイルを読み込み、
// ID昇順のスクリプト一覧を返します。

use crate::core::change::{Change, ChangeId};
use crate::core::error::OperationError;
use crate::core::naming;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

static SCRIPT_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)_(.+)\.sql$").expect("script filename pattern is valid")
});

static UNDO_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*--\s*//\s*@UNDO").expect("undo marker pattern is valid"));

/// マイグレーションスクリプト
#[derive(Debug, Clone)]
pub struct MigrationScript {
    /// 対応するチェンジ（未適用状態）
    pub change: Change,
    /// スクリプトファイルのパス
    pub path: PathBuf,
    do_section: String,
    undo_section: String,
}

impl MigrationScript {
    /// ファイル名と本文からスクリプトを作成
    ///
    /// ファイル名が命名規則に合わない場合はNone。
    pub fn from_source(path: impl Into<PathBuf>, content: &str) -> Option<Self> {
        let path = path.into();
        let filename = path.file_name()?.to_str()?.to_string();
        let captures = SCRIPT_FILENAME.captures(&filename)?;
        let id: ChangeId = captures[1].parse().ok()?;
        let description = captures[2].replace('_', " ");
        let (do_section, undo_section) = split_sections(content);

        Some(Self {
            change: Change::pending(id, description).with_filename(filename),
            path,
            do_section,
            undo_section,
        })
    }

    /// 表示用ファイル名
    pub fn filename(&self) -> String {
        self.change.filename()
    }

    /// 適用時に実行するSQL（UNDOマーカーより前）
    pub fn do_section(&self) -> &str {
        &self.do_section
    }

    /// 取り消し時に実行するSQL（UNDOマーカーより後）
    pub fn undo_section(&self) -> &str {
        &self.undo_section
    }
}

/// 本文をDOセクションとUNDOセクションに分割
fn split_sections(content: &str) -> (String, String) {
    let mut do_section = String::new();
    let mut undo_section = String::new();
    let mut in_undo = false;

    // 改行コード（CRLF）はそのまま残し、CRの除去はスクリプト実行側の設定に任せる
    for line in content.split_inclusive('\n') {
        if !in_undo && UNDO_MARKER.is_match(line) {
            in_undo = true;
            continue;
        }
        let target = if in_undo {
            &mut undo_section
        } else {
            &mut do_section
        };
        target.push_str(line);
        if !line.ends_with('\n') {
            target.push('\n');
        }
    }

    (do_section, undo_section)
}

/// スクリプト探索サービス
#[derive(Debug, Clone, Default)]
pub struct ScriptDiscovery;

impl ScriptDiscovery {
    pub fn new() -> Self {
        Self
    }

    /// ディレクトリからスクリプトを読み込む（ID昇順）
    ///
    /// 命名規則に合わないファイルは無視します。IDの重複はエラー。
    pub fn load(&self, scripts_dir: &Path) -> Result<Vec<MigrationScript>, OperationError> {
        let entries = fs::read_dir(scripts_dir).map_err(|e| OperationError::Discovery {
            message: format!("Failed to read scripts directory {:?}: {}", scripts_dir, e),
        })?;

        let mut scripts = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| OperationError::Discovery {
                    message: format!("Failed to read scripts directory {:?}: {}", scripts_dir, e),
                })?
                .path();

            let is_script_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| SCRIPT_FILENAME.is_match(name));
            if !is_script_name || !path.is_file() {
                debug!(path = %path.display(), "Skipping non-migration file");
                continue;
            }

            let content = fs::read_to_string(&path).map_err(|e| OperationError::Discovery {
                message: format!("Failed to read migration script {:?}: {}", path, e),
            })?;

            match MigrationScript::from_source(&path, &content) {
                Some(script) => scripts.push(script),
                None => debug!(path = %path.display(), "Skipping non-migration file"),
            }
        }

        scripts.sort_by(|a, b| a.change.cmp(&b.change));

        if let Some(pair) = scripts.windows(2).find(|pair| pair[0].change == pair[1].change) {
            return Err(OperationError::Discovery {
                message: format!(
                    "Duplicate migration id {}: '{}' and '{}'",
                    pair[0].change.id(),
                    pair[0].filename(),
                    pair[1].filename()
                ),
            });
        }

        debug!(count = scripts.len(), dir = %scripts_dir.display(), "Discovered migration scripts");
        Ok(scripts)
    }

    /// 新しいスクリプトのファイル名を生成
    pub fn script_filename(&self, id: &str, description: &str) -> String {
        let slug: String = description
            .trim()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();
        format!("{}_{}.sql", id, slug)
    }

    /// 新しいスクリプトのテンプレート本文
    pub fn script_template(&self, description: &str, do_sql: &str, undo_sql: &str) -> String {
        format!(
            "-- // {}\n{}\n\n{}\n{}\n",
            description,
            do_sql,
            naming::UNDO_MARKER,
            undo_sql
        )
    }
}

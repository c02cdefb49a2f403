// リコンサイラー
//
// データベースに記録された適用履歴と、利用可能なスクリプト一覧（どちらもID昇順）を
// 1回の走査で比較し、2種類のドリフトを警告として報告します。
// - 適用済みだがスクリプトが存在しない（Missing）
// - 適用済みの2つのバージョンの間にあるのに適用されていない（Unapplied）
// 最後の適用済みバージョンより後ろの未適用スクリプトはドリフトではありません。

use crate::core::change::{Change, ChangeId};
use serde::Serialize;
use std::fmt;

/// プラットフォームの改行文字
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// ドリフト警告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DriftWarning {
    /// 適用済みだがスクリプトが無い
    Missing {
        id: ChangeId,
        description: Option<String>,
    },
    /// 以前のバージョンなのに適用されていない
    Unapplied { filename: String },
}

impl fmt::Display for DriftWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriftWarning::Missing { id, description } => write!(
                f,
                "WARNING: Missing migration script. id='{}', description='{}'.",
                id,
                description.as_deref().unwrap_or("null")
            ),
            DriftWarning::Unapplied { filename } => write!(
                f,
                "WARNING: Migration script '{}' was not applied to the database.",
                filename
            ),
        }
    }
}

/// リコンサイラー
#[derive(Debug, Clone, Default)]
pub struct Reconciler;

impl Reconciler {
    pub fn new() -> Self {
        Self
    }

    /// ドリフト警告を検出
    ///
    /// # Arguments
    ///
    /// * `applied` - データベースに記録されたチェンジ（ID昇順）
    /// * `available` - 利用可能なスクリプトのチェンジ（ID昇順）
    pub fn inspect(&self, applied: &[Change], available: &[Change]) -> Vec<DriftWarning> {
        let mut warnings = Vec::new();
        // これまでに見つかった「スクリプトの無い適用済みエントリ」の数
        let mut adjust: isize = 0;

        for (i, change) in applied.iter().enumerate() {
            let expected = i as isize - adjust;
            match available.iter().position(|candidate| candidate == change) {
                None => {
                    warnings.push(DriftWarning::Missing {
                        id: change.id().clone(),
                        description: change.description().map(str::to_string),
                    });
                    adjust += 1;
                }
                Some(index) if index as isize != expected => {
                    for j in expected..index as isize {
                        adjust -= 1;
                        warnings.push(DriftWarning::Unapplied {
                            filename: available[j as usize].filename(),
                        });
                    }
                }
                Some(_) => {}
            }
        }

        warnings
    }

    /// ドリフトレポートを生成
    ///
    /// 各警告をプラットフォームの改行で終端したテキスト。ドリフトが無い場合は空文字列。
    pub fn diagnose(&self, applied: &[Change], available: &[Change]) -> String {
        self.inspect(applied, available)
            .iter()
            .map(|warning| format!("{}{}", warning, LINE_SEPARATOR))
            .collect()
    }
}

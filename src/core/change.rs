// チェンジレコード ドメインモデル
//
// 1つのマイグレーションの識別子・適用日時・説明を表現する値型。
// 同一性はIDのみで判定する（適用日時と説明は同一性に含まれない）。

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::Local;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// 適用日時の書式（秒精度、タイムゾーンなし）
pub const APPLIED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 現在のローカル時刻を適用日時文字列として生成
pub fn generate_applied_timestamp() -> String {
    Local::now().format(APPLIED_AT_FORMAT).to_string()
}

/// チェンジID
///
/// 任意精度の10進数。バージョン番号としてソート可能であり、一意キーでもある。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChangeId(BigDecimal);

impl ChangeId {
    /// 整数に収まる場合はi64として取得
    pub fn to_i64(&self) -> Option<i64> {
        if self.0.is_integer() {
            self.0.to_i64()
        } else {
            None
        }
    }
}

impl FromStr for ChangeId {
    type Err = bigdecimal::ParseBigDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BigDecimal::from_str(s.trim()).map(ChangeId)
    }
}

impl From<i64> for ChangeId {
    fn from(value: i64) -> Self {
        ChangeId(BigDecimal::from(value))
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ChangeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// チェンジの状態
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChangeState {
    /// 未適用
    Pending,
    /// 適用済み
    Applied {
        /// 適用日時（yyyy-MM-dd HH:mm:ss）
        applied_at: String,
    },
}

/// チェンジレコード
///
/// スクリプト探索から作られる場合は未適用、チェンジログテーブルから
/// 読み込まれる場合は適用済みとして生成されます。適用時は
/// [`Change::applied`] で適用済みのコピーを作り、元の値は変更しません。
#[derive(Debug, Clone, Serialize)]
pub struct Change {
    id: ChangeId,
    description: Option<String>,
    filename: Option<String>,
    #[serde(flatten)]
    state: ChangeState,
}

impl Change {
    /// 未適用のチェンジを作成
    pub fn pending(id: ChangeId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: Some(description.into()),
            filename: None,
            state: ChangeState::Pending,
        }
    }

    /// チェンジログテーブルの行からチェンジを作成
    ///
    /// APPLIED_AT が NULL の行は未適用として扱います。
    pub fn from_history(
        id: ChangeId,
        applied_at: Option<String>,
        description: Option<String>,
    ) -> Self {
        let state = match applied_at {
            Some(applied_at) => ChangeState::Applied { applied_at },
            None => ChangeState::Pending,
        };
        Self {
            id,
            description,
            filename: None,
            state,
        }
    }

    /// ファイル名を指定
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// 適用済みのコピーを作成
    pub fn applied(&self, applied_at: impl Into<String>) -> Self {
        Self {
            state: ChangeState::Applied {
                applied_at: applied_at.into(),
            },
            ..self.clone()
        }
    }

    pub fn id(&self) -> &ChangeId {
        &self.id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn state(&self) -> &ChangeState {
        &self.state
    }

    /// 適用日時を取得（未適用の場合はNone）
    pub fn applied_at(&self) -> Option<&str> {
        match &self.state {
            ChangeState::Applied { applied_at } => Some(applied_at),
            ChangeState::Pending => None,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self.state, ChangeState::Applied { .. })
    }

    /// 表示用ファイル名
    ///
    /// ファイル名を持たない場合は `<id>_<説明>.sql` を導出します。
    pub fn filename(&self) -> String {
        match &self.filename {
            Some(filename) => filename.clone(),
            None => {
                let description = self.description.as_deref().unwrap_or_default();
                format!("{}_{}.sql", self.id, description.replace(' ', "_"))
            }
        }
    }
}

impl PartialEq for Change {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Change {}

impl Hash for Change {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Change {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Change {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

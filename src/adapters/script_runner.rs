// SQLスクリプトランナー
//
// マイグレーションスクリプトをステートメント単位（または一括）で実行する。
// 区切り文字・エラー時の挙動・警告の扱いは ScriptRunnerSettings で構成します。

use crate::adapters::connection::MigrationConnection;
use crate::core::error::{DelimiterError, ScriptExecutionError};
use crate::core::output::OutputSink;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// `-- @DELIMITER $$` 形式の区切り文字変更ディレクティブ
static DELIMITER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*((--)|(//))?\s*(//)?\s*@DELIMITER\s+([^\s]+)")
        .expect("delimiter directive pattern is valid")
});

/// スクリプトランナーの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRunnerSettings {
    /// ステートメント区切り文字
    pub delimiter: String,
    /// 区切り文字が単独行である必要があるか
    pub full_line_delimiter: bool,
    /// エラー発生時に停止するか
    pub stop_on_error: bool,
    /// SQL警告をエラーとして扱うか
    pub throw_warning: bool,
    /// ステートメント毎に自動コミットするか
    pub auto_commit: bool,
    /// スクリプト全体を1ステートメントとして送信するか
    pub send_full_script: bool,
    /// 実行前にCRを除去するか
    pub remove_crs: bool,
    /// ドライバーによるエスケープ処理（プリペアドステートメント）を使うか
    pub escape_processing: bool,
}

impl Default for ScriptRunnerSettings {
    fn default() -> Self {
        Self {
            delimiter: ";".to_string(),
            full_line_delimiter: false,
            stop_on_error: true,
            throw_warning: false,
            auto_commit: false,
            send_full_script: false,
            remove_crs: false,
            escape_processing: true,
        }
    }
}

/// スクリプト実行結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptRunSummary {
    /// 実行に成功したステートメント数
    pub executed: usize,
    /// 失敗したが続行したステートメント数
    pub failed: usize,
}

/// SQLスクリプトランナー
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    settings: ScriptRunnerSettings,
    output: OutputSink,
}

impl ScriptRunner {
    /// 新しいScriptRunnerを作成
    ///
    /// 区切り文字が空、または空白を含む場合はエラー。
    pub fn new(settings: ScriptRunnerSettings, output: OutputSink) -> Result<Self, DelimiterError> {
        validate_delimiter(&settings.delimiter)?;
        Ok(Self { settings, output })
    }

    pub fn settings(&self) -> &ScriptRunnerSettings {
        &self.settings
    }

    /// スクリプトを実行
    ///
    /// # Arguments
    ///
    /// * `conn` - データベース接続
    /// * `script_name` - エラーメッセージ用のスクリプト名
    /// * `script` - スクリプト本文
    ///
    /// # Returns
    ///
    /// 実行結果のサマリー。`stop_on_error` の場合は最初の失敗でエラーを返す
    pub async fn run_script<C>(
        &self,
        conn: &mut C,
        script_name: &str,
        script: &str,
    ) -> Result<ScriptRunSummary, ScriptExecutionError>
    where
        C: MigrationConnection + ?Sized,
    {
        let script = if self.settings.remove_crs {
            script.replace('\r', "")
        } else {
            script.to_string()
        };

        let mut summary = ScriptRunSummary::default();

        if self.settings.send_full_script {
            self.output.println(&script);
            self.execute_statement(conn, script_name, &script, &mut summary)
                .await?;
            return Ok(summary);
        }

        let mut delimiter = self.settings.delimiter.clone();
        let mut command = String::new();

        for line in script.lines() {
            let trimmed = line.trim();

            if trimmed.starts_with("--") || trimmed.starts_with("//") {
                if let Some(captures) = DELIMITER_PATTERN.captures(trimmed) {
                    delimiter = captures[5].to_string();
                    debug!(script = script_name, delimiter = %delimiter, "Delimiter changed");
                }
                self.output.println(trimmed);
            } else if self.command_ready(trimmed, &delimiter) {
                let end = line.rfind(delimiter.as_str()).unwrap_or(line.len());
                command.push_str(&line[..end]);
                command.push('\n');
                self.output.println(&command);
                self.execute_statement(conn, script_name, &command, &mut summary)
                    .await?;
                command.clear();
            } else if !trimmed.is_empty() {
                command.push_str(line);
                command.push('\n');
            }
        }

        if !command.trim().is_empty() {
            let message = format!(
                "Line missing end-of-line terminator ({}) => {}",
                delimiter,
                command.trim_end()
            );
            self.output.println(&message);
            return Err(ScriptExecutionError::with_sql(
                script_name,
                message,
                command.trim_end(),
            ));
        }

        Ok(summary)
    }

    fn command_ready(&self, trimmed: &str, delimiter: &str) -> bool {
        if self.settings.full_line_delimiter {
            trimmed == delimiter
        } else {
            trimmed.contains(delimiter)
        }
    }

    async fn execute_statement<C>(
        &self,
        conn: &mut C,
        script_name: &str,
        statement: &str,
        summary: &mut ScriptRunSummary,
    ) -> Result<(), ScriptExecutionError>
    where
        C: MigrationConnection + ?Sized,
    {
        match self.try_execute(conn, statement).await {
            Ok(rows) => {
                summary.executed += 1;
                self.output.println(&format!("{} row(s) affected.", rows));
                Ok(())
            }
            Err(error) => {
                let message = format!("Error executing: {}.  Cause: {}", statement.trim(), error);
                self.output.println(&message);
                if self.settings.stop_on_error {
                    return Err(ScriptExecutionError::with_sql(
                        script_name,
                        error,
                        statement.trim(),
                    ));
                }
                warn!(script = script_name, "{}", message);
                summary.failed += 1;
                Ok(())
            }
        }
    }

    async fn try_execute<C>(&self, conn: &mut C, statement: &str) -> Result<u64, String>
    where
        C: MigrationConnection + ?Sized,
    {
        let rows = if self.settings.escape_processing {
            conn.execute(statement, &[]).await
        } else {
            conn.run_statement(statement).await
        }
        .map_err(|e| e.to_string())?;

        if self.settings.throw_warning {
            let warnings = conn.warnings().await.map_err(|e| e.to_string())?;
            if !warnings.is_empty() {
                return Err(format!("SQL warning(s): {}", warnings.join("; ")));
            }
        }

        Ok(rows)
    }
}

fn validate_delimiter(delimiter: &str) -> Result<(), DelimiterError> {
    if delimiter.is_empty() {
        return Err(DelimiterError {
            delimiter: delimiter.to_string(),
            reason: "delimiter must not be empty".to_string(),
        });
    }
    if delimiter.chars().any(char::is_whitespace) {
        return Err(DelimiterError {
            delimiter: delimiter.to_string(),
            reason: "delimiter must not contain whitespace".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimiter_pattern() {
        let captures = DELIMITER_PATTERN.captures("-- @DELIMITER $$").unwrap();
        assert_eq!(&captures[5], "$$");

        let captures = DELIMITER_PATTERN.captures("// @delimiter GO").unwrap();
        assert_eq!(&captures[5], "GO");

        assert!(DELIMITER_PATTERN.captures("-- create users").is_none());
    }

    #[test]
    fn test_new_rejects_invalid_delimiter() {
        let settings = ScriptRunnerSettings {
            delimiter: String::new(),
            ..ScriptRunnerSettings::default()
        };
        assert!(ScriptRunner::new(settings, OutputSink::silent()).is_err());

        let settings = ScriptRunnerSettings {
            delimiter: "; ;".to_string(),
            ..ScriptRunnerSettings::default()
        };
        let error = ScriptRunner::new(settings, OutputSink::silent()).unwrap_err();
        assert!(error.reason.contains("whitespace"));
    }
}

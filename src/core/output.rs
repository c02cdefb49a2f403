// 出力シンク
//
// スクリプト実行ログと操作メッセージの出力先。シンクが無い場合は何も出力しない。

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// 共有可能な出力シンク
///
/// 通常ログとエラーログは同じシンクへ書き込まれます。書き込み失敗は無視します。
#[derive(Clone, Default)]
pub struct OutputSink {
    writer: Option<SharedWriter>,
}

impl OutputSink {
    /// 何も出力しないシンク
    pub fn silent() -> Self {
        Self { writer: None }
    }

    /// 任意のWriterをシンクとして使用
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Some(Arc::new(Mutex::new(Box::new(writer)))),
        }
    }

    /// 標準出力へのシンク
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// メモリバッファへのシンクと、その内容を参照するハンドル
    pub fn capture() -> (Self, CapturedOutput) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Self::new(BufferWriter(Arc::clone(&buffer)));
        (sink, CapturedOutput(buffer))
    }

    pub fn is_silent(&self) -> bool {
        self.writer.is_none()
    }

    /// 1行出力
    pub fn println(&self, text: &str) {
        if let Some(writer) = &self.writer {
            if let Ok(mut writer) = writer.lock() {
                let _ = writeln!(writer, "{}", text);
                let _ = writer.flush();
            }
        }
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSink")
            .field("silent", &self.is_silent())
            .finish()
    }
}

struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.0.lock() {
            Ok(mut buffer) => {
                buffer.extend_from_slice(buf);
                Ok(buf.len())
            }
            Err(_) => Err(io::Error::other("output buffer poisoned")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// キャプチャされた出力
#[derive(Debug, Clone)]
pub struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

impl CapturedOutput {
    /// これまでに書き込まれた内容
    pub fn contents(&self) -> String {
        self.0
            .lock()
            .map(|buffer| String::from_utf8_lossy(&buffer).into_owned())
            .unwrap_or_default()
    }
}

#[cfg(feature = "cpal-output")]
pub mod cpal_backend;
mod headless;

#[cfg(feature = "cpal-output")]
pub use cpal_backend::CpalOutput;
pub use headless::HeadlessOutput;

use std::sync::Arc;

use super::decode::PcmBuffer;
use crate::domain::error::AudioError;

/// 再生が最後まで終わったときに一度だけ呼ばれるコールバック
///
/// `halt` で止めた場合は呼ばれない。`start` の中から同期的に呼んではならない。
pub type EndCallback = Box<dyn FnOnce() + Send + 'static>;

/// 出力バックエンド（プラットフォームごとの出力デバイスの生成元）
pub trait OutputBackend: Send + Sync {
    /// 出力デバイスを開く。未対応環境なら `AudioError::Unsupported`。
    fn open(&self) -> Result<Box<dyn OutputDevice>, AudioError>;

    fn name(&self) -> &str;
}

/// 開いた出力デバイス。close されるまで何度でも `start` できる。
pub trait OutputDevice: Send {
    fn start(
        &mut self,
        buffer: Arc<PcmBuffer>,
        on_end: EndCallback,
    ) -> Result<Box<dyn Voice>, AudioError>;

    fn close(&mut self);
}

/// 再生中の音声 1 本
pub trait Voice: Send {
    /// 再生を止める（冪等、ブロックしない）
    fn halt(&mut self);
}

/// 音声出力がない環境用。open は常に `Unsupported`。
pub struct UnsupportedOutput;

impl OutputBackend for UnsupportedOutput {
    fn open(&self) -> Result<Box<dyn OutputDevice>, AudioError> {
        Err(AudioError::Unsupported(
            "this build has no audio output backend".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "unsupported"
    }
}

/// ビルド構成に応じた既定のバックエンド
pub fn default_backend() -> Arc<dyn OutputBackend> {
    #[cfg(feature = "cpal-output")]
    {
        Arc::new(CpalOutput::new())
    }
    #[cfg(not(feature = "cpal-output"))]
    {
        Arc::new(UnsupportedOutput)
    }
}

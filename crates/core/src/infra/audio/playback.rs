use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::decode;
use super::output::{EndCallback, OutputBackend, OutputDevice, Voice};
use crate::domain::error::AudioError;
use crate::domain::types::PlaybackState;

/// `play` の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// 出力を開始した
    Started { duration_ms: u64 },
    /// デコード中に stop / 別の play が来たため破棄した
    Superseded,
    /// 出力デバイスが使えない（未対応環境 or 解放済み）。何もしない。
    Unavailable,
}

enum DeviceSlot {
    /// まだ一度も使っていない（遅延オープン）
    Unopened,
    Open(Box<dyn OutputDevice>),
    /// 未対応環境。以後の再生はすべて no-op。
    Unsupported,
    Released,
}

struct PlaybackInner {
    device: DeviceSlot,
    state: PlaybackState,
    /// play / stop のたびに進む世代番号。古いデコード結果や終了通知の判定に使う。
    generation: u64,
    voice: Option<Box<dyn Voice>>,
    sessions_started: u64,
}

impl PlaybackInner {
    fn halt_voice(&mut self) {
        if let Some(mut voice) = self.voice.take() {
            voice.halt();
        }
    }
}

/// 再生コントローラー（Idle → Decoding → Playing → Idle）
///
/// 出力デバイスを排他的に所有し、同時に生きる再生セッションは常に 1 つ以下。
/// `play` は既存セッションを必ず止めてから次を始める。
pub struct AudioPlaybackController {
    backend: Arc<dyn OutputBackend>,
    inner: Arc<Mutex<PlaybackInner>>,
}

impl AudioPlaybackController {
    pub fn new(backend: Arc<dyn OutputBackend>) -> Self {
        Self {
            backend,
            inner: Arc::new(Mutex::new(PlaybackInner {
                device: DeviceSlot::Unopened,
                state: PlaybackState::Idle,
                generation: 0,
                voice: None,
                sessions_started: 0,
            })),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.inner.lock().state
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    /// これまでに出力を開始したセッション数
    pub fn sessions_started(&self) -> u64 {
        self.inner.lock().sessions_started
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// 生の音声バイト列をデコードして再生する
    pub async fn play(&self, raw: Vec<u8>) -> Result<PlayOutcome, AudioError> {
        let generation = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            if !self.ensure_device(inner)? {
                return Ok(PlayOutcome::Unavailable);
            }
            inner.halt_voice();
            inner.generation += 1;
            inner.state = PlaybackState::Decoding;
            inner.generation
        };

        let decoded = tokio::task::spawn_blocking(move || decode::decode(&raw))
            .await
            .map_err(|e| AudioError::Decode(format!("decode task failed: {e}")))
            .and_then(|result| result);

        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if inner.generation != generation {
            log::debug!("デコード完了前に再生が取り消されました");
            return Ok(PlayOutcome::Superseded);
        }

        let buffer = match decoded {
            Ok(buffer) => Arc::new(buffer),
            Err(e) => {
                inner.state = PlaybackState::Idle;
                return Err(e);
            }
        };

        let DeviceSlot::Open(device) = &mut inner.device else {
            inner.state = PlaybackState::Idle;
            return Ok(PlayOutcome::Unavailable);
        };

        let duration_ms = buffer.duration_ms();
        let on_end = end_callback(Arc::downgrade(&self.inner), generation);
        match device.start(buffer, on_end) {
            Ok(voice) => {
                inner.voice = Some(voice);
                inner.state = PlaybackState::Playing;
                inner.sessions_started += 1;
                log::info!("再生開始: {}ms", duration_ms);
                Ok(PlayOutcome::Started { duration_ms })
            }
            Err(e) => {
                inner.state = PlaybackState::Idle;
                Err(e)
            }
        }
    }

    /// 再生 / デコード中なら止めて Idle にする。Idle なら何もしない。
    pub fn stop(&self) {
        let mut inner = self.inner.lock();
        if !inner.state.is_active() {
            return;
        }
        inner.halt_voice();
        inner.generation += 1;
        inner.state = PlaybackState::Idle;
        log::debug!("再生を停止しました");
    }

    /// 出力デバイスを解放する。2 回目以降は何もしない。
    pub fn release(&self) {
        let mut inner = self.inner.lock();
        if inner.state.is_active() {
            inner.halt_voice();
            inner.generation += 1;
            inner.state = PlaybackState::Idle;
        }
        if let DeviceSlot::Open(mut device) =
            std::mem::replace(&mut inner.device, DeviceSlot::Released)
        {
            device.close();
            log::info!("出力デバイスを解放しました ({})", self.backend.name());
        }
    }

    /// デバイスを遅延オープンする。使えない環境なら Ok(false)。
    fn ensure_device(&self, inner: &mut PlaybackInner) -> Result<bool, AudioError> {
        match inner.device {
            DeviceSlot::Open(_) => Ok(true),
            DeviceSlot::Unsupported => Ok(false),
            DeviceSlot::Released => {
                log::warn!("出力デバイスは解放済みのため再生しません");
                Ok(false)
            }
            DeviceSlot::Unopened => match self.backend.open() {
                Ok(device) => {
                    inner.device = DeviceSlot::Open(device);
                    Ok(true)
                }
                Err(AudioError::Unsupported(reason)) => {
                    log::warn!("音声出力は利用できません（読み上げは無効）: {reason}");
                    inner.device = DeviceSlot::Unsupported;
                    Ok(false)
                }
                Err(e) => Err(e),
            },
        }
    }
}

impl Drop for AudioPlaybackController {
    fn drop(&mut self) {
        self.release();
    }
}

/// 自然終了の通知。世代が一致するときだけ Idle に戻す。
fn end_callback(inner: Weak<Mutex<PlaybackInner>>, generation: u64) -> EndCallback {
    Box::new(move || {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        let mut inner = inner.lock();
        if inner.generation == generation && inner.state == PlaybackState::Playing {
            inner.voice = None;
            inner.state = PlaybackState::Idle;
            log::debug!("再生が終了しました");
        }
    })
}

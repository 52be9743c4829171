use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::domain::error::ErrorCode;
use crate::infra::audio::{AudioPlaybackController, PlayOutcome};
use crate::infra::metrics::{Metrics, PHASE_SYNTHESIZE};
use crate::infra::reasoning::SpeechSynthesizer;

struct ReadAloudState {
    enabled: bool,
    /// trigger / 取り消しのたびに進む。待機中タスクが自分が最新か判定する。
    epoch: u64,
    cancel_tx: Option<oneshot::Sender<()>>,
}

impl ReadAloudState {
    fn cancel_pending(&mut self) {
        self.epoch += 1;
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// 画面内容の自動読み上げ
///
/// 有効時のみ、デバウンス後に音声合成 → 再生を行う。待機中に次の trigger や
/// 無効化が来たら待機中のものは取り消す（最後の 1 件だけが残る）。
/// 失敗はログに残すだけで呼び出し側には返さない。
pub struct ReadAloudOrchestrator {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    playback: Arc<AudioPlaybackController>,
    metrics: Arc<Metrics>,
    debounce: Duration,
    state: Arc<Mutex<ReadAloudState>>,
}

impl ReadAloudOrchestrator {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        playback: Arc<AudioPlaybackController>,
        metrics: Arc<Metrics>,
        debounce: Duration,
        enabled: bool,
    ) -> Self {
        Self {
            synthesizer,
            playback,
            metrics,
            debounce,
            state: Arc::new(Mutex::new(ReadAloudState {
                enabled,
                epoch: 0,
                cancel_tx: None,
            })),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    /// 読み上げの有効/無効を切り替える。無効化は待機中の合成と再生中の音声を即座に止める。
    pub fn set_enabled(&self, enabled: bool) {
        {
            let mut state = self.state.lock();
            state.enabled = enabled;
            if !enabled {
                state.cancel_pending();
            }
        }
        if !enabled {
            self.playback.stop();
        }
        log::info!("読み上げ: {}", if enabled { "ON" } else { "OFF" });
    }

    /// 反転して新しい値を返す
    pub fn toggle(&self) -> bool {
        let enabled = !self.is_enabled();
        self.set_enabled(enabled);
        enabled
    }

    /// 待機中の読み上げを取り消す（再生中の音声には触れない）
    pub fn cancel_pending(&self) {
        self.state.lock().cancel_pending();
    }

    /// テキストの読み上げを予約する。無効時や空テキストなら何もしない。
    ///
    /// tokio ランタイム上で呼ぶこと。返り値のハンドルは待つ必要はない。
    pub fn trigger(&self, text: &str) -> Option<JoinHandle<()>> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let (epoch, cancel_rx) = {
            let mut state = self.state.lock();
            if !state.enabled {
                return None;
            }
            state.cancel_pending();
            let (tx, rx) = oneshot::channel();
            state.cancel_tx = Some(tx);
            (state.epoch, rx)
        };

        let task = ReadAloudTask {
            synthesizer: self.synthesizer.clone(),
            playback: self.playback.clone(),
            metrics: self.metrics.clone(),
            state: self.state.clone(),
            debounce: self.debounce,
            epoch,
            text: text.to_string(),
        };
        Some(tokio::spawn(task.run(cancel_rx)))
    }
}

struct ReadAloudTask {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    playback: Arc<AudioPlaybackController>,
    metrics: Arc<Metrics>,
    state: Arc<Mutex<ReadAloudState>>,
    debounce: Duration,
    epoch: u64,
    text: String,
}

impl ReadAloudTask {
    fn is_current(&self) -> bool {
        let state = self.state.lock();
        state.enabled && state.epoch == self.epoch
    }

    async fn run(self, cancel_rx: oneshot::Receiver<()>) {
        tokio::select! {
            _ = tokio::time::sleep(self.debounce) => {}
            _ = cancel_rx => {
                log::debug!("読み上げ待機を取り消しました");
                return;
            }
        }
        if !self.is_current() {
            return;
        }

        let started = Instant::now();
        let audio = match self.synthesizer.synthesize(&self.text).await {
            Ok(audio) => audio,
            Err(e) => {
                log::warn!("読み上げの音声合成に失敗: {e}");
                self.metrics.inc_error(e.code());
                return;
            }
        };
        self.metrics.inc_syntheses();
        self.metrics
            .record_latency(PHASE_SYNTHESIZE, started.elapsed().as_millis() as u64);

        if !self.is_current() {
            log::debug!("合成中に読み上げが取り消されました");
            return;
        }

        match self.playback.play(audio).await {
            Ok(PlayOutcome::Started { .. }) => {
                self.metrics.inc_playbacks_started();
                // play 中に無効化された場合は止める
                if !self.is_current() {
                    self.playback.stop();
                }
            }
            Ok(outcome) => log::debug!("読み上げを再生しませんでした: {outcome:?}"),
            Err(e) => {
                log::warn!("読み上げの再生に失敗: {e}");
                self.metrics.inc_error(ErrorCode::Audio);
            }
        }
    }
}

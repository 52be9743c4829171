use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use super::analyzer::SymptomAnalyzer;
use super::read_aloud::ReadAloudOrchestrator;
use super::resolver::GuidanceResolver;
use crate::domain::error::{ErrorCode, ErrorView, GuideError};
use crate::domain::guidance::{Guidance, GuidanceSource, GuideResult, SymptomAnalysis};
use crate::domain::i18n::{TranslationTable, Translator};
use crate::domain::screen::{RequestId, ResultsState, Screen, ScreenManager, ScreenTransition};
use crate::domain::settings::GuideSettings;
use crate::domain::types::{Emergency, PlaybackState};
use crate::infra::audio::{self, AudioPlaybackController, OutputBackend, PlayOutcome};
use crate::infra::metrics::{Metrics, MetricsSummary, PHASE_ANALYZE, PHASE_RESOLVE, PHASE_SYNTHESIZE};
use crate::infra::offline_store::OfflineGuidanceStore;
use crate::infra::reasoning::{
    GeminiClient, NoopReasoningService, ReasoningService, SpeechSynthesizer,
};

/// サービス初期化エラー
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Bundled offline guidance is invalid: {0}")]
    OfflineData(#[from] serde_json::Error),
}

/// 外部協調者（差し替え可能な部品）
pub struct GuideDeps {
    pub reasoning: Arc<dyn ReasoningService>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub output: Arc<dyn OutputBackend>,
    pub store: Arc<OfflineGuidanceStore>,
    pub translator: Arc<dyn Translator>,
}

/// 結果画面の音声ボタンの結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioToggle {
    /// 再生中だったので止めた
    Stopped,
    Play(PlayOutcome),
}

/// アプリケーションサービス（画面シェルから呼ばれるファサード）
pub struct GuideService {
    resolver: GuidanceResolver,
    analyzer: SymptomAnalyzer,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    playback: Arc<AudioPlaybackController>,
    read_aloud: ReadAloudOrchestrator,
    translator: Arc<dyn Translator>,
    metrics: Arc<Metrics>,
    screens: Mutex<ScreenManager>,
    online: AtomicBool,
    language: Mutex<String>,
}

impl GuideService {
    pub fn new(settings: &GuideSettings, deps: GuideDeps) -> Self {
        let metrics = Arc::new(Metrics::new());
        let playback = Arc::new(AudioPlaybackController::new(deps.output));
        let read_aloud = ReadAloudOrchestrator::new(
            deps.synthesizer.clone(),
            playback.clone(),
            metrics.clone(),
            settings.read_aloud_debounce(),
            settings.read_aloud_enabled,
        );

        log::info!(
            "GuideService 初期化: reasoning={}, output={}, language={}",
            deps.reasoning.name(),
            playback.backend_name(),
            settings.language
        );

        Self {
            resolver: GuidanceResolver::new(
                deps.reasoning.clone(),
                deps.store,
                settings.offline_latency(),
                settings.guidance_temperature,
            ),
            analyzer: SymptomAnalyzer::new(deps.reasoning, settings.analysis_temperature),
            synthesizer: deps.synthesizer,
            playback,
            read_aloud,
            translator: deps.translator,
            metrics,
            screens: Mutex::new(ScreenManager::new()),
            online: AtomicBool::new(true),
            language: Mutex::new(settings.language.clone()),
        }
    }

    /// 設定から既定の部品を組み立てる
    ///
    /// API キーがあれば Gemini、なければ Noop（リモート呼び出しは常に失敗）。
    pub fn from_settings(settings: &GuideSettings) -> Result<Self, InitError> {
        let store = OfflineGuidanceStore::shared()?;

        let (reasoning, synthesizer): (Arc<dyn ReasoningService>, Arc<dyn SpeechSynthesizer>) =
            match GeminiClient::from_settings(settings) {
                Ok(client) => {
                    let client = Arc::new(client);
                    let reasoning: Arc<dyn ReasoningService> = client.clone();
                    (reasoning, client as Arc<dyn SpeechSynthesizer>)
                }
                Err(e) => {
                    log::warn!("リモート推論を無効化します: {e}");
                    let noop = Arc::new(NoopReasoningService);
                    let reasoning: Arc<dyn ReasoningService> = noop.clone();
                    (reasoning, noop as Arc<dyn SpeechSynthesizer>)
                }
            };

        Ok(Self::new(
            settings,
            GuideDeps {
                reasoning,
                synthesizer,
                output: audio::default_backend(),
                store,
                translator: Arc::new(TranslationTable::builtin()),
            },
        ))
    }

    // ==================== Connectivity / Language ====================

    pub fn set_online(&self, online: bool) {
        let prev = self.online.swap(online, Ordering::Relaxed);
        if prev != online {
            log::info!("接続状態: {}", if online { "online" } else { "offline" });
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }

    pub fn set_language(&self, code: &str) {
        *self.language.lock() = code.to_string();
    }

    pub fn language(&self) -> String {
        self.language.lock().clone()
    }

    /// 現在の言語で翻訳する
    pub fn t(&self, key: &str) -> String {
        self.translator.t(&self.language(), key)
    }

    // ==================== Screens ====================

    pub fn current_screen(&self) -> Screen {
        self.screens.lock().current()
    }

    pub fn results(&self) -> ResultsState {
        self.screens.lock().results().clone()
    }

    pub fn navigate(&self, screen: Screen) -> ScreenTransition {
        self.screens.lock().navigate(screen)
    }

    /// 画面表示時: 読み上げを予約する
    pub fn on_enter(&self, screen: Screen, text: &str) -> Option<JoinHandle<()>> {
        log::debug!("on_enter: {}", screen.as_str());
        self.read_aloud.trigger(text)
    }

    /// 画面離脱時: 待機中の読み上げを取り消し、再生を止める
    pub fn on_exit(&self, screen: Screen) {
        log::debug!("on_exit: {}", screen.as_str());
        self.silence();
    }

    /// ホームへ戻る（音声停止・結果クリア）
    pub fn go_back(&self) -> ScreenTransition {
        self.silence();
        self.screens.lock().go_home()
    }

    fn silence(&self) {
        self.read_aloud.cancel_pending();
        self.playback.stop();
    }

    // ==================== Requests ====================

    /// 入力された状況テキストを送る。空白のみなら `InvalidInput`。
    pub async fn submit_situation(&self, text: &str) -> Result<Guidance, GuideError> {
        let text = text.trim();
        if text.is_empty() {
            let err = GuideError::InvalidInput("situation text is empty".to_string());
            self.metrics.inc_error(err.code());
            return Err(err);
        }
        self.fetch_guidance(text).await
    }

    /// ホーム画面の定型ボタン。現在言語のフレーズで問い合わせる。
    pub async fn fetch_emergency(&self, emergency: Emergency) -> Result<Guidance, GuideError> {
        let language = self.language();
        let phrase = self
            .emergency_phrase(emergency)
            .ok_or_else(|| GuideError::no_offline_match(format!("{emergency:?}"), language))?;
        self.fetch_guidance(&phrase).await
    }

    pub fn emergency_phrase(&self, emergency: Emergency) -> Option<String> {
        let language = self.language();
        let base = super::resolver::base_language(&language);
        self.resolver
            .store()
            .phrase_for(base, emergency)
            .map(str::to_string)
    }

    /// 状況ガイダンスを取得し、最新リクエストであれば結果画面に確定する
    pub async fn fetch_guidance(&self, text: &str) -> Result<Guidance, GuideError> {
        let id = self.begin_request(text.to_string());
        let online = self.is_online();
        let language = self.language();

        let started = Instant::now();
        let result = self.resolver.resolve(text, online, &language).await;
        self.metrics
            .record_latency(PHASE_RESOLVE, started.elapsed().as_millis() as u64);

        match &result {
            Ok(g) => self.metrics.inc_guidance(g.source == GuidanceSource::Offline),
            Err(e) => self.metrics.inc_error(e.code()),
        }
        self.commit(id, result.clone().map(GuideResult::Guidance));
        result
    }

    /// 症状分析を取得し、最新リクエストであれば結果画面に確定する
    pub async fn fetch_symptom_analysis(
        &self,
        symptoms: &[String],
    ) -> Result<SymptomAnalysis, GuideError> {
        let id = self.begin_request(symptoms.join(", "));
        let language = self.language();

        let started = Instant::now();
        let result = if self.is_online() {
            self.analyzer.analyze(symptoms, &language).await
        } else {
            // オフライン経路はない
            log::warn!("オフラインのため症状分析を実行しません");
            Err(GuideError::symptom_analysis_failed())
        };
        self.metrics
            .record_latency(PHASE_ANALYZE, started.elapsed().as_millis() as u64);

        match &result {
            Ok(_) => self.metrics.inc_analyses(),
            Err(e) => self.metrics.inc_error(e.code()),
        }
        self.commit(id, result.clone().map(GuideResult::SymptomAnalysis));
        result
    }

    fn begin_request(&self, query: String) -> RequestId {
        self.silence();
        let (id, transition) = self.screens.lock().begin_request(query);
        log::debug!(
            "リクエスト {id} 開始: {} → {}",
            transition.prev.as_str(),
            transition.new.as_str()
        );
        id
    }

    fn commit(&self, id: RequestId, outcome: Result<GuideResult, GuideError>) -> bool {
        let outcome = outcome.map_err(|e| self.error_view(&e));
        let mut screens = self.screens.lock();
        let committed = match outcome {
            Ok(result) => screens.commit_result(id, result),
            Err(view) => screens.commit_error(id, view),
        };
        if !committed {
            log::info!(
                "古いリクエスト {id} の結果を破棄しました（最新: {}）",
                screens.latest_request()
            );
        }
        committed
    }

    /// エラーを現在言語の表示用メッセージに変換する
    pub fn error_view(&self, error: &GuideError) -> ErrorView {
        ErrorView {
            code: error.code(),
            message: self.t(error.display_key()),
        }
    }

    // ==================== Audio ====================

    pub fn playback_state(&self) -> PlaybackState {
        self.playback.state()
    }

    /// 結果画面の音声ボタン
    ///
    /// 再生中なら止める。そうでなければ現在の結果を合成して再生する。
    /// 失敗は呼び出し側に返す（画面上の非ブロッキング表示用）。
    pub async fn toggle_result_audio(&self) -> Result<AudioToggle, GuideError> {
        if self.playback.is_active() {
            self.playback.stop();
            return Ok(AudioToggle::Stopped);
        }

        let (request, result) = {
            let screens = self.screens.lock();
            (screens.latest_request(), screens.results().result.clone())
        };
        let result =
            result.ok_or_else(|| GuideError::InvalidInput("no result to read aloud".to_string()))?;
        let text = result.to_speech_text(self.translator.as_ref(), &self.language());

        let started = Instant::now();
        let audio = self.synthesizer.synthesize(&text).await.inspect_err(|e| {
            self.metrics.inc_error(e.code());
        })?;
        self.metrics.inc_syntheses();
        self.metrics
            .record_latency(PHASE_SYNTHESIZE, started.elapsed().as_millis() as u64);

        // 合成中に結果画面を離れた／次のリクエストが始まった場合は再生しない
        if !self.is_showing_request(request) {
            log::info!("結果画面を離れたため読み上げ音声を破棄しました（リクエスト {request}）");
            return Ok(AudioToggle::Play(PlayOutcome::Superseded));
        }

        let outcome = self.playback.play(audio).await.map_err(|e| {
            log::error!("結果の再生に失敗: {e}");
            self.metrics.inc_error(ErrorCode::Audio);
            GuideError::from(e)
        })?;
        if matches!(outcome, PlayOutcome::Started { .. }) {
            self.metrics.inc_playbacks_started();
        }
        Ok(AudioToggle::Play(outcome))
    }

    fn is_showing_request(&self, id: RequestId) -> bool {
        let screens = self.screens.lock();
        screens.is_latest(id) && screens.current() == Screen::Results
    }

    // ==================== Read aloud ====================

    pub fn set_read_aloud(&self, enabled: bool) {
        self.read_aloud.set_enabled(enabled);
    }

    pub fn toggle_read_aloud(&self) -> bool {
        self.read_aloud.toggle()
    }

    pub fn is_read_aloud_enabled(&self) -> bool {
        self.read_aloud.is_enabled()
    }

    // ==================== Metrics / Lifecycle ====================

    pub fn metrics(&self) -> MetricsSummary {
        self.metrics.summary()
    }

    /// 終了処理。出力デバイスを解放する（2 回目以降は何もしない）。
    pub fn shutdown(&self) {
        self.read_aloud.cancel_pending();
        self.playback.release();
    }
}

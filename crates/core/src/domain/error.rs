use serde::Serialize;

/// アプリケーション共通エラーコード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    #[serde(rename = "E_NETWORK")]
    Network,
    #[serde(rename = "E_NO_OFFLINE_MATCH")]
    NoOfflineMatch,
    #[serde(rename = "E_AUDIO")]
    Audio,
    #[serde(rename = "E_INVALID_INPUT")]
    InvalidInput,
}

/// リモート呼び出しの種類（ローカライズ表示の切り分けに使う）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteOp {
    Guidance,
    SymptomAnalysis,
    SpeechSynthesis,
}

/// 音声デコード/出力エラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AudioError {
    #[error("Audio decode failed: {0}")]
    Decode(String),
    #[error("Audio device error: {0}")]
    Device(String),
    #[error("Audio output is not supported: {0}")]
    Unsupported(String),
}

/// ガイダンス取得・読み上げで発生するエラー
#[derive(Debug, Clone, thiserror::Error)]
pub enum GuideError {
    /// 通信・サービス・パース失敗。メッセージに "AI" / "symptom analysis" / "audio" を含む。
    #[error("{message}")]
    Network { op: RemoteOp, message: String },
    /// オフライン時に該当フレーズがない。メッセージに "offline" を含む。
    #[error(
        "You are offline. Only common emergencies are available. Please connect to the internet for AI assistance. (phrase: {phrase:?}, language: {language})"
    )]
    NoOfflineMatch { phrase: String, language: String },
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl GuideError {
    pub fn guidance_failed() -> Self {
        Self::Network {
            op: RemoteOp::Guidance,
            message: "Failed to get guidance from AI. Please check your connection and API key."
                .to_string(),
        }
    }

    pub fn symptom_analysis_failed() -> Self {
        Self::Network {
            op: RemoteOp::SymptomAnalysis,
            message: "Failed to get symptom analysis from AI. Please check your connection."
                .to_string(),
        }
    }

    pub fn speech_failed() -> Self {
        Self::Network {
            op: RemoteOp::SpeechSynthesis,
            message: "Failed to generate audio from text. Please check your connection."
                .to_string(),
        }
    }

    pub fn no_offline_match(phrase: impl Into<String>, language: impl Into<String>) -> Self {
        Self::NoOfflineMatch {
            phrase: phrase.into(),
            language: language.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Network { .. } => ErrorCode::Network,
            Self::NoOfflineMatch { .. } => ErrorCode::NoOfflineMatch,
            Self::Audio(_) => ErrorCode::Audio,
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
        }
    }

    /// UI が表示する翻訳キー
    pub fn display_key(&self) -> &'static str {
        match self {
            Self::NoOfflineMatch { .. } => "offlineError",
            Self::Network { op: RemoteOp::Guidance, .. } => "geminiError",
            Self::Network { op: RemoteOp::SymptomAnalysis, .. } => "symptomError",
            Self::Network { op: RemoteOp::SpeechSynthesis, .. } | Self::Audio(_) => "audioError",
            Self::InvalidInput(_) => "unknownError",
        }
    }
}

/// UI に渡すエラー表示（イベントペイロード兼用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorView {
    pub code: ErrorCode,
    /// 翻訳済みメッセージ
    pub message: String,
}

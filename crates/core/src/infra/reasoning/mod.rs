pub mod gemini;
mod noop;
pub mod prompts;

pub use gemini::GeminiClient;
pub use noop::NoopReasoningService;

use async_trait::async_trait;

use crate::domain::error::GuideError;

/// リモート推論エラー
#[derive(Debug, thiserror::Error)]
pub enum ReasoningError {
    #[error("Reasoning service not configured: {0}")]
    NotConfigured(String),
    #[error("HTTP request failed: {0}")]
    Transport(String),
    #[error("Reasoning request timeout")]
    Timeout,
    #[error("Reasoning service error: {status} - {body}")]
    Service { status: u16, body: String },
    #[error("Empty response from reasoning service")]
    EmptyResponse,
}

/// 構造化出力（JSON）を要求する推論リクエスト
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub system_instruction: String,
    pub prompt: String,
    /// 応答スキーマ（generateContent の responseSchema 形式）
    pub schema: serde_json::Value,
    pub temperature: f32,
}

/// リモート推論サービス trait（テキストを渡し、JSON テキストを受け取る）
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn generate_json(&self, request: StructuredRequest) -> Result<String, ReasoningError>;

    fn name(&self) -> &str;
}

/// 音声合成 trait
///
/// 成功時は 16bit little-endian PCM（24kHz モノラル）の生バイト列を返す。
/// 失敗はすべて `GuideError::speech_failed()` 相当に正規化される。
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, GuideError>;
}

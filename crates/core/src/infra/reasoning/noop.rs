use async_trait::async_trait;

use super::{ReasoningError, ReasoningService, SpeechSynthesizer, StructuredRequest};
use crate::domain::error::GuideError;

/// NoopReasoningService: API キー未設定時の代替実装。
/// すべての呼び出しを `NotConfigured` で失敗させる（オフライン経路はそのまま使える）。
pub struct NoopReasoningService;

#[async_trait]
impl ReasoningService for NoopReasoningService {
    async fn generate_json(&self, _request: StructuredRequest) -> Result<String, ReasoningError> {
        Err(ReasoningError::NotConfigured(
            "API key is not set".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "noop"
    }
}

#[async_trait]
impl SpeechSynthesizer for NoopReasoningService {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, GuideError> {
        log::warn!("音声合成は未設定です（API キーなし）");
        Err(GuideError::speech_failed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::infra::reasoning::prompts;

    #[tokio::test]
    async fn test_noop_reasoning_fails() {
        let err = NoopReasoningService
            .generate_json(prompts::guidance_request("Burn", "en", 0.2))
            .await
            .unwrap_err();
        assert!(matches!(err, ReasoningError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_noop_synthesis_fails() {
        let err = NoopReasoningService.synthesize("hello").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Network);
        assert_eq!(err.display_key(), "audioError");
    }

    #[test]
    fn test_noop_name() {
        assert_eq!(NoopReasoningService.name(), "noop");
    }
}

use std::sync::Arc;
use std::time::Duration;

use crate::domain::error::GuideError;
use crate::domain::guidance::{Guidance, GuidancePayload, GuidanceSource};
use crate::infra::offline_store::OfflineGuidanceStore;
use crate::infra::reasoning::{prompts, ReasoningService};

/// 言語コードから地域部分を落とす（"en-US" → "en", "zh_CN" → "zh"）
pub fn base_language(code: &str) -> &str {
    code.split(['-', '_']).next().unwrap_or(code)
}

/// 状況テキストに対するガイダンスをオンライン/オフラインで解決する
pub struct GuidanceResolver {
    reasoning: Arc<dyn ReasoningService>,
    store: Arc<OfflineGuidanceStore>,
    offline_latency: Duration,
    temperature: f32,
}

impl GuidanceResolver {
    pub fn new(
        reasoning: Arc<dyn ReasoningService>,
        store: Arc<OfflineGuidanceStore>,
        offline_latency: Duration,
        temperature: f32,
    ) -> Self {
        Self {
            reasoning,
            store,
            offline_latency,
            temperature,
        }
    }

    pub fn store(&self) -> &Arc<OfflineGuidanceStore> {
        &self.store
    }

    pub async fn resolve(
        &self,
        situation: &str,
        is_online: bool,
        language: &str,
    ) -> Result<Guidance, GuideError> {
        if is_online {
            self.resolve_remote(situation, language).await
        } else {
            self.resolve_offline(situation, language).await
        }
    }

    async fn resolve_remote(&self, situation: &str, language: &str) -> Result<Guidance, GuideError> {
        let request = prompts::guidance_request(situation, language, self.temperature);

        let json = self.reasoning.generate_json(request).await.map_err(|e| {
            log::error!("ガイダンス取得に失敗 ({}): {e}", self.reasoning.name());
            GuideError::guidance_failed()
        })?;

        let payload: GuidancePayload = serde_json::from_str(&json).map_err(|e| {
            log::error!("ガイダンス応答のパースに失敗: {e}");
            GuideError::guidance_failed()
        })?;

        if let Some(field) = payload.first_empty_list() {
            log::error!("ガイダンス応答の {field} が空です");
            return Err(GuideError::guidance_failed());
        }

        Ok(payload.into_guidance(GuidanceSource::Remote))
    }

    /// 完全一致で引き、見つかれば疑似レイテンシ後に返す
    async fn resolve_offline(&self, situation: &str, language: &str) -> Result<Guidance, GuideError> {
        let base = base_language(language);
        let guidance = self
            .store
            .resolve(base, situation)
            .cloned()
            .ok_or_else(|| {
                log::info!("オフラインデータに該当なし: {situation:?} ({base})");
                GuideError::no_offline_match(situation, base)
            })?;

        tokio::time::sleep(self.offline_latency).await;
        Ok(guidance)
    }
}

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// アプリケーション設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuideSettings {
    /// Gemini API キー（未設定ならリモート呼び出しはすべて失敗する）
    pub api_key: Option<String>,
    /// generateContent エンドポイントのベース URL
    pub api_base_url: String,
    /// 状況ガイダンス / 症状分析に使うモデル
    pub reasoning_model: String,
    /// 音声合成モデル
    pub speech_model: String,
    /// 合成音声のプリセット名
    pub voice_name: String,
    /// UI 言語コード（"en", "es-MX" など）
    pub language: String,
    /// 起動時の読み上げ設定
    pub read_aloud_enabled: bool,
    /// 画面遷移後に読み上げを始めるまでの待ち時間
    pub read_aloud_debounce_ms: u64,
    /// オフライン応答に入れる疑似レイテンシ
    pub offline_latency_ms: u64,
    /// HTTP タイムアウト秒数
    pub request_timeout_secs: u64,
    pub guidance_temperature: f32,
    pub analysis_temperature: f32,
}

impl Default for GuideSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: "https://generativelanguage.googleapis.com".to_string(),
            reasoning_model: "gemini-2.5-pro".to_string(),
            speech_model: "gemini-2.5-flash-preview-tts".to_string(),
            voice_name: "Kore".to_string(),
            language: "en".to_string(),
            read_aloud_enabled: false,
            read_aloud_debounce_ms: 300,
            offline_latency_ms: 500,
            request_timeout_secs: 30,
            guidance_temperature: 0.2,
            analysis_temperature: 0.3,
        }
    }
}

impl GuideSettings {
    /// デフォルト値に環境変数を重ねる
    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// JSON 文字列から読み込む（欠けたフィールドはデフォルト値）
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("API_KEY").or_else(|| non_empty("GEMINI_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(url) = non_empty("FA_API_BASE_URL") {
            self.api_base_url = url;
        }
        if let Some(lang) = non_empty("FA_LANGUAGE") {
            self.language = lang;
        }
        self
    }

    pub fn read_aloud_debounce(&self) -> Duration {
        Duration::from_millis(self.read_aloud_debounce_ms)
    }

    pub fn offline_latency(&self) -> Duration {
        Duration::from_millis(self.offline_latency_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = GuideSettings::default();
        assert!(s.api_key.is_none());
        assert!(!s.read_aloud_enabled);
        assert_eq!(s.read_aloud_debounce(), Duration::from_millis(300));
        assert_eq!(s.offline_latency(), Duration::from_millis(500));
        assert_eq!(s.language, "en");
    }

    #[test]
    fn overrides_prefer_api_key_over_gemini_key() {
        let s = GuideSettings::default().with_overrides(|name| match name {
            "API_KEY" => Some("primary".to_string()),
            "GEMINI_API_KEY" => Some("secondary".to_string()),
            "FA_LANGUAGE" => Some("fr-CA".to_string()),
            _ => None,
        });
        assert_eq!(s.api_key.as_deref(), Some("primary"));
        assert_eq!(s.language, "fr-CA");
    }

    #[test]
    fn blank_override_is_ignored() {
        let s = GuideSettings::default().with_overrides(|name| match name {
            "API_KEY" => Some("  ".to_string()),
            "GEMINI_API_KEY" => Some("fallback".to_string()),
            _ => None,
        });
        assert_eq!(s.api_key.as_deref(), Some("fallback"));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let s = GuideSettings::from_json(r#"{"language":"ar","read_aloud_enabled":true}"#).unwrap();
        assert_eq!(s.language, "ar");
        assert!(s.read_aloud_enabled);
        assert_eq!(s.voice_name, "Kore");
    }
}

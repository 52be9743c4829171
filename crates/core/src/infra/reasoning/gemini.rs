use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use super::prompts;
use super::{ReasoningError, ReasoningService, SpeechSynthesizer, StructuredRequest};
use crate::domain::error::GuideError;
use crate::domain::settings::GuideSettings;

/// Gemini generateContent API クライアント
///
/// 推論（構造化 JSON）と音声合成の両方を同じ HTTP クライアントで扱う。
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    reasoning_model: String,
    speech_model: String,
    voice_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing)]
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    data: String,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

fn user_text(text: String) -> Content {
    Content {
        role: Some("user".to_string()),
        parts: vec![Part {
            text: Some(text),
            inline_data: None,
        }],
    }
}

fn structured_body(request: StructuredRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        system_instruction: Some(Content {
            role: None,
            parts: vec![Part {
                text: Some(request.system_instruction),
                inline_data: None,
            }],
        }),
        contents: vec![user_text(request.prompt)],
        generation_config: GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(request.schema),
            temperature: Some(request.temperature),
            ..Default::default()
        },
    }
}

fn speech_body(text: &str, voice_name: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        system_instruction: None,
        contents: vec![user_text(prompts::speech_prompt(text))],
        generation_config: GenerationConfig {
            response_modalities: Some(vec!["AUDIO".to_string()]),
            speech_config: Some(SpeechConfig {
                voice_config: VoiceConfig {
                    prebuilt_voice_config: PrebuiltVoiceConfig {
                        voice_name: voice_name.to_string(),
                    },
                },
            }),
            ..Default::default()
        },
    }
}

/// 最初の候補のテキストパートを連結して返す
fn extract_text(response: GenerateContentResponse) -> Result<String, ReasoningError> {
    let text = response
        .candidates
        .into_iter()
        .next()
        .map(|c| {
            c.content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        return Err(ReasoningError::EmptyResponse);
    }
    Ok(text.to_string())
}

/// 最初の候補の最初のパートの inlineData を base64 デコードする
fn extract_audio(response: GenerateContentResponse) -> Result<Vec<u8>, ReasoningError> {
    let data = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().next())
        .and_then(|p| p.inline_data)
        .map(|d| d.data)
        .filter(|d| !d.is_empty())
        .ok_or(ReasoningError::EmptyResponse)?;

    STANDARD
        .decode(data.as_bytes())
        .map_err(|e| ReasoningError::Transport(format!("Invalid base64 audio payload: {e}")))
}

impl GeminiClient {
    /// 設定から生成する。API キー未設定なら `NotConfigured`。
    pub fn from_settings(settings: &GuideSettings) -> Result<Self, ReasoningError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ReasoningError::NotConfigured("API key is not set".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| ReasoningError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            reasoning_model: settings.reasoning_model.clone(),
            speech_model: settings.speech_model.clone(),
            voice_name: settings.voice_name.clone(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.base_url)
    }

    async fn generate_content(
        &self,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ReasoningError> {
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReasoningError::Timeout
                } else {
                    ReasoningError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ReasoningError::Service { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| ReasoningError::Transport(format!("Response parse error: {e}")))
    }
}

#[async_trait]
impl ReasoningService for GeminiClient {
    async fn generate_json(&self, request: StructuredRequest) -> Result<String, ReasoningError> {
        let body = structured_body(request);
        let response = self.generate_content(&self.reasoning_model, &body).await?;
        extract_text(response)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[async_trait]
impl SpeechSynthesizer for GeminiClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, GuideError> {
        let body = speech_body(text, &self.voice_name);
        let result = match self.generate_content(&self.speech_model, &body).await {
            Ok(response) => extract_audio(response),
            Err(e) => Err(e),
        };
        result.map_err(|e| {
            log::error!("音声合成に失敗: {e}");
            GuideError::speech_failed()
        })
    }
}

use std::sync::Arc;

use crate::domain::error::GuideError;
use crate::domain::guidance::SymptomAnalysis;
use crate::infra::reasoning::{prompts, ReasoningService};

/// 症状リストをリモート推論サービスで分析する（オフライン経路なし）
pub struct SymptomAnalyzer {
    reasoning: Arc<dyn ReasoningService>,
    temperature: f32,
}

impl SymptomAnalyzer {
    pub fn new(reasoning: Arc<dyn ReasoningService>, temperature: f32) -> Self {
        Self {
            reasoning,
            temperature,
        }
    }

    /// 症状を分析する。`potential_conditions` はサービスの返した順のまま。
    pub async fn analyze(
        &self,
        symptoms: &[String],
        language: &str,
    ) -> Result<SymptomAnalysis, GuideError> {
        if symptoms.is_empty() {
            return Err(GuideError::InvalidInput("symptom list is empty".to_string()));
        }

        let request = prompts::symptom_request(symptoms, language, self.temperature);

        let json = self.reasoning.generate_json(request).await.map_err(|e| {
            log::error!("症状分析に失敗 ({}): {e}", self.reasoning.name());
            GuideError::symptom_analysis_failed()
        })?;

        // severity が High/Medium/Low 以外ならここで失敗する
        let analysis: SymptomAnalysis = serde_json::from_str(&json).map_err(|e| {
            log::error!("症状分析応答のパースに失敗: {e}");
            GuideError::symptom_analysis_failed()
        })?;

        if let Some(field) = analysis.first_empty_list() {
            log::error!("症状分析応答の {field} が空です");
            return Err(GuideError::symptom_analysis_failed());
        }

        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::domain::guidance::Severity;
    use crate::infra::reasoning::{ReasoningError, StructuredRequest};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct FixedReasoning {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ReasoningService for FixedReasoning {
        async fn generate_json(&self, request: StructuredRequest) -> Result<String, ReasoningError> {
            self.prompts.lock().push(request.prompt);
            Ok(self.reply.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn analysis_json(severities: &[&str]) -> String {
        let conditions = severities
            .iter()
            .enumerate()
            .map(|(i, s)| {
                format!(r#"{{"name":"Condition {i}","description":"d","severity":"{s}"}}"#)
            })
            .collect::<Vec<_>>()
            .join(",");
        format!(
            r#"{{"potentialConditions":[{conditions}],
                "firstAidGuidance":{{"immediateAssessment":["a"],"criticalSymptoms":["b"],
                    "firstAidMeasures":["c"],"seekMedicalAssistance":["d"]}},
                "overallDisclaimer":"Not a diagnosis"}}"#
        )
    }

    fn analyzer(reply: String) -> (SymptomAnalyzer, Arc<FixedReasoning>) {
        let reasoning = Arc::new(FixedReasoning {
            reply,
            prompts: Mutex::new(Vec::new()),
        });
        (SymptomAnalyzer::new(reasoning.clone(), 0.3), reasoning)
    }

    #[tokio::test]
    async fn test_preserves_service_order() {
        let (analyzer, reasoning) = analyzer(analysis_json(&["Low", "High", "Medium"]));
        let symptoms = vec!["fever".to_string(), "rash".to_string()];
        let analysis = analyzer.analyze(&symptoms, "en").await.unwrap();

        let severities: Vec<Severity> = analysis
            .potential_conditions
            .iter()
            .map(|c| c.severity)
            .collect();
        assert_eq!(severities, vec![Severity::Low, Severity::High, Severity::Medium]);
        assert_eq!(analysis.potential_conditions[0].name, "Condition 0");
        assert_eq!(
            reasoning.prompts.lock()[0],
            "Analyze the following symptoms: fever, rash"
        );
    }

    #[tokio::test]
    async fn test_unknown_severity_is_parse_failure() {
        let (analyzer, _) = analyzer(analysis_json(&["Critical"]));
        let err = analyzer.analyze(&["cough".to_string()], "en").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Network);
        assert_eq!(err.display_key(), "symptomError");
        assert!(err.to_string().contains("symptom analysis"));
    }

    #[tokio::test]
    async fn test_empty_conditions_is_failure() {
        let (analyzer, _) = analyzer(analysis_json(&[]));
        let err = analyzer.analyze(&["cough".to_string()], "en").await.unwrap_err();
        assert_eq!(err.display_key(), "symptomError");
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected_without_call() {
        let (analyzer, reasoning) = analyzer(analysis_json(&["Low"]));
        let err = analyzer.analyze(&[], "en").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);
        assert!(reasoning.prompts.lock().is_empty());
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::error::{ErrorCode, ErrorView};
    use crate::domain::guidance::{
        Guidance, GuidancePayload, GuidanceSource, GuideResult, Severity, SymptomAnalysis,
    };
    use crate::domain::screen::{Screen, ScreenTransition};
    use crate::domain::types::{Emergency, PlaybackState};

    #[test]
    fn test_guidance_source_serialization() {
        assert_eq!(
            serde_json::to_string(&GuidanceSource::Remote).unwrap(),
            "\"REMOTE\""
        );
        assert_eq!(
            serde_json::to_string(&GuidanceSource::Offline).unwrap(),
            "\"OFFLINE\""
        );
    }

    #[test]
    fn test_guidance_uses_camel_case_fields() {
        let g = Guidance {
            situation: "s".into(),
            immediate_assessment: vec!["a".into()],
            critical_symptoms: vec!["b".into()],
            first_aid_measures: vec!["c".into()],
            seek_medical_assistance: vec!["d".into()],
            disclaimer: "x".into(),
            source: GuidanceSource::Offline,
        };
        let json = serde_json::to_string(&g).unwrap();
        assert!(json.contains("\"immediateAssessment\""));
        assert!(json.contains("\"seekMedicalAssistance\""));
        assert!(json.contains("\"source\":\"OFFLINE\""));
    }

    #[test]
    fn test_payload_rejects_missing_field() {
        let json = r#"{"situation":"s","immediateAssessment":["a"],"criticalSymptoms":["b"],
            "firstAidMeasures":["c"],"disclaimer":"x"}"#;
        assert!(serde_json::from_str::<GuidancePayload>(json).is_err());
    }

    #[test]
    fn test_payload_rejects_unknown_field() {
        let json = r#"{"situation":"s","immediateAssessment":["a"],"criticalSymptoms":["b"],
            "firstAidMeasures":["c"],"seekMedicalAssistance":["d"],"disclaimer":"x",
            "confidence":0.9}"#;
        assert!(serde_json::from_str::<GuidancePayload>(json).is_err());
    }

    #[test]
    fn test_analysis_rejects_unknown_nested_field() {
        let json = r#"{"potentialConditions":[{"name":"n","description":"d","severity":"Low","icd10":"X"}],
            "firstAidGuidance":{"immediateAssessment":["a"],"criticalSymptoms":["b"],
                "firstAidMeasures":["c"],"seekMedicalAssistance":["d"]},
            "overallDisclaimer":"x"}"#;
        assert!(serde_json::from_str::<SymptomAnalysis>(json).is_err());

        let ok = json.replace(r#","icd10":"X""#, "");
        assert!(serde_json::from_str::<SymptomAnalysis>(&ok).is_ok());
    }

    #[test]
    fn test_severity_is_closed_enum() {
        assert_eq!(
            serde_json::from_str::<Severity>("\"High\"").unwrap(),
            Severity::High
        );
        assert!(serde_json::from_str::<Severity>("\"Critical\"").is_err());
        assert!(serde_json::from_str::<Severity>("\"high\"").is_err());
    }

    #[test]
    fn test_symptom_analysis_deserialization() {
        let json = r#"{
            "potentialConditions": [
                {"name": "Flu", "description": "Viral", "severity": "Medium"}
            ],
            "firstAidGuidance": {
                "immediateAssessment": ["a"],
                "criticalSymptoms": ["b"],
                "firstAidMeasures": ["c"],
                "seekMedicalAssistance": ["d"]
            },
            "overallDisclaimer": "Not a diagnosis"
        }"#;
        let a: SymptomAnalysis = serde_json::from_str(json).unwrap();
        assert_eq!(a.potential_conditions[0].severity, Severity::Medium);
        assert_eq!(a.overall_disclaimer, "Not a diagnosis");
    }

    #[test]
    fn test_guide_result_is_tagged() {
        let json = serde_json::to_string(&GuideResult::SymptomAnalysis(SymptomAnalysis {
            potential_conditions: vec![],
            first_aid_guidance: crate::domain::guidance::FirstAidGuidance {
                immediate_assessment: vec![],
                critical_symptoms: vec![],
                first_aid_measures: vec![],
                seek_medical_assistance: vec![],
            },
            overall_disclaimer: String::new(),
        }))
        .unwrap();
        assert!(json.contains("\"kind\":\"symptom_analysis\""));
    }

    #[test]
    fn test_error_code_serialization() {
        assert_eq!(
            serde_json::to_string(&ErrorCode::NoOfflineMatch).unwrap(),
            "\"E_NO_OFFLINE_MATCH\""
        );
        let view = ErrorView {
            code: ErrorCode::Network,
            message: "m".into(),
        };
        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains("E_NETWORK"));
    }

    #[test]
    fn test_enum_serialization() {
        assert_eq!(
            serde_json::to_string(&Emergency::DiabeticEmergency).unwrap(),
            "\"diabetic_emergency\""
        );
        assert_eq!(
            serde_json::to_string(&PlaybackState::Decoding).unwrap(),
            "\"decoding\""
        );
        let t = ScreenTransition {
            prev: Screen::Home,
            new: Screen::SymptomChecker,
        };
        let json = serde_json::to_string(&t).unwrap();
        assert!(json.contains("symptom_checker"));
    }
}

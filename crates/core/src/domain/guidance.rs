use serde::{Deserialize, Serialize};

use super::i18n::Translator;

/// ガイダンスの取得経路
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GuidanceSource {
    Remote,
    Offline,
}

/// 単一状況に対する応急処置ガイダンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guidance {
    /// 状況の一文要約
    pub situation: String,
    pub immediate_assessment: Vec<String>,
    pub critical_symptoms: Vec<String>,
    pub first_aid_measures: Vec<String>,
    pub seek_medical_assistance: Vec<String>,
    pub disclaimer: String,
    /// 実際に通った経路（UI のバッジ表示に使う）
    pub source: GuidanceSource,
}

/// リモートサービスの応答形（source を持たない）。余分なフィールドはパース失敗。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GuidancePayload {
    pub situation: String,
    pub immediate_assessment: Vec<String>,
    pub critical_symptoms: Vec<String>,
    pub first_aid_measures: Vec<String>,
    pub seek_medical_assistance: Vec<String>,
    pub disclaimer: String,
}

impl GuidancePayload {
    pub fn into_guidance(self, source: GuidanceSource) -> Guidance {
        Guidance {
            situation: self.situation,
            immediate_assessment: self.immediate_assessment,
            critical_symptoms: self.critical_symptoms,
            first_aid_measures: self.first_aid_measures,
            seek_medical_assistance: self.seek_medical_assistance,
            disclaimer: self.disclaimer,
            source,
        }
    }

    /// 4 つの手順リストがすべて非空かを検査し、空のリスト名を返す
    pub fn first_empty_list(&self) -> Option<&'static str> {
        first_empty_list(
            &self.immediate_assessment,
            &self.critical_symptoms,
            &self.first_aid_measures,
            &self.seek_medical_assistance,
        )
    }
}

/// 症状チェッカーの重症度。これ以外の値はパース失敗として扱う。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// 翻訳キー（値そのもの）
    pub fn as_key(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PotentialCondition {
    pub name: String,
    pub description: String,
    pub severity: Severity,
}

/// 症状分析の応急処置部分（situation / disclaimer / source を除いた Guidance）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FirstAidGuidance {
    pub immediate_assessment: Vec<String>,
    pub critical_symptoms: Vec<String>,
    pub first_aid_measures: Vec<String>,
    pub seek_medical_assistance: Vec<String>,
}

/// 複数症状に対する分析結果
///
/// `potential_conditions` はサービスが返した順（可能性・重症度の高い順）を保持し、
/// 再ソートしない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SymptomAnalysis {
    pub potential_conditions: Vec<PotentialCondition>,
    pub first_aid_guidance: FirstAidGuidance,
    pub overall_disclaimer: String,
}

impl SymptomAnalysis {
    pub fn first_empty_list(&self) -> Option<&'static str> {
        if self.potential_conditions.is_empty() {
            return Some("potentialConditions");
        }
        let g = &self.first_aid_guidance;
        first_empty_list(
            &g.immediate_assessment,
            &g.critical_symptoms,
            &g.first_aid_measures,
            &g.seek_medical_assistance,
        )
    }
}

fn first_empty_list(
    immediate_assessment: &[String],
    critical_symptoms: &[String],
    first_aid_measures: &[String],
    seek_medical_assistance: &[String],
) -> Option<&'static str> {
    [
        ("immediateAssessment", immediate_assessment),
        ("criticalSymptoms", critical_symptoms),
        ("firstAidMeasures", first_aid_measures),
        ("seekMedicalAssistance", seek_medical_assistance),
    ]
    .into_iter()
    .find(|(_, items)| items.is_empty())
    .map(|(name, _)| name)
}

/// 結果画面に表示する結果（2 ケースのタグ付きユニオン）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GuideResult {
    Guidance(Guidance),
    SymptomAnalysis(SymptomAnalysis),
}

impl GuideResult {
    /// 読み上げ用テキストを組み立てる。
    ///
    /// 各セクションは `"<見出し>. <項目を '. ' で連結>"`、セクション同士は `". "` で連結する。
    pub fn to_speech_text(&self, translator: &dyn Translator, language: &str) -> String {
        let t = |key: &str| translator.t(language, key);

        let sections: Vec<(String, Vec<String>)> = match self {
            Self::Guidance(g) => vec![
                (t("situationQueryTitle"), vec![g.situation.clone()]),
                (t("immediateAssessment"), g.immediate_assessment.clone()),
                (t("criticalSymptomsToMonitor"), g.critical_symptoms.clone()),
                (t("firstAidMeasures"), g.first_aid_measures.clone()),
                (t("whenToSeekMedicalAssistance"), g.seek_medical_assistance.clone()),
                (t("importantDisclaimer"), vec![g.disclaimer.clone()]),
            ],
            Self::SymptomAnalysis(a) => {
                let severity_label = t("severity");
                let conditions = a
                    .potential_conditions
                    .iter()
                    .map(|c| {
                        format!(
                            "{}. {}: {}. {}",
                            c.name,
                            severity_label,
                            t(c.severity.as_key()),
                            c.description
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(". ");
                let g = &a.first_aid_guidance;
                vec![
                    (t("potentialConditions"), vec![conditions]),
                    (t("immediateAssessment"), g.immediate_assessment.clone()),
                    (t("criticalSymptomsToMonitor"), g.critical_symptoms.clone()),
                    (t("firstAidMeasures"), g.first_aid_measures.clone()),
                    (t("whenToSeekMedicalAssistance"), g.seek_medical_assistance.clone()),
                    (t("importantDisclaimer"), vec![a.overall_disclaimer.clone()]),
                ]
            }
        };

        sections
            .into_iter()
            .map(|(title, items)| format!("{}. {}", title, items.join(". ")))
            .collect::<Vec<_>>()
            .join(". ")
    }
}

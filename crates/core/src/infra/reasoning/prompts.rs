//! 応急処置ガイダンス / 症状分析のプロンプトと応答スキーマ
use serde_json::{json, Value};

use super::StructuredRequest;

/// 状況ガイダンス用システム指示
pub fn guidance_system_instruction(language: &str) -> String {
    format!(
        "\
You are an AI Medical Assistant designed for general public use.
Your purpose is to provide clear, concise, and step-by-step guidance for common medical situations.
Your advice must be based on standard first-aid protocols.
Prioritize immediate actions and clear, unambiguous instructions.
You must not provide a definitive diagnosis.
Always conclude with a disclaimer advising that the guidance is not a substitute for professional medical advice and to contact emergency services (like 911, 112, etc.) for serious conditions.
Respond ONLY in the provided JSON format, with all string values translated to the language with code \"{language}\"."
    )
}

/// 症状分析用システム指示
pub fn symptom_system_instruction(language: &str) -> String {
    format!(
        "\
You are an expert AI medical symptom analyst.
Given a list of symptoms, your task is to provide a list of potential related conditions, ordered from most likely/severe to least.
For each condition, provide a brief description and a severity rating (High, Medium, Low). 'High' severity should be reserved for life-threatening emergencies requiring immediate action.
Also, provide a consolidated, step-by-step first aid plan that is generally applicable to the combination of symptoms provided.
Crucially, you must include a strong disclaimer that this is NOT a medical diagnosis and a healthcare professional must be consulted for proper evaluation.
Respond ONLY in the provided JSON format, with all string values translated to the language with code \"{language}\"."
    )
}

pub fn guidance_prompt(situation: &str) -> String {
    format!("Generate guidance for the following situation: \"{situation}\"")
}

pub fn symptom_prompt(symptoms: &[String]) -> String {
    format!("Analyze the following symptoms: {}", symptoms.join(", "))
}

pub fn speech_prompt(text: &str) -> String {
    format!("Read calmly and clearly: {text}")
}

fn string_list(description: &str) -> Value {
    json!({
        "type": "ARRAY",
        "items": { "type": "STRING" },
        "description": description,
    })
}

pub fn guidance_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "situation": {
                "type": "STRING",
                "description": "A brief, one-sentence summary of the medical situation."
            },
            "immediateAssessment": string_list("Bulleted list of step-by-step initial assessment actions."),
            "criticalSymptoms": string_list("Bulleted list of key symptoms to monitor closely."),
            "firstAidMeasures": string_list("Bulleted list of first aid steps to take."),
            "seekMedicalAssistance": string_list(
                "Bulleted list of conditions or triggers for when to seek professional medical help (e.g., calling emergency services, visiting a doctor or hospital)."
            ),
            "disclaimer": {
                "type": "STRING",
                "description": "A standard safety disclaimer."
            }
        },
        "required": [
            "situation",
            "immediateAssessment",
            "criticalSymptoms",
            "firstAidMeasures",
            "seekMedicalAssistance",
            "disclaimer"
        ]
    })
}

pub fn symptom_analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "potentialConditions": {
                "type": "ARRAY",
                "description": "A list of potential medical conditions related to the provided symptoms.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING", "description": "The name of the potential condition." },
                        "description": { "type": "STRING", "description": "A brief, simple explanation of the condition." },
                        "severity": {
                            "type": "STRING",
                            "enum": ["High", "Medium", "Low"],
                            "description": "An assessment of the potential urgency or severity. High indicates a life-threatening emergency."
                        }
                    },
                    "required": ["name", "description", "severity"]
                }
            },
            "firstAidGuidance": {
                "type": "OBJECT",
                "properties": {
                    "immediateAssessment": string_list("General immediate assessment steps based on the symptoms."),
                    "criticalSymptoms": string_list("Critical symptoms to watch for that require immediate escalation."),
                    "firstAidMeasures": string_list("Step-by-step first aid guidance relevant to the set of symptoms."),
                    "seekMedicalAssistance": string_list("When to call emergency services.")
                },
                "required": ["immediateAssessment", "criticalSymptoms", "firstAidMeasures", "seekMedicalAssistance"]
            },
            "overallDisclaimer": {
                "type": "STRING",
                "description": "A comprehensive disclaimer stating this is not a diagnosis and a medical professional must be consulted."
            }
        },
        "required": ["potentialConditions", "firstAidGuidance", "overallDisclaimer"]
    })
}

/// 状況テキストからガイダンスリクエストを組み立てる
pub fn guidance_request(situation: &str, language: &str, temperature: f32) -> StructuredRequest {
    StructuredRequest {
        system_instruction: guidance_system_instruction(language),
        prompt: guidance_prompt(situation),
        schema: guidance_schema(),
        temperature,
    }
}

/// 症状リストから分析リクエストを組み立てる
pub fn symptom_request(symptoms: &[String], language: &str, temperature: f32) -> StructuredRequest {
    StructuredRequest {
        system_instruction: symptom_system_instruction(language),
        prompt: symptom_prompt(symptoms),
        schema: symptom_analysis_schema(),
        temperature,
    }
}

use std::collections::HashMap;

/// 翻訳のフォールバック先
pub const FALLBACK_LANGUAGE: &str = "en";

/// 翻訳テーブル trait（画面側の文字列表は外部から供給される）
pub trait Translator: Send + Sync {
    /// 指定言語のキーをそのまま引く（フォールバックなし）
    fn lookup(&self, language: &str, key: &str) -> Option<String>;

    /// 指定言語 → 英語 → キー文字列 の順でフォールバックする
    fn t(&self, language: &str, key: &str) -> String {
        self.lookup(language, key)
            .or_else(|| self.lookup(FALLBACK_LANGUAGE, key))
            .unwrap_or_else(|| key.to_string())
    }
}

/// 読み上げ組み立てとエラー表示に必要な英語文字列
const BUILTIN_EN: &[(&str, &str)] = &[
    ("situationQueryTitle", "Situation"),
    ("immediateAssessment", "Immediate Assessment"),
    ("criticalSymptomsToMonitor", "Critical Symptoms to Monitor"),
    ("firstAidMeasures", "First Aid Measures"),
    ("whenToSeekMedicalAssistance", "When to Seek Medical Assistance"),
    ("importantDisclaimer", "Important Disclaimer"),
    ("potentialConditions", "Potential Conditions"),
    ("severity", "Severity"),
    ("High", "High"),
    ("Medium", "Medium"),
    ("Low", "Low"),
    (
        "offlineError",
        "You are offline. Only common emergencies are available. Please connect to the internet for AI assistance.",
    ),
    (
        "geminiError",
        "Could not get guidance from the AI assistant. Please check your connection and try again.",
    ),
    (
        "symptomError",
        "Could not analyze the symptoms. Please check your connection and try again.",
    ),
    ("audioError", "Could not play the audio guidance."),
    ("unknownError", "An unknown error occurred."),
];

/// 言語コード → (キー → 文字列) のインメモリ翻訳テーブル
#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    tables: HashMap<String, HashMap<String, String>>,
}

impl TranslationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 英語の組み込み文字列のみを持つテーブル
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for (key, value) in BUILTIN_EN {
            table.insert(FALLBACK_LANGUAGE, key, value);
        }
        table
    }

    pub fn insert(&mut self, language: &str, key: &str, value: &str) {
        self.tables
            .entry(language.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    /// 1 言語分をまとめて登録する（既存キーは上書き）
    pub fn extend_language<I, K, V>(&mut self, language: &str, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let table = self.tables.entry(language.to_string()).or_default();
        for (k, v) in entries {
            table.insert(k.into(), v.into());
        }
    }
}

impl Translator for TranslationTable {
    fn lookup(&self, language: &str, key: &str) -> Option<String> {
        self.tables.get(language)?.get(key).cloned()
    }
}

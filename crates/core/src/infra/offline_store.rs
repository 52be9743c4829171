use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use serde::Deserialize;

use crate::domain::guidance::{Guidance, GuidancePayload, GuidanceSource};
use crate::domain::i18n::FALLBACK_LANGUAGE;
use crate::domain::types::Emergency;

/// ビルド時に同梱するオフラインガイダンス（言語 → 定型フレーズ 6 件）
const BUNDLED_DATA: &str = include_str!("../../data/offline_guidance.json");

static SHARED: OnceLock<Arc<OfflineGuidanceStore>> = OnceLock::new();

#[derive(Deserialize)]
struct RawEntry {
    emergency: Emergency,
    phrase: String,
    guidance: GuidancePayload,
}

struct LanguageTable {
    /// フレーズ完全一致 → ガイダンス
    by_phrase: HashMap<String, Guidance>,
    /// 定型緊急事態 → フレーズ（データファイルの順序を保持）
    phrases: Vec<(Emergency, String)>,
}

/// 言語別の読み取り専用オフラインガイダンス表
///
/// キーは `(言語コード, 状況フレーズ)` の完全一致。ロード後は変更されない。
pub struct OfflineGuidanceStore {
    languages: HashMap<String, LanguageTable>,
}

impl OfflineGuidanceStore {
    /// 同梱データをパースする
    pub fn bundled() -> Result<Self, serde_json::Error> {
        Self::from_json(BUNDLED_DATA)
    }

    /// プロセス内で共有される同梱ストア（初回のみパース）
    pub fn shared() -> Result<Arc<Self>, serde_json::Error> {
        if let Some(store) = SHARED.get() {
            return Ok(store.clone());
        }
        let store = Arc::new(Self::bundled()?);
        Ok(SHARED.get_or_init(|| store).clone())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: HashMap<String, Vec<RawEntry>> = serde_json::from_str(json)?;

        let languages = raw
            .into_iter()
            .map(|(lang, entries)| {
                let mut by_phrase = HashMap::with_capacity(entries.len());
                let mut phrases = Vec::with_capacity(entries.len());
                for entry in entries {
                    phrases.push((entry.emergency, entry.phrase.clone()));
                    by_phrase.insert(
                        entry.phrase,
                        entry.guidance.into_guidance(GuidanceSource::Offline),
                    );
                }
                (lang, LanguageTable { by_phrase, phrases })
            })
            .collect::<HashMap<_, _>>();

        log::debug!("オフラインガイダンスをロード: {} 言語", languages.len());
        Ok(Self { languages })
    }

    /// 指定言語だけを引く（フォールバックなし）
    pub fn lookup(&self, language: &str, phrase: &str) -> Option<&Guidance> {
        self.languages.get(language)?.by_phrase.get(phrase)
    }

    /// 指定言語 → 英語 の順で引く
    pub fn resolve(&self, language: &str, phrase: &str) -> Option<&Guidance> {
        self.lookup(language, phrase)
            .or_else(|| self.lookup(FALLBACK_LANGUAGE, phrase))
    }

    /// 定型緊急事態のフレーズ（UI のボタンが送る文字列）
    pub fn phrase_for(&self, language: &str, emergency: Emergency) -> Option<&str> {
        let find = |lang: &str| {
            self.languages.get(lang).and_then(|table| {
                table
                    .phrases
                    .iter()
                    .find(|(e, _)| *e == emergency)
                    .map(|(_, phrase)| phrase.as_str())
            })
        };
        find(language).or_else(|| find(FALLBACK_LANGUAGE))
    }

    /// 言語のフレーズ一覧。未対応言語なら英語。
    pub fn phrases(&self, language: &str) -> Vec<&str> {
        self.languages
            .get(language)
            .or_else(|| self.languages.get(FALLBACK_LANGUAGE))
            .map(|table| table.phrases.iter().map(|(_, p)| p.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn languages(&self) -> Vec<&str> {
        let mut langs: Vec<&str> = self.languages.keys().map(String::as_str).collect();
        langs.sort_unstable();
        langs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHEST_PAIN_EN: &str = "Someone with chest pain and shortness of breath";

    #[test]
    fn bundled_data_has_six_phrases_per_language() {
        let store = OfflineGuidanceStore::bundled().unwrap();
        assert_eq!(store.languages(), vec!["ar", "en", "es", "fr", "ru", "zh"]);
        for lang in store.languages() {
            assert_eq!(store.phrases(lang).len(), 6, "language {lang}");
            for emergency in Emergency::ALL {
                assert!(store.phrase_for(lang, emergency).is_some());
            }
        }
    }

    #[test]
    fn every_entry_is_tagged_offline_and_non_empty() {
        let store = OfflineGuidanceStore::bundled().unwrap();
        for lang in store.languages() {
            for phrase in store.phrases(lang) {
                let g = store.lookup(lang, phrase).unwrap();
                assert_eq!(g.source, GuidanceSource::Offline);
                assert!(!g.situation.is_empty());
                assert!(!g.immediate_assessment.is_empty());
                assert!(!g.critical_symptoms.is_empty());
                assert!(!g.first_aid_measures.is_empty());
                assert!(!g.seek_medical_assistance.is_empty());
                assert!(!g.disclaimer.is_empty());
            }
        }
    }

    #[test]
    fn lookup_is_exact_match() {
        let store = OfflineGuidanceStore::bundled().unwrap();
        assert!(store.lookup("en", CHEST_PAIN_EN).is_some());
        assert!(store.lookup("en", &CHEST_PAIN_EN.to_lowercase()).is_none());
        assert!(store.lookup("en", "Someone with chest pain").is_none());
    }

    #[test]
    fn resolve_falls_back_to_english() {
        let store = OfflineGuidanceStore::bundled().unwrap();
        assert!(store.lookup("de", CHEST_PAIN_EN).is_none());
        let g = store.resolve("de", CHEST_PAIN_EN).unwrap();
        assert!(g.situation.starts_with("Person experiencing chest pain"));
        // 英語フレーズは他言語テーブルにないので英語へフォールバックする
        assert!(store.resolve("es", CHEST_PAIN_EN).is_some());
    }

    #[test]
    fn phrase_for_unknown_language_uses_english() {
        let store = OfflineGuidanceStore::bundled().unwrap();
        assert_eq!(
            store.phrase_for("ja", Emergency::Seizure),
            Some("Someone having a seizure")
        );
        assert_eq!(
            store.phrase_for("es", Emergency::ChestPain),
            Some("Alguien con dolor de pecho y dificultad para respirar")
        );
    }

    #[test]
    fn shared_store_is_parsed_once() {
        let a = OfflineGuidanceStore::shared().unwrap();
        let b = OfflineGuidanceStore::shared().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}

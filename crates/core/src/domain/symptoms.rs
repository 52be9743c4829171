use serde::Serialize;

/// 症状チェッカーで入力された症状の順序付きリスト
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SymptomList {
    items: Vec<String>,
}

impl SymptomList {
    pub fn new() -> Self {
        Self::default()
    }

    /// 症状を追加する。前後の空白は除去し、空文字と
    /// 大文字小文字を無視した完全一致の重複は追加しない。
    pub fn add(&mut self, symptom: &str) -> bool {
        let symptom = symptom.trim();
        if symptom.is_empty() {
            return false;
        }
        let lower = symptom.to_lowercase();
        if self.items.iter().any(|s| s.to_lowercase() == lower) {
            return false;
        }
        self.items.push(symptom.to_string());
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<String> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<String> {
        self.items
    }
}

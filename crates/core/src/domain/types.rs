use serde::{Deserialize, Serialize};

/// ホーム画面に並ぶ定型の緊急事態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emergency {
    ChestPain,
    AllergicReaction,
    Fainting,
    DiabeticEmergency,
    Seizure,
    HeavyBleeding,
}

impl Emergency {
    pub const ALL: [Emergency; 6] = [
        Self::ChestPain,
        Self::AllergicReaction,
        Self::Fainting,
        Self::DiabeticEmergency,
        Self::Seizure,
        Self::HeavyBleeding,
    ];
}

/// 再生コントローラーの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Idle,
    Decoding,
    Playing,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Decoding => "decoding",
            Self::Playing => "playing",
        }
    }

    /// セッションが生存中か（Decoding / Playing）
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

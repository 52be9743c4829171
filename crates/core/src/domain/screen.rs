use serde::Serialize;

use super::error::ErrorView;
use super::guidance::GuideResult;

/// 画面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Home,
    Voice,
    Results,
    SymptomChecker,
    EmergencyNumbers,
}

impl Screen {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Voice => "voice",
            Self::Results => "results",
            Self::SymptomChecker => "symptom_checker",
            Self::EmergencyNumbers => "emergency_numbers",
        }
    }
}

/// リクエスト識別子（単調増加）
pub type RequestId = u64;

/// 結果画面の表示状態
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultsState {
    /// 表示用の問い合わせ文（症状は ", " 連結）
    pub query: String,
    pub result: Option<GuideResult>,
    pub loading: bool,
    pub error: Option<ErrorView>,
}

/// 画面遷移イベントペイロード
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreenTransition {
    pub prev: Screen,
    pub new: Screen,
}

/// 画面マネージャー（現在画面 + 結果状態 + 最新リクエスト ID）
///
/// 結果の確定は最後に発行したリクエストのものだけを受け付ける。
/// 古いリクエストが後から完了しても結果状態は変わらない。
pub struct ScreenManager {
    current: Screen,
    results: ResultsState,
    latest_request: RequestId,
}

impl ScreenManager {
    pub fn new() -> Self {
        Self {
            current: Screen::Home,
            results: ResultsState::default(),
            latest_request: 0,
        }
    }

    pub fn current(&self) -> Screen {
        self.current
    }

    pub fn results(&self) -> &ResultsState {
        &self.results
    }

    pub fn latest_request(&self) -> RequestId {
        self.latest_request
    }

    pub fn is_latest(&self, id: RequestId) -> bool {
        id == self.latest_request
    }

    /// 画面遷移
    pub fn navigate(&mut self, screen: Screen) -> ScreenTransition {
        let prev = self.current;
        self.current = screen;
        ScreenTransition { prev, new: screen }
    }

    /// 新しいリクエストを開始: 結果状態をリセットし、結果画面へ遷移する
    pub fn begin_request(&mut self, query: impl Into<String>) -> (RequestId, ScreenTransition) {
        self.latest_request += 1;
        self.results = ResultsState {
            query: query.into(),
            result: None,
            loading: true,
            error: None,
        };
        let transition = self.navigate(Screen::Results);
        (self.latest_request, transition)
    }

    /// 結果を確定する。最新でなければ破棄して false を返す。
    pub fn commit_result(&mut self, id: RequestId, result: GuideResult) -> bool {
        if !self.is_latest(id) {
            return false;
        }
        self.results.result = Some(result);
        self.results.error = None;
        self.results.loading = false;
        true
    }

    /// エラーを確定する。最新でなければ破棄して false を返す。
    pub fn commit_error(&mut self, id: RequestId, error: ErrorView) -> bool {
        if !self.is_latest(id) {
            return false;
        }
        self.results.result = None;
        self.results.error = Some(error);
        self.results.loading = false;
        true
    }

    /// ホームへ戻る。進行中のリクエストは以後確定されない。
    pub fn go_home(&mut self) -> ScreenTransition {
        self.latest_request += 1;
        self.results = ResultsState::default();
        self.navigate(Screen::Home)
    }
}

impl Default for ScreenManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::domain::guidance::{Guidance, GuidanceSource};

    fn guidance(situation: &str) -> GuideResult {
        GuideResult::Guidance(Guidance {
            situation: situation.into(),
            immediate_assessment: vec!["a".into()],
            critical_symptoms: vec!["b".into()],
            first_aid_measures: vec!["c".into()],
            seek_medical_assistance: vec!["d".into()],
            disclaimer: "e".into(),
            source: GuidanceSource::Offline,
        })
    }

    #[test]
    fn begin_request_resets_and_navigates() {
        let mut mgr = ScreenManager::new();
        let (id, t) = mgr.begin_request("burn");
        assert_eq!(id, 1);
        assert_eq!(t.prev, Screen::Home);
        assert_eq!(t.new, Screen::Results);
        assert!(mgr.results().loading);
        assert_eq!(mgr.results().query, "burn");
    }

    #[test]
    fn stale_completion_is_discarded() {
        let mut mgr = ScreenManager::new();
        let (first, _) = mgr.begin_request("first");
        let (second, _) = mgr.begin_request("second");

        assert!(mgr.commit_result(second, guidance("second")));
        assert!(!mgr.commit_result(first, guidance("first")));

        match &mgr.results().result {
            Some(GuideResult::Guidance(g)) => assert_eq!(g.situation, "second"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn stale_error_does_not_overwrite_result() {
        let mut mgr = ScreenManager::new();
        let (first, _) = mgr.begin_request("first");
        let (second, _) = mgr.begin_request("second");
        mgr.commit_result(second, guidance("second"));

        let committed = mgr.commit_error(
            first,
            ErrorView {
                code: ErrorCode::Network,
                message: "boom".into(),
            },
        );
        assert!(!committed);
        assert!(mgr.results().error.is_none());
        assert!(!mgr.results().loading);
    }

    #[test]
    fn go_home_invalidates_in_flight_request() {
        let mut mgr = ScreenManager::new();
        let (id, _) = mgr.begin_request("q");
        let t = mgr.go_home();
        assert_eq!(t.new, Screen::Home);
        assert!(!mgr.commit_result(id, guidance("late")));
        assert!(mgr.results().result.is_none());
    }
}

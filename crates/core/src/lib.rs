//! 応急処置ガイダンスのコア: オンライン/オフラインのガイダンス解決、症状分析、
//! 音声合成と再生、自動読み上げ。

pub mod domain;
pub mod infra;
pub mod usecase;

use std::io::Cursor;

use crate::domain::error::AudioError;

/// 音声合成の出力フォーマット（16bit LE PCM, 24kHz, モノラル）
pub const SYNTH_SAMPLE_RATE: u32 = 24_000;
pub const SYNTH_CHANNELS: u16 = 1;

/// デコード済み PCM バッファ（f32, -1.0..=1.0, インターリーブ）
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmBuffer {
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.frames() as u64 * 1000 / self.sample_rate as u64
    }

    /// モノラル化（チャンネル平均）
    pub fn into_mono(self) -> Self {
        if self.channels <= 1 {
            return self;
        }
        let channels = self.channels as usize;
        let samples = self
            .samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();
        Self {
            samples,
            sample_rate: self.sample_rate,
            channels: 1,
        }
    }
}

/// 合成音声のバイト列をデコードする
///
/// RIFF/WAVE ヘッダがあれば hound で読み、なければ 24kHz モノラルの
/// 生 16bit LE PCM として扱う。結果は常にモノラル。
pub fn decode(raw: &[u8]) -> Result<PcmBuffer, AudioError> {
    if raw.is_empty() {
        return Err(AudioError::Decode("empty audio payload".to_string()));
    }

    let buffer = if is_wav(raw) {
        decode_wav(raw)?
    } else {
        decode_pcm16le(raw, SYNTH_SAMPLE_RATE, SYNTH_CHANNELS)?
    };

    if buffer.samples.is_empty() {
        return Err(AudioError::Decode("audio payload has no samples".to_string()));
    }
    Ok(buffer.into_mono())
}

fn is_wav(raw: &[u8]) -> bool {
    raw.len() >= 12 && &raw[0..4] == b"RIFF" && &raw[8..12] == b"WAVE"
}

/// 生 16bit little-endian PCM をデコードする
pub fn decode_pcm16le(raw: &[u8], sample_rate: u32, channels: u16) -> Result<PcmBuffer, AudioError> {
    if raw.len() % 2 != 0 {
        return Err(AudioError::Decode(format!(
            "odd PCM16 payload length: {} bytes",
            raw.len()
        )));
    }

    let samples = raw
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
        .collect();

    Ok(PcmBuffer {
        samples,
        sample_rate,
        channels,
    })
}

fn decode_wav(raw: &[u8]) -> Result<PcmBuffer, AudioError> {
    let reader = hound::WavReader::new(Cursor::new(raw))
        .map_err(|e| AudioError::Decode(format!("invalid WAV payload: {e}")))?;
    let spec = reader.spec();

    let samples: Result<Vec<f32>, hound::Error> = match spec.sample_format {
        hound::SampleFormat::Float => reader.into_samples::<f32>().collect(),
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect()
        }
    };
    let samples = samples.map_err(|e| AudioError::Decode(format!("WAV sample error: {e}")))?;

    log::debug!(
        "WAV をデコード: {}Hz, {}ch, {}bit",
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample
    );

    Ok(PcmBuffer {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::{EndCallback, OutputBackend, OutputDevice, Voice};
use crate::domain::error::AudioError;
use crate::infra::audio::decode::PcmBuffer;
use crate::infra::audio::resample;

/// 再生スレッドが停止/終了を確認する間隔
const POLL_INTERVAL: Duration = Duration::from_millis(20);
/// 最後のサンプルを書き込んだ後、デバイスバッファが鳴り切るまで待つ時間
const DRAIN_TAIL: Duration = Duration::from_millis(80);

/// cpal の既定出力デバイスを使うバックエンド
pub struct CpalOutput;

impl CpalOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CpalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputBackend for CpalOutput {
    fn open(&self) -> Result<Box<dyn OutputDevice>, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::Unsupported("no audio output device found".to_string()))?;

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::Device(e.to_string()))?;

        log::info!(
            "出力デバイスを開きました: {} ({}Hz, {}ch)",
            device.name().unwrap_or_else(|_| "unknown".to_string()),
            config.sample_rate().0,
            config.channels()
        );

        Ok(Box::new(CpalDevice { closed: false }))
    }

    fn name(&self) -> &str {
        "cpal"
    }
}

/// cpal::Stream は Send ではないため、ストリームは音声ごとの再生スレッド上で作成・保持する。
struct CpalDevice {
    closed: bool,
}

impl OutputDevice for CpalDevice {
    fn start(
        &mut self,
        buffer: Arc<PcmBuffer>,
        on_end: EndCallback,
    ) -> Result<Box<dyn Voice>, AudioError> {
        if self.closed {
            return Err(AudioError::Device("output device is closed".to_string()));
        }

        let halt_flag = Arc::new(AtomicBool::new(false));
        let halt_clone = halt_flag.clone();

        thread::Builder::new()
            .name("fa-playback".to_string())
            .spawn(move || playback_thread(buffer, halt_clone, on_end))
            .map_err(|e| AudioError::Device(format!("failed to spawn playback thread: {e}")))?;

        Ok(Box::new(CpalVoice { halt_flag }))
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

struct CpalVoice {
    halt_flag: Arc<AtomicBool>,
}

impl Voice for CpalVoice {
    fn halt(&mut self) {
        self.halt_flag.store(true, Ordering::Relaxed);
    }
}

/// 再生スレッド本体
///
/// 自然終了時のみ `on_end` を呼ぶ。起動失敗もログに残して自然終了扱いにする。
fn playback_thread(buffer: Arc<PcmBuffer>, halt_flag: Arc<AtomicBool>, on_end: EndCallback) {
    match play_until_done(&buffer, &halt_flag) {
        Ok(true) => on_end(),
        Ok(false) => log::debug!("再生を停止しました"),
        Err(e) => {
            log::error!("再生に失敗: {e}");
            if !halt_flag.load(Ordering::Relaxed) {
                on_end();
            }
        }
    }
}

/// 再生し終えたら true、停止されたら false
fn play_until_done(buffer: &PcmBuffer, halt_flag: &Arc<AtomicBool>) -> Result<bool, AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AudioError::Device("output device disappeared".to_string()))?;
    let supported_config = device
        .default_output_config()
        .map_err(|e| AudioError::Device(e.to_string()))?;

    let sample_rate = supported_config.sample_rate().0;
    let channels = supported_config.channels();
    let sample_format = supported_config.sample_format();

    let config = cpal::StreamConfig {
        channels,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let mono = resample::resample(&buffer.samples, buffer.sample_rate, sample_rate);
    let data = Arc::new(resample::to_channels(&mono, channels));
    let cursor = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicBool::new(false));

    let stream = match sample_format {
        cpal::SampleFormat::F32 => {
            let (data, cursor, finished, halted) =
                (data.clone(), cursor.clone(), finished.clone(), halt_flag.clone());
            device.build_output_stream(
                &config,
                move |out: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                    fill(out, &data, &cursor, &finished, &halted, 0.0, |s| s);
                },
                |err| {
                    log::error!("Audio output stream error: {}", err);
                },
                None,
            )
        }
        cpal::SampleFormat::I16 => {
            let (data, cursor, finished, halted) =
                (data.clone(), cursor.clone(), finished.clone(), halt_flag.clone());
            device.build_output_stream(
                &config,
                move |out: &mut [i16], _info: &cpal::OutputCallbackInfo| {
                    fill(out, &data, &cursor, &finished, &halted, 0, |s| {
                        (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
                    });
                },
                |err| {
                    log::error!("Audio output stream error: {}", err);
                },
                None,
            )
        }
        format => {
            return Err(AudioError::Unsupported(format!(
                "Unsupported sample format: {:?}",
                format
            )));
        }
    }
    .map_err(|e| AudioError::Device(e.to_string()))?;

    stream
        .play()
        .map_err(|e| AudioError::Device(e.to_string()))?;

    log::info!(
        "再生開始: {}ms, {}Hz, {} channels, {:?}",
        buffer.duration_ms(),
        sample_rate,
        channels,
        sample_format
    );

    while !finished.load(Ordering::Relaxed) {
        if halt_flag.load(Ordering::Relaxed) {
            return Ok(false);
        }
        thread::sleep(POLL_INTERVAL);
    }
    thread::sleep(DRAIN_TAIL);

    Ok(!halt_flag.load(Ordering::Relaxed))
}

/// コールバック用: カーソル位置から書き込み、足りない分は無音で埋める
///
/// 停止済みなら次のコールバックから無音だけを書く。
fn fill<T: Copy>(
    out: &mut [T],
    data: &[f32],
    cursor: &AtomicUsize,
    finished: &AtomicBool,
    halted: &AtomicBool,
    silence: T,
    convert: impl Fn(f32) -> T,
) {
    if halted.load(Ordering::Relaxed) {
        out.fill(silence);
        finished.store(true, Ordering::Relaxed);
        return;
    }

    let start = cursor.load(Ordering::Relaxed).min(data.len());
    let n = (data.len() - start).min(out.len());

    for (o, &s) in out[..n].iter_mut().zip(&data[start..start + n]) {
        *o = convert(s);
    }
    for o in &mut out[n..] {
        *o = silence;
    }

    cursor.store(start + n, Ordering::Relaxed);
    if start + n >= data.len() {
        finished.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_pads_with_silence_and_finishes() {
        let data = vec![0.5f32, -0.5, 0.25];
        let cursor = AtomicUsize::new(0);
        let finished = AtomicBool::new(false);

        let halted = AtomicBool::new(false);

        let mut out = [1.0f32; 2];
        fill(&mut out, &data, &cursor, &finished, &halted, 0.0, |s| s);
        assert_eq!(out, [0.5, -0.5]);
        assert!(!finished.load(Ordering::Relaxed));

        let mut out = [1.0f32; 2];
        fill(&mut out, &data, &cursor, &finished, &halted, 0.0, |s| s);
        assert_eq!(out, [0.25, 0.0]);
        assert!(finished.load(Ordering::Relaxed));
    }

    #[test]
    fn test_fill_converts_to_i16() {
        let data = vec![1.0f32, -2.0];
        let cursor = AtomicUsize::new(0);
        let finished = AtomicBool::new(false);
        let halted = AtomicBool::new(false);
        let mut out = [0i16; 2];
        fill(&mut out, &data, &cursor, &finished, &halted, 0, |s| {
            (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
        });
        assert_eq!(out, [i16::MAX, -i16::MAX]);
    }

    #[test]
    fn test_fill_writes_silence_once_halted() {
        let data = vec![0.5f32; 8];
        let cursor = AtomicUsize::new(0);
        let finished = AtomicBool::new(false);
        let halted = AtomicBool::new(false);

        let mut out = [0.0f32; 2];
        fill(&mut out, &data, &cursor, &finished, &halted, 0.0, |s| s);
        assert_eq!(out, [0.5, 0.5]);

        halted.store(true, Ordering::Relaxed);
        let mut out = [1.0f32; 4];
        fill(&mut out, &data, &cursor, &finished, &halted, 0.0, |s| s);
        assert_eq!(out, [0.0; 4]);
        assert!(finished.load(Ordering::Relaxed));
        assert_eq!(cursor.load(Ordering::Relaxed), 2);
    }
}

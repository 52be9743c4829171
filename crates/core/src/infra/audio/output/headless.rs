use std::sync::Arc;

use parking_lot::Mutex;

use super::{EndCallback, OutputBackend, OutputDevice, Voice};
use crate::domain::error::AudioError;
use crate::infra::audio::decode::PcmBuffer;

/// 実デバイスを持たない出力バックエンド
///
/// 開閉・再生開始・停止を記録し、`finish_current` で自然終了を起こせる。
/// ヘッドレス環境やテストで使う。クローンは同じ記録を共有する。
#[derive(Clone, Default)]
pub struct HeadlessOutput {
    shared: Arc<Mutex<HeadlessState>>,
}

#[derive(Default)]
struct HeadlessState {
    opens: usize,
    closes: usize,
    starts: usize,
    halts: usize,
    next_voice: u64,
    current: Option<ActiveVoice>,
    last_frames: usize,
}

struct ActiveVoice {
    id: u64,
    on_end: EndCallback,
}

impl HeadlessOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opens(&self) -> usize {
        self.shared.lock().opens
    }

    pub fn closes(&self) -> usize {
        self.shared.lock().closes
    }

    pub fn starts(&self) -> usize {
        self.shared.lock().starts
    }

    pub fn halts(&self) -> usize {
        self.shared.lock().halts
    }

    /// 鳴っている音声があるか
    pub fn is_playing(&self) -> bool {
        self.shared.lock().current.is_some()
    }

    /// 直近に開始した音声のフレーム数
    pub fn last_frames(&self) -> usize {
        self.shared.lock().last_frames
    }

    /// 現在の音声を最後まで再生したことにする。鳴っていなければ false。
    pub fn finish_current(&self) -> bool {
        let voice = self.shared.lock().current.take();
        match voice {
            Some(voice) => {
                (voice.on_end)();
                true
            }
            None => false,
        }
    }
}

impl OutputBackend for HeadlessOutput {
    fn open(&self) -> Result<Box<dyn OutputDevice>, AudioError> {
        self.shared.lock().opens += 1;
        Ok(Box::new(HeadlessDevice {
            shared: self.shared.clone(),
            closed: false,
        }))
    }

    fn name(&self) -> &str {
        "headless"
    }
}

struct HeadlessDevice {
    shared: Arc<Mutex<HeadlessState>>,
    closed: bool,
}

impl OutputDevice for HeadlessDevice {
    fn start(
        &mut self,
        buffer: Arc<PcmBuffer>,
        on_end: EndCallback,
    ) -> Result<Box<dyn Voice>, AudioError> {
        if self.closed {
            return Err(AudioError::Device("output device is closed".to_string()));
        }
        let mut state = self.shared.lock();
        state.starts += 1;
        state.next_voice += 1;
        state.last_frames = buffer.frames();
        let id = state.next_voice;
        state.current = Some(ActiveVoice { id, on_end });

        Ok(Box::new(HeadlessVoice {
            id,
            shared: self.shared.clone(),
            halted: false,
        }))
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let mut state = self.shared.lock();
        state.closes += 1;
        state.current = None;
    }
}

struct HeadlessVoice {
    id: u64,
    shared: Arc<Mutex<HeadlessState>>,
    halted: bool,
}

impl Voice for HeadlessVoice {
    fn halt(&mut self) {
        if self.halted {
            return;
        }
        self.halted = true;
        let mut state = self.shared.lock();
        state.halts += 1;
        if state.current.as_ref().is_some_and(|v| v.id == self.id) {
            // コールバックは呼ばずに破棄する
            state.current = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn buffer() -> Arc<PcmBuffer> {
        Arc::new(PcmBuffer {
            samples: vec![0.0; 480],
            sample_rate: 24_000,
            channels: 1,
        })
    }

    #[test]
    fn test_finish_invokes_callback_once() {
        let output = HeadlessOutput::new();
        let mut device = output.open().unwrap();
        let ended = Arc::new(AtomicUsize::new(0));
        let ended_clone = ended.clone();

        let _voice = device
            .start(buffer(), Box::new(move || {
                ended_clone.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        assert!(output.is_playing());
        assert_eq!(output.last_frames(), 480);

        assert!(output.finish_current());
        assert!(!output.finish_current());
        assert_eq!(ended.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_halt_drops_callback() {
        let output = HeadlessOutput::new();
        let mut device = output.open().unwrap();
        let ended = Arc::new(AtomicUsize::new(0));
        let ended_clone = ended.clone();

        let mut voice = device
            .start(buffer(), Box::new(move || {
                ended_clone.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        voice.halt();
        voice.halt();

        assert_eq!(output.halts(), 1);
        assert!(!output.finish_current());
        assert_eq!(ended.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_closed_device_rejects_start() {
        let output = HeadlessOutput::new();
        let mut device = output.open().unwrap();
        device.close();
        device.close();
        assert_eq!(output.closes(), 1);
        assert!(matches!(
            device.start(buffer(), Box::new(|| {})),
            Err(AudioError::Device(_))
        ));
    }
}

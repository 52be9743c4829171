/// モノラル信号を出力デバイスのレートへ変換する
///
/// `high-quality-resample` 有効時は rubato の sinc 補間、失敗時や無効時は線形補間。
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }

    #[cfg(feature = "high-quality-resample")]
    match resample_sinc(samples, from_rate, to_rate) {
        Ok(out) => return out,
        Err(e) => log::warn!("sinc リサンプルに失敗、線形補間にフォールバック: {e}"),
    }

    resample_linear(samples, from_rate, to_rate)
}

fn output_len(input_len: usize, from_rate: u32, to_rate: u32) -> usize {
    (input_len as f64 * to_rate as f64 / from_rate as f64).round() as usize
}

/// 線形補間リサンプル
pub fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }

    let last = samples.len() - 1;
    let step = from_rate as f64 / to_rate as f64;
    (0..output_len(samples.len(), from_rate, to_rate))
        .map(|i| {
            let pos = i as f64 * step;
            let idx = (pos.floor() as usize).min(last);
            let frac = (pos - idx as f64) as f32;
            let a = samples[idx];
            let b = samples[(idx + 1).min(last)];
            a + (b - a) * frac
        })
        .collect()
}

#[cfg(feature = "high-quality-resample")]
fn resample_sinc(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, String> {
    use rubato::{
        Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType,
        WindowFunction,
    };

    const CHUNK_SIZE: usize = 1024;

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(
        to_rate as f64 / from_rate as f64,
        1.0,
        params,
        CHUNK_SIZE,
        1,
    )
    .map_err(|e| e.to_string())?;

    let delay = resampler.output_delay();
    let expected = output_len(samples.len(), from_rate, to_rate);
    let mut out = Vec::with_capacity(expected + delay);

    let mut pos = 0;
    while samples.len() - pos >= resampler.input_frames_next() {
        let n = resampler.input_frames_next();
        let waves_in = vec![samples[pos..pos + n].to_vec()];
        let waves_out = resampler.process(&waves_in, None).map_err(|e| e.to_string())?;
        out.extend_from_slice(&waves_out[0]);
        pos += n;
    }
    if pos < samples.len() {
        let waves_in = vec![samples[pos..].to_vec()];
        let waves_out = resampler
            .process_partial(Some(waves_in.as_slice()), None)
            .map_err(|e| e.to_string())?;
        out.extend_from_slice(&waves_out[0]);
    }

    // フィルタ遅延分を吐き出す
    while out.len() < expected + delay {
        let flush: Option<&[Vec<f32>]> = None;
        let waves_out = resampler
            .process_partial(flush, None)
            .map_err(|e| e.to_string())?;
        if waves_out[0].is_empty() {
            break;
        }
        out.extend_from_slice(&waves_out[0]);
    }

    out.drain(..delay.min(out.len()));
    out.truncate(expected);
    Ok(out)
}

/// モノラル → N チャンネル（同一サンプルを複製）
pub fn to_channels(mono: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return mono.to_vec();
    }
    mono.iter()
        .flat_map(|&s| std::iter::repeat(s).take(channels as usize))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_rate_is_identity() {
        let input = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(&input, 24_000, 24_000), input);
    }

    #[test]
    fn test_linear_upsample_length_and_values() {
        let out = resample_linear(&[0.0, 1.0], 24_000, 48_000);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], 0.0);
        assert!((out[1] - 0.5).abs() < 1e-6);
        assert_eq!(out[2], 1.0);
    }

    #[test]
    fn test_resample_output_length() {
        let input = vec![0.0f32; 24_000];
        let out = resample(&input, 24_000, 44_100);
        assert_eq!(out.len(), 44_100);
    }

    #[test]
    fn test_resample_preserves_dc_level() {
        let input = vec![0.5f32; 4800];
        let out = resample(&input, 24_000, 48_000);
        let mid = &out[out.len() / 4..out.len() * 3 / 4];
        assert!(mid.iter().all(|s| (s - 0.5).abs() < 0.05));
    }

    #[test]
    fn test_to_channels() {
        assert_eq!(to_channels(&[0.1, 0.2], 2), vec![0.1, 0.1, 0.2, 0.2]);
        assert_eq!(to_channels(&[0.1], 1), vec![0.1]);
    }
}

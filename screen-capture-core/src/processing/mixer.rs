//! Sample-level helpers used by the mix graph: channel layout conversion,
//! linear-interpolation resampling, gain and summing.

/// Linear interpolation resampler for interleaved audio.
#[derive(Debug, Clone, Copy)]
pub struct Resampler {
    pub target_sample_rate: f64,
}

impl Resampler {
    pub fn new(target_sample_rate: f64) -> Self {
        Self { target_sample_rate }
    }

    /// Resample interleaved `samples` with `channels` channels from
    /// `source_sample_rate` to the target rate. Matching rates pass through.
    pub fn resample(&self, samples: &[f32], source_sample_rate: f64, channels: usize) -> Vec<f32> {
        if channels == 0 || samples.is_empty() {
            return Vec::new();
        }
        if (source_sample_rate - self.target_sample_rate).abs() < 0.01 || source_sample_rate <= 0.0 {
            return samples.to_vec();
        }

        let frames = samples.len() / channels;
        let ratio = self.target_sample_rate / source_sample_rate;
        let out_frames = (frames as f64 * ratio) as usize;
        let mut output = vec![0.0f32; out_frames * channels];

        for (i, frame) in output.chunks_exact_mut(channels).enumerate() {
            let position = i as f64 / ratio;
            let index = position as usize;
            let fraction = (position - index as f64) as f32;
            for (ch, out) in frame.iter_mut().enumerate() {
                let current = samples.get(index * channels + ch).copied().unwrap_or(0.0);
                *out = if index + 1 < frames {
                    let next = samples[(index + 1) * channels + ch];
                    current * (1.0 - fraction) + next * fraction
                } else {
                    current
                };
            }
        }
        output
    }
}

/// Convert interleaved audio to stereo: mono is duplicated to both sides,
/// more than two channels keep the first two.
pub fn to_stereo(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.iter().flat_map(|&s| [s, s]).collect(),
        2 => samples.to_vec(),
        n => samples
            .chunks_exact(n as usize)
            .flat_map(|frame| [frame[0], frame[1]])
            .collect(),
    }
}

/// Multiply every sample by `gain`.
pub fn apply_gain(samples: &mut [f32], gain: f32) {
    if (gain - 1.0).abs() < f32::EPSILON {
        return;
    }
    for sample in samples.iter_mut() {
        *sample *= gain;
    }
}

/// Sum two interleaved buffers, zero-padding the shorter one and clamping
/// the result to `[-1.0, 1.0]`.
pub fn sum_clamped(a: &[f32], b: &[f32]) -> Vec<f32> {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let left = a.get(i).copied().unwrap_or(0.0);
            let right = b.get(i).copied().unwrap_or(0.0);
            (left + right).clamp(-1.0, 1.0)
        })
        .collect()
}

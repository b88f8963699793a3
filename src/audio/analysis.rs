use rustfft::{num_complex::Complex, FftPlanner};

const FFT_SIZE: usize = 2048;
const HOP_SIZE: usize = 1024;

/// Fallback when the onset detector finds too little rhythm to measure
pub const DEFAULT_TEMPO_BPM: f32 = 120.0;

/// Estimate the tempo of a mono waveform in beats per minute.
pub fn estimate_tempo(samples: &[f32], sample_rate: u32) -> f32 {
    let flux = spectral_flux(samples, sample_rate);
    let onsets = detect_onsets(&flux);
    let tempo = tempo_from_onsets(&onsets);
    log::debug!("Tempo analysis: {} onsets, tempo={:.1} BPM", onsets.len(), tempo);
    tempo
}

/// Half-wave rectified spectral flux per hop, as (time, flux) pairs.
fn spectral_flux(samples: &[f32], sample_rate: u32) -> Vec<(f32, f32)> {
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(FFT_SIZE);
    let hann = hann_window(FFT_SIZE);

    let mut prev_magnitudes = vec![0.0f32; FFT_SIZE / 2];
    let mut flux_values = Vec::new();

    let mut pos = 0;
    while pos + FFT_SIZE <= samples.len() {
        let mut buffer: Vec<Complex<f32>> = samples[pos..pos + FFT_SIZE]
            .iter()
            .zip(hann.iter())
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();
        fft.process(&mut buffer);

        let magnitudes: Vec<f32> = buffer[..FFT_SIZE / 2].iter().map(|c| c.norm()).collect();

        let flux: f32 = magnitudes
            .iter()
            .zip(prev_magnitudes.iter())
            .map(|(cur, prev)| (cur - prev).max(0.0))
            .sum();

        flux_values.push((pos as f32 / sample_rate as f32, flux));
        prev_magnitudes = magnitudes;
        pos += HOP_SIZE;
    }

    flux_values
}

/// Peak-pick flux values above an adaptive local threshold.
fn detect_onsets(flux_values: &[(f32, f32)]) -> Vec<f32> {
    let window = 20; // ~200ms at typical hop rate
    let mut onsets: Vec<f32> = Vec::new();

    for i in 0..flux_values.len() {
        let start = i.saturating_sub(window);
        let end = (i + window + 1).min(flux_values.len());
        let local_mean: f32 =
            flux_values[start..end].iter().map(|(_, f)| f).sum::<f32>() / (end - start) as f32;

        let threshold = local_mean * 1.5 + 0.01;
        let (time, flux) = flux_values[i];
        if flux <= threshold {
            continue;
        }

        let is_peak = (i == 0 || flux >= flux_values[i - 1].1)
            && (i == flux_values.len() - 1 || flux >= flux_values[i + 1].1);

        // Minimum gap between onsets (100ms)
        let far_enough = onsets.last().map_or(true, |&last| time - last > 0.1);

        if is_peak && far_enough {
            onsets.push(time);
        }
    }

    onsets
}

/// Median inter-onset interval within 60-200 BPM, converted to BPM.
fn tempo_from_onsets(onsets: &[f32]) -> f32 {
    if onsets.len() < 2 {
        return DEFAULT_TEMPO_BPM;
    }

    let mut reasonable: Vec<f32> = onsets
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|&i| (0.3..=1.0).contains(&i))
        .collect();

    if reasonable.is_empty() {
        return DEFAULT_TEMPO_BPM;
    }

    reasonable.sort_by(|a, b| a.total_cmp(b));
    60.0 / reasonable[reasonable.len() / 2]
}

fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos())
        })
        .collect()
}

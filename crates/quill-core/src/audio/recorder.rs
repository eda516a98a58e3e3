//! Microphone capture via cpal.
//!
//! The recorder opens an input stream on the requested (or default) device
//! and forwards mono f32 sample chunks over a channel to the session engine.
//! The audio callback never blocks: chunks are handed off with `try_send`
//! and the engine owns all accumulation and classification.
//!
//! `cpal::Stream` is not `Send`, so a recorder must be created, held, and
//! dropped on the thread that runs the session engine.

use anyhow::{Context, Result, bail};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, StreamConfig};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for stream errors (reset per recording session)
/// Used to provide rate-limited, user-friendly error reporting
static STREAM_ERROR_COUNT: AtomicU64 = AtomicU64::new(0);

/// Recorder configuration.
#[derive(Debug, Clone, Default)]
pub struct RecorderConfig {
    /// Device name to use (None = system default)
    pub device_name: Option<String>,
}

/// An open capture stream feeding the session engine.
pub struct AudioRecorder {
    stream: cpal::Stream,
    sample_rate: u32,
    channels: u16,
}

impl AudioRecorder {
    /// Open the input device and start capturing.
    ///
    /// Returns the recorder; the actual stream sample rate is reported via
    /// [`AudioRecorder::sample_rate`] and may differ from any configured
    /// preference, since the device's native format is used as-is.
    pub fn start(config: &RecorderConfig, frame_tx: Sender<Vec<f32>>) -> Result<Self> {
        STREAM_ERROR_COUNT.store(0, Ordering::Relaxed);

        let device = resolve_device(config.device_name.as_deref())?;
        let supported = device
            .default_input_config()
            .context("No default input config for capture device")?;

        let sample_format = supported.sample_format();
        let stream_config: StreamConfig = supported.into();
        let sample_rate = stream_config.sample_rate.0;
        let channels = stream_config.channels;

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, channels, frame_tx)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, channels, frame_tx)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, channels, frame_tx)?,
            other => bail!("Unsupported capture sample format: {other:?}"),
        };

        stream.play().context("Failed to start capture stream")?;

        Ok(Self {
            stream,
            sample_rate,
            channels: 1, // chunks are mono-mixed before handoff
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Stop capturing and close the stream.
    pub fn stop(self) {
        drop(self.stream);
    }
}

fn resolve_device(device_name: Option<&str>) -> Result<Device> {
    let host = cpal::default_host();
    match device_name {
        Some(name) => {
            let mut devices = host.input_devices().context("Failed to list input devices")?;
            devices
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .with_context(|| format!("Input device not found: {name}"))
        }
        None => host
            .default_input_device()
            .context("No default input device available"),
    }
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    channels: u16,
    frame_tx: Sender<Vec<f32>>,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample,
    f32: cpal::FromSample<T>,
{
    // Rate-limited error handler for ALSA stream errors
    // These are common on Linux (especially with USB audio) and non-fatal
    let err_fn = |err| {
        let count = STREAM_ERROR_COUNT.fetch_add(1, Ordering::Relaxed);
        if count == 0 {
            crate::verbose!(
                "Audio stream error (common on Linux, non-fatal): {err}\n\
                 Subsequent similar errors will be suppressed."
            );
        } else if count % 1000 == 0 {
            crate::verbose!("Audio stream: {count} non-fatal errors (recording continues)");
        }
    };

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let mono = mix_to_mono::<T>(data, channels);
            // Never block the audio thread; a full channel means the engine
            // is shutting down and the chunk can be dropped.
            let _ = frame_tx.try_send(mono);
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

/// Convert an interleaved capture buffer to mono f32 by averaging channels.
fn mix_to_mono<T>(data: &[T], channels: u16) -> Vec<f32>
where
    T: cpal::SizedSample,
    f32: cpal::FromSample<T>,
{
    let channels = channels.max(1) as usize;
    if channels == 1 {
        return data
            .iter()
            .map(|&s| cpal::Sample::from_sample(s))
            .collect();
    }
    data.chunks(channels)
        .map(|frame| {
            frame
                .iter()
                .map(|&s| -> f32 { cpal::Sample::from_sample(s) })
                .sum::<f32>()
                / frame.len() as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_to_mono_averages_channels() {
        let stereo: Vec<f32> = vec![0.2, 0.4, 1.0, 0.0];
        let mono = mix_to_mono(&stereo, 2);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.3).abs() < 1e-6);
        assert!((mono[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_mix_to_mono_passthrough() {
        let mono_in: Vec<f32> = vec![0.1, -0.2, 0.3];
        let mono = mix_to_mono(&mono_in, 1);
        assert_eq!(mono, mono_in);
    }
}

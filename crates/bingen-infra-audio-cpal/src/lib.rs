use bingen_ports::audio::{AudioError, AudioOutputPort, AudioRenderCallback, AudioStreamHandle};
use bingen_ports::types::{AudioConfig, AudioOutputDevice, DeviceId};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{
    BufferSize, FromSample, Sample, SampleFormat, SampleRate, SizedSample, StreamConfig,
    SupportedStreamConfigRange,
};
use std::sync::mpsc;
use std::thread;

/// Scratch size used when the host picks the buffer size.
const DEFAULT_SCRATCH_FRAMES: usize = 8192;

pub struct CpalAudioOutputPort {
    host: cpal::Host,
}

struct SelectedStreamConfig {
    config: StreamConfig,
    sample_format: SampleFormat,
}

impl CpalAudioOutputPort {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    fn devices(host: &cpal::Host) -> Result<Vec<(DeviceId, cpal::Device)>, AudioError> {
        let host_id = format!("{:?}", host.id());
        let devices = host
            .output_devices()
            .map_err(|e| AudioError::Backend(e.to_string()))?;

        Ok(devices
            .enumerate()
            .map(|(index, device)| {
                let name = device_name(&device);
                (DeviceId(format!("cpal:{host_id}:{index}:{name}")), device)
            })
            .collect())
    }

    fn find_device(
        host: &cpal::Host,
        device_id: Option<&DeviceId>,
    ) -> Result<cpal::Device, AudioError> {
        match device_id {
            None => host
                .default_output_device()
                .ok_or_else(|| AudioError::DeviceNotFound("default output".to_string())),
            Some(wanted) => Self::devices(host)?
                .into_iter()
                .find(|(id, _)| id == wanted)
                .map(|(_, device)| device)
                .ok_or_else(|| AudioError::DeviceNotFound(wanted.to_string())),
        }
    }

    fn select_stream_config(
        device: &cpal::Device,
        desired: AudioConfig,
    ) -> Result<SelectedStreamConfig, AudioError> {
        let supported = device
            .supported_output_configs()
            .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;
        let chosen = select_supported_config(supported, desired)?;

        let sample_format = chosen.sample_format();
        let mut config = chosen.config();
        config.buffer_size = match desired.buffer_size_frames {
            Some(frames) => BufferSize::Fixed(frames),
            None => BufferSize::Default,
        };

        Ok(SelectedStreamConfig {
            config,
            sample_format,
        })
    }
}

impl Default for CpalAudioOutputPort {
    fn default() -> Self {
        Self::new()
    }
}

fn device_name(device: &cpal::Device) -> String {
    device
        .name()
        .unwrap_or_else(|_| "Unknown Output".to_string())
}

/// Owns the thread that keeps the (non-`Send`) cpal stream alive.
pub struct CpalAudioStreamHandle {
    stop_tx: mpsc::Sender<()>,
    join_handle: Option<thread::JoinHandle<()>>,
}

impl AudioStreamHandle for CpalAudioStreamHandle {
    fn close(mut self: Box<Self>) {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.join_handle.take() {
            let _ = handle.join();
        }
    }
}

impl AudioOutputPort for CpalAudioOutputPort {
    fn list_outputs(&self) -> Result<Vec<AudioOutputDevice>, AudioError> {
        let mut results = Vec::new();
        for (id, device) in Self::devices(&self.host)? {
            let Ok(default_config) = device.default_output_config() else {
                tracing::debug!(device = %id, "skipping output without a default config");
                continue;
            };
            results.push(AudioOutputDevice {
                name: device_name(&device),
                id,
                default_config: AudioConfig {
                    sample_rate_hz: default_config.sample_rate().0,
                    channels: default_config.channels(),
                    buffer_size_frames: None,
                },
            });
        }
        Ok(results)
    }

    fn open_output(
        &self,
        device_id: Option<&DeviceId>,
        config: AudioConfig,
        cb: Box<dyn AudioRenderCallback>,
    ) -> Result<Box<dyn AudioStreamHandle>, AudioError> {
        let device_id = device_id.cloned();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let join_handle = thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || {
                let stream = match start_stream(device_id.as_ref(), config, cb) {
                    Ok(stream) => stream,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                let _ = stop_rx.recv();
                drop(stream);
                tracing::debug!("audio output closed");
            })
            .map_err(|e| AudioError::Backend(e.to_string()))?;

        ready_rx
            .recv()
            .map_err(|e| AudioError::Backend(e.to_string()))??;
        Ok(Box::new(CpalAudioStreamHandle {
            stop_tx,
            join_handle: Some(join_handle),
        }))
    }
}

fn start_stream(
    device_id: Option<&DeviceId>,
    desired: AudioConfig,
    cb: Box<dyn AudioRenderCallback>,
) -> Result<cpal::Stream, AudioError> {
    let host = cpal::default_host();
    let device = CpalAudioOutputPort::find_device(&host, device_id)?;
    let selected = CpalAudioOutputPort::select_stream_config(&device, desired)?;
    tracing::info!(
        device = %device_name(&device),
        format = ?selected.sample_format,
        channels = selected.config.channels,
        sample_rate = selected.config.sample_rate.0,
        "starting output stream"
    );

    let stream = match selected.sample_format {
        SampleFormat::F32 => build_stream::<f32>(&device, &selected.config, cb),
        SampleFormat::I16 => build_stream::<i16>(&device, &selected.config, cb),
        SampleFormat::U16 => build_stream::<u16>(&device, &selected.config, cb),
        other => {
            return Err(AudioError::UnsupportedConfig(format!(
                "sample format {other:?}"
            )))
        }
    }
    .map_err(|e| AudioError::Backend(e.to_string()))?;

    stream
        .play()
        .map_err(|e| AudioError::Backend(e.to_string()))?;
    Ok(stream)
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut cb: Box<dyn AudioRenderCallback>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let scratch_frames = match config.buffer_size {
        BufferSize::Fixed(frames) => frames as usize,
        BufferSize::Default => DEFAULT_SCRATCH_FRAMES,
    };
    let mut left = vec![0.0_f32; scratch_frames];
    let mut right = vec![0.0_f32; scratch_frames];
    let mut sample_time: u64 = 0;

    device.build_output_stream(
        config,
        move |data: &mut [T], _info: &cpal::OutputCallbackInfo| {
            let frames = data.len() / channels.max(1);
            if frames > left.len() {
                left.resize(frames, 0.0);
                right.resize(frames, 0.0);
            }
            cb.render(sample_time, &mut left[..frames], &mut right[..frames]);
            write_interleaved(data, channels, &left[..frames], &right[..frames]);
            sample_time = sample_time.saturating_add(frames as u64);
        },
        |err| tracing::error!(error = %err, "output stream error"),
        None,
    )
}

/// Prefers the exact channel count, then float over integer formats.
fn select_supported_config(
    supported: impl Iterator<Item = SupportedStreamConfigRange>,
    desired: AudioConfig,
) -> Result<cpal::SupportedStreamConfig, AudioError> {
    let rate = desired.sample_rate_hz;
    supported
        .filter(|range| {
            range.channels() > 0
                && range.min_sample_rate().0 <= rate
                && rate <= range.max_sample_rate().0
        })
        .filter_map(|range| {
            let format_score = match range.sample_format() {
                SampleFormat::F32 => 3,
                SampleFormat::I16 => 2,
                SampleFormat::U16 => 1,
                _ => return None,
            };
            let channel_score = if range.channels() == desired.channels { 10 } else { 0 };
            Some((channel_score + format_score, range))
        })
        .max_by_key(|(score, _)| *score)
        .map(|(_, range)| range.with_sample_rate(SampleRate(rate)))
        .ok_or_else(|| {
            AudioError::UnsupportedConfig(format!(
                "no output config at {rate} Hz with {} channels",
                desired.channels
            ))
        })
}

/// Stereo in, any channel count out: mono gets the average, extra channels silence.
fn write_interleaved<T>(data: &mut [T], channels: usize, left: &[f32], right: &[f32])
where
    T: Sample + FromSample<f32>,
{
    if channels == 0 {
        return;
    }
    for (frame, out) in data.chunks_exact_mut(channels).enumerate() {
        let l = left.get(frame).copied().unwrap_or(0.0).clamp(-1.0, 1.0);
        let r = right.get(frame).copied().unwrap_or(0.0).clamp(-1.0, 1.0);
        match out {
            [mono] => *mono = T::from_sample((l + r) * 0.5),
            [first, second, rest @ ..] => {
                *first = T::from_sample(l);
                *second = T::from_sample(r);
                rest.fill(T::EQUILIBRIUM);
            }
            [] => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::write_interleaved;

    #[test]
    fn stereo_frames_are_interleaved() {
        let mut data = [0.0_f32; 4];
        write_interleaved(&mut data, 2, &[0.5, -0.5], &[0.25, 1.5]);
        assert_eq!(data, [0.5, 0.25, -0.5, 1.0]);
    }

    #[test]
    fn mono_output_averages_both_sides() {
        let mut data = [0.0_f32; 2];
        write_interleaved(&mut data, 1, &[1.0, 0.0], &[0.0, -0.5]);
        assert_eq!(data, [0.5, -0.25]);
    }

    #[test]
    fn surround_channels_beyond_stereo_are_silent() {
        let mut data = [7_i16; 4];
        write_interleaved(&mut data, 4, &[0.0], &[0.0]);
        assert_eq!(data, [0, 0, 0, 0]);
    }
}

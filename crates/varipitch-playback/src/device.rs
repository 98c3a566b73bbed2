//! CPAL output driving a [`PlaybackTimeline`].

use crate::{Error, PlaybackTimeline, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

/// `cpal::Stream` is `!Send` because of platform internals.
struct StreamHandle(#[allow(dead_code)] cpal::Stream);

// SAFETY: the stream is owned by `DeviceOutput` and only dropped, never used, after creation.
// The engine keeps `DeviceOutput` on one thread at a time.
unsafe impl Send for StreamHandle {}

pub struct DeviceOutput {
    sample_rate: u32,
    channels: usize,
    output_device_index: Option<usize>,
    _stream: Option<StreamHandle>,
}

impl DeviceOutput {
    pub fn new(output_device_index: Option<usize>) -> Result<Self> {
        let device = Self::get_device(output_device_index)?;
        let config = device.default_output_config()?;

        Ok(Self {
            sample_rate: config.sample_rate().0,
            channels: config.channels() as usize,
            output_device_index,
            _stream: None,
        })
    }

    /// Open the stream and render `timeline` from its callback.
    pub fn start(&mut self, timeline: PlaybackTimeline) -> Result<()> {
        if self._stream.is_some() {
            return Ok(());
        }

        let device = Self::get_device(self.output_device_index)?;
        let config = device.default_output_config()?;

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => Self::build_stream::<f32>(&device, &config.into(), timeline)?,
            cpal::SampleFormat::I16 => Self::build_stream::<i16>(&device, &config.into(), timeline)?,
            cpal::SampleFormat::U16 => Self::build_stream::<u16>(&device, &config.into(), timeline)?,
            format => {
                return Err(Error::InvalidConfig(format!(
                    "Unsupported sample format: {:?}",
                    format
                )));
            }
        };

        stream.play()?;
        self._stream = Some(StreamHandle(stream));
        tracing::info!(
            sample_rate = self.sample_rate,
            channels = self.channels,
            "playback device started"
        );
        Ok(())
    }

    /// Close the stream. Anything still scheduled is dropped with the timeline.
    pub fn stop(&mut self) {
        self._stream = None;
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn is_running(&self) -> bool {
        self._stream.is_some()
    }

    pub fn list_output_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        host.output_devices()?
            .enumerate()
            .map(|(idx, device)| Ok(format!("{}: {}", idx, device.name()?)))
            .collect()
    }

    fn get_device(index: Option<usize>) -> Result<cpal::Device> {
        let host = cpal::default_host();

        if let Some(idx) = index {
            let devices: Vec<_> = host.output_devices()?.collect();
            let device_count = devices.len();
            devices.into_iter().nth(idx).ok_or_else(|| {
                Error::InvalidDevice(format!(
                    "Output device index {} out of range (available: {})",
                    idx, device_count
                ))
            })
        } else {
            host.default_output_device()
                .ok_or_else(|| Error::InvalidDevice("No output device available".to_string()))
        }
    }

    fn build_stream<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        mut timeline: PlaybackTimeline,
    ) -> Result<cpal::Stream>
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        let channels = config.channels as usize;
        // Grown on the first callback only; device block sizes are stable.
        let mut scratch: Vec<f32> = Vec::new();

        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                if scratch.len() != data.len() {
                    scratch.resize(data.len(), 0.0);
                }
                timeline.render(&mut scratch, channels);
                for (out, &sample) in data.iter_mut().zip(scratch.iter()) {
                    *out = T::from_sample(sample);
                }
            },
            |err| {
                tracing::error!(error = %err, "playback stream error");
            },
            None,
        )?;

        Ok(stream)
    }
}

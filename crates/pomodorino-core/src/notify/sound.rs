//! Completion chime synthesis and playback.
//!
//! The cue is a fixed three-tone sweep (800 -> 600 -> 800 Hz) under an
//! exponential half-second fade-out. Synthesis is pure; playback happens
//! on a dedicated thread that owns the audio output stream for the
//! process lifetime, created lazily on the first play and reused after.

use std::sync::{mpsc, Arc, OnceLock};
use std::thread;

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};
use tokio::sync::oneshot;

use crate::error::NotifyError;

pub const SAMPLE_RATE: u32 = 44_100;

const CHIME_SECS: f32 = 0.5;
const GAIN_START: f32 = 0.3;
const GAIN_END: f32 = 0.01;

/// Render the chime as mono f32 samples at the given rate.
///
/// Frequency steps at 0.1 s and 0.2 s; phase is accumulated across the
/// steps so the transitions don't click.
pub fn render_chime(sample_rate: u32) -> Vec<f32> {
    let total = (CHIME_SECS * sample_rate as f32) as usize;
    let mut samples = Vec::with_capacity(total);
    let mut phase = 0.0f32;
    for n in 0..total {
        let t = n as f32 / sample_rate as f32;
        let freq = if t < 0.1 {
            800.0
        } else if t < 0.2 {
            600.0
        } else {
            800.0
        };
        phase += 2.0 * std::f32::consts::PI * freq / sample_rate as f32;
        let gain = GAIN_START * (GAIN_END / GAIN_START).powf(t / CHIME_SECS);
        samples.push(phase.sin() * gain);
    }
    samples
}

struct PlayRequest {
    samples: Vec<f32>,
    done: oneshot::Sender<Result<(), NotifyError>>,
}

/// Handle to the process-lifetime playback thread.
#[derive(Clone, Default)]
pub struct SoundPlayer {
    requests: Arc<OnceLock<mpsc::Sender<PlayRequest>>>,
}

impl SoundPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Play the chime, resolving once playback finished or failed.
    pub async fn play(&self) -> Result<(), NotifyError> {
        let (done_tx, done_rx) = oneshot::channel();
        let request = PlayRequest {
            samples: render_chime(SAMPLE_RATE),
            done: done_tx,
        };
        self.requests
            .get_or_init(spawn_playback_thread)
            .send(request)
            .map_err(|_| NotifyError::Audio("playback thread gone".into()))?;
        done_rx
            .await
            .map_err(|_| NotifyError::Audio("playback thread gone".into()))?
    }
}

fn spawn_playback_thread() -> mpsc::Sender<PlayRequest> {
    let (tx, rx) = mpsc::channel::<PlayRequest>();
    thread::spawn(move || {
        // Opened on first request, then reused until process exit.
        let mut output: Option<(OutputStream, OutputStreamHandle)> = None;
        for request in rx {
            let result = play_once(&mut output, request.samples);
            let _ = request.done.send(result);
        }
    });
    tx
}

fn play_once(
    output: &mut Option<(OutputStream, OutputStreamHandle)>,
    samples: Vec<f32>,
) -> Result<(), NotifyError> {
    if output.is_none() {
        let pair = OutputStream::try_default().map_err(|e| NotifyError::Audio(e.to_string()))?;
        *output = Some(pair);
    }
    let Some((_stream, handle)) = output.as_ref() else {
        return Err(NotifyError::Audio("audio output unavailable".into()));
    };
    let sink = Sink::try_new(handle).map_err(|e| NotifyError::Audio(e.to_string()))?;
    sink.append(SamplesBuffer::new(1, SAMPLE_RATE, samples));
    sink.sleep_until_end();
    Ok(())
}

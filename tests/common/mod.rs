#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use crossbeam_channel::{Receiver, Sender};
use ndarray::{Array2, Array4};
use frame_detect::common::{Frame, ModelConfig, Rotation};
use frame_detect::data::LabelTable;
use frame_detect::detection_runners::{DetectorSession, ForwardPass, ModelShape};

pub const TIMEOUT: Duration = Duration::from_secs(5);

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Counters shared between a test and the engine it handed to a session.
#[derive(Default)]
pub struct EngineCounters {
    pub calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl EngineCounters {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// A forward pass that replays a fixed output. It can be made to wait for a
/// release signal, so tests control exactly when a cycle finishes.
pub struct ScriptedEngine {
    shape: ModelShape,
    output: Array2<f32>,
    fail: bool,
    panic_first: bool,
    started: Option<Sender<()>>,
    release: Option<Receiver<()>>,
    counters: Arc<EngineCounters>,
}

impl ScriptedEngine {
    pub fn new(output: Array2<f32>) -> Self {
        let (num_channels, num_elements) = output.dim();
        Self {
            shape: ModelShape {
                input_width: 32,
                input_height: 32,
                num_channels,
                num_elements,
            },
            output,
            fail: false,
            panic_first: false,
            started: None,
            release: None,
            counters: Arc::new(EngineCounters::default()),
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Panics inside the first forward pass, then behaves normally.
    pub fn panicking_once(mut self) -> Self {
        self.panic_first = true;
        self
    }

    /// Returns `(started, release)`: the engine signals `started` when a
    /// forward pass begins and waits on `release` before returning.
    pub fn blocking(mut self) -> (Self, Receiver<()>, Sender<()>) {
        let (started_tx, started_rx) = crossbeam_channel::unbounded();
        let (release_tx, release_rx) = crossbeam_channel::unbounded();
        self.started = Some(started_tx);
        self.release = Some(release_rx);
        (self, started_rx, release_tx)
    }

    pub fn counters(&self) -> Arc<EngineCounters> {
        Arc::clone(&self.counters)
    }
}

impl ForwardPass for ScriptedEngine {
    fn shape(&self) -> ModelShape {
        self.shape
    }

    fn forward(&mut self, input: Array4<f32>) -> anyhow::Result<Array2<f32>> {
        assert_eq!(input.dim(), (1, self.shape.input_height, self.shape.input_width, 3));

        let call = self.counters.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.panic_first && call == 1 {
            panic!("scripted panic in forward pass");
        }
        let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(started) = &self.started {
            let _ = started.send(());
        }
        if let Some(release) = &self.release {
            let _ = release.recv_timeout(TIMEOUT);
        }

        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("scripted failure");
        }
        Ok(self.output.clone())
    }
}

/// Builds a `(7, n)` output from per-element rows of
/// `[cx, cy, w, h, objectness, phone, laptop]`.
pub fn output(elements: &[[f32; 7]]) -> Array2<f32> {
    let mut out = Array2::zeros((7, elements.len()));
    for (i, e) in elements.iter().enumerate() {
        for (c, v) in e.iter().enumerate() {
            out[[c, i]] = *v;
        }
    }
    out
}

pub fn labels() -> LabelTable {
    ["phone", "laptop"].into_iter().collect()
}

pub fn session(engine: ScriptedEngine) -> DetectorSession<ScriptedEngine> {
    DetectorSession::with_engine(engine, labels(), &ModelConfig::default()).unwrap()
}

/// A solid frame whose every byte is `marker`, so recycled buffers can be told apart.
pub fn frame(width: u32, height: u32, marker: u8) -> Frame {
    Frame::new(width, height, vec![marker; (width * height * 4) as usize], Rotation::Deg0)
}

/// Two overlapping candidates (IoU 0.7) and one below the threshold.
pub fn overlapping_pair() -> Array2<f32> {
    output(&[
        [0.3, 0.3, 0.4, 0.4, 0.5, 0.8, 0.1],
        [0.370_588, 0.3, 0.4, 0.4, 0.9, 0.1, 0.8],
        [0.6, 0.6, 0.2, 0.2, 0.2, 0.9, 0.0],
    ])
}

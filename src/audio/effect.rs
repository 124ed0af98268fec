use std::f32::consts::PI;

use super::frame::StereoFrame;

// Runtime units the cpal backend runs for each graph stage.
pub trait Effect: Send {
    fn name(&self) -> &'static str;
    fn process(&mut self, buf: &mut [StereoFrame]);
}

#[inline]
fn wet_amount(mix: f32) -> f32 {
    mix.clamp(0.0, 100.0) / 100.0
}

/// Fixed-size stereo ring buffer with fractional reads.
struct RingBuffer {
    data: Vec<StereoFrame>,
    write: usize,
}

impl RingBuffer {
    fn new(len: usize) -> Self {
        Self { data: vec![StereoFrame::zero(); len.max(2)], write: 0 }
    }

    #[inline]
    fn push(&mut self, f: StereoFrame) {
        self.data[self.write] = f;
        self.write = (self.write + 1) % self.data.len();
    }

    // `delay` frames behind the most recently pushed frame
    #[inline]
    fn read(&self, delay: f32) -> StereoFrame {
        let len = self.data.len() as f32;
        let mut pos = self.write as f32 - 1.0 - delay;
        while pos < 0.0 {
            pos += len;
        }
        let i = pos as usize % self.data.len();
        let j = (i + 1) % self.data.len();
        StereoFrame::lerp(self.data[i], self.data[j], pos.fract())
    }
}

//pitch shifter: two crossfaded taps sweeping through a short delay line
pub struct PitchShifter {
    ring: RingBuffer,
    window: f32,
    ratio: f32,
    phase: f32,
}

impl PitchShifter {
    const WINDOW_SECONDS: f32 = 0.05;

    pub fn new(cents: f32, sample_rate: f32) -> Self {
        let window = (Self::WINDOW_SECONDS * sample_rate).max(16.0);
        Self {
            ring: RingBuffer::new(window as usize + 4),
            window,
            ratio: 2.0_f32.powf(cents / 1200.0),
            phase: 0.0,
        }
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }
}

impl Effect for PitchShifter {
    fn name(&self) -> &'static str {
        "pitch"
    }

    fn process(&mut self, buf: &mut [StereoFrame]) {
        let step = (1.0 - self.ratio) / self.window;
        for f in buf.iter_mut() {
            self.ring.push(*f);

            let p1 = self.phase;
            let p2 = (self.phase + 0.5).fract();
            // sin² + cos² keeps the crossfade at unity gain
            let g1 = (PI * p1).sin().powi(2);
            let g2 = (PI * p2).sin().powi(2);
            let a = self.ring.read(p1 * self.window);
            let b = self.ring.read(p2 * self.window);
            f.left = a.left * g1 + b.left * g2;
            f.right = a.right * g1 + b.right * g2;

            self.phase = (self.phase + step).rem_euclid(1.0);
        }
    }
}

//echo
pub struct Echo {
    ring: RingBuffer,
    delay: f32,
    feedback: f32,
    wet: f32,
}

impl Echo {
    pub const DELAY_SECONDS: f32 = 0.3;
    pub const FEEDBACK: f32 = 0.5;

    pub fn new(mix: f32, sample_rate: f32) -> Self {
        let delay = (Self::DELAY_SECONDS * sample_rate).round().max(1.0);
        Self {
            ring: RingBuffer::new(delay as usize + 2),
            delay,
            feedback: Self::FEEDBACK,
            wet: wet_amount(mix),
        }
    }
}

impl Effect for Echo {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn process(&mut self, buf: &mut [StereoFrame]) {
        for f in buf.iter_mut() {
            let delayed = self.ring.read(self.delay - 1.0);
            self.ring.push(StereoFrame {
                left: f.left + delayed.left * self.feedback,
                right: f.right + delayed.right * self.feedback,
            });
            f.left = f.left * (1.0 - self.wet) + delayed.left * self.wet;
            f.right = f.right * (1.0 - self.wet) + delayed.right * self.wet;
        }
    }
}

//reverb: parallel damped combs into series allpasses, per channel
const COMB_LENGTHS: [usize; 4] = [1557, 1491, 1277, 1116]; // at 44.1kHz
const ALLPASS_LENGTHS: [usize; 2] = [556, 341];
const COMB_FEEDBACK: f32 = 0.84;
const COMB_DAMP: f32 = 0.2;
const ALLPASS_FEEDBACK: f32 = 0.5;

struct Comb {
    buf: Vec<f32>,
    pos: usize,
    store: f32,
}

impl Comb {
    fn process(&mut self, input: f32) -> f32 {
        let out = self.buf[self.pos];
        self.store = out * (1.0 - COMB_DAMP) + self.store * COMB_DAMP;
        self.buf[self.pos] = input + self.store * COMB_FEEDBACK;
        self.pos = (self.pos + 1) % self.buf.len();
        out
    }
}

struct Allpass {
    buf: Vec<f32>,
    pos: usize,
}

impl Allpass {
    fn process(&mut self, input: f32) -> f32 {
        let buffered = self.buf[self.pos];
        self.buf[self.pos] = input + buffered * ALLPASS_FEEDBACK;
        self.pos = (self.pos + 1) % self.buf.len();
        buffered - input
    }
}

struct ReverbChannel {
    combs: Vec<Comb>,
    allpasses: Vec<Allpass>,
}

impl ReverbChannel {
    fn new(scale: f32, spread: usize) -> Self {
        let len = |n: usize| (((n + spread) as f32 * scale) as usize).max(1);
        Self {
            combs: COMB_LENGTHS
                .iter()
                .map(|&n| Comb { buf: vec![0.0; len(n)], pos: 0, store: 0.0 })
                .collect(),
            allpasses: ALLPASS_LENGTHS
                .iter()
                .map(|&n| Allpass { buf: vec![0.0; len(n)], pos: 0 })
                .collect(),
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let mut out = 0.0;
        for c in &mut self.combs {
            out += c.process(input);
        }
        out /= self.combs.len() as f32;
        for a in &mut self.allpasses {
            out = a.process(out);
        }
        out
    }
}

pub struct Reverb {
    left: ReverbChannel,
    right: ReverbChannel,
    wet: f32,
}

impl Reverb {
    pub fn new(mix: f32, sample_rate: f32) -> Self {
        let scale = sample_rate / 44100.0;
        Self {
            left: ReverbChannel::new(scale, 0),
            right: ReverbChannel::new(scale, 23), // slight offset for stereo width
            wet: wet_amount(mix),
        }
    }
}

impl Effect for Reverb {
    fn name(&self) -> &'static str {
        "reverb"
    }

    fn process(&mut self, buf: &mut [StereoFrame]) {
        for f in buf.iter_mut() {
            let l = self.left.process(f.left);
            let r = self.right.process(f.right);
            f.left = f.left * (1.0 - self.wet) + l * self.wet;
            f.right = f.right * (1.0 - self.wet) + r * self.wet;
        }
    }
}

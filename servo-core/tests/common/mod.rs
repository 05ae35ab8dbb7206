#![allow(dead_code)]

use core::convert::Infallible;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicI32;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::JoinHandle;

use embassy_futures::block_on;
use servo_core::Actuator;
use servo_core::AngleSensor;
use servo_core::CommandProcessor;
use servo_core::CurrentLoop;
use servo_core::CurrentSensor;
use servo_core::PositionLoop;
use servo_core::ServoHandler;

/// Scripted host: feeds `input`, captures every reply byte.
pub struct HostLink {
    input: Vec<u8>,
    pos: usize,
    pub output: Vec<u8>,
}

impl HostLink {
    pub fn new(script: &str) -> Self {
        Self { input: script.as_bytes().to_vec(), pos: 0, output: Vec::new() }
    }

    pub fn replies(&self) -> Vec<String> {
        String::from_utf8(self.output.clone())
            .expect("replies are ascii")
            .split_terminator("\r\n")
            .map(String::from)
            .collect()
    }
}

impl embedded_io_async::ErrorType for HostLink {
    type Error = Infallible;
}

impl embedded_io_async::Read for HostLink {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Infallible> {
        let n = (self.input.len() - self.pos).min(buf.len());
        buf[..n].copy_from_slice(&self.input[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl embedded_io_async::Write for HostLink {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Infallible> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

/// Encoder that stays wherever the test puts it.
#[derive(Default)]
pub struct MockEncoder {
    pub angle: AtomicI32,
    pub resets: AtomicU32,
}

impl AngleSensor for MockEncoder {
    fn read_angle(&self) -> i32 {
        self.angle.load(Ordering::Relaxed)
    }

    fn reset_angle_origin(&self) {
        self.angle.store(0, Ordering::Relaxed);
        self.resets.fetch_add(1, Ordering::Relaxed);
    }
}

/// Resistive load: current follows the last drive.
pub struct Load {
    drive: Arc<AtomicI32>,
}

pub struct LoadBridge {
    drive: Arc<AtomicI32>,
}

impl CurrentSensor for Load {
    fn read_current(&mut self) -> i32 {
        self.drive.load(Ordering::Relaxed) * 2
    }
}

impl Actuator for LoadBridge {
    fn set_drive(&mut self, signed_percent: i32) {
        self.drive.store(signed_percent, Ordering::Relaxed);
    }
}

pub struct Bench {
    pub servo: &'static ServoHandler,
    pub encoder: &'static MockEncoder,
}

impl Bench {
    pub fn new() -> Self {
        Self {
            servo: Box::leak(Box::new(ServoHandler::new())),
            encoder: Box::leak(Box::new(MockEncoder::default())),
        }
    }

    /// Run one session over `script` and return the reply lines.
    pub fn session(&self, script: &str) -> Vec<String> {
        let mut link = HostLink::new(script);
        let mut processor = CommandProcessor::new(self.servo, self.encoder);
        block_on(processor.run(&mut link));
        link.replies()
    }

    /// Tick both loops from a background thread, 25 current ticks per
    /// position tick, until the returned guard is dropped.
    pub fn spin_loops(&self) -> LoopThread {
        let servo = self.servo;
        let encoder = self.encoder;
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();

        let handle = std::thread::spawn(move || {
            let drive = Arc::new(AtomicI32::new(0));
            let mut current = CurrentLoop::new(Load { drive: drive.clone() }, LoadBridge { drive }, servo);
            let mut position = PositionLoop::new(encoder, servo);
            let mut tick: u64 = 0;

            while !stop_flag.load(Ordering::Relaxed) {
                current.tick();
                if tick % 25 == 0 {
                    position.tick();
                }
                tick += 1;
                std::thread::yield_now();
            }
        });

        LoopThread { stop, handle: Some(handle) }
    }
}

pub struct LoopThread {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Drop for LoopThread {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

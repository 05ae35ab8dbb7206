/*
*  Board Config
*
*  DC Motor Properties
*  - DC Motor Gearbox Ratio 1:4.4
*  - Encoder PPR = 11
*  - Overall PPR = 48.4 PPR or 484 Pulse per 10 Rotation
*
*  Current Sense
*  - 12-bit ADC on GPIO26, mA = 0.51 * counts - 1024
*  - Each read averages ADC_AVG_OVER conversions
*/

use super::*;

/* --------------------------- Shared State -------------------------- */
pub static SERVO: ServoHandler = ServoHandler::new();
pub static ENCODER: EncoderCounter = EncoderCounter::new(ENCODER_PULSES_PER_10_REV);

/* --------------------------- Encoder -------------------------- */
pub const ENCODER_PULSES_PER_10_REV: i32 = 484;

/* --------------------------- Current Sense -------------------------- */
pub const ADC_MA_PER_COUNT: f32 = 0.51;
pub const ADC_OFFSET_MA: f32 = -1024.0;
pub const ADC_AVG_OVER: u32 = 10; // ~20 us of the 200 us current loop period

/* --------------------------- H-Bridge PWM -------------------------- */
pub const PWM_PERIOD_NS: u64 = 50_000; // 20 kHz, above audible range

/* --------------------------- Heartbeat -------------------------- */
pub const HEARTBEAT_PERIOD_MS: u64 = 500;

/* --------------------------- USB Communication-------------------------- */
pub const USB_PACKET_SIZE: usize = 64;

/* --------------------------- USB Builder-------------------------- */
pub static USB_STATE: StaticCell<State> = StaticCell::new();
pub static CONFIG_DESC: StaticCell<[u8; 256]> = StaticCell::new();
pub static BOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
pub static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/* --------------------------- Multicore Executor -------------------------- */
pub static mut CORE1_STACK: Stack<4096> = Stack::new();
pub static EXECUTOR1: StaticCell<Executor> = StaticCell::new();
pub static EXECUTOR0: StaticCell<Executor> = StaticCell::new();
pub static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

/*
* Current Loop Task
*  - 5 kHz, core 1
*  - H-bridge: two PIO PWM outputs, the sign of the drive picks the active side
*  - Current sense: one blocking ADC conversion per tick
*/

use super::*;

use core::time::Duration as CoreDuration;
use embassy_rp::adc::Adc;
use embassy_rp::adc::Blocking;
use embassy_rp::adc::Channel as AdcChannel;
use embassy_rp::pio_programs::pwm::PioPwm;
use servo_core::Actuator;
use servo_core::CurrentSensor;

use crate::resources::ADC_MA_PER_COUNT;
use crate::resources::ADC_OFFSET_MA;
use crate::resources::ADC_AVG_OVER;

/* --------------------------- H-Bridge -------------------------- */
pub struct HBridge<'d, T: Instance, const SM1: usize, const SM2: usize> {
    pwm_cw: PioPwm<'d, T, SM1>,
    pwm_ccw: PioPwm<'d, T, SM2>,
    period_ns: u64,
}

impl<'d, T: Instance, const SM1: usize, const SM2: usize> HBridge<'d, T, SM1, SM2> {
    pub fn new(pwm_cw: PioPwm<'d, T, SM1>, pwm_ccw: PioPwm<'d, T, SM2>, period_ns: u64) -> Self {
        let mut bridge = Self {
            pwm_cw,
            pwm_ccw,
            period_ns,
        };
        bridge.enable();
        bridge
    }

    fn enable(&mut self) {
        let period = CoreDuration::from_nanos(self.period_ns);
        self.pwm_cw.set_period(period);
        self.pwm_ccw.set_period(period);
        self.pwm_cw.start();
        self.pwm_ccw.start();
        self.pwm_cw.write(CoreDuration::ZERO);
        self.pwm_ccw.write(CoreDuration::ZERO);
    }

    fn pulse_width(&self, percent: u32) -> CoreDuration {
        CoreDuration::from_nanos(self.period_ns * percent.min(100) as u64 / 100)
    }
}

impl<T: Instance, const SM1: usize, const SM2: usize> Actuator for HBridge<'_, T, SM1, SM2> {
    fn set_drive(&mut self, signed_percent: i32) {
        let pulse = self.pulse_width(signed_percent.unsigned_abs());

        if signed_percent > 0 {
            self.pwm_ccw.write(CoreDuration::ZERO);
            self.pwm_cw.write(pulse);
        }
        else {
            self.pwm_cw.write(CoreDuration::ZERO);
            self.pwm_ccw.write(pulse);
        }
    }
}

/* --------------------------- Current Sense -------------------------- */
pub struct AdcCurrentSense<'d> {
    adc: Adc<'d, Blocking>,
    channel: AdcChannel<'d>,
    last_ma: i32,
}

impl<'d> AdcCurrentSense<'d> {
    pub fn new(adc: Adc<'d, Blocking>, channel: AdcChannel<'d>) -> Self {
        Self {
            adc,
            channel,
            last_ma: 0,
        }
    }

    fn counts_to_ma(counts: f32) -> i32 {
        (counts * ADC_MA_PER_COUNT + ADC_OFFSET_MA) as i32
    }
}

impl CurrentSensor for AdcCurrentSense<'_> {
    fn read_current(&mut self) -> i32 {
        // Average a burst of conversions; failed ones are skipped, and if all
        // fail the previous value repeats
        let mut sum: u32 = 0;
        let mut taken: u32 = 0;
        for _ in 0..ADC_AVG_OVER {
            if let Ok(counts) = self.adc.blocking_read(&mut self.channel) {
                sum += counts as u32;
                taken += 1;
            }
        }
        if taken > 0 {
            self.last_ma = Self::counts_to_ma(sum as f32 / taken as f32);
        }
        self.last_ma
    }
}

/* --------------------------- Task -------------------------- */
#[embassy_executor::task]
pub async fn current_loop_task(sense: AdcCurrentSense<'static>, bridge: HBridge<'static, PIO0, 1, 2>) {
    let mut control = CurrentLoop::new(sense, bridge, &SERVO);
    let mut ticker = Ticker::every(Duration::from_micros(CURRENT_LOOP_PERIOD_US));

    loop {
        control.tick();
        ticker.next().await;
    }
}

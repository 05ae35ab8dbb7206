/*
    Resource Allocation Module
*/

use super::*;

assign_resources! {
    motor: MotorResources {
        pwm_cw_pin: PIN_15,
        pwm_ccw_pin: PIN_14,
    },
    encoder: EncoderResources {
        pin_a: PIN_6,
        pin_b: PIN_7,
    },
    current_sense: CurrentSenseResources {
        adc: ADC,
        sense_pin: PIN_26,
    },
    led: LedResources {
        led_pin: PIN_25,
    },
}

bind_interrupts!(pub struct Irqs {
    PIO0_IRQ_0 => PioInterruptHandler<peripherals::PIO0>;
    USBCTRL_IRQ => UsbInterruptHandler<peripherals::USB>;
});

#![no_std]
#![no_main]

// Mod
mod resources;
mod tasks;

// Resources
use crate::resources::Irqs;
use crate::resources::AssignedResources;
use crate::resources::MotorResources;
use crate::resources::EncoderResources;
use crate::resources::CurrentSenseResources;
use crate::resources::LedResources;
use crate::resources::ENCODER;
use crate::resources::PWM_PERIOD_NS;
use crate::resources::USB_PACKET_SIZE;
use crate::resources::USB_STATE;
use crate::resources::CONFIG_DESC;
use crate::resources::BOS_DESC;
use crate::resources::CONTROL_BUF;
use crate::resources::CORE1_STACK;
use crate::resources::EXECUTOR1;
use crate::resources::EXECUTOR0;
use crate::resources::EXECUTOR_HIGH;

// Tasks
use crate::tasks::usb_task::usb_device_task;
use crate::tasks::usb_task::usb_communication_task;
use crate::tasks::heartbeat::heartbeat_task;
use crate::tasks::current_loop::AdcCurrentSense;
use crate::tasks::current_loop::HBridge;
use crate::tasks::current_loop::current_loop_task;
use crate::tasks::position_loop::position_loop_task;
use crate::tasks::encoder::RotaryEncoder;
use crate::tasks::encoder::encoder_task;

// Library
use defmt_rtt as _;
use panic_probe as _;

use embassy_usb::class::cdc_acm::CdcAcmClass;
use embassy_usb::class::cdc_acm::State;
use embassy_rp::adc::Adc;
use embassy_rp::adc::Channel as AdcChannel;
use embassy_rp::adc::Config as AdcConfig;
use embassy_rp::gpio::Level;
use embassy_rp::gpio::Output;
use embassy_rp::gpio::Pull;
use embassy_rp::interrupt;
use embassy_rp::interrupt::InterruptExt;
use embassy_rp::interrupt::Priority;
use embassy_rp::multicore::spawn_core1;
use embassy_rp::usb::Driver;
use embassy_rp::pio::Pio;
use embassy_rp::pio_programs::rotary_encoder::PioEncoder;
use embassy_rp::pio_programs::rotary_encoder::PioEncoderProgram;
use embassy_rp::pio_programs::pwm::PioPwmProgram;
use embassy_rp::pio_programs::pwm::PioPwm;
use embassy_executor::Executor;
use cortex_m_rt::entry;

#[interrupt]
unsafe fn SWI_IRQ_1() {
    unsafe { EXECUTOR_HIGH.on_interrupt() }
}

#[entry]
fn main() -> ! {
    let ph = embassy_rp::init(Default::default());
    let p = split_resources!(ph);
    let usb_driver = Driver::new(ph.USB, Irqs);

    defmt::info!("servo firmware starting");

    let config = {
        let mut config = embassy_usb::Config::new(0xc0de, 0xcafe);
        config.manufacturer = Some("Embassy");
        config.product = Some("DC servo");
        config.serial_number = Some("12345678");
        config.max_power = 100;
        config.max_packet_size_0 = 64;
        config
    };

    let mut builder = embassy_usb::Builder::new(
        usb_driver,
        config,
        CONFIG_DESC.init([0; 256]),
        BOS_DESC.init([0; 256]),
        &mut [],
        CONTROL_BUF.init([0; 64]),
    );

    let class = CdcAcmClass::new(&mut builder, USB_STATE.init(State::new()), USB_PACKET_SIZE as u16);
    let usb_dev = builder.build();

    let Pio {
        mut common, sm0, sm1, sm2, ..
    } = Pio::new(ph.PIO0, Irqs);

    let enc_prg = PioEncoderProgram::new(&mut common);
    let pwm_prg = PioPwmProgram::new(&mut common);

    let pwm_cw = PioPwm::new(
                    &mut common,
                    sm1,
                    p.motor.pwm_cw_pin,
                    &pwm_prg
                );
    let pwm_ccw = PioPwm::new(
                    &mut common,
                    sm2,
                    p.motor.pwm_ccw_pin,
                    &pwm_prg
                );
    let bridge = HBridge::new(pwm_cw, pwm_ccw, PWM_PERIOD_NS);

    let encoder = RotaryEncoder::new(PioEncoder::new(
                        &mut common,
                        sm0,
                        p.encoder.pin_a,
                        p.encoder.pin_b,
                        &enc_prg,
                    ),
                    &ENCODER,
                );

    let adc = Adc::new_blocking(p.current_sense.adc, AdcConfig::default());
    let sense_channel = AdcChannel::new_pin(p.current_sense.sense_pin, Pull::None);
    let sense = AdcCurrentSense::new(adc, sense_channel);

    let led = Output::new(p.led.led_pin, Level::Low);

    // Both control loops share core 1, neither preempts the other
    spawn_core1(
        ph.CORE1,
        unsafe { &mut *core::ptr::addr_of_mut!(CORE1_STACK) },
        move || {
            let executor1 = EXECUTOR1.init(Executor::new());
            executor1.run(|spawner| {
                spawner.must_spawn(current_loop_task(sense, bridge));
                spawner.must_spawn(position_loop_task());
            });
        },
    );

    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let spawner_high = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    spawner_high.must_spawn(encoder_task(encoder));

    let executor0 = EXECUTOR0.init(Executor::new());
    executor0.run(|spawner| {
        spawner.must_spawn(usb_device_task(usb_dev));
        spawner.must_spawn(usb_communication_task(class));
        spawner.must_spawn(heartbeat_task(led));
    });
}

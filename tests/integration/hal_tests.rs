//! Drives a full open/close cycle through the embedded-hal bridge.

use core::cell::Cell;
use core::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};
use futures_lite::future::block_on;

use petfeeder::adapters::hal::HalBoard;
use petfeeder::app::events::FeederEvent;
use petfeeder::config::StationId;
use petfeeder::drivers::servo::angle_to_duty_cycle;
use petfeeder::feeder::{Executor, MonitorExit, StationManager};

use crate::mock_hw::{SharedSink, closed_exits, fast_config, settle};

/// Shared register file of one fake GPIO.
#[derive(Default)]
struct Line {
    level: Cell<bool>,
    duty: Cell<u16>,
}

#[derive(Clone)]
struct FakeGpio(Rc<Line>);

impl digital::ErrorType for FakeGpio {
    type Error = Infallible;
}

impl pwm::ErrorType for FakeGpio {
    type Error = Infallible;
}

impl InputPin for FakeGpio {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.level.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.level.get())
    }
}

impl OutputPin for FakeGpio {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.level.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.level.set(true);
        Ok(())
    }
}

impl SetDutyCycle for FakeGpio {
    fn max_duty_cycle(&self) -> u16 {
        10_000
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
        self.0.duty.set(duty);
        Ok(())
    }
}

#[test]
fn hal_board_serves_a_full_cycle() {
    let config = fast_config();
    let mut board = HalBoard::new();
    let mut lines = Vec::new();
    for pins in &config.stations {
        let servo = Rc::new(Line::default());
        let sensor = Rc::new(Line::default());
        board.register(pins.servo_pin.to_string(), FakeGpio(Rc::clone(&servo)));
        board.register(pins.sensor_pin.to_string(), FakeGpio(Rc::clone(&sensor)));
        lines.push((servo, sensor));
    }

    let executor = Executor::new();
    block_on(executor.run(async {
        let sink = SharedSink::default();
        let manager = StationManager::new(&executor, board, &config, Rc::clone(&sink)).unwrap();
        manager.setup().unwrap();

        let (servo, sensor) = &lines[0];
        sensor.level.set(true);
        assert!(manager.route_detection("whiskers"));
        assert!(servo.level.get());
        let open_duty = (angle_to_duty_cycle(config.servo_open_angle) * 10_000.0).round() as u16;
        assert_eq!(servo.duty.get(), open_duty);

        settle(20).await;
        sensor.level.set(false);
        settle(120).await;

        assert!(!servo.level.get());
        let closed_duty = (angle_to_duty_cycle(config.servo_closed_angle) * 10_000.0).round() as u16;
        assert_eq!(servo.duty.get(), closed_duty);
        assert_eq!(closed_exits(&sink, StationId(1)), vec![MonitorExit::Departed]);

        manager.close_all().await;
        assert!(matches!(
            sink.borrow().events.last(),
            Some(FeederEvent::Shutdown { .. })
        ));
    }));
}

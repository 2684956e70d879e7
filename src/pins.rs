//! Default GPIO assignments for the three-bay feeder board.
//!
//! Single source of truth for the factory wiring.  Deployments override
//! these through `SERVO_<n>_PIN` / `SENSOR_<n>_PIN`; the defaults below are
//! what [`FeederConfig::default`](crate::config::FeederConfig) uses.

// ---------------------------------------------------------------------------
// Gate servos (digital enable + PWM on the same header pin)
// ---------------------------------------------------------------------------

/// Station 1 gate servo.
pub const SERVO_1_GPIO: u8 = 18;
/// Station 2 gate servo.
pub const SERVO_2_GPIO: u8 = 19;
/// Station 3 gate servo.
pub const SERVO_3_GPIO: u8 = 20;

// ---------------------------------------------------------------------------
// Presence sensors (IR break-beam, HIGH = subject in the bay)
// ---------------------------------------------------------------------------

/// Station 1 presence input.
pub const SENSOR_1_GPIO: u8 = 23;
/// Station 2 presence input.
pub const SENSOR_2_GPIO: u8 = 24;
/// Station 3 presence input.
pub const SENSOR_3_GPIO: u8 = 25;

/// `(station, servo, sensor)` triples for the stock board.
pub const DEFAULT_LAYOUT: [(u8, u8, u8); 3] = [
    (1, SERVO_1_GPIO, SENSOR_1_GPIO),
    (2, SERVO_2_GPIO, SENSOR_2_GPIO),
    (3, SERVO_3_GPIO, SENSOR_3_GPIO),
];

// ---------------------------------------------------------------------------
// Servo PWM calibration
// ---------------------------------------------------------------------------

/// Duty cycle at 0° (1 ms pulse in a 20 ms frame).
pub const SERVO_MIN_DUTY: f32 = 0.05;
/// Duty cycle at 180° (2 ms pulse in a 20 ms frame).
pub const SERVO_MAX_DUTY: f32 = 0.10;

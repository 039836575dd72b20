//! UPS hat device
//!
//! [`UpsDevice`] owns one fuel gauge's register interface and power-present
//! line, and runs the poll cycle described in [`crate::scheduler`]. A device
//! is built from a [`DeviceConfig`] passed by value; an invalid configuration
//! is rejected before anything touches the bus.

use crate::bus::RegisterIo;
use crate::command::Command;
use crate::debounce::PowerStatusDebouncer;
use crate::scheduler::{FailureEvent, PollScheduler, PollState, TickOutcome};
use crate::sink::{BinarySink, NumericSink, ObserverBinding, SinkKind};
use crate::telemetry::{
    CONFIG, CONFIG_POWER_UP_DEFAULT, CONFIG_SAFE_MASK, LevelSource, RawTelemetry, Reading, SOC,
    TelemetryDecoder, VCELL,
};
use crate::{Result, UpsError};
use embedded_hal::digital::{Error as _, InputPin};
use std::collections::VecDeque;
use std::fmt;
use std::ops::RangeInclusive;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Factory address of the MAX17043
pub const DEFAULT_ADDRESS: u8 = 0x36;

/// Default time between polls
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(60);

/// Default number of agreeing polls before the power status flips
pub const DEFAULT_DEBOUNCE_POLLS: u8 = 2;

/// Non-reserved 7-bit I2C addresses
pub const ADDRESS_RANGE: RangeInclusive<u8> = 0x03..=0x77;

/// Supported polling intervals
pub const UPDATE_INTERVAL_RANGE: RangeInclusive<Duration> =
    Duration::from_secs(1)..=Duration::from_secs(24 * 60 * 60);

/// Supported debounce thresholds
pub const DEBOUNCE_RANGE: RangeInclusive<u8> = 1..=16;

/// Everything needed to construct a device
#[derive(Debug)]
pub struct DeviceConfig {
    pub id: String,
    pub address: u8,
    pub update_interval: Duration,
    pub debounce_polls: u8,
    pub level_source: LevelSource,
}

impl DeviceConfig {
    /// Defaults for everything but the identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            address: DEFAULT_ADDRESS,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            debounce_polls: DEFAULT_DEBOUNCE_POLLS,
            level_source: LevelSource::FuelGauge,
        }
    }

    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    pub fn with_debounce_polls(mut self, polls: u8) -> Self {
        self.debounce_polls = polls;
        self
    }

    pub fn with_level_source(mut self, source: LevelSource) -> Self {
        self.level_source = source;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(UpsError::InvalidConfig(
                "device id must not be empty".to_string(),
            ));
        }
        if !ADDRESS_RANGE.contains(&self.address) {
            return Err(UpsError::InvalidConfig(format!(
                "address {:#04x} outside {:#04x}..={:#04x}",
                self.address,
                ADDRESS_RANGE.start(),
                ADDRESS_RANGE.end()
            )));
        }
        if !UPDATE_INTERVAL_RANGE.contains(&self.update_interval) {
            return Err(UpsError::InvalidConfig(format!(
                "update interval {:?} outside {:?}..={:?}",
                self.update_interval,
                UPDATE_INTERVAL_RANGE.start(),
                UPDATE_INTERVAL_RANGE.end()
            )));
        }
        if !DEBOUNCE_RANGE.contains(&self.debounce_polls) {
            return Err(UpsError::InvalidConfig(format!(
                "debounce polls {} outside {}..={}",
                self.debounce_polls,
                DEBOUNCE_RANGE.start(),
                DEBOUNCE_RANGE.end()
            )));
        }
        Ok(())
    }
}

/// Source of the raw power-present signal
pub trait PowerSense {
    fn power_present(&mut self) -> Result<bool>;
}

/// Power-present signal read from a GPIO input
pub struct PinPowerSense<P> {
    pin: P,
    active_low: bool,
}

impl<P: InputPin> PinPowerSense<P> {
    pub fn new(pin: P, active_low: bool) -> Self {
        Self { pin, active_low }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: InputPin> PowerSense for PinPowerSense<P> {
    fn power_present(&mut self) -> Result<bool> {
        let high = self
            .pin
            .is_high()
            .map_err(|e| UpsError::PowerSense(format!("{:?}", e.kind())))?;
        Ok(high != self.active_low)
    }
}

/// Component health, mirroring a host's warning/error status flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Health {
    Ok,
    /// Something went wrong recently; cleared by the next good poll
    Warning(String),
    /// Setup rejected the chip; the device is no longer polled
    Failed(String),
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Health::Ok => f.write_str("ok"),
            Health::Warning(msg) => write!(f, "warning: {msg}"),
            Health::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

/// One UPS hat
pub struct UpsDevice<R, P> {
    id: String,
    address: u8,
    io: R,
    power: P,
    decoder: TelemetryDecoder,
    debouncer: PowerStatusDebouncer,
    sinks: ObserverBinding,
    scheduler: PollScheduler,
    queued: VecDeque<Command>,
    poll_deferred: bool,
    last_reading: Option<Reading>,
    last_failure: Option<FailureEvent>,
    failure_count: u64,
    health: Health,
}

impl<R: RegisterIo, P: PowerSense> UpsDevice<R, P> {
    /// Create a device, rejecting an invalid configuration
    pub fn new(config: DeviceConfig, io: R, power: P) -> Result<Self> {
        config.validate()?;
        if io.address() != config.address {
            return Err(UpsError::InvalidConfig(format!(
                "bus is set up for {:#04x} but the device is configured for {:#04x}",
                io.address(),
                config.address
            )));
        }

        debug!(
            "Creating UPS device '{}' at {:#04x}, polling every {:?}",
            config.id, config.address, config.update_interval
        );

        Ok(Self {
            id: config.id,
            address: config.address,
            io,
            power,
            decoder: TelemetryDecoder::new(config.level_source),
            debouncer: PowerStatusDebouncer::new(config.debounce_polls),
            sinks: ObserverBinding::new(),
            scheduler: PollScheduler::new(config.update_interval),
            queued: VecDeque::new(),
            poll_deferred: false,
            last_reading: None,
            last_failure: None,
            failure_count: 0,
            health: Health::Ok,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn update_interval(&self) -> Duration {
        self.scheduler.interval()
    }

    pub fn poll_state(&self) -> PollState {
        self.scheduler.state()
    }

    pub fn set_voltage_sensor(&mut self, sink: NumericSink) -> Result<()> {
        self.sinks.bind_voltage(sink)
    }

    pub fn set_battery_remaining_sensor(&mut self, sink: NumericSink) -> Result<()> {
        self.sinks.bind_level(sink)
    }

    pub fn set_ups_status_sensor(&mut self, sink: BinarySink) -> Result<()> {
        self.sinks.bind_status(sink)
    }

    pub fn bound_sinks(&self) -> Vec<SinkKind> {
        self.sinks.bound()
    }

    /// Check the chip identity and clear a leftover sleep bit
    pub fn setup(&mut self) -> Result<()> {
        if self.is_failed() {
            return Err(UpsError::DeviceFailed);
        }
        info!("Setting up UPS hat '{}'...", self.id);

        let config = match self.io.read_u16(CONFIG) {
            Ok(raw) => raw & CONFIG_SAFE_MASK,
            Err(e) => {
                self.set_warning(format!("CONFIG read failed: {e}"));
                return Err(e);
            }
        };
        debug!("CONFIG register reads {:#06X}", config);

        if config != CONFIG_POWER_UP_DEFAULT {
            error!("Device '{}' does not appear to be a MAX17043", self.id);
            self.health = Health::Failed("unrecognised".to_string());
            return Err(UpsError::UnrecognisedDevice { config });
        }

        if let Err(e) = self.io.write_u16(CONFIG, CONFIG_POWER_UP_DEFAULT) {
            warn!("Failed to reset sleep bit on '{}': {}", self.id, e);
            self.set_warning(format!("sleep reset failed: {e}"));
            return Err(e);
        }

        self.health = Health::Ok;
        Ok(())
    }

    /// Advance the device by one scheduling step
    ///
    /// Queued commands take the whole step; the poll they displace stays due
    /// and runs on the next step even if more commands arrived meanwhile.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        if self.is_failed() {
            return TickOutcome::Halted;
        }

        if !self.queued.is_empty() && !self.poll_deferred {
            let mut ran = 0;
            while let Some(command) = self.queued.pop_front() {
                // Failures are logged and reflected in health by execute()
                let _ = self.execute(command);
                ran += 1;
            }
            self.poll_deferred = self.scheduler.is_due(now);
            return TickOutcome::Commands(ran);
        }

        if !self.scheduler.is_due(now) {
            return TickOutcome::NotDue;
        }

        self.poll_cycle(now)
    }

    /// Poll immediately, ignoring the interval
    pub fn poll_now(&mut self, now: Instant) -> TickOutcome {
        if self.is_failed() {
            return TickOutcome::Halted;
        }
        self.poll_cycle(now)
    }

    /// Run a command right away
    pub fn execute(&mut self, command: Command) -> Result<()> {
        if self.is_failed() {
            warn!("Ignoring {} for failed device '{}'", command, self.id);
            return Err(UpsError::DeviceFailed);
        }

        let (reg, value) = command.register_write();
        match self.io.write_u16(reg, value) {
            Ok(()) => {
                info!("Device '{}': {} (CONFIG <- {:#06X})", self.id, command, value);
                Ok(())
            }
            Err(e) => {
                warn!("Device '{}': unable to {}: {}", self.id, command, e);
                self.set_warning(format!("{command} failed: {e}"));
                Err(e)
            }
        }
    }

    /// Queue a command for the next tick
    pub fn request(&mut self, command: Command) {
        debug!("Device '{}': queued {}", self.id, command);
        self.queued.push_back(command);
    }

    pub fn last_reading(&self) -> Option<Reading> {
        self.last_reading
    }

    pub fn last_failure(&self) -> Option<&FailureEvent> {
        self.last_failure.as_ref()
    }

    /// Poll cycles that could not publish
    pub fn failure_count(&self) -> u64 {
        self.failure_count
    }

    pub fn health(&self) -> &Health {
        &self.health
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.health, Health::Failed(_))
    }

    /// Log the device configuration
    pub fn describe(&self) {
        info!("UPS hat '{}':", self.id);
        info!("  Address: {:#04x}", self.address);
        info!("  Update interval: {:?}", self.scheduler.interval());
        info!("  Level source: {:?}", self.decoder.level_source());
        info!("  Debounce polls: {}", self.debouncer.threshold());
        info!("  Sinks: {:?}", self.sinks);
        info!("  Health: {}", self.health);
        if self.is_failed() {
            error!("  Communication with '{}' failed", self.id);
        }
    }

    /// Give the bus and power line back
    pub fn release(self) -> (R, P) {
        (self.io, self.power)
    }

    fn poll_cycle(&mut self, now: Instant) -> TickOutcome {
        self.poll_deferred = false;
        self.scheduler.begin(now);

        let result = match self.capture() {
            Ok((raw, raw_power)) => {
                let power_present = self.debouncer.update(raw_power);
                self.decoder.decode(Ok(raw), power_present)
            }
            Err(e) => self.decoder.decode(Err(e), false),
        };

        let outcome = match result {
            Ok(reading) => {
                self.scheduler.succeed();
                debug!(
                    "Device '{}': {:.3} V, {:.3} %, power {}",
                    self.id,
                    reading.voltage,
                    reading.level,
                    if reading.power_present { "present" } else { "absent" }
                );
                self.sinks.publish(&reading);
                self.last_reading = Some(reading);
                self.health = Health::Ok;
                TickOutcome::Published(reading)
            }
            Err(error) => {
                self.scheduler.fail();
                self.failure_count += 1;
                warn!("Device '{}': poll failed: {}", self.id, error);
                self.set_warning(error.to_string());
                let event = FailureEvent { at: now, error };
                self.last_failure = Some(event.clone());
                TickOutcome::Failed(event)
            }
        };

        self.scheduler.finish();
        outcome
    }

    fn capture(&mut self) -> Result<(RawTelemetry, bool)> {
        let vcell = self.io.read_u16(VCELL)?;
        let soc = if self.decoder.level_source().reads_soc() {
            Some(self.io.read_u16(SOC)?)
        } else {
            None
        };
        let power_present = self.power.power_present()?;

        Ok((RawTelemetry { vcell, soc }, power_present))
    }

    fn set_warning(&mut self, message: String) {
        if !self.is_failed() {
            self.health = Health::Warning(message);
        }
    }
}

/// Object-safe view of a device for the host registry
pub trait Component: Send {
    fn id(&self) -> &str;
    fn setup(&mut self) -> Result<()>;
    fn tick(&mut self, now: Instant) -> TickOutcome;
    fn poll_now(&mut self, now: Instant) -> TickOutcome;
    fn execute(&mut self, command: Command) -> Result<()>;
    fn request(&mut self, command: Command);
    fn describe(&self);
    fn last_reading(&self) -> Option<Reading>;
    fn health(&self) -> &Health;
}

impl<R, P> Component for UpsDevice<R, P>
where
    R: RegisterIo + Send,
    P: PowerSense + Send,
{
    fn id(&self) -> &str {
        UpsDevice::id(self)
    }

    fn setup(&mut self) -> Result<()> {
        UpsDevice::setup(self)
    }

    fn tick(&mut self, now: Instant) -> TickOutcome {
        UpsDevice::tick(self, now)
    }

    fn poll_now(&mut self, now: Instant) -> TickOutcome {
        UpsDevice::poll_now(self, now)
    }

    fn execute(&mut self, command: Command) -> Result<()> {
        UpsDevice::execute(self, command)
    }

    fn request(&mut self, command: Command) {
        UpsDevice::request(self, command)
    }

    fn describe(&self) {
        UpsDevice::describe(self)
    }

    fn last_reading(&self) -> Option<Reading> {
        UpsDevice::last_reading(self)
    }

    fn health(&self) -> &Health {
        UpsDevice::health(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::I2cRegisterIo;
    use crate::mock::{MockBus, MockPin, Transaction};
    use crate::telemetry::{CONFIG_SLEEP_MASK, LinearCurve};
    use embedded_hal::i2c::ErrorKind;

    type MockDevice = UpsDevice<I2cRegisterIo<MockBus>, PinPowerSense<MockPin>>;

    /// Reads pass through; every write times out
    struct FailingWrites<R>(R);

    impl<R: RegisterIo> RegisterIo for FailingWrites<R> {
        fn address(&self) -> u8 {
            self.0.address()
        }

        fn read_register(&mut self, reg: u8, buf: &mut [u8]) -> Result<()> {
            self.0.read_register(reg, buf)
        }

        fn write_register(&mut self, _reg: u8, _bytes: &[u8]) -> Result<()> {
            Err(UpsError::BusTimeout)
        }
    }

    fn mock_device(config: DeviceConfig) -> (MockDevice, MockBus, MockPin) {
        let bus = MockBus::max17043(DEFAULT_ADDRESS);
        let pin = MockPin::new(true);
        let device = UpsDevice::new(
            config,
            I2cRegisterIo::new(bus.clone(), DEFAULT_ADDRESS),
            PinPowerSense::new(pin.clone(), false),
        )
        .unwrap();
        (device, bus, pin)
    }

    #[test]
    fn test_config_defaults() {
        let config = DeviceConfig::new("ups");
        assert_eq!(config.address, 0x36);
        assert_eq!(config.update_interval, Duration::from_secs(60));
        assert_eq!(config.debounce_polls, DEFAULT_DEBOUNCE_POLLS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let bad = [
            DeviceConfig::new(""),
            DeviceConfig::new("ups").with_address(0x02),
            DeviceConfig::new("ups").with_address(0x78),
            DeviceConfig::new("ups").with_update_interval(Duration::from_millis(500)),
            DeviceConfig::new("ups").with_update_interval(Duration::from_secs(2 * 86_400)),
            DeviceConfig::new("ups").with_debounce_polls(0),
            DeviceConfig::new("ups").with_debounce_polls(17),
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(UpsError::InvalidConfig(_))),
                "{config:?} should be rejected"
            );
        }

        assert!(DeviceConfig::new("ups").with_address(0x03).validate().is_ok());
        assert!(DeviceConfig::new("ups").with_address(0x77).validate().is_ok());
    }

    #[test]
    fn test_power_sense_polarity() {
        let pin = MockPin::new(true);
        let mut active_high = PinPowerSense::new(pin.clone(), false);
        let mut active_low = PinPowerSense::new(pin.clone(), true);

        assert!(active_high.power_present().unwrap());
        assert!(!active_low.power_present().unwrap());

        pin.set_broken(true);
        assert!(matches!(
            active_high.power_present(),
            Err(UpsError::PowerSense(_))
        ));
    }

    #[test]
    fn test_setup_recognises_chip_and_clears_sleep_bit() {
        let (mut device, bus, _) = mock_device(DeviceConfig::new("ups"));
        bus.set_register(CONFIG, CONFIG_POWER_UP_DEFAULT | CONFIG_SLEEP_MASK);

        device.setup().unwrap();

        assert_eq!(bus.register(CONFIG), CONFIG_POWER_UP_DEFAULT);
        assert_eq!(device.health(), &Health::Ok);
    }

    #[test]
    fn test_setup_rejects_other_chip() {
        let (mut device, bus, _) = mock_device(DeviceConfig::new("ups"));
        bus.set_register(CONFIG, 0x1234);

        assert_eq!(
            device.setup(),
            Err(UpsError::UnrecognisedDevice { config: 0x1214 })
        );
        assert!(device.is_failed());
        assert_eq!(device.tick(Instant::now()), TickOutcome::Halted);
        assert_eq!(device.execute(Command::Sleep), Err(UpsError::DeviceFailed));
    }

    #[test]
    fn test_setup_bus_error_is_only_a_warning() {
        let (mut device, bus, _) = mock_device(DeviceConfig::new("ups"));
        bus.fail_with(Some(ErrorKind::Bus));

        assert_eq!(device.setup(), Err(UpsError::BusTimeout));
        assert!(!device.is_failed());
        assert!(matches!(device.health(), Health::Warning(_)));

        bus.fail_with(None);
        assert!(matches!(
            device.tick(Instant::now()),
            TickOutcome::Published(_)
        ));
        assert_eq!(device.health(), &Health::Ok);
    }

    #[test]
    fn test_poll_without_sinks_still_reads() {
        let (mut device, bus, _) = mock_device(DeviceConfig::new("ups"));

        let outcome = device.tick(Instant::now());

        assert!(matches!(outcome, TickOutcome::Published(_)));
        assert_eq!(bus.read_count(), 2);
        assert!(device.last_reading().is_some());
    }

    #[test]
    fn test_curve_source_skips_soc_register() {
        let config = DeviceConfig::new("ups")
            .with_level_source(LevelSource::Curve(Box::new(LinearCurve::default())));
        let (mut device, bus, _) = mock_device(config);

        device.tick(Instant::now());

        assert_eq!(
            bus.transactions(),
            vec![Transaction::Read { reg: VCELL, len: 2 }]
        );
    }

    #[test]
    fn test_not_due_until_interval_elapses() {
        let start = Instant::now();
        let (mut device, bus, _) = mock_device(DeviceConfig::new("ups"));

        assert!(matches!(device.tick(start), TickOutcome::Published(_)));
        bus.clear_transactions();

        assert_eq!(device.tick(start + Duration::from_secs(30)), TickOutcome::NotDue);
        assert_eq!(bus.read_count(), 0);

        assert!(matches!(
            device.tick(start + Duration::from_secs(60)),
            TickOutcome::Published(_)
        ));
    }

    #[test]
    fn test_power_line_failure_skips_cycle() {
        let (mut device, _, pin) = mock_device(DeviceConfig::new("ups"));
        pin.set_broken(true);

        let outcome = device.tick(Instant::now());

        match outcome {
            TickOutcome::Failed(event) => assert!(matches!(
                event.error,
                UpsError::NoReading(ref cause) if matches!(**cause, UpsError::PowerSense(_))
            )),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(device.last_reading(), None);
    }

    #[test]
    fn test_status_is_debounced() {
        let start = Instant::now();
        let interval = Duration::from_secs(60);
        let (mut device, _, pin) = mock_device(DeviceConfig::new("ups").with_debounce_polls(2));

        let status_at = |device: &mut MockDevice, n: u32| match device.tick(start + interval * n)
        {
            TickOutcome::Published(reading) => reading.power_present,
            other => panic!("expected reading, got {other:?}"),
        };

        assert!(status_at(&mut device, 0));
        pin.set_high(false);
        assert!(status_at(&mut device, 1));
        assert!(!status_at(&mut device, 2));
    }

    #[test]
    fn test_queued_command_takes_the_tick() {
        let start = Instant::now();
        let (mut device, bus, _) = mock_device(DeviceConfig::new("ups"));

        device.request(Command::Wake);
        assert_eq!(device.tick(start), TickOutcome::Commands(1));
        assert_eq!(bus.read_count(), 0);

        // The displaced poll is still due
        assert!(matches!(device.tick(start), TickOutcome::Published(_)));
    }

    #[test]
    fn test_steady_commands_do_not_starve_polling() {
        let start = Instant::now();
        let (mut device, bus, _) = mock_device(DeviceConfig::new("ups"));

        device.request(Command::Wake);
        assert_eq!(device.tick(start), TickOutcome::Commands(1));
        assert_eq!(device.poll_state(), PollState::Idle);

        // A new command every step still lets the deferred poll through
        device.request(Command::Wake);
        assert!(matches!(device.tick(start), TickOutcome::Published(_)));
        assert_eq!(bus.read_count(), 2);

        device.request(Command::Wake);
        assert_eq!(device.tick(start), TickOutcome::Commands(2));
        assert_eq!(bus.write_count(), 3);
    }

    #[test]
    fn test_commands_between_polls_defer_nothing() {
        let start = Instant::now();
        let (mut device, _, _) = mock_device(DeviceConfig::new("ups"));
        assert!(matches!(device.tick(start), TickOutcome::Published(_)));

        let later = start + Duration::from_secs(10);
        device.request(Command::Sleep);
        assert_eq!(device.tick(later), TickOutcome::Commands(1));
        device.request(Command::Wake);
        assert_eq!(device.tick(later), TickOutcome::Commands(1));
    }

    #[test]
    fn test_setup_write_back_failure_is_only_a_warning() {
        let (device, bus, pin) = mock_device(DeviceConfig::new("ups"));
        let (io, _) = device.release();
        let mut device = UpsDevice::new(
            DeviceConfig::new("ups"),
            FailingWrites(io),
            PinPowerSense::new(pin, false),
        )
        .unwrap();

        assert_eq!(device.setup(), Err(UpsError::BusTimeout));
        assert!(!device.is_failed());
        assert!(matches!(device.health(), Health::Warning(_)));
        assert_eq!(bus.write_count(), 0);

        assert!(matches!(
            device.tick(Instant::now()),
            TickOutcome::Published(_)
        ));
        assert_eq!(device.health(), &Health::Ok);
    }

    #[test]
    fn test_bus_address_must_match_config() {
        let bus = MockBus::max17043(0x00);
        let result = UpsDevice::new(
            DeviceConfig::new("ups"),
            I2cRegisterIo::new(bus.clone(), 0x00),
            PinPowerSense::new(MockPin::new(true), false),
        );
        assert!(matches!(result, Err(UpsError::InvalidConfig(_))));

        let result = UpsDevice::new(
            DeviceConfig::new("ups").with_address(0x36),
            I2cRegisterIo::new(bus.clone(), 0x37),
            PinPowerSense::new(MockPin::new(true), false),
        );
        assert!(matches!(result, Err(UpsError::InvalidConfig(_))));
        assert!(bus.transactions().is_empty());
    }

    #[test]
    fn test_failed_command_sets_warning() {
        let (mut device, bus, _) = mock_device(DeviceConfig::new("ups"));
        bus.fail_with(Some(ErrorKind::NoAcknowledge(
            embedded_hal::i2c::NoAcknowledgeSource::Address,
        )));

        assert_eq!(device.execute(Command::Sleep), Err(UpsError::NoAck));
        assert!(matches!(device.health(), Health::Warning(_)));
    }

    #[test]
    fn test_component_object() {
        let (device, _, _) = mock_device(DeviceConfig::new("ups"));
        let mut component: Box<dyn Component> = Box::new(device);

        assert_eq!(component.id(), "ups");
        component.setup().unwrap();
        assert!(matches!(
            component.poll_now(Instant::now()),
            TickOutcome::Published(_)
        ));
        assert!(component.last_reading().is_some());
    }
}

//! Assembles devices from configuration
//!
//! Real hats are reached through the Linux I2C character device and a sysfs
//! GPIO line; `--mock` swaps both for the in-memory doubles from
//! `upslite_hal::mock` so the daemon can run on a development machine.

use crate::sinks::{binary_sink, numeric_sink};
use anyhow::{Context, Result};
use linux_embedded_hal::sysfs_gpio::Direction;
use linux_embedded_hal::{I2cdev, SysfsPin};
use upslite_config::{DeviceSettings, OutputFormat};
use upslite_hal::mock::{MockBus, MockPin};
use upslite_hal::{
    Component, DeviceRegistry, I2cRegisterIo, PinPowerSense, PowerSense, RegisterIo, SinkKind,
    UpsDevice,
};

/// Build one device with its configured sinks attached
pub fn build_device(
    settings: &DeviceSettings,
    mock: bool,
    output: OutputFormat,
) -> Result<Box<dyn Component>> {
    if mock {
        tracing::info!("[MOCK] Using simulated hat for '{}'", settings.id);
        let io = I2cRegisterIo::new(MockBus::max17043(settings.address), settings.address);
        let power = PinPowerSense::new(MockPin::new(true), settings.power_active_low);
        return assemble(settings, io, power, output);
    }

    let bus = I2cdev::new(&settings.i2c_bus)
        .with_context(|| format!("Failed to open {}", settings.i2c_bus.display()))?;

    let pin = SysfsPin::new(settings.power_pin);
    pin.export()
        .with_context(|| format!("Failed to export GPIO {}", settings.power_pin))?;
    pin.set_direction(Direction::In)
        .with_context(|| format!("Failed to make GPIO {} an input", settings.power_pin))?;

    let io = I2cRegisterIo::new(bus, settings.address);
    let power = PinPowerSense::new(pin, settings.power_active_low);
    assemble(settings, io, power, output)
}

fn assemble<R, P>(
    settings: &DeviceSettings,
    io: R,
    power: P,
    output: OutputFormat,
) -> Result<Box<dyn Component>>
where
    R: RegisterIo + Send + 'static,
    P: PowerSense + Send + 'static,
{
    let config = settings.to_device_config()?;
    let mut device = UpsDevice::new(config, io, power)?;
    let id = settings.id.as_str();

    if let Some(decl) = &settings.battery_voltage {
        let meta = decl.resolve(SinkKind::Voltage, id);
        device.set_voltage_sensor(numeric_sink(id, meta, output))?;
    }
    if let Some(decl) = &settings.battery_level {
        let meta = decl.resolve(SinkKind::Level, id);
        device.set_battery_remaining_sensor(numeric_sink(id, meta, output))?;
    }
    if let Some(decl) = &settings.ups_status {
        let meta = decl.resolve(SinkKind::Status, id);
        device.set_ups_status_sensor(binary_sink(id, meta, output))?;
    }

    if device.bound_sinks().is_empty() {
        tracing::warn!("Device '{}' has no sensors declared; readings go nowhere", id);
    }

    Ok(Box::new(device))
}

/// Build every configured device into a registry
pub fn build_registry(
    devices: &[DeviceSettings],
    mock: bool,
    output: OutputFormat,
) -> Result<DeviceRegistry> {
    let mut registry = DeviceRegistry::new();
    for settings in devices {
        let device = build_device(settings, mock, output)
            .with_context(|| format!("Failed to create device '{}'", settings.id))?;
        registry.register(device)?;
    }
    Ok(registry)
}

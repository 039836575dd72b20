//! Host-side registry of UPS devices
//!
//! Keeps at most one component per identifier and routes ticks and commands
//! to them by id.

use crate::command::Command;
use crate::device::Component;
use crate::scheduler::TickOutcome;
use crate::{Result, UpsError};
use std::collections::BTreeMap;
use std::time::Instant;

#[derive(Default)]
pub struct DeviceRegistry {
    devices: BTreeMap<String, Box<dyn Component>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component, refusing a second one with the same id
    pub fn register(&mut self, component: Box<dyn Component>) -> Result<()> {
        let id = component.id().to_string();
        if self.devices.contains_key(&id) {
            return Err(UpsError::DuplicateDevice(id));
        }
        tracing::debug!("Registered device '{}'", id);
        self.devices.insert(id, component);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&dyn Component> {
        self.devices.get(id).map(|c| c.as_ref())
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut (dyn Component + 'static)> {
        self.devices.get_mut(id).map(|c| c.as_mut())
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.devices.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Run setup on every device; failures are returned, not fatal
    pub fn setup_all(&mut self) -> Vec<(String, Result<()>)> {
        self.devices
            .iter_mut()
            .map(|(id, device)| {
                let result = device.setup();
                device.describe();
                (id.clone(), result)
            })
            .collect()
    }

    /// Advance every device by one scheduling step
    pub fn tick_all(&mut self, now: Instant) -> Vec<(String, TickOutcome)> {
        self.devices
            .iter_mut()
            .map(|(id, device)| (id.clone(), device.tick(now)))
            .collect()
    }

    /// Run a command on one device right away
    pub fn dispatch(&mut self, id: &str, command: Command) -> Result<()> {
        self.get_mut(id)
            .ok_or_else(|| UpsError::UnknownDevice(id.to_string()))?
            .execute(command)
    }

    /// Queue a command on one device for its next tick
    pub fn request(&mut self, id: &str, command: Command) -> Result<()> {
        self.get_mut(id)
            .ok_or_else(|| UpsError::UnknownDevice(id.to_string()))?
            .request(command);
        Ok(())
    }

    /// Queue a command on every device
    pub fn request_all(&mut self, command: Command) {
        for device in self.devices.values_mut() {
            device.request(command);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::I2cRegisterIo;
    use crate::device::{DeviceConfig, PinPowerSense, UpsDevice};
    use crate::mock::{MockBus, MockPin};

    fn component(id: &str, bus: &MockBus) -> Box<dyn Component> {
        Box::new(
            UpsDevice::new(
                DeviceConfig::new(id),
                I2cRegisterIo::new(bus.clone(), 0x36),
                PinPowerSense::new(MockPin::new(true), false),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let bus = MockBus::max17043(0x36);
        let mut registry = DeviceRegistry::new();

        registry.register(component("ups", &bus)).unwrap();
        assert_eq!(
            registry.register(component("ups", &bus)),
            Err(UpsError::DuplicateDevice("ups".into()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_dispatch_by_id() {
        let bus_a = MockBus::max17043(0x36);
        let bus_b = MockBus::max17043(0x36);
        let mut registry = DeviceRegistry::new();
        registry.register(component("a", &bus_a)).unwrap();
        registry.register(component("b", &bus_b)).unwrap();

        registry.dispatch("b", Command::Sleep).unwrap();

        assert_eq!(bus_a.write_count(), 0);
        assert_eq!(bus_b.write_count(), 1);
        assert_eq!(
            registry.dispatch("c", Command::Sleep),
            Err(UpsError::UnknownDevice("c".into()))
        );
    }

    #[test]
    fn test_tick_all_and_request_all() {
        let bus = MockBus::max17043(0x36);
        let mut registry = DeviceRegistry::new();
        registry.register(component("ups", &bus)).unwrap();

        let now = Instant::now();
        let setup = registry.setup_all();
        assert!(setup.iter().all(|(_, r)| r.is_ok()));

        registry.request_all(Command::Sleep);
        let outcomes = registry.tick_all(now);
        assert_eq!(outcomes, vec![("ups".to_string(), TickOutcome::Commands(1))]);

        let outcomes = registry.tick_all(now);
        assert!(matches!(outcomes[0].1, TickOutcome::Published(_)));
        assert!(registry.get("ups").unwrap().last_reading().is_some());
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["ups"]);
    }
}

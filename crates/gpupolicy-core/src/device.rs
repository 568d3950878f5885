//! GPU device snapshots

use crate::error::{check_finite, PolicyError, PolicyResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A point-in-time snapshot of one GPU device.
///
/// Fields are private so a `Device` can only exist once its numeric fields
/// have been validated. Build one with [`Device::builder`] or deserialize it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DeviceRecord", into = "DeviceRecord")]
pub struct Device {
    id: u32,
    name: String,
    uuid: String,
    memory_gb: f64,
    temperature_c: f64,
    power_w: f64,
    online: bool,
    registered: bool,
    pool: String,
    tags: BTreeSet<String>,
}

impl Device {
    /// Start building a device with the identifying fields set
    pub fn builder(id: u32, name: impl Into<String>, uuid: impl Into<String>) -> DeviceBuilder {
        DeviceBuilder {
            record: DeviceRecord {
                id,
                name: name.into(),
                uuid: uuid.into(),
                memory_gb: 0.0,
                temperature_c: 0.0,
                power_w: 0.0,
                online: true,
                registered: false,
                pool: String::new(),
                tags: BTreeSet::new(),
            },
        }
    }

    /// Device index
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Display name (e.g. "NVIDIA GeForce RTX 4090")
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Globally unique identifier
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Memory capacity in GB
    pub fn memory_gb(&self) -> f64 {
        self.memory_gb
    }

    /// Current temperature in °C
    pub fn temperature_c(&self) -> f64 {
        self.temperature_c
    }

    /// Current power draw in W
    pub fn power_w(&self) -> f64 {
        self.power_w
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Pool the device is bound to, if any
    pub fn assigned_pool(&self) -> Option<&str> {
        if self.pool.is_empty() {
            None
        } else {
            Some(&self.pool)
        }
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "GPU{} [{}] - {} | Mem: {:.1}GB | Temp: {:.1}°C | Power: {:.1}W",
            self.id, self.uuid, self.name, self.memory_gb, self.temperature_c, self.power_w
        )
    }
}

/// Unvalidated device fields, as produced by a loader or a wire format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: u32,
    pub name: String,
    pub uuid: String,
    pub memory_gb: f64,
    pub temperature_c: f64,
    pub power_w: f64,
    #[serde(default = "default_online")]
    pub online: bool,
    #[serde(default)]
    pub registered: bool,
    #[serde(default)]
    pub pool: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

fn default_online() -> bool {
    true
}

impl TryFrom<DeviceRecord> for Device {
    type Error = PolicyError;

    fn try_from(record: DeviceRecord) -> PolicyResult<Self> {
        if record.uuid.trim().is_empty() {
            return Err(PolicyError::invalid("uuid", "must not be empty"));
        }
        let memory_gb = check_finite("memory_gb", record.memory_gb, Some(0.0))?;
        let temperature_c = check_finite("temperature_c", record.temperature_c, None)?;
        let power_w = check_finite("power_w", record.power_w, Some(0.0))?;

        Ok(Self {
            id: record.id,
            name: record.name,
            uuid: record.uuid,
            memory_gb,
            temperature_c,
            power_w,
            online: record.online,
            registered: record.registered,
            pool: record.pool,
            tags: record.tags,
        })
    }
}

impl From<Device> for DeviceRecord {
    fn from(device: Device) -> Self {
        Self {
            id: device.id,
            name: device.name,
            uuid: device.uuid,
            memory_gb: device.memory_gb,
            temperature_c: device.temperature_c,
            power_w: device.power_w,
            online: device.online,
            registered: device.registered,
            pool: device.pool,
            tags: device.tags,
        }
    }
}

/// Builder for [`Device`]; validation happens in [`DeviceBuilder::build`]
#[derive(Debug, Clone)]
pub struct DeviceBuilder {
    record: DeviceRecord,
}

impl DeviceBuilder {
    pub fn memory_gb(mut self, memory_gb: f64) -> Self {
        self.record.memory_gb = memory_gb;
        self
    }

    pub fn temperature_c(mut self, temperature_c: f64) -> Self {
        self.record.temperature_c = temperature_c;
        self
    }

    pub fn power_w(mut self, power_w: f64) -> Self {
        self.record.power_w = power_w;
        self
    }

    pub fn online(mut self, online: bool) -> Self {
        self.record.online = online;
        self
    }

    pub fn registered(mut self, registered: bool) -> Self {
        self.record.registered = registered;
        self
    }

    /// Bind the device to a pool; an empty name leaves it unassigned
    pub fn pool(mut self, pool: impl Into<String>) -> Self {
        self.record.pool = pool.into();
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.record.tags.insert(tag.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> PolicyResult<Device> {
        Device::try_from(self.record)
    }
}

//! Registry of the hardware devices the host reports
//!
//! Records are created from the registration info (disconnected) or on the
//! first connect event for an unknown id (connected). They are updated in
//! place and never removed, so a handle obtained from [`DeviceRegistry::get`]
//! keeps observing later connects and disconnects.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use deck_connection::{Connection, Subscription};
use deck_protocol::{DeviceDescriptor, DeviceInfo, DeviceSize, DeviceType, EventKind, InboundEvent};
use parking_lot::RwLock;

/// One hardware device known to the plugin.
#[derive(Debug)]
pub struct Device {
    id: String,
    info: RwLock<DeviceInfo>,
    connected: AtomicBool,
}

impl Device {
    fn new(id: String, info: DeviceInfo, connected: bool) -> Self {
        Self {
            id,
            info: RwLock::new(info),
            connected: AtomicBool::new(connected),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<String> {
        self.info.read().name.clone()
    }

    pub fn size(&self) -> Option<DeviceSize> {
        self.info.read().size
    }

    pub fn kind(&self) -> Option<DeviceType> {
        self.info.read().kind
    }

    /// Copy of the descriptive fields.
    pub fn info(&self) -> DeviceInfo {
        self.info.read().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

#[derive(Debug, Default)]
struct Records {
    by_id: HashMap<String, Arc<Device>>,
    order: Vec<Arc<Device>>,
}

/// Thread-safe device registry. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    records: Arc<RwLock<Records>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the devices from the registration info, all
    /// marked disconnected until the host reports them.
    pub fn from_descriptors<'a>(devices: impl IntoIterator<Item = &'a DeviceDescriptor>) -> Self {
        let registry = Self::new();
        {
            let mut records = registry.records.write();
            for descriptor in devices {
                if let Some(existing) = records.by_id.get(&descriptor.id) {
                    existing.info.write().merge(&descriptor.info);
                    continue;
                }
                let device = Arc::new(Device::new(descriptor.id.clone(), descriptor.info.clone(), false));
                records.by_id.insert(descriptor.id.clone(), Arc::clone(&device));
                records.order.push(device);
            }
        }
        registry
    }

    pub fn get(&self, id: &str) -> Option<Arc<Device>> {
        self.records.read().by_id.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().order.is_empty()
    }

    /// Handles to every device, in the order they became known.
    pub fn snapshot(&self) -> Vec<Arc<Device>> {
        self.records.read().order.clone()
    }

    /// Iterate over a snapshot of the devices in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = Arc<Device>> {
        self.snapshot().into_iter()
    }

    /// Insert or update `id`, merge `info` and mark it connected.
    pub(crate) fn apply_connect(&self, id: &str, info: Option<&DeviceInfo>) {
        if let Some(device) = self.get(id) {
            if let Some(info) = info {
                device.info.write().merge(info);
            }
            device.connected.store(true, Ordering::Release);
            tracing::debug!("Device {} connected", id);
            return;
        }

        let mut records = self.records.write();
        // Another thread may have inserted it since the read above.
        if let Some(device) = records.by_id.get(id) {
            if let Some(info) = info {
                device.info.write().merge(info);
            }
            device.connected.store(true, Ordering::Release);
            return;
        }
        let device = Arc::new(Device::new(id.to_string(), info.cloned().unwrap_or_default(), true));
        records.by_id.insert(id.to_string(), Arc::clone(&device));
        records.order.push(device);
        tracing::debug!("New device {} connected", id);
    }

    /// Mark `id` disconnected. Unknown ids are ignored.
    pub(crate) fn apply_disconnect(&self, id: &str) {
        if let Some(device) = self.get(id) {
            device.connected.store(false, Ordering::Release);
            tracing::debug!("Device {} disconnected", id);
        }
    }

    /// Apply a `deviceDidConnect` or `deviceDidDisconnect` event. Other
    /// events, and device events without a device id, are ignored.
    pub(crate) fn apply_event(&self, event: &InboundEvent) {
        let Some(id) = event.device.as_deref() else {
            return;
        };
        match event.kind() {
            EventKind::DeviceDidConnect => self.apply_connect(id, event.device_info.as_ref()),
            EventKind::DeviceDidDisconnect => self.apply_disconnect(id),
            _ => {}
        }
    }

    /// Keep this registry in sync with the device events of `connection`.
    pub fn attach(&self, connection: &Connection) -> [Subscription; 2] {
        let on_connect = self.clone();
        let on_disconnect = self.clone();
        [
            connection.add_disposable_listener(EventKind::DeviceDidConnect, move |event| {
                on_connect.apply_event(event)
            }),
            connection.add_disposable_listener(EventKind::DeviceDidDisconnect, move |event| {
                on_disconnect.apply_event(event)
            }),
        ]
    }
}

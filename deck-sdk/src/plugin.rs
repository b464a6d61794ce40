//! The plugin facade: one connection plus everything wired to it.

use std::path::Path;

use deck_connection::{Connection, ConnectionConfig, ConnectionState, Subscription};
use deck_protocol::{EventKind, InboundEvent, Manifest};

use crate::devices::DeviceRegistry;
use crate::error::Result;
use crate::params::RegistrationParams;
use crate::router::{ActionHandler, ActionRouter, HandlerRegistration};
use crate::settings::GlobalSettings;
use crate::system::System;

/// A running plugin.
///
/// Owns the single [`Connection`] to the host, a [`DeviceRegistry`] kept in
/// sync with device events, the [`ActionRouter`] and the plugin-level
/// [`GlobalSettings`] and [`System`] handles.
///
/// ```rust,no_run
/// use deck_sdk::{Manifest, Plugin};
///
/// # async fn run() -> deck_sdk::Result<()> {
/// let manifest = Manifest::from_path("manifest.json")?;
/// let plugin = Plugin::from_env(manifest)?;
/// plugin.connect()?;
/// plugin.system().log_message("plugin started").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Plugin {
    params: RegistrationParams,
    connection: Connection,
    devices: DeviceRegistry,
    router: ActionRouter,
    settings: GlobalSettings,
    system: System,
    _device_listeners: [Subscription; 2],
}

impl Plugin {
    /// Build a plugin with the default connection settings for `params`.
    pub fn new(params: RegistrationParams, manifest: Manifest) -> Result<Self> {
        let config = params.connection_config();
        Self::with_config(params, config, manifest)
    }

    /// Build a plugin with an explicit connection config.
    pub fn with_config(params: RegistrationParams, config: ConnectionConfig, manifest: Manifest) -> Result<Self> {
        config.validate()?;

        let connection = Connection::new(config);
        let devices = DeviceRegistry::from_descriptors(&params.info.devices);
        let device_listeners = devices.attach(&connection);
        let router = ActionRouter::new(connection.clone(), manifest);
        let settings = GlobalSettings::new(connection.clone(), &params.plugin_uuid);
        let system = System::new(connection.clone(), &params.plugin_uuid);

        tracing::debug!(
            "Plugin {} created with {} known device(s)",
            params.plugin_uuid,
            devices.len()
        );
        Ok(Self {
            params,
            connection,
            devices,
            router,
            settings,
            system,
            _device_listeners: device_listeners,
        })
    }

    /// Build from the process arguments.
    pub fn from_env(manifest: Manifest) -> Result<Self> {
        Self::new(RegistrationParams::from_env()?, manifest)
    }

    /// Build from the process arguments and a manifest file.
    pub fn from_env_with_manifest(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_env(Manifest::from_path(path)?)
    }

    /// Start connecting to the host. See [`Connection::connect`].
    pub fn connect(&self) -> Result<()> {
        self.connection.connect()?;
        Ok(())
    }

    /// Wait until the registration handshake has been sent.
    pub async fn wait_until_connected(&self) -> Result<()> {
        self.connection.wait_until_connected().await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.connection.close().await;
    }

    pub fn register_action<H: ActionHandler>(&self, handler: H) -> Result<HandlerRegistration> {
        Ok(self.router.register(handler)?)
    }

    /// Listen to an event that is not tied to an action instance, such as
    /// `systemDidWakeUp` or `applicationDidLaunch`.
    pub fn on_system_event<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&InboundEvent) + Send + Sync + 'static,
    {
        if kind.is_action_event() {
            tracing::debug!("{} is an action event; prefer an ActionHandler", kind);
        }
        self.connection.add_disposable_listener(kind, listener)
    }

    pub fn params(&self) -> &RegistrationParams {
        &self.params
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }

    pub fn router(&self) -> &ActionRouter {
        &self.router
    }

    pub fn global_settings(&self) -> &GlobalSettings {
        &self.settings
    }

    pub fn system(&self) -> &System {
        &self.system
    }
}

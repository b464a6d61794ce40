//! Connection parameters the host passes on the plugin's command line.
//!
//! The host launches the plugin as
//! `plugin -port 28196 -pluginUUID <token> -registerEvent registerPlugin -info <json>`.

use deck_connection::ConnectionConfig;
use deck_protocol::RegistrationInfo;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamsError {
    #[error("Missing required argument {0}")]
    Missing(&'static str),

    #[error("Argument {flag} has no value")]
    NoValue { flag: String },

    #[error("Invalid port {0:?}")]
    InvalidPort(String),

    #[error("Invalid -info document: {0}")]
    InvalidInfo(String),
}

/// Everything needed to connect and register with the host.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationParams {
    pub port: u16,
    /// Opaque token sent in the handshake
    pub plugin_uuid: String,
    pub register_event: String,
    pub info: RegistrationInfo,
}

impl RegistrationParams {
    /// Parse the host's single-dash flags. Flags are matched case-sensitively;
    /// unknown flags and their values are skipped. The program name, if
    /// present, is ignored.
    pub fn from_args<I, S>(args: I) -> Result<Self, ParamsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut port = None;
        let mut plugin_uuid = None;
        let mut register_event = None;
        let mut info = None;

        let mut args = args.into_iter().map(Into::into).peekable();
        while let Some(arg) = args.next() {
            if !arg.starts_with('-') {
                continue;
            }
            let slot = match arg.as_str() {
                "-port" => &mut port,
                "-pluginUUID" => &mut plugin_uuid,
                "-registerEvent" => &mut register_event,
                "-info" => &mut info,
                _ => {
                    tracing::debug!("Skipping unknown argument {}", arg);
                    if args.peek().is_some_and(|next| !next.starts_with('-')) {
                        args.next();
                    }
                    continue;
                }
            };
            match args.next() {
                Some(value) => *slot = Some(value),
                None => return Err(ParamsError::NoValue { flag: arg }),
            }
        }

        let port = port.ok_or(ParamsError::Missing("-port"))?;
        let port = port
            .parse::<u16>()
            .ok()
            .filter(|port| *port != 0)
            .ok_or(ParamsError::InvalidPort(port))?;

        let info = match info {
            Some(text) => serde_json::from_str::<RegistrationInfo>(&text)
                .map_err(|e| ParamsError::InvalidInfo(e.to_string()))?,
            None => RegistrationInfo::default(),
        };

        Ok(Self {
            port,
            plugin_uuid: plugin_uuid.ok_or(ParamsError::Missing("-pluginUUID"))?,
            register_event: register_event.ok_or(ParamsError::Missing("-registerEvent"))?,
            info,
        })
    }

    /// Parse the current process's arguments.
    pub fn from_env() -> Result<Self, ParamsError> {
        Self::from_args(std::env::args())
    }

    /// Connection config for these parameters, with default reconnect timing.
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig::new(self.port, &self.plugin_uuid, &self.register_event)
    }
}

//! Event and command names used by the host.
//!
//! The host tags every frame with a camelCase `event` string. [`EventKind`]
//! covers the inbound tags and [`CommandKind`] the outbound ones; both map
//! to and from the wire string.

use std::fmt;

/// Inbound event tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    ApplicationDidLaunch,
    ApplicationDidTerminate,
    DeviceDidConnect,
    DeviceDidDisconnect,
    DialDown,
    DialRotate,
    DialUp,
    DidReceiveDeepLink,
    DidReceiveGlobalSettings,
    DidReceiveSettings,
    KeyDown,
    KeyUp,
    PropertyInspectorDidAppear,
    PropertyInspectorDidDisappear,
    SendToPlugin,
    SystemDidWakeUp,
    TitleParametersDidChange,
    TouchTap,
    WillAppear,
    WillDisappear,
    /// Any tag this crate does not know about
    Other(String),
}

impl EventKind {
    /// Every known tag, in wire-name order.
    pub const KNOWN: [EventKind; 20] = [
        EventKind::ApplicationDidLaunch,
        EventKind::ApplicationDidTerminate,
        EventKind::DeviceDidConnect,
        EventKind::DeviceDidDisconnect,
        EventKind::DialDown,
        EventKind::DialRotate,
        EventKind::DialUp,
        EventKind::DidReceiveDeepLink,
        EventKind::DidReceiveGlobalSettings,
        EventKind::DidReceiveSettings,
        EventKind::KeyDown,
        EventKind::KeyUp,
        EventKind::PropertyInspectorDidAppear,
        EventKind::PropertyInspectorDidDisappear,
        EventKind::SendToPlugin,
        EventKind::SystemDidWakeUp,
        EventKind::TitleParametersDidChange,
        EventKind::TouchTap,
        EventKind::WillAppear,
        EventKind::WillDisappear,
    ];

    /// Map a wire name to its kind.
    pub fn from_name(name: &str) -> Self {
        match name {
            "applicationDidLaunch" => Self::ApplicationDidLaunch,
            "applicationDidTerminate" => Self::ApplicationDidTerminate,
            "deviceDidConnect" => Self::DeviceDidConnect,
            "deviceDidDisconnect" => Self::DeviceDidDisconnect,
            "dialDown" => Self::DialDown,
            "dialRotate" => Self::DialRotate,
            "dialUp" => Self::DialUp,
            "didReceiveDeepLink" => Self::DidReceiveDeepLink,
            "didReceiveGlobalSettings" => Self::DidReceiveGlobalSettings,
            "didReceiveSettings" => Self::DidReceiveSettings,
            "keyDown" => Self::KeyDown,
            "keyUp" => Self::KeyUp,
            "propertyInspectorDidAppear" => Self::PropertyInspectorDidAppear,
            "propertyInspectorDidDisappear" => Self::PropertyInspectorDidDisappear,
            "sendToPlugin" => Self::SendToPlugin,
            "systemDidWakeUp" => Self::SystemDidWakeUp,
            "titleParametersDidChange" => Self::TitleParametersDidChange,
            "touchTap" => Self::TouchTap,
            "willAppear" => Self::WillAppear,
            "willDisappear" => Self::WillDisappear,
            other => Self::Other(other.to_string()),
        }
    }

    /// The wire name of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::ApplicationDidLaunch => "applicationDidLaunch",
            Self::ApplicationDidTerminate => "applicationDidTerminate",
            Self::DeviceDidConnect => "deviceDidConnect",
            Self::DeviceDidDisconnect => "deviceDidDisconnect",
            Self::DialDown => "dialDown",
            Self::DialRotate => "dialRotate",
            Self::DialUp => "dialUp",
            Self::DidReceiveDeepLink => "didReceiveDeepLink",
            Self::DidReceiveGlobalSettings => "didReceiveGlobalSettings",
            Self::DidReceiveSettings => "didReceiveSettings",
            Self::KeyDown => "keyDown",
            Self::KeyUp => "keyUp",
            Self::PropertyInspectorDidAppear => "propertyInspectorDidAppear",
            Self::PropertyInspectorDidDisappear => "propertyInspectorDidDisappear",
            Self::SendToPlugin => "sendToPlugin",
            Self::SystemDidWakeUp => "systemDidWakeUp",
            Self::TitleParametersDidChange => "titleParametersDidChange",
            Self::TouchTap => "touchTap",
            Self::WillAppear => "willAppear",
            Self::WillDisappear => "willDisappear",
            Self::Other(name) => name,
        }
    }

    /// Whether events of this kind target a single action instance and carry
    /// an `action` + `context` pair.
    pub fn is_action_event(&self) -> bool {
        matches!(
            self,
            Self::DialDown
                | Self::DialRotate
                | Self::DialUp
                | Self::DidReceiveSettings
                | Self::KeyDown
                | Self::KeyUp
                | Self::PropertyInspectorDidAppear
                | Self::PropertyInspectorDidDisappear
                | Self::SendToPlugin
                | Self::TitleParametersDidChange
                | Self::TouchTap
                | Self::WillAppear
                | Self::WillDisappear
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for EventKind {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Outbound command tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    GetGlobalSettings,
    GetSettings,
    LogMessage,
    OpenUrl,
    SendToPropertyInspector,
    SetFeedback,
    SetFeedbackLayout,
    SetGlobalSettings,
    SetImage,
    SetSettings,
    SetState,
    SetTitle,
    SetTriggerDescription,
    ShowAlert,
    ShowOk,
    SwitchToProfile,
}

impl CommandKind {
    /// The wire name of this command.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetGlobalSettings => "getGlobalSettings",
            Self::GetSettings => "getSettings",
            Self::LogMessage => "logMessage",
            Self::OpenUrl => "openUrl",
            Self::SendToPropertyInspector => "sendToPropertyInspector",
            Self::SetFeedback => "setFeedback",
            Self::SetFeedbackLayout => "setFeedbackLayout",
            Self::SetGlobalSettings => "setGlobalSettings",
            Self::SetImage => "setImage",
            Self::SetSettings => "setSettings",
            Self::SetState => "setState",
            Self::SetTitle => "setTitle",
            Self::SetTriggerDescription => "setTriggerDescription",
            Self::ShowAlert => "showAlert",
            Self::ShowOk => "showOk",
            Self::SwitchToProfile => "switchToProfile",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<CommandKind> for String {
    fn from(kind: CommandKind) -> Self {
        kind.as_str().to_string()
    }
}

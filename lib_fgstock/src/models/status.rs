use serde::{Deserialize, Serialize};
use std::fmt;

/// # Connection Status
///
/// The lifecycle state of the engine's link to its data source. Exactly one
/// value is current at any instant and only the engine's state machine moves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// No link; the generator is idle. Initial state.
    #[default]
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// Link established; the generator is emitting.
    Connected,
}

impl ConnectionStatus {
    /// Lowercase name as used on the wire and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

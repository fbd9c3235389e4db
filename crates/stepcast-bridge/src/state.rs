//! Recording state machine.

use std::fmt;

use stepcast_config::DeliveryPolicy;
use stepcast_protocols::BridgeStatus;

/// Combined connection and recording state of the bridge.
///
/// Recording while the link is down only exists as [`Suspended`], which is
/// reachable solely under [`DeliveryPolicy::Queue`].
///
/// [`Suspended`]: RecordingState::Suspended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingState {
    /// Link down, not recording.
    #[default]
    Offline,
    /// Link up, not recording.
    Idle,
    /// Link up, forwarding events. `since` is in epoch milliseconds.
    Recording { since: i64 },
    /// Link down with recording intent retained; events are queued.
    Suspended { since: i64 },
}

impl RecordingState {
    pub fn status(&self) -> BridgeStatus {
        BridgeStatus {
            connected: matches!(self, Self::Idle | Self::Recording { .. }),
            recording: matches!(self, Self::Recording { .. } | Self::Suspended { .. }),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.status().recording
    }

    /// The link came up.
    pub fn connected(self) -> Self {
        match self {
            Self::Offline => Self::Idle,
            Self::Suspended { since } => Self::Recording { since },
            other => other,
        }
    }

    /// The link went down.
    pub fn disconnected(self, policy: DeliveryPolicy) -> Self {
        match (self, policy) {
            (Self::Recording { since }, DeliveryPolicy::Queue { .. }) => Self::Suspended { since },
            (Self::Suspended { since }, _) => Self::Suspended { since },
            _ => Self::Offline,
        }
    }

    /// A user toggle at time `now`. Toggles without a live link are ignored,
    /// so a suspended session keeps its intent until the link returns.
    pub fn toggled(self, now: i64) -> Self {
        match self {
            Self::Idle => Self::Recording { since: now },
            Self::Recording { .. } => Self::Idle,
            other @ (Self::Offline | Self::Suspended { .. }) => other,
        }
    }
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Offline => "offline",
            Self::Idle => "idle",
            Self::Recording { .. } => "recording",
            Self::Suspended { .. } => "suspended",
        };
        f.write_str(s)
    }
}

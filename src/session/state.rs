/// Lifecycle of one relay session.
///
/// ```text
/// Connecting ──vendor open──▶ Open
///     │                        │
///     ├──transport closed──────┼──▶ Closing ──teardown──▶ Closed
///     │                        │
///     └──vendor closed─────────┴──────────────────────▶ Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl SessionState {
    /// Outbound frames are only written while the session is live.
    #[inline]
    pub fn accepts_outbound(self) -> bool {
        matches!(self, Self::Connecting | Self::Open)
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        self == Self::Closed
    }

    pub fn on_vendor_open(self) -> Self {
        match self {
            Self::Connecting => Self::Open,
            other => other,
        }
    }

    pub fn on_transport_closed(self) -> Self {
        match self {
            Self::Connecting | Self::Open => Self::Closing,
            other => other,
        }
    }

    pub fn on_vendor_closed(self) -> Self {
        match self {
            Self::Connecting | Self::Open => Self::Closed,
            other => other,
        }
    }

    pub fn on_teardown_complete(self) -> Self {
        match self {
            Self::Closing => Self::Closed,
            other => other,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::Closing => write!(f, "closing"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

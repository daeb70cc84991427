//! Session lifecycle states.

/// Lifecycle state of a session.
///
/// Transitions run strictly forward: `Created -> Started -> Closing ->
/// Closed`. Re-requesting teardown past `Closing` is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum SessionState {
    /// Transport open, pumps not yet running.
    #[default]
    Created,
    /// Both pumps running; messages flow only in this state.
    Started,
    /// A terminal condition was detected; teardown in progress.
    Closing,
    /// All resources released. Terminal.
    Closed,
}

impl SessionState {
    /// Check if the session still holds resources.
    #[must_use]
    #[inline]
    pub const fn is_active(&self) -> bool {
        !matches!(self, SessionState::Closed)
    }

    /// Check if messages can flow in this state.
    #[must_use]
    #[inline]
    pub const fn can_send(&self) -> bool {
        matches!(self, SessionState::Started)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Created => write!(f, "Created"),
            SessionState::Started => write!(f, "Started"),
            SessionState::Closing => write!(f, "Closing"),
            SessionState::Closed => write!(f, "Closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        assert_eq!(SessionState::default(), SessionState::Created);
    }

    #[test]
    fn test_can_send_in_each_state() {
        assert!(!SessionState::Created.can_send());
        assert!(SessionState::Started.can_send());
        assert!(!SessionState::Closing.can_send());
        assert!(!SessionState::Closed.can_send());
    }

    #[test]
    fn test_is_active() {
        assert!(SessionState::Created.is_active());
        assert!(SessionState::Started.is_active());
        assert!(SessionState::Closing.is_active());
        assert!(!SessionState::Closed.is_active());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Created.to_string(), "Created");
        assert_eq!(SessionState::Started.to_string(), "Started");
        assert_eq!(SessionState::Closing.to_string(), "Closing");
        assert_eq!(SessionState::Closed.to_string(), "Closed");
    }
}

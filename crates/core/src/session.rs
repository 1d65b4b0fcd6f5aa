//! Session status state machine.
//!
//! A session represents one concrete occurrence of a schedule slot on one
//! calendar day in one room. Status values map to the
//! `attendance_sessions.status` text column.

/// Session lifecycle status.
///
/// `Closed` is terminal: there is no transition out of it, and a closed
/// session blocks re-creation for the same (room, slot, day) occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    WaitingForTeacher,
    Active,
    Closed,
}

impl SessionStatus {
    /// Database column value for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::WaitingForTeacher => "waiting_for_teacher",
            SessionStatus::Active => "active",
            SessionStatus::Closed => "closed",
        }
    }

    /// Parse a database column value. Unknown values return `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "waiting_for_teacher" => Some(SessionStatus::WaitingForTeacher),
            "active" => Some(SessionStatus::Active),
            "closed" => Some(SessionStatus::Closed),
            _ => None,
        }
    }

    /// Returns the set of valid target statuses reachable from `self`.
    pub fn valid_transitions(self) -> &'static [SessionStatus] {
        match self {
            SessionStatus::WaitingForTeacher => &[SessionStatus::Active, SessionStatus::Closed],
            SessionStatus::Active => &[SessionStatus::Closed],
            SessionStatus::Closed => &[],
        }
    }

    /// Check whether a transition from `self` to `to` is valid.
    pub fn can_transition(self, to: SessionStatus) -> bool {
        self.valid_transitions().contains(&to)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::SessionStatus::*;

    #[test]
    fn waiting_to_active() {
        assert!(WaitingForTeacher.can_transition(Active));
    }

    #[test]
    fn waiting_to_closed() {
        assert!(WaitingForTeacher.can_transition(Closed));
    }

    #[test]
    fn active_to_closed() {
        assert!(Active.can_transition(Closed));
    }

    #[test]
    fn closed_is_terminal() {
        assert!(Closed.valid_transitions().is_empty());
        assert!(!Closed.can_transition(Active));
        assert!(!Closed.can_transition(WaitingForTeacher));
    }

    #[test]
    fn active_cannot_regress_to_waiting() {
        assert!(!Active.can_transition(WaitingForTeacher));
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [WaitingForTeacher, Active, Closed] {
            assert_eq!(super::SessionStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn unknown_status_is_none() {
        assert_eq!(super::SessionStatus::parse("paused"), None);
    }
}

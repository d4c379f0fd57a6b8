//! The mode gate (§4.4 "Mode gate"): transitions between normal and admin server
//! mode, gated on the count of scheduled operations reaching zero.

use crate::element::ScheduleId;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ServerMode {
    Normal,
    Admin,
}

/// Tracks the current mode and, while a transition to admin is parked, the id the
/// caller will see promoted once every scheduled operation has released.
pub struct ModeGate {
    mode: ServerMode,
    pending_admin: Option<ScheduleId>,
}

impl ModeGate {
    pub fn new() -> ModeGate {
        ModeGate { mode: ServerMode::Normal, pending_admin: None }
    }

    pub fn mode(&self) -> ServerMode {
        self.mode
    }

    /// True while a transition to admin is pending or already in effect; gates
    /// non-admin-permitted write requests per §4.4.
    pub fn admin_pending_or_effective(&self) -> bool {
        self.mode == ServerMode::Admin || self.pending_admin.is_some()
    }

    /// `to_normal` always succeeds immediately; any parked admin transition is
    /// dropped since it is superseded.
    pub fn to_normal(&mut self) {
        self.mode = ServerMode::Normal;
        self.pending_admin = None;
    }

    /// Requests a transition to admin. If `scheduled_count == 0` it applies at once
    /// and returns `None` (nothing to wait on); otherwise it parks on `id` and
    /// returns `Some(id)`, to be promoted later by `try_complete`.
    pub fn request_admin(&mut self, id: ScheduleId, scheduled_count: usize) -> Option<ScheduleId> {
        if scheduled_count == 0 {
            self.mode = ServerMode::Admin;
            None
        } else {
            self.pending_admin = Some(id);
            Some(id)
        }
    }

    /// Called after every `release`: if a transition is parked and the count has
    /// now reached zero, completes it and returns the id that was waiting.
    pub fn try_complete(&mut self, scheduled_count: usize) -> Option<ScheduleId> {
        if scheduled_count == 0 {
            if let Some(id) = self.pending_admin.take() {
                self.mode = ServerMode::Admin;
                return Some(id);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_transition_applies_immediately_when_idle() {
        let mut gate = ModeGate::new();
        assert!(gate.request_admin(ScheduleId(1), 0).is_none());
        assert_eq!(gate.mode(), ServerMode::Admin);
    }

    #[test]
    fn admin_transition_parks_until_count_reaches_zero() {
        let mut gate = ModeGate::new();
        assert_eq!(gate.request_admin(ScheduleId(1), 3), Some(ScheduleId(1)));
        assert_eq!(gate.mode(), ServerMode::Normal);
        assert!(gate.admin_pending_or_effective());

        assert!(gate.try_complete(1).is_none());
        assert_eq!(gate.try_complete(0), Some(ScheduleId(1)));
        assert_eq!(gate.mode(), ServerMode::Admin);
    }
}

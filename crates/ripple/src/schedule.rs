/// Handle for one scheduled frame cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameToken {
    id: u64,
}

impl FrameToken {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Tracks the single outstanding "next frame" request.
///
/// The host delivers the refresh signal asynchronously (a redraw event), so a
/// request issued before a cancellation can still arrive afterwards. Every
/// request gets a fresh token and only the most recent, uncancelled token is
/// honoured.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    next_id: u64,
    pending: Option<FrameToken>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a token for the next cycle, superseding any earlier one.
    pub fn schedule(&mut self) -> FrameToken {
        let token = FrameToken { id: self.next_id };
        self.next_id = self.next_id.wrapping_add(1);
        self.pending = Some(token);
        token
    }

    /// Revokes the outstanding request, if any.
    pub fn cancel(&mut self) -> Option<FrameToken> {
        self.pending.take()
    }

    /// Consumes `token` if it is the outstanding request.
    pub fn claim(&mut self, token: FrameToken) -> bool {
        if self.pending == Some(token) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn pending(&self) -> Option<FrameToken> {
        self.pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_token_is_rejected() {
        let mut scheduler = FrameScheduler::new();
        let token = scheduler.schedule();
        assert_eq!(scheduler.cancel(), Some(token));
        assert!(!scheduler.claim(token));
    }

    #[test]
    fn superseded_token_is_rejected() {
        let mut scheduler = FrameScheduler::new();
        let stale = scheduler.schedule();
        let fresh = scheduler.schedule();
        assert!(!scheduler.claim(stale));
        assert!(scheduler.claim(fresh));
        assert!(!scheduler.is_pending());
    }
}

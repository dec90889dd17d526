/// Coalesces redraw requests into at most one draw per animation frame.
///
/// Mutations call [`request`](Self::request); the host's frame callback calls
/// [`take_pending`](Self::take_pending) and draws only when it returns true.
#[derive(Debug, Clone, Default)]
pub struct RedrawScheduler {
    pending: bool,
    requested: u64,
    drawn: u64,
}

impl RedrawScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the preview dirty. Returns true if this request scheduled a new
    /// frame (the host should call `requestAnimationFrame`), false if one was
    /// already pending.
    pub fn request(&mut self) -> bool {
        self.requested += 1;
        let first = !self.pending;
        self.pending = true;
        first
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Consume the pending flag.
    pub fn take_pending(&mut self) -> bool {
        if self.pending {
            self.pending = false;
            self.drawn += 1;
            true
        } else {
            false
        }
    }

    /// Drop a pending request without drawing.
    pub fn cancel(&mut self) {
        self.pending = false;
    }

    /// Requests received so far.
    pub fn requests(&self) -> u64 {
        self.requested
    }

    /// Frames actually drawn.
    pub fn frames(&self) -> u64 {
        self.drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_coalesce() {
        let mut sched = RedrawScheduler::new();
        assert!(!sched.take_pending());

        assert!(sched.request());
        assert!(!sched.request());
        assert!(!sched.request());
        assert!(sched.is_pending());

        assert!(sched.take_pending());
        assert!(!sched.take_pending());
        assert_eq!(sched.requests(), 3);
        assert_eq!(sched.frames(), 1);
    }

    #[test]
    fn test_request_after_frame_schedules_again() {
        let mut sched = RedrawScheduler::new();
        sched.request();
        sched.take_pending();
        assert!(sched.request());
        assert!(sched.take_pending());
        assert_eq!(sched.frames(), 2);
    }

    #[test]
    fn test_cancel() {
        let mut sched = RedrawScheduler::new();
        sched.request();
        sched.cancel();
        assert!(!sched.take_pending());
        assert_eq!(sched.frames(), 0);
    }
}

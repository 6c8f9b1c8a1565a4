use std::time::{Duration, Instant};

/// How long the "Call ended" card stays up before returning to the friends
/// list.
pub const END_NAVIGATE_DELAY: Duration = Duration::from_millis(800);

/// Purely local simulated call: an elapsed-time counter plus mute/video
/// toggles. No media or network I/O happens here. Methods take `now` so the
/// machine can be driven without real sleeps.
#[derive(Debug)]
pub struct CallSession {
    peer: String,
    started: Instant,
    muted: bool,
    video_enabled: bool,
    ended: Option<Ended>,
}

#[derive(Debug)]
struct Ended {
    at: Instant,
    elapsed_secs: u64,
}

impl CallSession {
    pub fn start(peer: &str, now: Instant) -> Self {
        Self {
            peer: peer.to_string(),
            started: now,
            muted: false,
            video_enabled: true,
            ended: None,
        }
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn video_enabled(&self) -> bool {
        self.video_enabled
    }

    pub fn is_ended(&self) -> bool {
        self.ended.is_some()
    }

    /// Seconds in call, frozen at its last value once the call has ended.
    pub fn elapsed_secs(&self, now: Instant) -> u64 {
        match &self.ended {
            Some(ended) => ended.elapsed_secs,
            None => now.duration_since(self.started).as_secs(),
        }
    }

    pub fn toggle_mute(&mut self) {
        if self.ended.is_none() {
            self.muted = !self.muted;
        }
    }

    pub fn toggle_video(&mut self) {
        if self.ended.is_none() {
            self.video_enabled = !self.video_enabled;
        }
    }

    pub fn end(&mut self, now: Instant) {
        if self.ended.is_none() {
            self.ended = Some(Ended {
                at: now,
                elapsed_secs: now.duration_since(self.started).as_secs(),
            });
        }
    }

    /// True once the post-end delay has elapsed and the app should navigate
    /// back to the friends list.
    pub fn should_return(&self, now: Instant) -> bool {
        match &self.ended {
            Some(ended) => now.duration_since(ended.at) >= END_NAVIGATE_DELAY,
            None => false,
        }
    }
}

/// mm:ss, minutes uncapped.
pub fn format_elapsed(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_tracks_wall_time_at_one_second_resolution() {
        let start = Instant::now();
        let call = CallSession::start("alice", start);
        assert_eq!(call.elapsed_secs(start), 0);
        assert_eq!(call.elapsed_secs(start + Duration::from_millis(1500)), 1);
        assert_eq!(call.elapsed_secs(start + Duration::from_secs(95)), 95);
    }

    #[test]
    fn ending_freezes_the_counter() {
        let start = Instant::now();
        let mut call = CallSession::start("alice", start);
        call.end(start + Duration::from_secs(42));
        assert!(call.is_ended());
        assert_eq!(call.elapsed_secs(start + Duration::from_secs(600)), 42);
    }

    #[test]
    fn navigation_back_happens_after_the_fixed_delay() {
        let start = Instant::now();
        let mut call = CallSession::start("alice", start);
        assert!(!call.should_return(start + Duration::from_secs(10)));

        let end = start + Duration::from_secs(10);
        call.end(end);
        assert!(!call.should_return(end + Duration::from_millis(799)));
        assert!(call.should_return(end + END_NAVIGATE_DELAY));
    }

    #[test]
    fn toggles_are_local_and_locked_after_end() {
        let start = Instant::now();
        let mut call = CallSession::start("alice", start);
        assert!(!call.muted());
        assert!(call.video_enabled());

        call.toggle_mute();
        call.toggle_video();
        assert!(call.muted());
        assert!(!call.video_enabled());

        call.end(start + Duration::from_secs(1));
        call.toggle_mute();
        call.toggle_video();
        assert!(call.muted());
        assert!(!call.video_enabled());
    }

    #[test]
    fn ending_twice_keeps_the_first_freeze() {
        let start = Instant::now();
        let mut call = CallSession::start("alice", start);
        call.end(start + Duration::from_secs(5));
        call.end(start + Duration::from_secs(50));
        assert_eq!(call.elapsed_secs(start + Duration::from_secs(60)), 5);
    }

    #[test]
    fn elapsed_formats_as_minutes_and_seconds() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(61), "01:01");
        assert_eq!(format_elapsed(3725), "62:05");
    }
}

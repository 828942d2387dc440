use std::time::Instant;

const PUBLISH_INTERVAL_SECS: f32 = 1.0;

/// Internal frame pacing state. See [`FrameData`] for the published snapshot.
pub struct FrameTimer {
    last_sample: Instant,
    frame_start: Instant,
    last_publish: Instant,
    frame_count: u32,
    accumulated: f32,
}

/// Published frame statistics.
///
/// `delta_time` is rewritten on every [`FrameTimer::end`]; `avg_fps` and
/// `avg_frame_time` hold their previous value between once-per-second
/// publishes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameData {
    pub delta_time: f32,
    pub avg_fps: f32,
    pub avg_frame_time: f32,
}

impl FrameTimer {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_sample: now,
            frame_start: now,
            last_publish: now,
            frame_count: 0,
            accumulated: 0.0,
        }
    }

    /// Mark the start of graphics submission for the current frame.
    pub fn begin(&mut self) {
        self.begin_at(Instant::now());
    }

    pub fn begin_at(&mut self, now: Instant) {
        self.frame_start = now;
    }

    /// Time spent inside the current frame so far.
    pub fn frame_elapsed(&self) -> f32 {
        self.frame_start.elapsed().as_secs_f32()
    }

    /// Close the frame: refresh `delta_time` and, at most once per second,
    /// publish the smoothed averages. Returns whether a publish happened.
    pub fn end(&mut self, data: &mut FrameData) -> bool {
        self.end_at(Instant::now(), data)
    }

    /// Timestamp-injectable form of [`FrameTimer::end`].
    pub fn end_at(&mut self, now: Instant, data: &mut FrameData) -> bool {
        data.delta_time = now.duration_since(self.last_sample).as_secs_f32();
        self.last_sample = now;

        self.frame_count += 1;
        self.accumulated += data.delta_time;

        let since_publish = now.duration_since(self.last_publish).as_secs_f32();
        if since_publish >= PUBLISH_INTERVAL_SECS {
            data.avg_fps = self.frame_count as f32 / since_publish;
            data.avg_frame_time = (self.accumulated / self.frame_count as f32) * 1000.0;

            self.frame_count = 0;
            self.accumulated = 0.0;
            self.last_publish = now;
            return true;
        }

        false
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(base: Instant, frame: u32, fps: f64) -> Instant {
        base + Duration::from_secs_f64(frame as f64 / fps)
    }

    #[test]
    fn delta_time_tracks_each_frame() {
        let mut timer = FrameTimer::new();
        let mut data = FrameData::default();
        let base = Instant::now();

        timer.end_at(base + Duration::from_millis(16), &mut data);
        let first = data.delta_time;
        timer.end_at(base + Duration::from_millis(48), &mut data);
        assert!((data.delta_time - 0.032).abs() < 1e-3);
        assert!(data.delta_time > first);
    }

    #[test]
    fn fps_publishes_twice_over_two_seconds_at_sixty_hz() {
        let mut timer = FrameTimer::new();
        let mut data = FrameData::default();
        let base = Instant::now();

        let mut publishes = Vec::new();
        for frame in 1..=120 {
            if timer.end_at(at(base, frame, 60.0), &mut data) {
                publishes.push((frame, data.avg_fps, data.avg_frame_time));
            }
        }

        assert_eq!(publishes.len(), 2, "publishes: {publishes:?}");
        assert_eq!(publishes[0].0, 60);
        assert_eq!(publishes[1].0, 120);
        for (_, fps, frame_time) in &publishes {
            assert!((fps - 60.0).abs() < 0.5, "avg_fps was {fps}");
            assert!((frame_time - 1000.0 / 60.0).abs() < 0.5, "avg_frame_time was {frame_time}");
        }
    }

    #[test]
    fn averages_hold_between_publishes() {
        let mut timer = FrameTimer::new();
        let mut data = FrameData::default();
        let base = Instant::now();

        for frame in 1..=60 {
            timer.end_at(at(base, frame, 60.0), &mut data);
        }
        let published_fps = data.avg_fps;
        assert!(published_fps > 0.0);

        for frame in 61..=90 {
            let published = timer.end_at(at(base, frame, 60.0), &mut data);
            assert!(!published);
            assert_eq!(data.avg_fps, published_fps);
        }
    }

    #[test]
    fn delta_is_fresh_even_without_publish() {
        let mut timer = FrameTimer::new();
        let mut data = FrameData::default();
        let base = Instant::now();

        let published = timer.end_at(base + Duration::from_millis(5), &mut data);
        assert!(!published);
        assert!((data.delta_time - 0.005).abs() < 1e-3);
        assert_eq!(data.avg_fps, 0.0, "no publish yet, snapshot keeps its default");
    }
}

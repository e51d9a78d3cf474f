use std::time::Duration;

use tokio::time::Instant;

/// Countdown values published on every timer tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerReading {
    /// Milliseconds since the board step began.
    pub elapsed_ms: u64,
    /// Milliseconds left before the cap, never negative.
    pub remaining_ms: u64,
    /// `remaining / cap`, within `[0, 1]`.
    pub ratio: f64,
    /// Remaining time as `MM:SS`.
    pub label: String,
}

impl TimerReading {
    /// Compute the reading for `elapsed` against the round cap.
    pub fn at(elapsed: Duration, cap: Duration) -> Self {
        let remaining = cap.saturating_sub(elapsed);
        let ratio = if cap.is_zero() {
            0.0
        } else {
            (remaining.as_secs_f64() / cap.as_secs_f64()).clamp(0.0, 1.0)
        };

        Self {
            elapsed_ms: duration_ms(elapsed),
            remaining_ms: duration_ms(remaining),
            ratio,
            label: format_remaining(remaining),
        }
    }
}

/// Format a remaining duration as zero-padded `MM:SS`, counting partial seconds as whole ones.
pub fn format_remaining(remaining: Duration) -> String {
    let total_seconds = duration_ms(remaining).div_ceil(1000);
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes:02}:{seconds:02}")
}

/// Start instant of a round's board step.
#[derive(Debug, Clone, Copy)]
pub struct RoundClock {
    started_at: Instant,
    cap: Duration,
}

impl RoundClock {
    /// Capture the start instant now.
    pub fn start(cap: Duration) -> Self {
        Self {
            started_at: Instant::now(),
            cap,
        }
    }

    /// Time elapsed since the start.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Reading for the current instant.
    pub fn reading(&self) -> TimerReading {
        TimerReading::at(self.elapsed(), self.cap)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAP: Duration = Duration::from_secs(180);

    #[test]
    fn full_time_at_start() {
        let reading = TimerReading::at(Duration::ZERO, CAP);
        assert_eq!(reading.label, "03:00");
        assert_eq!(reading.ratio, 1.0);
        assert_eq!(reading.remaining_ms, 180_000);
    }

    #[test]
    fn partial_seconds_round_up() {
        let reading = TimerReading::at(Duration::from_millis(400), CAP);
        assert_eq!(reading.label, "03:00");

        let reading = TimerReading::at(Duration::from_millis(1_000), CAP);
        assert_eq!(reading.label, "02:59");

        let reading = TimerReading::at(Duration::from_millis(120_500), CAP);
        assert_eq!(reading.label, "01:00");
    }

    #[test]
    fn minutes_and_seconds_are_padded() {
        assert_eq!(format_remaining(Duration::from_secs(65)), "01:05");
        assert_eq!(format_remaining(Duration::from_secs(9)), "00:09");
        assert_eq!(format_remaining(Duration::from_secs(600)), "10:00");
    }

    #[test]
    fn past_cap_clamps_to_zero() {
        let reading = TimerReading::at(Duration::from_secs(200), CAP);
        assert_eq!(reading.remaining_ms, 0);
        assert_eq!(reading.ratio, 0.0);
        assert_eq!(reading.label, "00:00");
        assert_eq!(reading.elapsed_ms, 200_000);
    }

    #[test]
    fn ratio_is_linear() {
        let reading = TimerReading::at(Duration::from_secs(45), CAP);
        assert!((reading.ratio - 0.75).abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn clock_follows_runtime_time() {
        let clock = RoundClock::start(CAP);
        tokio::time::advance(Duration::from_secs(30)).await;
        let reading = clock.reading();
        assert_eq!(reading.elapsed_ms, 30_000);
        assert_eq!(reading.label, "02:30");
    }
}

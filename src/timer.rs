//! Pomodoro countdown.
//!
//! [`Timer`] only holds the remaining time and whether it is running; the
//! caller decides when a second has passed and calls [`Timer::tick`].
//! Presentation hooks go through [`TimerEvents`].

mod terminal;

pub(crate) use terminal::run;

pub(crate) const DEFAULT_MINUTES: u32 = 25;

/// Hooks fired on every state change. All default to doing nothing.
pub(crate) trait TimerEvents {
    fn on_start(&mut self, _timer: &Timer) {}
    fn on_pause(&mut self, _timer: &Timer) {}
    fn on_reset(&mut self, _timer: &Timer) {}
    fn on_tick(&mut self, _timer: &Timer) {}
    fn on_complete(&mut self, _timer: &Timer) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tick {
    /// Not running; nothing changed.
    Idle,
    Counting,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Timer {
    minutes: u32,
    seconds: u32,
    running: bool,
    session_minutes: u32,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new(DEFAULT_MINUTES)
    }
}

impl Timer {
    pub fn new(session_minutes: u32) -> Self {
        Self {
            minutes: session_minutes,
            seconds: 0,
            running: false,
            session_minutes,
        }
    }

    /// `(minutes, seconds, running)`
    #[cfg(test)]
    pub fn state(&self) -> (u32, u32, bool) {
        (self.minutes, self.seconds, self.running)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.minutes, self.seconds)
    }

    /// Returns `false` when the timer was already running.
    pub fn start(&mut self, events: &mut impl TimerEvents) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        events.on_start(self);
        true
    }

    pub fn pause(&mut self, events: &mut impl TimerEvents) {
        self.running = false;
        events.on_pause(self);
    }

    pub fn reset(&mut self, events: &mut impl TimerEvents) {
        self.running = false;
        self.minutes = self.session_minutes;
        self.seconds = 0;
        events.on_reset(self);
    }

    /// Advance one second. Reaching 00:00 stops the timer and fires completion.
    pub fn tick(&mut self, events: &mut impl TimerEvents) -> Tick {
        if !self.running {
            return Tick::Idle;
        }
        if self.seconds > 0 {
            self.seconds -= 1;
        } else if self.minutes > 0 {
            self.minutes -= 1;
            self.seconds = 59;
        }

        if self.minutes == 0 && self.seconds == 0 {
            self.running = false;
            events.on_tick(self);
            events.on_complete(self);
            return Tick::Completed;
        }
        events.on_tick(self);
        Tick::Counting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        log: Vec<String>,
    }

    impl TimerEvents for Recorder {
        fn on_start(&mut self, t: &Timer) {
            self.log.push(format!("start {}", t.display()));
        }
        fn on_pause(&mut self, t: &Timer) {
            self.log.push(format!("pause {}", t.display()));
        }
        fn on_reset(&mut self, t: &Timer) {
            self.log.push(format!("reset {}", t.display()));
        }
        fn on_complete(&mut self, t: &Timer) {
            self.log.push(format!("complete {}", t.display()));
        }
    }

    struct Silent;
    impl TimerEvents for Silent {}

    #[test]
    fn starts_at_twenty_five_minutes_idle() {
        let timer = Timer::default();
        assert_eq!(timer.state(), (25, 0, false));
        assert_eq!(timer.display(), "25:00");
    }

    #[test]
    fn tick_borrows_a_minute_when_seconds_run_out() {
        let mut timer = Timer::default();
        timer.start(&mut Silent);
        assert_eq!(timer.tick(&mut Silent), Tick::Counting);
        assert_eq!(timer.state(), (24, 59, true));
        assert_eq!(timer.display(), "24:59");
    }

    #[test]
    fn full_session_completes_after_1500_ticks() {
        let mut timer = Timer::default();
        let mut rec = Recorder::default();
        timer.start(&mut rec);
        for _ in 0..1499 {
            assert_eq!(timer.tick(&mut rec), Tick::Counting);
        }
        assert_eq!(timer.display(), "00:01");
        assert_eq!(timer.tick(&mut rec), Tick::Completed);
        assert_eq!(timer.state(), (0, 0, false));
        assert_eq!(rec.log, vec!["start 25:00", "complete 00:00"]);
        assert_eq!(timer.tick(&mut rec), Tick::Idle);
    }

    #[test]
    fn start_while_running_is_a_no_op() {
        let mut timer = Timer::default();
        let mut rec = Recorder::default();
        assert!(timer.start(&mut rec));
        assert!(!timer.start(&mut rec));
        assert_eq!(rec.log.len(), 1);
    }

    #[test]
    fn pause_keeps_remaining_time() {
        let mut timer = Timer::default();
        timer.start(&mut Silent);
        for _ in 0..61 {
            timer.tick(&mut Silent);
        }
        timer.pause(&mut Silent);
        assert_eq!(timer.state(), (23, 59, false));
        assert_eq!(timer.tick(&mut Silent), Tick::Idle);
        assert_eq!(timer.state(), (23, 59, false));
    }

    #[test]
    fn pause_then_reset_always_restores_full_session() {
        for ticks in [0, 1, 59, 60, 900, 1500] {
            let mut timer = Timer::default();
            timer.start(&mut Silent);
            for _ in 0..ticks {
                timer.tick(&mut Silent);
            }
            timer.pause(&mut Silent);
            timer.reset(&mut Silent);
            assert_eq!(timer.state(), (25, 0, false), "after {ticks} ticks");
        }
    }

    #[test]
    fn restart_at_zero_completes_on_next_tick() {
        let mut timer = Timer::new(0);
        let mut rec = Recorder::default();
        timer.start(&mut rec);
        assert_eq!(timer.tick(&mut rec), Tick::Completed);
        assert_eq!(rec.log.last().map(String::as_str), Some("complete 00:00"));
    }

    #[test]
    fn custom_session_length_resets_to_itself() {
        let mut timer = Timer::new(5);
        timer.start(&mut Silent);
        timer.tick(&mut Silent);
        timer.reset(&mut Silent);
        assert_eq!(timer.state(), (5, 0, false));
    }
}

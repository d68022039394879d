use std::{
    io::{self, BufRead, Write},
    sync::mpsc::{self, Receiver, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use log::{debug, info};

use super::{Tick, Timer, TimerEvents};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Command {
    Start,
    Pause,
    Reset,
    Quit,
}

pub(super) fn parse_command(line: &str) -> Option<Command> {
    match line.trim().to_lowercase().as_str() {
        "s" | "start" => Some(Command::Start),
        "p" | "pause" => Some(Command::Pause),
        "r" | "reset" => Some(Command::Reset),
        "q" | "quit" | "exit" => Some(Command::Quit),
        _ => None,
    }
}

/// Redraws the countdown in place and keeps the terminal title in sync.
pub(super) struct TerminalEvents<W: Write> {
    out: W,
}

impl<W: Write> TerminalEvents<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn draw(&mut self, timer: &Timer, status: &str) {
        let display = timer.display();
        let _ = write!(
            self.out,
            "\x1b]0;{display} - Pomodoro\x07\r{display}  {status:<8}"
        );
        let _ = self.out.flush();
    }
}

impl<W: Write> TimerEvents for TerminalEvents<W> {
    fn on_start(&mut self, timer: &Timer) {
        self.draw(timer, "running");
    }

    fn on_pause(&mut self, timer: &Timer) {
        self.draw(timer, "paused");
    }

    fn on_reset(&mut self, timer: &Timer) {
        self.draw(timer, "reset");
    }

    fn on_tick(&mut self, timer: &Timer) {
        self.draw(timer, "running");
    }

    fn on_complete(&mut self, timer: &Timer) {
        self.draw(timer, "done");
        let _ = writeln!(self.out, "\x07\nTime's up! Take a break.");
        let _ = self.out.flush();
        info!("Pomodoro session complete");
    }
}

/// Feed ticks and commands into `timer` until it completes, the operator
/// quits, or input ends while the timer is stopped.
pub(super) fn drive(
    timer: &mut Timer,
    events: &mut impl TimerEvents,
    commands: Receiver<Command>,
    autostart: bool,
    period: Duration,
) {
    let mut next_tick = Instant::now() + period;
    if autostart {
        timer.start(events);
    } else {
        events.on_reset(timer);
    }

    loop {
        let command = if timer.is_running() {
            let wait = next_tick.saturating_duration_since(Instant::now());
            match commands.recv_timeout(wait) {
                Ok(command) => Some(command),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => {
                    thread::sleep(wait);
                    None
                }
            }
        } else {
            match commands.recv() {
                Ok(command) => Some(command),
                Err(_) => return,
            }
        };

        debug!("timer command: {command:?}");
        match command {
            None => {
                next_tick += period;
                if timer.tick(events) == Tick::Completed {
                    return;
                }
            }
            Some(Command::Start) => {
                if timer.start(events) {
                    next_tick = Instant::now() + period;
                }
            }
            Some(Command::Pause) => timer.pause(events),
            Some(Command::Reset) => timer.reset(events),
            Some(Command::Quit) => return,
        }
    }
}

pub(crate) fn run(minutes: u32, autostart: bool) -> anyhow::Result<()> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if let Some(command) = parse_command(&line) {
                if tx.send(command).is_err() {
                    break;
                }
            }
        }
    });

    println!("Commands: [s]tart, [p]ause, [r]eset, [q]uit (then Enter)");
    let mut timer = Timer::new(minutes);
    let mut events = TerminalEvents::new(io::stdout());
    drive(&mut timer, &mut events, rx, autostart, Duration::from_secs(1));
    println!();
    Ok(())
}

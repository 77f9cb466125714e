//! Countdown to the hackathon deadline and the pomodoro timer. Neither is
//! tied to a page; both keep running across navigation.

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};
use crate::store::{keys, LocalStore};

// ── Countdown ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    /// Unix millis
    pub deadline: i64,
    pub name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Remaining {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    /// Under one hour left.
    pub urgent: bool,
}

const DAY_MS: i64 = 86_400_000;
const HOUR_MS: i64 = 3_600_000;

impl Countdown {
    /// Time left at `now_ms`; `None` once the deadline has passed.
    pub fn remaining(&self, now_ms: i64) -> Option<Remaining> {
        let diff = self.deadline - now_ms;
        if diff <= 0 {
            return None;
        }
        Some(Remaining {
            days: diff / DAY_MS,
            hours: (diff % DAY_MS) / HOUR_MS,
            minutes: (diff % HOUR_MS) / 60_000,
            seconds: (diff % 60_000) / 1000,
            urgent: diff < HOUR_MS,
        })
    }
}

pub fn countdown(store: &LocalStore) -> Option<Countdown> {
    store.get_json(keys::COUNTDOWN)
}

pub fn set_countdown(store: &LocalStore, deadline_ms: i64, name: &str, now_ms: i64) -> Result<Countdown> {
    if deadline_ms <= now_ms {
        return Err(ClientError::validation("The deadline must be in the future"));
    }
    let name = match name.trim() {
        "" => "Hackathon",
        n => n,
    };
    let countdown = Countdown {
        deadline: deadline_ms,
        name: name.to_string(),
    };
    store.set_json(keys::COUNTDOWN, &countdown)?;
    Ok(countdown)
}

pub fn clear_countdown(store: &LocalStore) -> Result<()> {
    store.remove(keys::COUNTDOWN)
}

// ── Pomodoro ────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

/// Phase lengths in minutes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PomodoroDurations {
    pub work: u32,
    pub short_break: u32,
    pub long_break: u32,
}

impl Default for PomodoroDurations {
    fn default() -> Self {
        Self {
            work: 25,
            short_break: 5,
            long_break: 15,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Pomodoro {
    durations: PomodoroDurations,
    phase: Phase,
    left_secs: u32,
    cycles: u32,
    running: bool,
}

impl Default for Pomodoro {
    fn default() -> Self {
        Self::new(PomodoroDurations::default())
    }
}

impl Pomodoro {
    pub fn new(durations: PomodoroDurations) -> Self {
        Self {
            durations,
            phase: Phase::Work,
            left_secs: durations.work * 60,
            cycles: 0,
            running: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn left_secs(&self) -> u32 {
        self.left_secs
    }

    /// `MM:SS`
    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.left_secs / 60, self.left_secs % 60)
    }

    /// Share of the current phase still left, 0.0..=1.0.
    pub fn progress(&self) -> f64 {
        let total = self.phase_minutes(self.phase) * 60;
        if total == 0 {
            return 0.0;
        }
        self.left_secs as f64 / total as f64
    }

    /// Start/pause.
    pub fn toggle(&mut self) {
        self.running = !self.running;
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.phase = Phase::Work;
        self.left_secs = self.durations.work * 60;
    }

    /// Change the work length; applies immediately if a paused work phase
    /// is showing.
    pub fn set_work_minutes(&mut self, minutes: u32) {
        self.durations.work = minutes;
        if self.phase == Phase::Work && !self.running {
            self.left_secs = minutes * 60;
        }
    }

    /// One-second tick. Returns the new phase when the current one ends;
    /// the timer then pauses until toggled again.
    pub fn tick(&mut self) -> Option<Phase> {
        if !self.running {
            return None;
        }
        self.left_secs = self.left_secs.saturating_sub(1);
        if self.left_secs > 0 {
            return None;
        }
        self.running = false;
        self.phase = match self.phase {
            Phase::Work => {
                self.cycles += 1;
                if self.cycles % 4 == 0 {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                }
            }
            Phase::ShortBreak | Phase::LongBreak => Phase::Work,
        };
        self.left_secs = self.phase_minutes(self.phase) * 60;
        Some(self.phase)
    }

    fn phase_minutes(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.durations.work,
            Phase::ShortBreak => self.durations.short_break,
            Phase::LongBreak => self.durations.long_break,
        }
    }
}

//! The quiz session state machine.
//!
//! Pure and event-driven: transitions happen on user events (`select`,
//! `confirm`, `advance`) and on the 1-second heartbeat (`tick`). The machine
//! performs no IO and owns no timers; a driver delivers events and renders
//! the [`SessionView`] snapshot after each one.

use chrono::{DateTime, Utc};

use ritual_core::Clock;
use ritual_core::model::{
    AnswerStatus, DisplayShuffle, Question, RecordedAnswer, ScoreReport,
};
use ritual_core::time::{Countdown, CountdownState, Stopwatch};

use crate::error::SessionStateError;

/// Number of questions in a full ritual.
pub const SESSION_LENGTH: usize = 15;

/// Answer window per question, in seconds.
pub const ANSWER_SECONDS: u32 = 60;

/// Explanation (reading) window per question, in seconds.
pub const READING_SECONDS: u32 = 60;

/// Fixed 0-based positions flagged as signature questions. The flag drives a
/// cosmetic/haptic cue only; scoring and timing are unaffected.
pub const SIGNATURE_POSITIONS: [usize; 3] = [2, 7, 12];

#[must_use]
pub fn is_signature_position(position: usize) -> bool {
    SIGNATURE_POSITIONS.contains(&position)
}

//
// ─── PHASES AND COUNTDOWNS ─────────────────────────────────────────────────────
//

/// Lifecycle phase of the live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// A question is shown; the answer countdown is running.
    Presenting,
    /// The question resolved; the explanation is shown under the reading
    /// countdown.
    Reading,
    /// All questions resolved; the score report is available.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownKind {
    Answer,
    Reading,
}

/// Single slot holding whichever countdown is live.
///
/// Owning at most one countdown makes the answer/reading mutual exclusion a
/// structural property: starting one replaces the other.
#[derive(Debug, Clone, Copy, Default)]
struct CountdownSlot {
    active: Option<(CountdownKind, Countdown)>,
}

impl CountdownSlot {
    fn start(&mut self, kind: CountdownKind, seconds: u32) {
        self.active = Some((kind, Countdown::new(seconds)));
    }

    fn cancel(&mut self) {
        self.active = None;
    }

    /// Decrements the live countdown; returns its kind when it expires.
    fn tick(&mut self) -> Option<CountdownKind> {
        let (kind, countdown) = self.active.as_mut()?;
        match countdown.tick() {
            CountdownState::Running => None,
            CountdownState::Expired => {
                let kind = *kind;
                self.active = None;
                Some(kind)
            }
        }
    }

    fn remaining(&self) -> Option<(CountdownKind, u32)> {
        self.active
            .map(|(kind, countdown)| (kind, countdown.remaining()))
    }
}

/// A provisional selection: the display position the user tapped and the
/// canonical option index behind it. Not committed until resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub display_index: usize,
    pub canonical_index: usize,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// The single live session instance.
///
/// Owns the question set, the append-only answer log, and (once finished)
/// the score report. Nothing outside the machine mutates any of it.
#[derive(Debug)]
pub struct RitualSession {
    questions: Vec<Question>,
    cursor: usize,
    phase: SessionPhase,
    shuffle: DisplayShuffle,
    selection: Option<Selection>,
    log: Vec<RecordedAnswer>,
    correct_count: u32,
    countdown: CountdownSlot,
    stopwatch: Stopwatch,
    started_at: DateTime<Utc>,
    report: Option<ScoreReport>,
}

impl RitualSession {
    /// Starts a session over an already-validated question set and enters
    /// `Presenting(0)` with a fresh shuffle and a running answer countdown.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::Empty` if no questions are provided.
    pub fn start(questions: Vec<Question>, clock: &Clock) -> Result<Self, SessionStateError> {
        if questions.is_empty() {
            return Err(SessionStateError::Empty);
        }

        let mut countdown = CountdownSlot::default();
        countdown.start(CountdownKind::Answer, ANSWER_SECONDS);

        Ok(Self {
            questions,
            cursor: 0,
            phase: SessionPhase::Presenting,
            shuffle: DisplayShuffle::draw(),
            selection: None,
            log: Vec::new(),
            correct_count: 0,
            countdown,
            stopwatch: Stopwatch::start(),
            started_at: clock.now(),
            report: None,
        })
    }

    /// Selects the option at a display position, replacing any prior
    /// selection for this question.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::Locked` outside the answer window and
    /// `SessionStateError::InvalidOption` for a bad display index.
    pub fn select(&mut self, display_index: usize) -> Result<Selection, SessionStateError> {
        if self.phase != SessionPhase::Presenting {
            return Err(SessionStateError::Locked);
        }
        let canonical_index = self
            .shuffle
            .canonical_at(display_index)
            .ok_or(SessionStateError::InvalidOption {
                index: display_index,
            })?;

        let selection = Selection {
            display_index,
            canonical_index,
        };
        self.selection = Some(selection);
        Ok(selection)
    }

    /// Commits the current selection, resolving the question. A no-op when
    /// nothing is selected or the question is already resolved; returns
    /// whether a resolution happened.
    pub fn confirm(&mut self) -> bool {
        if self.phase != SessionPhase::Presenting || self.selection.is_none() {
            return false;
        }
        self.resolve();
        true
    }

    /// Delivers one second of wall-clock time: advances the elapsed sampler
    /// and the live countdown, firing the timeout transitions.
    pub fn tick(&mut self) {
        if self.phase == SessionPhase::Finished {
            return;
        }
        self.stopwatch.tick();

        match self.countdown.tick() {
            // Answer window ran out: auto-resolve, with the pending
            // selection if one exists, as a timeout otherwise.
            Some(CountdownKind::Answer) => self.resolve(),
            Some(CountdownKind::Reading) => self.advance(),
            None => {}
        }
    }

    /// Leaves the explanation: re-enters `Presenting` on the next question,
    /// or finishes the session after the last one. A no-op outside the
    /// reading window.
    pub fn advance(&mut self) {
        if self.phase != SessionPhase::Reading {
            return;
        }

        if self.cursor + 1 < self.questions.len() {
            self.cursor += 1;
            self.selection = None;
            self.shuffle = DisplayShuffle::draw();
            self.phase = SessionPhase::Presenting;
            self.countdown.start(CountdownKind::Answer, ANSWER_SECONDS);
        } else {
            self.finish();
        }
    }

    /// Locks the question and records the outcome. Re-entrant calls while
    /// already resolved are no-ops.
    fn resolve(&mut self) {
        if self.phase != SessionPhase::Presenting {
            return;
        }
        let Some(question) = self.questions.get(self.cursor) else {
            return;
        };

        let answer = match self.selection {
            Some(selection) => {
                let letter =
                    DisplayShuffle::letter_at(selection.display_index).unwrap_or('-');
                RecordedAnswer::answered(question.id().clone(), selection.canonical_index, letter)
            }
            None => RecordedAnswer::timed_out(question.id().clone()),
        };

        if answer
            .selected_index()
            .is_some_and(|selected| question.is_correct(selected))
        {
            self.correct_count += 1;
        }
        self.log.push(answer);

        self.phase = SessionPhase::Reading;
        self.countdown.start(CountdownKind::Reading, READING_SECONDS);
    }

    fn finish(&mut self) {
        self.phase = SessionPhase::Finished;
        self.countdown.cancel();
        let elapsed = self.stopwatch.stop();
        self.report = Some(ScoreReport::from_log(&self.questions, &self.log, elapsed));
    }

    //
    // ─── ACCESSORS ─────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase == SessionPhase::Finished
    }

    /// 0-based cursor of the question being presented or read.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.phase == SessionPhase::Finished {
            None
        } else {
            self.questions.get(self.cursor)
        }
    }

    #[must_use]
    pub fn shuffle(&self) -> &DisplayShuffle {
        &self.shuffle
    }

    #[must_use]
    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    #[must_use]
    pub fn answers(&self) -> &[RecordedAnswer] {
        &self.log
    }

    /// Live correct counter. Display-only: the reported score is recomputed
    /// from the log at session end.
    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        self.stopwatch.elapsed_seconds()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// The final score report; available once the session finishes.
    #[must_use]
    pub fn report(&self) -> Option<&ScoreReport> {
        self.report.as_ref()
    }

    /// Snapshot of the current state for a rendering layer.
    #[must_use]
    pub fn view(&self) -> SessionView {
        let question = self.questions.get(self.cursor);
        let options = match (self.phase, question) {
            (SessionPhase::Finished, _) | (_, None) => Vec::new(),
            (_, Some(q)) => (0..self.shuffle.as_order().len())
                .filter_map(|display| self.shuffle.canonical_at(display))
                .map(|canonical| q.option(canonical).unwrap_or_default().to_string())
                .collect(),
        };
        let (countdown_kind, countdown_remaining) = match self.countdown.remaining() {
            Some((kind, remaining)) => (Some(kind), Some(remaining)),
            None => (None, None),
        };

        SessionView {
            phase: self.phase,
            position: self.cursor,
            total: self.questions.len(),
            question: question
                .filter(|_| self.phase != SessionPhase::Finished)
                .map(|q| q.text().to_string())
                .unwrap_or_default(),
            domain: question
                .filter(|_| self.phase != SessionPhase::Finished)
                .map(|q| q.domain().to_string())
                .unwrap_or_default(),
            options,
            countdown_kind,
            countdown_remaining,
            selected_display: self.selection.map(|s| s.display_index),
            correct_so_far: (!self.log.is_empty()).then_some(self.correct_count),
            signature: is_signature_position(self.cursor),
            verdict: self.verdict(),
        }
    }

    /// Reveal description for the resolved question, present only in the
    /// reading window.
    fn verdict(&self) -> Option<VerdictView> {
        if self.phase != SessionPhase::Reading {
            return None;
        }
        let question = self.questions.get(self.cursor)?;
        let answer = self.log.last()?;

        let status = if answer.is_timeout() {
            AnswerStatus::Timeout
        } else if answer
            .selected_index()
            .is_some_and(|selected| question.is_correct(selected))
        {
            AnswerStatus::Correct
        } else {
            AnswerStatus::Wrong
        };

        let correct_display = self.shuffle.display_of(question.correct_index())?;
        Some(VerdictView {
            status,
            selected_letter: answer.selected_letter(),
            selected_text: answer
                .selected_index()
                .and_then(|canonical| question.option(canonical))
                .map(str::to_string),
            correct_display,
            correct_letter: DisplayShuffle::letter_at(correct_display)?,
            correct_text: question
                .option(question.correct_index())
                .unwrap_or_default()
                .to_string(),
            explanation: question.explanation().map(str::to_string),
        })
    }
}

//
// ─── VIEW SNAPSHOTS ────────────────────────────────────────────────────────────
//

/// Renderer-facing description of the session state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub phase: SessionPhase,
    /// 0-based position of the current question.
    pub position: usize,
    pub total: usize,
    pub question: String,
    pub domain: String,
    /// Option texts in display order.
    pub options: Vec<String>,
    pub countdown_kind: Option<CountdownKind>,
    pub countdown_remaining: Option<u32>,
    pub selected_display: Option<usize>,
    /// Live correct counter; hidden until the first question resolves.
    pub correct_so_far: Option<u32>,
    pub signature: bool,
    pub verdict: Option<VerdictView>,
}

/// Reveal shown during the reading window.
#[derive(Debug, Clone, PartialEq)]
pub struct VerdictView {
    pub status: AnswerStatus,
    /// Display letter the user picked; `-` on timeout.
    pub selected_letter: char,
    /// Text of the picked option; absent on timeout.
    pub selected_text: Option<String>,
    pub correct_display: usize,
    pub correct_letter: char,
    pub correct_text: String,
    pub explanation: Option<String>,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

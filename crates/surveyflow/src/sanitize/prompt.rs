//! Prompt state machine for the review loop.
//!
//! The interactive prompt is modeled as a small state machine with pure
//! transition functions, so every input path (commands, free text, empty
//! override, interrupts) is unit-testable without a terminal. The console
//! operator at the bottom is the only code that touches stdin/stdout.

use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One operator decision for a candidate response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Replace the value with operator-entered text (never empty)
    Override(String),
    /// Blank out the response (empty override)
    Discard,
    /// Confirm the original value is fine
    Verify,
    /// Revert all sanitization for this response
    Undo,
    /// Defer; move on without touching state
    Skip,
    /// Abort the whole batch; committed decisions are kept
    Cancel,
}

/// Where the prompt loop currently is for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptState {
    /// Waiting for a single-letter command
    Prompting,
    /// `s` was entered; waiting for the replacement text
    AwaitingFreeText,
}

/// Input arriving at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptEvent<'a> {
    /// A line read from the operator (not yet trimmed)
    Line(&'a str),
    /// Cancel signal or end of input
    Interrupted,
}

/// What to show the operator before reading again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    /// Print the command legend and re-present the candidate
    Legend,
    /// Unrecognized command: error plus legend, re-present
    Unrecognized,
    /// Empty override text entered: error, back to the command prompt
    EmptyOverride,
    /// Ask for the replacement value
    EnterValue,
}

/// Result of one transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    /// Stay in the loop for this candidate
    Continue {
        state: PromptState,
        feedback: Feedback,
    },
    /// A decision was reached
    Done(Decision),
}

/// Pure transition function for the prompt state machine.
pub fn advance(state: PromptState, event: PromptEvent<'_>) -> PromptOutcome {
    match (state, event) {
        (_, PromptEvent::Interrupted) => PromptOutcome::Done(Decision::Cancel),

        (PromptState::Prompting, PromptEvent::Line(line)) => {
            match line.trim().to_lowercase().as_str() {
                "s" => PromptOutcome::Continue {
                    state: PromptState::AwaitingFreeText,
                    feedback: Feedback::EnterValue,
                },
                "d" => PromptOutcome::Done(Decision::Discard),
                "v" => PromptOutcome::Done(Decision::Verify),
                "u" => PromptOutcome::Done(Decision::Undo),
                "n" => PromptOutcome::Done(Decision::Skip),
                "?" => PromptOutcome::Continue {
                    state: PromptState::Prompting,
                    feedback: Feedback::Legend,
                },
                _ => PromptOutcome::Continue {
                    state: PromptState::Prompting,
                    feedback: Feedback::Unrecognized,
                },
            }
        }

        (PromptState::AwaitingFreeText, PromptEvent::Line(line)) => {
            let text = line.trim();
            if text.is_empty() {
                PromptOutcome::Continue {
                    state: PromptState::Prompting,
                    feedback: Feedback::EmptyOverride,
                }
            } else {
                PromptOutcome::Done(Decision::Override(text.to_string()))
            }
        }
    }
}

/// What the engine presents for one candidate response.
#[derive(Debug, Clone)]
pub struct CandidateView {
    pub response_id: i64,
    pub session_id: i64,
    pub question_id: i64,
    /// None when the question header was already shown for this batch
    pub question_text: Option<String>,
    pub original: String,
    /// Present iff the response is currently sanitized
    pub current_override: Option<String>,
}

/// Source of operator decisions. The console implementation below talks to
/// a terminal; tests script a sequence of decisions instead.
pub trait Operator {
    fn decide(&mut self, view: &CandidateView) -> anyhow::Result<Decision>;
}

const LEGEND: &str = "\
s - enter a sanitized replacement value
d - discard this response (sets an empty override)
v - verify this as a valid response and don't show it again
u - undo all sanitization actions
n - nothing, skip over this and decide later
? - show this help
Ctrl-C - stop reviewing; committed decisions are kept";

/// Interactive operator reading from a terminal.
pub struct ConsoleOperator<R: BufRead, W: Write> {
    input: R,
    output: W,
    cancel: Arc<AtomicBool>,
}

impl<R: BufRead, W: Write> ConsoleOperator<R, W> {
    pub fn new(input: R, output: W, cancel: Arc<AtomicBool>) -> Self {
        Self {
            input,
            output,
            cancel,
        }
    }

    fn display(&mut self, view: &CandidateView) -> std::io::Result<()> {
        writeln!(
            self.output,
            "S:{} Q:{} R:{}",
            view.session_id, view.question_id, view.response_id
        )?;
        if let Some(question) = &view.question_text {
            writeln!(self.output, "QUESTION: {question}")?;
        }
        writeln!(self.output, "RESPONSE: {}", view.original)?;
        if let Some(current) = &view.current_override {
            writeln!(self.output, "SANITIZE: {current}")?;
        }
        writeln!(self.output)?;
        Ok(())
    }

    /// Read one line; `None` means end of input or a pending cancel signal.
    fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let mut line = String::new();
        let n = match self.input.read_line(&mut line) {
            Ok(n) => n,
            // A delivered signal can interrupt the blocking read
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => 0,
            Err(err) => return Err(err),
        };
        if n == 0 || self.cancel.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

impl<R: BufRead, W: Write> Operator for ConsoleOperator<R, W> {
    fn decide(&mut self, view: &CandidateView) -> anyhow::Result<Decision> {
        if self.cancel.load(Ordering::SeqCst) {
            return Ok(Decision::Cancel);
        }

        self.display(view)?;
        let mut state = PromptState::Prompting;

        loop {
            match state {
                PromptState::Prompting => write!(
                    self.output,
                    "What should we do with this response? [s,d,v,u,n,?] "
                )?,
                PromptState::AwaitingFreeText => write!(self.output, "> ")?,
            }
            self.output.flush()?;

            let line = self.read_line()?;
            let event = match &line {
                Some(line) => PromptEvent::Line(line),
                None => PromptEvent::Interrupted,
            };

            match advance(state, event) {
                PromptOutcome::Done(decision) => return Ok(decision),
                PromptOutcome::Continue {
                    state: next,
                    feedback,
                } => {
                    match feedback {
                        Feedback::Legend => {
                            writeln!(self.output, "{LEGEND}")?;
                            writeln!(self.output)?;
                            self.display(view)?;
                        }
                        Feedback::Unrecognized => {
                            writeln!(self.output, "Unrecognized command.")?;
                            writeln!(self.output, "{LEGEND}")?;
                            writeln!(self.output)?;
                            self.display(view)?;
                        }
                        Feedback::EmptyOverride => {
                            writeln!(
                                self.output,
                                "Error: no value entered, use 'd' to discard."
                            )?;
                        }
                        Feedback::EnterValue => {
                            writeln!(self.output, "Enter the new response value:")?;
                        }
                    }
                    state = next;
                }
            }
        }
    }
}

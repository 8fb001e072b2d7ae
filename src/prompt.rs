//! Interactive yes/no confirmation.
//!
//! The terminal prompt waits on a single channel fed by two producers: a
//! short-lived thread reading one line from stdin, and the process-wide
//! Ctrl-C handler.  Whichever arrives first decides the answer, so an
//! interrupt while prompting is a clean rejection rather than a kill.
use std::io::{self, BufRead as _, Write};
use std::sync::mpsc::{self, Sender};
use std::sync::{Mutex, OnceLock};

/// Answer to a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// The user said yes.
    Approved,
    /// The user said no, or input ended.
    Declined,
    /// Ctrl-C was pressed while waiting.
    Interrupted,
}

/// Something that can ask the user a yes/no question.
#[cfg_attr(test, mockall::automock)]
pub trait Confirm: Send + Sync {
    /// Ask `question` and block until it is answered.
    ///
    /// # Errors
    ///
    /// Returns an error only for genuine I/O failures; declining, end of
    /// input and interrupts are all answers.
    fn confirm(&self, question: &str) -> io::Result<Confirmation>;
}

/// One input event observed while prompting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEvent {
    /// A line was read (trailing newline included or not).
    Line(String),
    /// Input is closed.
    Eof,
    /// Ctrl-C.
    Interrupt,
}

/// Ask `question` on `out` and consume events from `next` until one of
/// them is an answer.  Unrecognised replies re-ask.
///
/// # Errors
///
/// Propagates write failures on `out` and errors returned by `next`.
pub fn confirm_with<W, F>(question: &str, out: &mut W, mut next: F) -> io::Result<Confirmation>
where
    W: Write,
    F: FnMut() -> io::Result<PromptEvent>,
{
    loop {
        write!(out, "{question} [y/n] ")?;
        out.flush()?;
        match next()? {
            PromptEvent::Line(line) => match line.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(Confirmation::Approved),
                "n" | "no" => return Ok(Confirmation::Declined),
                _ => writeln!(out, "Please answer 'y' or 'n'.")?,
            },
            PromptEvent::Eof => {
                writeln!(out)?;
                return Ok(Confirmation::Declined);
            }
            PromptEvent::Interrupt => {
                writeln!(out)?;
                return Ok(Confirmation::Interrupted);
            }
        }
    }
}

type EventSender = Sender<io::Result<PromptEvent>>;

/// Sender of the prompt currently waiting, if any.
fn waiting() -> &'static Mutex<Option<EventSender>> {
    static WAITING: OnceLock<Mutex<Option<EventSender>>> = OnceLock::new();
    WAITING.get_or_init(|| Mutex::new(None))
}

/// Install the process-wide Ctrl-C handler.
///
/// While a prompt is waiting the interrupt is delivered to it; at any other
/// time the process exits with status 130.
///
/// # Errors
///
/// Returns an error if a handler is already installed.
pub fn install_interrupt_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| {
        let delivered = waiting().lock().ok().is_some_and(|slot| {
            slot.as_ref()
                .is_some_and(|tx| tx.send(Ok(PromptEvent::Interrupt)).is_ok())
        });
        if !delivered {
            std::process::exit(130);
        }
    })
}

/// Prompt on the controlling terminal (stdin/stdout).
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl Confirm for TerminalPrompt {
    fn confirm(&self, question: &str) -> io::Result<Confirmation> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut slot) = waiting().lock() {
            *slot = Some(tx.clone());
        }

        let mut stdout = io::stdout();
        let answer = confirm_with(question, &mut stdout, || {
            let reader = tx.clone();
            std::thread::spawn(move || {
                let mut line = String::new();
                let event = match io::stdin().lock().read_line(&mut line) {
                    Ok(0) => Ok(PromptEvent::Eof),
                    Ok(_) => Ok(PromptEvent::Line(line)),
                    Err(e) => Err(e),
                };
                let _ = reader.send(event);
            });
            rx.recv().unwrap_or(Ok(PromptEvent::Eof))
        });

        if let Ok(mut slot) = waiting().lock() {
            *slot = None;
        }
        answer
    }
}

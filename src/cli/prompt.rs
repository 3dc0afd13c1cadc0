//! Small interactive prompts for the setup commands: plain stdin lines for
//! menus and a masked raw-mode editor for the API token.

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::fmt;
use std::io::{self, BufRead, Write};
use std::time::Duration;

/// Characters of the token shown when the reveal toggle (F2) is on.
const REVEAL_TAIL_CHARS: usize = 4;

#[derive(Debug)]
pub enum PromptError {
    Cancelled,
    Io(io::Error),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::Cancelled => write!(f, "Cancelled by user"),
            PromptError::Io(err) => write!(f, "Terminal error: {err}"),
        }
    }
}

impl std::error::Error for PromptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PromptError::Io(err) => Some(err),
            PromptError::Cancelled => None,
        }
    }
}

impl From<io::Error> for PromptError {
    fn from(err: io::Error) -> Self {
        PromptError::Io(err)
    }
}

/// Print `prompt` and read one trimmed line from stdin.
pub fn prompt_line(prompt: &str) -> io::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct MaskedInput {
    text: String,
    reveal_tail: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum MaskedAction {
    Insert(char),
    Backspace,
    Clear,
    ToggleReveal,
    Paste(String),
    Submit,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum MaskedOutcome {
    Continue,
    Submit(String),
    Cancelled,
}

impl MaskedInput {
    fn apply(&mut self, action: MaskedAction) -> MaskedOutcome {
        match action {
            MaskedAction::Insert(c) => self.text.push(c),
            MaskedAction::Backspace => {
                self.text.pop();
            }
            MaskedAction::Clear => self.text.clear(),
            MaskedAction::ToggleReveal => self.reveal_tail = !self.reveal_tail,
            MaskedAction::Paste(text) => {
                // Anything after the first line break ends the prompt.
                let mut lines = text.split(['\r', '\n']);
                if let Some(first) = lines.next() {
                    self.text.extend(first.chars().filter(|c| !c.is_control()));
                }
                if lines.next().is_some() {
                    return MaskedOutcome::Submit(self.text.clone());
                }
            }
            MaskedAction::Submit => return MaskedOutcome::Submit(self.text.clone()),
            MaskedAction::Cancel => return MaskedOutcome::Cancelled,
        }
        MaskedOutcome::Continue
    }

    fn display(&self) -> String {
        let len = self.text.chars().count();
        if self.reveal_tail && len >= REVEAL_TAIL_CHARS {
            let hidden = len - REVEAL_TAIL_CHARS;
            let tail: String = self.text.chars().skip(hidden).collect();
            format!("{}{tail}", "*".repeat(hidden))
        } else {
            "*".repeat(len)
        }
    }
}

fn map_key(key: &KeyEvent) -> Option<MaskedAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => Some(MaskedAction::Submit),
        KeyCode::Esc => Some(MaskedAction::Cancel),
        KeyCode::Backspace => Some(MaskedAction::Backspace),
        KeyCode::F(2) => Some(MaskedAction::ToggleReveal),
        KeyCode::Char('c') if ctrl => Some(MaskedAction::Cancel),
        KeyCode::Char('u') if ctrl => Some(MaskedAction::Clear),
        KeyCode::Char(c) if !ctrl => Some(MaskedAction::Insert(c)),
        _ => None,
    }
}

fn redraw(prompt: &str, input: &MaskedInput) -> io::Result<()> {
    print!("\r\x1b[K{prompt}{}", input.display());
    io::stdout().flush()
}

/// Read a secret without echoing it. Esc or Ctrl+C cancels.
pub fn prompt_masked(prompt: &str) -> Result<String, PromptError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, event::EnableBracketedPaste)?;

    let result = (|| -> Result<String, PromptError> {
        let mut input = MaskedInput::default();
        redraw(prompt, &input)?;
        loop {
            if !event::poll(Duration::from_millis(100))? {
                continue;
            }
            let action = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => map_key(&key),
                Event::Paste(text) => Some(MaskedAction::Paste(text)),
                _ => None,
            };
            let Some(action) = action else {
                continue;
            };
            match input.apply(action) {
                MaskedOutcome::Continue => redraw(prompt, &input)?,
                MaskedOutcome::Submit(value) => break Ok(value),
                MaskedOutcome::Cancelled => break Err(PromptError::Cancelled),
            }
        }
    })();

    let disable_raw = disable_raw_mode();
    let disable_paste = execute!(stdout, event::DisableBracketedPaste);
    println!();

    let value = result?;
    disable_raw?;
    disable_paste?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_characters_are_masked() {
        let mut input = MaskedInput::default();
        for c in "sk-abc".chars() {
            assert_eq!(input.apply(MaskedAction::Insert(c)), MaskedOutcome::Continue);
        }
        assert_eq!(input.display(), "******");
        input.apply(MaskedAction::Backspace);
        assert_eq!(
            input.apply(MaskedAction::Submit),
            MaskedOutcome::Submit("sk-ab".to_string())
        );
    }

    #[test]
    fn reveal_toggle_shows_only_the_tail() {
        let mut input = MaskedInput::default();
        input.apply(MaskedAction::Paste("sk-123456".to_string()));
        input.apply(MaskedAction::ToggleReveal);
        assert_eq!(input.display(), "*****3456");

        input.apply(MaskedAction::Clear);
        input.apply(MaskedAction::Insert('x'));
        assert_eq!(input.display(), "*");
    }

    #[test]
    fn pasted_newline_submits_first_line() {
        let mut input = MaskedInput::default();
        assert_eq!(
            input.apply(MaskedAction::Paste("token\nextra".to_string())),
            MaskedOutcome::Submit("token".to_string())
        );
    }

    #[test]
    fn escape_and_ctrl_c_cancel() {
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(&esc), Some(MaskedAction::Cancel));
        assert_eq!(map_key(&ctrl_c), Some(MaskedAction::Cancel));
        assert_eq!(
            map_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)),
            Some(MaskedAction::Insert('c'))
        );
    }
}

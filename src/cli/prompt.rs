//! Line-based prompts for interactive commands
//!
//! Reads answers from any `BufRead` and writes prompts to any `Write`, so
//! sessions can be scripted in tests. Typing the stop word at any prompt, or
//! closing the input, ends the session with [`PromptError::Stopped`].

use std::fmt::Display;
use std::io::{self, BufRead, Write};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("stopped by user")]
    Stopped,

    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

pub struct Prompter<R, W> {
    input: R,
    output: W,
    stop_word: String,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W, stop_word: impl Into<String>) -> Self {
        Self {
            input,
            output,
            stop_word: stop_word.into(),
        }
    }

    /// Show `prompt` and read one trimmed line
    pub fn ask(&mut self, prompt: impl Display) -> Result<String, PromptError> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            // End of input
            writeln!(self.output)?;
            return Err(PromptError::Stopped);
        }

        let answer = line.trim().to_string();
        if self.is_stop_word(&answer) {
            return Err(PromptError::Stopped);
        }
        Ok(answer)
    }

    /// Yes/no question; only `y`/`yes` counts as yes
    pub fn confirm(&mut self, prompt: impl Display) -> Result<bool, PromptError> {
        let answer = self.ask(prompt)?.to_lowercase();
        Ok(answer == "y" || answer == "yes")
    }

    /// Print one line
    pub fn say(&mut self, line: impl Display) -> Result<(), PromptError> {
        writeln!(self.output, "{}", line)?;
        Ok(())
    }

    pub fn is_stop_word(&self, answer: &str) -> bool {
        !self.stop_word.is_empty() && answer.trim().eq_ignore_ascii_case(&self.stop_word)
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(script: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(script.as_bytes().to_vec()), Vec::new(), "stop")
    }

    #[test]
    fn test_ask_trims() {
        let mut p = prompter("  Heparin \n");
        assert_eq!(p.ask("Name: ").unwrap(), "Heparin");
        assert_eq!(String::from_utf8(p.into_output()).unwrap(), "Name: ");
    }

    #[test]
    fn test_stop_word_any_case() {
        for script in ["stop\n", "STOP\n", "  Stop  \n"] {
            let mut p = prompter(script);
            assert!(matches!(p.ask("> "), Err(PromptError::Stopped)));
        }
    }

    #[test]
    fn test_end_of_input_stops() {
        let mut p = prompter("");
        assert!(matches!(p.ask("> "), Err(PromptError::Stopped)));
    }

    #[test]
    fn test_confirm() {
        let mut p = prompter("y\nYES\nn\n\n");
        assert!(p.confirm("? ").unwrap());
        assert!(p.confirm("? ").unwrap());
        assert!(!p.confirm("? ").unwrap());
        assert!(!p.confirm("? ").unwrap());
    }

    #[test]
    fn test_stop_word_not_substring() {
        let mut p = prompter("stopcock\n");
        assert_eq!(p.ask("> ").unwrap(), "stopcock");
    }
}

//! TerminalConsole - stdin/stdout 上の Console 実装
//!
//! - `Quiet` では write / write_line を全て捨てる（prompt だけは出す）
//! - 空入力は default、EOF も default 扱い
//! - 不正な入力はエラーメッセージを出して再度聞き直す

use std::io::{self, BufRead, Write};
use std::sync::{Mutex, MutexGuard};

use crate::domain::Verbosity;
use crate::ports::{Choice, Console};

pub struct TerminalConsole {
    verbosity: Verbosity,
    input: Mutex<Box<dyn BufRead + Send>>,
    output: Mutex<Box<dyn Write + Send>>,
}

impl TerminalConsole {
    /// Console over the process's stdin / stdout.
    pub fn stdio(verbosity: Verbosity) -> Self {
        Self::with_io(
            verbosity,
            Box::new(io::BufReader::new(io::stdin())),
            Box::new(io::stdout()),
        )
    }

    pub fn with_io(
        verbosity: Verbosity,
        input: Box<dyn BufRead + Send>,
        output: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            verbosity,
            input: Mutex::new(input),
            output: Mutex::new(output),
        }
    }

    fn output(&self) -> io::Result<MutexGuard<'_, Box<dyn Write + Send>>> {
        self.output
            .lock()
            .map_err(|_| io::Error::other("console output lock poisoned"))
    }

    /// Print `prompt` and read one trimmed line. `None` on end of input.
    fn ask(&self, prompt: &str) -> io::Result<Option<String>> {
        {
            let mut out = self.output()?;
            out.write_all(prompt.as_bytes())?;
            out.flush()?;
        }

        let mut line = String::new();
        let read = self
            .input
            .lock()
            .map_err(|_| io::Error::other("console input lock poisoned"))?
            .read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn say(&self, text: &str) -> io::Result<()> {
        let mut out = self.output()?;
        writeln!(out, "{text}")?;
        out.flush()
    }

    /// Match an answer against keys first, then labels (case-insensitive).
    pub fn match_choice<'a>(answer: &str, choices: &[Choice<'a>]) -> Option<&'a str> {
        let answer = answer.to_lowercase();
        choices
            .iter()
            .find(|c| c.key.to_lowercase() == answer)
            .or_else(|| choices.iter().find(|c| c.label.to_lowercase() == answer))
            .map(|c| c.key)
    }

    pub fn format_choice_prompt(question: &str, choices: &[Choice<'_>], default: &str) -> String {
        let default_label = choices
            .iter()
            .find(|c| c.key == default)
            .map(|c| c.label)
            .unwrap_or(default);

        let mut prompt = format!(" {question} [{default_label}]:\n");
        for choice in choices {
            prompt.push_str(&format!("  [{}] {}\n", choice.key, choice.label));
        }
        prompt.push_str(" > ");
        prompt
    }
}

impl Console for TerminalConsole {
    fn write(&self, text: &str) -> io::Result<()> {
        if self.verbosity == Verbosity::Quiet {
            return Ok(());
        }
        let mut out = self.output()?;
        out.write_all(text.as_bytes())?;
        out.flush()
    }

    fn write_line(&self, text: &str) -> io::Result<()> {
        if self.verbosity == Verbosity::Quiet {
            return Ok(());
        }
        self.say(text)
    }

    fn choice(&self, question: &str, choices: &[Choice<'_>], default: &str) -> io::Result<String> {
        let prompt = Self::format_choice_prompt(question, choices, default);
        loop {
            let Some(answer) = self.ask(&prompt)? else {
                return Ok(default.to_string());
            };
            if answer.is_empty() {
                return Ok(default.to_string());
            }
            if let Some(key) = Self::match_choice(&answer, choices) {
                return Ok(key.to_string());
            }
            self.say(&format!(" Value \"{answer}\" is invalid"))?;
        }
    }

    fn confirm(&self, question: &str, default: bool) -> io::Result<bool> {
        let hint = if default { "yes" } else { "no" };
        let prompt = format!(" {question} (yes/no) [{hint}]:\n > ");
        loop {
            let Some(answer) = self.ask(&prompt)? else {
                return Ok(default);
            };
            match answer.to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.say(" Please answer yes or no.")?,
            }
        }
    }

    fn verbosity(&self) -> Verbosity {
        self.verbosity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const STEP: [Choice<'static>; 3] = [
        Choice::new("y", "yes"),
        Choice::new("s", "skip"),
        Choice::new("a", "abort"),
    ];

    /// Writer whose contents the test can read back after the console has it.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn console(verbosity: Verbosity, input: &str) -> (TerminalConsole, SharedBuf) {
        let out = SharedBuf::default();
        let console = TerminalConsole::with_io(
            verbosity,
            Box::new(io::Cursor::new(input.as_bytes().to_vec())),
            Box::new(out.clone()),
        );
        (console, out)
    }

    #[test]
    fn choice_accepts_key_label_and_default() {
        let (c, _) = console(Verbosity::Normal, "s\nABORT\n\n");
        assert_eq!(c.choice("Execute this step?", &STEP, "y").unwrap(), "s");
        assert_eq!(c.choice("Execute this step?", &STEP, "y").unwrap(), "a");
        assert_eq!(c.choice("Execute this step?", &STEP, "y").unwrap(), "y");
    }

    #[test]
    fn choice_reprompts_on_invalid_answer() {
        let (c, out) = console(Verbosity::Normal, "maybe\na\n");
        assert_eq!(c.choice("Execute this step?", &STEP, "y").unwrap(), "a");
        let text = out.text();
        assert!(text.contains("Value \"maybe\" is invalid"));
        assert_eq!(text.matches("Execute this step? [yes]").count(), 2);
    }

    #[test]
    fn choice_falls_back_to_default_on_eof() {
        let (c, _) = console(Verbosity::Normal, "");
        assert_eq!(c.choice("Execute this step?", &STEP, "y").unwrap(), "y");
    }

    #[test]
    fn confirm_parses_yes_no() {
        let (c, _) = console(Verbosity::Normal, "no\nyes\n\n");
        assert!(!c.confirm("Continue?", true).unwrap());
        assert!(c.confirm("Continue?", false).unwrap());
        assert!(c.confirm("Continue?", true).unwrap());
    }

    #[test]
    fn quiet_suppresses_writes_but_not_prompts() {
        let (c, out) = console(Verbosity::Quiet, "y\n");
        c.write(".").unwrap();
        c.write_line("title").unwrap();
        assert_eq!(out.text(), "");

        c.choice("Execute this step?", &STEP, "y").unwrap();
        assert!(out.text().contains("Execute this step?"));
    }

    #[test]
    fn prompt_lists_every_choice() {
        let prompt = TerminalConsole::format_choice_prompt("Execute this step?", &STEP, "y");
        assert!(prompt.starts_with(" Execute this step? [yes]:"));
        assert!(prompt.contains("[s] skip"));
        assert!(prompt.contains("[a] abort"));
    }
}

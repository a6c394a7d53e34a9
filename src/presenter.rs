use std::io::{self, BufRead, Write};
use tracing::warn;

/// Operator interaction. The console adapter blocks on stdin; tests use a scripted one.
pub trait Presenter {
    /// Index into `options`, or `None` if the operator chose to exit or skip
    fn choose_one(&mut self, title: &str, options: &[String]) -> Option<usize>;
    fn confirm(&mut self, prompt: &str) -> bool;
    /// Shows a message to the operator
    fn show(&mut self, message: &str);
}

#[derive(Debug)]
pub struct ConsolePresenter<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl ConsolePresenter<io::StdinLock<'static>, io::Stdout> {
    pub fn new() -> Self {
        Self {
            input: io::stdin().lock(),
            output: io::stdout(),
        }
    }
}

impl Default for ConsolePresenter<io::StdinLock<'static>, io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: BufRead, W: Write> ConsolePresenter<R, W> {
    pub const fn with_io(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// `None` at end of input
    fn read_line(&mut self) -> io::Result<Option<String>> {
        self.output.flush()?;
        let mut line = String::new();
        match self.input.read_line(&mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line.trim().to_string())),
        }
    }

    fn try_choose_one(&mut self, title: &str, options: &[String]) -> io::Result<Option<usize>> {
        writeln!(self.output, "{title}")?;
        for (num, option) in options.iter().enumerate() {
            writeln!(self.output, "{}. {option}", num + 1)?;
        }
        writeln!(self.output, "{}. Exit", options.len() + 1)?;
        loop {
            write!(self.output, "Select an option: ")?;
            let line = match self.read_line()? {
                Some(line) => line,
                None => return Ok(None),
            };
            match line.parse::<usize>() {
                Ok(num) if num >= 1 && num <= options.len() => return Ok(Some(num - 1)),
                Ok(num) if num == options.len() + 1 => return Ok(None),
                _ => writeln!(self.output, "'{line}' is not a valid option")?,
            }
        }
    }

    fn try_confirm(&mut self, prompt: &str) -> io::Result<bool> {
        loop {
            write!(self.output, "{prompt} (Y/Enter/n) ")?;
            let line = match self.read_line()? {
                Some(line) => line,
                None => return Ok(false),
            };
            match line.to_lowercase().as_str() {
                "" | "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.output, "Please answer y or n")?,
            }
        }
    }
}

/// A broken console counts as "exit" and "no".
impl<R: BufRead, W: Write> Presenter for ConsolePresenter<R, W> {
    fn choose_one(&mut self, title: &str, options: &[String]) -> Option<usize> {
        self.try_choose_one(title, options).unwrap_or_else(|e| {
            warn!("Console failed: {e}");
            None
        })
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        self.try_confirm(prompt).unwrap_or_else(|e| {
            warn!("Console failed: {e}");
            false
        })
    }

    fn show(&mut self, message: &str) {
        if let Err(e) = writeln!(self.output, "{message}") {
            warn!("Console failed: {e}");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Answers prompts from a script. Runs out of answers as "no" / exit.
    #[derive(Debug, Default)]
    pub struct ScriptedPresenter {
        pub confirmations: VecDeque<bool>,
        pub choices: VecDeque<Option<usize>>,
        pub messages: Vec<String>,
        pub prompts: Vec<String>,
    }

    impl ScriptedPresenter {
        pub fn confirming(answers: &[bool]) -> Self {
            Self {
                confirmations: answers.iter().copied().collect(),
                ..Default::default()
            }
        }

        pub fn has_message(&self, needle: &str) -> bool {
            self.messages.iter().any(|m| m.contains(needle))
        }
    }

    impl Presenter for ScriptedPresenter {
        fn choose_one(&mut self, title: &str, _options: &[String]) -> Option<usize> {
            self.prompts.push(title.to_string());
            self.choices.pop_front().flatten()
        }

        fn confirm(&mut self, prompt: &str) -> bool {
            self.prompts.push(prompt.to_string());
            self.confirmations.pop_front().unwrap_or(false)
        }

        fn show(&mut self, message: &str) {
            self.messages.push(message.to_string());
        }
    }

    fn console(input: &str) -> ConsolePresenter<&[u8], Vec<u8>> {
        ConsolePresenter::with_io(input.as_bytes(), vec![])
    }

    #[test]
    fn test_confirm_defaults_to_yes() {
        assert!(console("\n").confirm("Continue?"));
        assert!(console("Y\n").confirm("Continue?"));
        assert!(!console("n\n").confirm("Continue?"));
        assert!(console("maybe\nyes\n").confirm("Continue?"));
    }

    #[test]
    fn test_confirm_at_end_of_input_is_no() {
        assert!(!console("").confirm("Continue?"));
    }

    #[test]
    fn test_choose_one() {
        let options = vec!["a".to_string(), "b".to_string()];
        assert_eq!(console("2\n").choose_one("Pick", &options), Some(1));
        assert_eq!(console("3\n").choose_one("Pick", &options), None);
        assert_eq!(console("0\nx\n1\n").choose_one("Pick", &options), Some(0));
        assert_eq!(console("").choose_one("Pick", &options), None);
    }

    /// Stdout with a closed pipe
    #[derive(Debug)]
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn test_broken_output_ends_prompts() {
        let options = vec!["a".to_string()];
        let mut presenter = ConsolePresenter::with_io("maybe\nmaybe\n1\n".as_bytes(), BrokenPipe);
        assert_eq!(presenter.choose_one("Pick", &options), None);
        assert!(!presenter.confirm("Continue?"));
        presenter.show("nobody reads this");
    }

    #[test]
    fn test_choose_one_lists_exit() {
        let mut presenter = console("1\n");
        presenter.choose_one("Select a task", &["only".to_string()]);
        let out = String::from_utf8(presenter.output.clone()).unwrap();
        assert!(out.starts_with("Select a task\n1. only\n2. Exit\n"));
    }
}

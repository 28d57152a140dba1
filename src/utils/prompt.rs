use crate::domain::ports::Prompter;
use crate::utils::error::Result;
use std::io::{BufRead, Write};

/// Writes to stdout and reads answers from stdin, one line per question.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn say(&self, message: &str) {
        println!("{}", message);
    }

    fn prompt(&self, message: &str) -> Result<String> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{}: ", message)?;
        stdout.flush()?;

        let mut answer = String::new();
        std::io::stdin().lock().read_line(&mut answer)?;
        Ok(answer.trim().to_string())
    }
}

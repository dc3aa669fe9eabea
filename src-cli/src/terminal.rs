use std::io::{self, BufRead, Write};

/// Line-oriented question/answer on a reader, prompts on stdout.
pub struct Prompt<R> {
    input: R,
}

impl<R: BufRead> Prompt<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    /// Trimmed line, or `None` at end of input.
    pub fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{prompt} ")?;
        stdout.flush()?;
        drop(stdout);

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::Prompt;
    use pretty_assertions::assert_eq;

    #[test]
    fn answers_are_trimmed_until_eof() {
        let mut prompt = Prompt::new("  3M \n\nq\n".as_bytes());
        assert_eq!(prompt.ask(">").unwrap().as_deref(), Some("3M"));
        assert_eq!(prompt.ask(">").unwrap().as_deref(), Some(""));
        assert_eq!(prompt.ask(">").unwrap().as_deref(), Some("q"));
        assert_eq!(prompt.ask(">").unwrap(), None);
    }
}

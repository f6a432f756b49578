//! Interactive prompts: confirm dialogs and the section choice list.

use grocery_core::SectionRequest;
use std::io::{self, BufRead, Write};

/// Blocking user dialogs needed by the commands.
pub(crate) trait Prompter {
    /// Yes/no question; anything but `y`/`yes` is a no.
    fn confirm(&mut self, message: &str) -> io::Result<bool>;
    /// Single choice from `request.choices`; `None` means dismissed.
    fn choose_section(&mut self, request: &SectionRequest) -> io::Result<Option<String>>;
}

/// Line-based prompts over any reader/writer pair.
pub(crate) struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Reads one trimmed line; `None` at end of input.
    fn read_answer(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn confirm(&mut self, message: &str) -> io::Result<bool> {
        write!(self.output, "{message} [y/N] ")?;
        self.output.flush()?;
        let answer = self.read_answer()?.unwrap_or_default();
        Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
    }

    fn choose_section(&mut self, request: &SectionRequest) -> io::Result<Option<String>> {
        writeln!(self.output, "Select a section for \"{}\":", request.item_name)?;
        if let Some(stale) = &request.stale_section {
            writeln!(self.output, "  (last used \"{stale}\" no longer exists)")?;
        }
        for (index, choice) in request.choices.iter().enumerate() {
            writeln!(self.output, "  {}) {choice}", index + 1)?;
        }

        loop {
            write!(self.output, "number or name, empty to skip: ")?;
            self.output.flush()?;
            let Some(answer) = self.read_answer()? else {
                return Ok(None);
            };
            if answer.is_empty() {
                return Ok(None);
            }
            if let Some(choice) = match_choice(&request.choices, &answer) {
                return Ok(Some(choice));
            }
            writeln!(self.output, "\"{answer}\" is not one of the listed sections")?;
        }
    }
}

/// Resolves a 1-based number or a case-insensitive section name.
fn match_choice(choices: &[String], answer: &str) -> Option<String> {
    if let Ok(number) = answer.parse::<usize>() {
        return number
            .checked_sub(1)
            .and_then(|index| choices.get(index))
            .cloned();
    }
    choices
        .iter()
        .find(|choice| choice.eq_ignore_ascii_case(answer))
        .cloned()
}

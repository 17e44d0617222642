use std::io::{self, BufRead, Write};

/// Decides whether a destructive recovery step may go ahead.
///
/// The source manager asks for consent before deleting a corrupted archive
/// and re-downloading it. Implement this trait to answer that question
/// without a terminal (for example in a batch job or a test).
pub trait Confirm: Send {
    /// Returns `true` if the operation described by `prompt` may proceed.
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Asks the operator on stdin. An empty answer, `Y` or `y` count as yes.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl Confirm for TerminalPrompt {
    fn confirm(&mut self, prompt: &str) -> bool {
        print!("{} [Y/n]? ", prompt);
        if io::stdout().flush().is_err() {
            return false;
        }
        confirm_from(io::stdin().lock())
    }
}

/// Reads one answer line from `input`. End of input is a refusal, so a
/// run without an operator never consents.
fn confirm_from<R: BufRead>(mut input: R) -> bool {
    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(0) => {
            log::warn!("No answer on stdin (end of input), declining");
            false
        }
        Ok(_) => is_affirmative(&answer),
        Err(e) => {
            log::error!("Failed to read confirmation from stdin: {}", e);
            false
        }
    }
}

/// Always consents. Used for unattended runs (`--yes`).
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        log::info!("{}: confirmed automatically", prompt);
        true
    }
}

/// Never consents.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverConfirm;

impl Confirm for NeverConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        log::info!("{}: declined automatically", prompt);
        false
    }
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool + Send,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim_end_matches(['\r', '\n']), "" | "Y" | "y")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affirmative_answers() {
        assert!(is_affirmative("\n"));
        assert!(is_affirmative("y\n"));
        assert!(is_affirmative("Y\r\n"));
        assert!(!is_affirmative("n\n"));
        assert!(!is_affirmative("yes\n"));
        assert!(!is_affirmative(" y\n"));
    }

    #[test]
    fn test_end_of_input_declines() {
        assert!(!confirm_from(io::empty()));
        assert!(!confirm_from(&b""[..]));
    }

    #[test]
    fn test_typed_answers() {
        assert!(!confirm_from(&b"n\n"[..]));
        assert!(confirm_from(&b"y\n"[..]));
        assert!(confirm_from(&b"\n"[..]));
        // Only the first line counts.
        assert!(!confirm_from(&b"no\ny\n"[..]));
    }

    #[test]
    fn test_closure_strategy() {
        let mut asked = Vec::new();
        let mut strategy = |prompt: &str| {
            asked.push(prompt.to_string());
            false
        };
        assert!(!strategy.confirm("Delete archive"));
        drop(strategy);
        assert_eq!(asked, vec!["Delete archive".to_string()]);
    }

    #[test]
    fn test_fixed_strategies() {
        assert!(AlwaysConfirm.confirm("anything"));
        assert!(!NeverConfirm.confirm("anything"));
    }
}

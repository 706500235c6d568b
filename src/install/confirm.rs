//! Confirmation policies for questions the install has to ask.
use std::io::IsTerminal as _;

/// A yes/no decision, injected so the install pipeline never talks to a
/// terminal directly.
#[cfg_attr(test, mockall::automock)]
pub trait Confirm: Send + Sync {
    /// Answer `question`; `true` means proceed.
    fn confirm(&self, question: &str) -> bool;
}

/// Always answers yes (`--yes`).
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _question: &str) -> bool {
        true
    }
}

/// Always answers no; the unattended default.
#[derive(Debug, Default, Clone, Copy)]
pub struct Deny;

impl Confirm for Deny {
    fn confirm(&self, _question: &str) -> bool {
        false
    }
}

/// Interactive terminal prompt that defaults to "no".
///
/// Cancelling the prompt (Esc, Ctrl-C) or any prompt error counts as "no".
#[derive(Debug, Default, Clone, Copy)]
pub struct InquirePrompt;

impl Confirm for InquirePrompt {
    fn confirm(&self, question: &str) -> bool {
        inquire::Confirm::new(question)
            .with_default(false)
            .with_help_message("Press 'y' to confirm, Enter to cancel")
            .prompt()
            .unwrap_or(false)
    }
}

/// Pick the policy for this invocation.
///
/// `--yes` wins over everything; `--no-input` or a non-terminal stdin deny.
#[must_use]
pub fn select_policy(assume_yes: bool, no_input: bool) -> Box<dyn Confirm> {
    policy_for(assume_yes, no_input, std::io::stdin().is_terminal())
}

fn policy_for(assume_yes: bool, no_input: bool, interactive: bool) -> Box<dyn Confirm> {
    if assume_yes {
        Box::new(AssumeYes)
    } else if no_input || !interactive {
        Box::new(Deny)
    } else {
        Box::new(InquirePrompt)
    }
}

//! Shell completion generation.

use clap::{CommandFactory, ValueEnum};
use clap_complete::{generate, Shell};

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Shell::Bash,
            CompletionShell::Zsh => Shell::Zsh,
            CompletionShell::Fish => Shell::Fish,
            CompletionShell::PowerShell => Shell::PowerShell,
            CompletionShell::Elvish => Shell::Elvish,
        }
    }
}

/// Write completions for `C` to `out`.
pub fn write_completions<C: CommandFactory>(
    shell: CompletionShell,
    bin_name: &str,
    out: &mut dyn std::io::Write,
) {
    let mut cmd = C::command();
    let shell_type: Shell = shell.into();
    tracing::trace!(shell = ?shell, bin_name = %bin_name, "Generating completions");
    generate(shell_type, &mut cmd, bin_name, out);
}

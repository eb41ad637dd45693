//! Shell completion generation.

use clap::CommandFactory;
use clap_complete::{generate, shells};

use crate::cli::{Cli, Shell};

pub fn execute(shell: Shell) {
    let mut cmd = Cli::command();
    let bin = "envkey";
    let mut out = std::io::stdout();

    match shell {
        Shell::Bash => generate(shells::Bash, &mut cmd, bin, &mut out),
        Shell::Zsh => generate(shells::Zsh, &mut cmd, bin, &mut out),
        Shell::Fish => generate(shells::Fish, &mut cmd, bin, &mut out),
        Shell::PowerShell => generate(shells::PowerShell, &mut cmd, bin, &mut out),
    }
}

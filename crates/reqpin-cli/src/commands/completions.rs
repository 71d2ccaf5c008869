use super::EXIT_SUCCESS;
use clap::CommandFactory;
use clap_complete::Shell;
use std::io::Write;

/// Completion script for `shell`, with `reqpin` as the program name.
pub fn write_completions<C: CommandFactory>(shell: Shell, out: &mut dyn Write) {
    clap_complete::generate(shell, &mut C::command(), "reqpin", out);
}

#[allow(clippy::unnecessary_wraps)]
pub fn run<C: CommandFactory>(shell: Shell) -> Result<u8, String> {
    write_completions::<C>(shell, &mut std::io::stdout());
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Parser, Subcommand};

    #[derive(Parser)]
    #[allow(dead_code)]
    struct Demo {
        #[command(subcommand)]
        command: DemoCommand,
    }

    #[derive(Subcommand)]
    enum DemoCommand {
        Resolve,
        Verify,
    }

    fn generated(shell: Shell) -> String {
        let mut buf = Vec::new();
        write_completions::<Demo>(shell, &mut buf);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn bash_script_registers_program_and_subcommands() {
        let script = generated(Shell::Bash);
        assert!(script.contains("complete -F _reqpin"), "{script}");
        assert!(script.contains("resolve"));
        assert!(script.contains("verify"));
    }

    #[test]
    fn fish_script_targets_reqpin() {
        let script = generated(Shell::Fish);
        assert!(script.contains("complete -c reqpin"), "{script}");
    }
}

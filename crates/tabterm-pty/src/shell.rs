use std::path::{Path, PathBuf};

use portable_pty::CommandBuilder;

/// Environment variable that overrides the detected shell program.
pub const SHELL_OVERRIDE_VAR: &str = "TABTERM_SHELL";

/// Describes the program a session runs inside its pseudo-terminal.
///
/// The child always inherits the controller's environment; `env` entries are
/// layered on top of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl ShellCommand {
    /// A command for `program` with no arguments, started in the home directory.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: dirs::home_dir(),
            env: Vec::new(),
        }
    }

    /// The interactive shell for the host platform.
    ///
    /// `TABTERM_SHELL` wins when set; otherwise `$SHELL` (or `/bin/sh`) on
    /// unix and PowerShell on Windows.
    pub fn detect() -> Self {
        match std::env::var(SHELL_OVERRIDE_VAR) {
            Ok(program) if !program.trim().is_empty() => Self::new(program),
            _ => Self::new(default_shell()),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Title shown for a session until the shell reports its own.
    pub fn display_name(&self) -> String {
        let name = Path::new(&self.program)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.clone());

        if name.eq_ignore_ascii_case("powershell") || name.eq_ignore_ascii_case("pwsh") {
            "PowerShell".to_string()
        } else {
            name
        }
    }

    pub(crate) fn to_builder(&self) -> CommandBuilder {
        let mut cmd = CommandBuilder::new(&self.program);
        cmd.args(&self.args);
        if let Some(cwd) = self.cwd.as_ref().filter(|dir| dir.is_dir()) {
            cmd.cwd(cwd);
        }
        cmd.env("TERM", "xterm-256color");
        cmd.env("COLORTERM", "truecolor");
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }
}

impl Default for ShellCommand {
    fn default() -> Self {
        Self::detect()
    }
}

#[cfg(windows)]
fn default_shell() -> String {
    "powershell.exe".to_string()
}

/// Returns the user's login shell, falling back to `/bin/sh`.
#[cfg(not(windows))]
fn default_shell() -> String {
    std::env::var("SHELL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "/bin/sh".to_string())
}

use log::warn;
use std::io;
use std::path::Path;
use std::process::Command;

fn opener(path: &Path) -> Command {
    #[cfg(target_os = "macos")]
    let mut cmd = Command::new("open");

    #[cfg(target_os = "windows")]
    let mut cmd = Command::new("explorer");

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut cmd = Command::new("xdg-open");

    cmd.arg(path);
    cmd
}

/// Starts `cmd` without waiting for it. Fails when the program can't be launched.
fn launch(mut cmd: Command) -> io::Result<()> {
    cmd.spawn().map(|_| ()).inspect_err(|e| {
        warn!("Could not launch {:?}: {}", cmd.get_program(), e);
    })
}

/// Opens `path` with the platform's default application.
pub fn open(path: &Path) -> io::Result<()> {
    launch(opener(path))
}

/// Shows the file in the system file manager. Failures are logged only.
pub fn reveal(path: &Path) {
    #[cfg(target_os = "macos")]
    let cmd = {
        let mut cmd = Command::new("open");
        cmd.arg("-R").arg(path);
        cmd
    };

    #[cfg(target_os = "windows")]
    let cmd = {
        let mut cmd = Command::new("explorer");
        cmd.arg(format!("/select,{}", path.to_string_lossy()));
        cmd
    };

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let cmd = opener(path.parent().unwrap_or(path));

    let _ = launch(cmd);
}

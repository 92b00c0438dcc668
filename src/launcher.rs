//! Redirect launcher
//!
//! The legacy executable name is kept as a thin redirector: it starts the renamed
//! application that sits next to it, forwarding the command line, and exits
//! without waiting for it.

use crate::error::LaunchError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Executable started by the redirector
pub const TARGET_EXECUTABLE: &str = "UniGetUI.exe";

/// Path of [`TARGET_EXECUTABLE`] in the directory of `executable`
pub fn resolve_target(executable: &Path) -> PathBuf {
    executable
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(TARGET_EXECUTABLE)
}

/// Start `target` with `args` and return its process id without waiting
pub fn launch<I>(target: &Path, args: I) -> Result<u32, LaunchError>
where
    I: IntoIterator<Item = OsString>,
{
    if !target.is_file() {
        return Err(LaunchError::TargetMissing {
            path: target.to_path_buf(),
        });
    }

    let args: Vec<OsString> = args.into_iter().collect();
    debug!("Starting {} with {} arguments", target.display(), args.len());

    let child = Command::new(target)
        .args(&args)
        .spawn()
        .map_err(|source| LaunchError::Spawn {
            path: target.to_path_buf(),
            source,
        })?;

    info!("Started {} (pid {})", target.display(), child.id());
    Ok(child.id())
}

/// Redirect from the running executable to its sibling target
pub fn redirect<I>(args: I) -> Result<u32, LaunchError>
where
    I: IntoIterator<Item = OsString>,
{
    let executable = std::env::current_exe().map_err(LaunchError::CurrentExe)?;
    launch(&resolve_target(&executable), args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TARGET_MISSING_EXIT_CODE;
    use crate::test_utils::create_test_dir;

    #[test]
    fn test_target_is_sibling_of_executable() {
        let executable = Path::new("install").join("WingetUI.exe");
        assert_eq!(
            resolve_target(&executable),
            Path::new("install").join("UniGetUI.exe")
        );
    }

    #[test]
    fn test_bare_executable_name_resolves_to_bare_target() {
        assert_eq!(
            resolve_target(Path::new("WingetUI.exe")),
            PathBuf::from("UniGetUI.exe")
        );
    }

    #[test]
    fn test_missing_target_exit_code() {
        let temp_dir = create_test_dir();
        let target = temp_dir.path().join(TARGET_EXECUTABLE);

        let error = launch(&target, Vec::new()).unwrap_err();
        assert!(matches!(error, LaunchError::TargetMissing { .. }));
        assert_eq!(error.exit_code(), TARGET_MISSING_EXIT_CODE);
    }

    #[test]
    fn test_directory_is_not_a_target() {
        let temp_dir = create_test_dir();
        let target = temp_dir.path().join(TARGET_EXECUTABLE);
        std::fs::create_dir(&target).unwrap();

        let error = launch(&target, Vec::new()).unwrap_err();
        assert_eq!(error.exit_code(), TARGET_MISSING_EXIT_CODE);
    }

    #[test]
    fn test_spawn_failure_reports_os_error() {
        let error = LaunchError::Spawn {
            path: PathBuf::from(TARGET_EXECUTABLE),
            source: std::io::Error::from_raw_os_error(5),
        };
        assert_eq!(error.exit_code(), 5);
    }

    #[test]
    fn test_error_without_os_code_exits_with_one() {
        let error = LaunchError::CurrentExe(std::io::Error::other("no path"));
        assert_eq!(error.exit_code(), 1);
    }
}

//! Launching feature programs.
//!
//! Each feature is addressed by name. `[launcher]` in `eyeward.toml` decides
//! how a name becomes a command line:
//!
//! ```text
//! program = "python3"
//! args    = ["-m", "backend.features.$FEATURE"]
//! script  = "backend/features/$FEATURE.py"
//! ```

use std::path::PathBuf;
use std::process::Stdio;

use rustc_hash::FxHashMap;
use tokio::process::Command;

use super::{ExitSender, LaunchError, ProcessHandle, Spawner};
use crate::config::LauncherConfig;
use crate::feature::FeatureDescriptor;
use crate::{debug, log};

// ============================================================================
// Argument Resolution
// ============================================================================

/// Replace `$NAME` occurrences with values from `vars`.
///
/// Longer names are substituted first so `$ROOT` never clobbers `$ROOTDIR`.
fn resolve_args(args: &[String], vars: &FxHashMap<String, String>) -> Vec<String> {
    let mut keys: Vec<_> = vars.keys().collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    args.iter()
        .map(|arg| {
            let mut result = arg.clone();
            for key in &keys {
                result = result.replace(&format!("${key}"), &vars[*key]);
            }
            result
        })
        .collect()
}

// ============================================================================
// Launcher
// ============================================================================

/// Spawns feature programs with the application root as working directory.
#[derive(Debug, Clone)]
pub struct Launcher {
    root: PathBuf,
    settings_path: PathBuf,
    program: String,
    args: Vec<String>,
    script: String,
}

impl Launcher {
    pub fn new(
        root: impl Into<PathBuf>,
        settings_path: impl Into<PathBuf>,
        config: &LauncherConfig,
    ) -> Self {
        Self {
            root: root.into(),
            settings_path: settings_path.into(),
            program: config.program.clone(),
            args: config.args.clone(),
            script: config.script.clone(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Script that must exist for `feature` to be launchable.
    pub fn script_path(&self, feature: &str) -> PathBuf {
        let mut vars = FxHashMap::default();
        vars.insert("FEATURE".to_string(), feature.to_string());
        let script = resolve_args(std::slice::from_ref(&self.script), &vars)
            .pop()
            .unwrap_or_default();
        self.root.join(script)
    }

    /// `$FEATURE`, `$SCRIPT` and `$ROOT` for `feature`.
    fn vars(&self, feature: &str) -> FxHashMap<String, String> {
        let mut vars = FxHashMap::default();
        vars.insert("FEATURE".to_string(), feature.to_string());
        vars.insert(
            "SCRIPT".to_string(),
            self.script_path(feature).display().to_string(),
        );
        vars.insert("ROOT".to_string(), self.root.display().to_string());
        vars
    }

    /// Resolved argument list for `feature`.
    pub fn command_args(&self, feature: &str) -> Vec<String> {
        resolve_args(&self.args, &self.vars(feature))
    }

    fn command(&self, feature: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.command_args(feature))
            .current_dir(&self.root)
            .env("EYEWARD_FEATURE", feature)
            .env("EYEWARD_ROOT", &self.root)
            .env("EYEWARD_SETTINGS", &self.settings_path)
            .env("PYTHONUNBUFFERED", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Spawner for Launcher {
    fn spawn(
        &self,
        feature: &'static FeatureDescriptor,
        generation: u64,
        exit_tx: ExitSender,
    ) -> Result<ProcessHandle, LaunchError> {
        let script = self.script_path(feature.name);
        if !script.is_file() {
            return Err(LaunchError::ScriptMissing {
                feature: feature.name,
                path: script,
            });
        }

        let child = self
            .command(feature.name)
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                feature: feature.name,
                program: self.program.clone(),
                source,
            })?;

        let handle = ProcessHandle::spawn(feature.name, generation, child, exit_tx);
        match handle.pid() {
            Some(pid) => log!("launch"; "{} started (pid {})", feature.name, pid),
            None => log!("launch"; "{} started", feature.name),
        }
        debug!("launch"; "{} {}", self.program, self.command_args(feature.name).join(" "));
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config() -> LauncherConfig {
        LauncherConfig {
            program: "python3".into(),
            args: vec!["-m".into(), "backend.features.$FEATURE".into()],
            script: "backend/features/$FEATURE.py".into(),
        }
    }

    #[test]
    fn test_resolve_args() {
        let mut vars = FxHashMap::default();
        vars.insert("FEATURE".to_string(), "night_limit".to_string());
        vars.insert("ROOT".to_string(), "/app".to_string());

        let args = vec![
            "-m".to_string(),
            "backend.features.$FEATURE".to_string(),
            "--root=$ROOT".to_string(),
            "$UNKNOWN".to_string(),
        ];
        assert_eq!(
            resolve_args(&args, &vars),
            vec!["-m", "backend.features.night_limit", "--root=/app", "$UNKNOWN"]
        );
    }

    #[test]
    fn test_longer_names_win() {
        let mut vars = FxHashMap::default();
        vars.insert("ROOT".to_string(), "/a".to_string());
        vars.insert("ROOTDIR".to_string(), "/b".to_string());
        assert_eq!(resolve_args(&["$ROOTDIR".to_string()], &vars), vec!["/b"]);
    }

    #[test]
    fn test_script_path_and_args() {
        let launcher = Launcher::new("/app", "/app/settings.json", &config());
        assert_eq!(
            launcher.script_path("daily_limit"),
            PathBuf::from("/app/backend/features/daily_limit.py")
        );
        assert_eq!(
            launcher.command_args("daily_limit"),
            vec!["-m", "backend.features.daily_limit"]
        );

        let script_arg = LauncherConfig {
            args: vec!["$SCRIPT".into()],
            ..config()
        };
        let launcher = Launcher::new("/app", "/app/settings.json", &script_arg);
        assert_eq!(
            launcher.command_args("night_limit"),
            vec!["/app/backend/features/night_limit.py"]
        );
    }

    #[tokio::test]
    async fn test_missing_script_is_launch_error() {
        let dir = TempDir::new().unwrap();
        let launcher = Launcher::new(dir.path(), dir.path().join("settings.json"), &config());
        let (exit_tx, _exit_rx) = tokio::sync::mpsc::unbounded_channel();
        let feature = crate::feature::find("break_reminders").unwrap();

        let err = launcher.spawn(feature, 1, exit_tx).unwrap_err();
        assert!(matches!(err, LaunchError::ScriptMissing { feature: "break_reminders", .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_launch_runs_in_root_with_env() {
        let dir = TempDir::new().unwrap();
        let features = dir.path().join("backend").join("features");
        std::fs::create_dir_all(&features).unwrap();
        std::fs::write(
            features.join("night_limit.py"),
            "[ \"$EYEWARD_FEATURE\" = night_limit ] && [ -f backend/features/night_limit.py ] || exit 9\n",
        )
        .unwrap();

        let launcher = Launcher::new(
            dir.path(),
            dir.path().join("settings.json"),
            &LauncherConfig {
                program: "sh".into(),
                args: vec!["$SCRIPT".into()],
                script: "backend/features/$FEATURE.py".into(),
            },
        );
        let (exit_tx, mut exit_rx) = tokio::sync::mpsc::unbounded_channel();
        let feature = crate::feature::find("night_limit").unwrap();

        let handle = launcher.spawn(feature, 3, exit_tx).unwrap();
        assert_eq!(handle.generation(), 3);

        let notice = exit_rx.recv().await.unwrap();
        assert_eq!(notice.feature, "night_limit");
        assert_eq!(notice.report.code, Some(0));
    }
}

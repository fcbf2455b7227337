//! Feature-specific cleanup run after a feature's process is stopped.

use super::StopError;
use crate::debug;
use crate::feature::{FeatureDescriptor, StopHook};
use crate::utils::exec::Cmd;

/// Run `feature`'s stop hook, if it has one, to completion.
///
/// `display_filter_off` is the configured command line for
/// [`StopHook::DisplayFilterOff`]. Its output is discarded.
pub async fn run_stop_hook(
    feature: &'static FeatureDescriptor,
    display_filter_off: &[String],
) -> Result<(), StopError> {
    let Some(hook) = feature.stop_hook else {
        return Ok(());
    };

    match hook {
        StopHook::DisplayFilterOff => {
            if display_filter_off.is_empty() {
                return Err(StopError::EmptyCommand {
                    feature: feature.name,
                });
            }

            debug!("stop"; "{}: running `{}`", feature.name, display_filter_off.join(" "));
            let command = display_filter_off.to_vec();
            let result = tokio::task::spawn_blocking(move || {
                Cmd::from_slice(&command).quiet().run()
            })
            .await;

            match result {
                Ok(Ok(_)) => Ok(()),
                Ok(Err(e)) => Err(StopError::Failed {
                    feature: feature.name,
                    message: format!("{e:#}"),
                }),
                Err(e) => Err(StopError::Failed {
                    feature: feature.name,
                    message: e.to_string(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::find;

    fn cmd(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_feature_without_hook_is_noop() {
        let feature = find("night_limit").unwrap();
        assert!(run_stop_hook(feature, &[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_command_is_error() {
        let feature = find("blue_light_filter").unwrap();
        let err = run_stop_hook(feature, &[]).await.unwrap_err();
        assert!(matches!(err, StopError::EmptyCommand { .. }));
    }

    #[tokio::test]
    async fn test_missing_command_is_error() {
        let feature = find("blue_light_filter").unwrap();
        let err = run_stop_hook(feature, &cmd(&["eyeward-missing-nightlight", "off"]))
            .await
            .unwrap_err();
        assert!(matches!(err, StopError::Failed { feature: "blue_light_filter", .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_command() {
        let feature = find("blue_light_filter").unwrap();
        assert!(run_stop_hook(feature, &cmd(&["true"])).await.is_ok());
        assert!(run_stop_hook(feature, &cmd(&["false"])).await.is_err());
    }
}

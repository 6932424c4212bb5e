//! Human-readable explanations for typed failures.

/// Map an eyre::Report to an explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use groover_core::error::{BuildError, CoreError};

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingDrive => {
                "What happened: No motor driver was provided to the conductor.\nLikely causes: Hardware drive failed to initialize or was not wired into the builder.\nHow to fix: Ensure the H-bridge driver is created successfully and passed via with_drive(...).".to_string()
            }
            BuildError::MissingLink => {
                "What happened: No command link was provided to the conductor.\nLikely causes: UART failed to open or was not wired into the builder.\nHow to fix: Check the serial device path and pass the link via with_link(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(ce) = err.downcast_ref::<CoreError>() {
        return match ce {
            CoreError::Hardware(msg) | CoreError::HardwareFault(msg) => format!(
                "What happened: A peripheral failed mid-run ({msg}).\nLikely causes: Wiring, power, or a disconnected sensor.\nHow to fix: The wheels were braked on exit; check connections and rerun."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level debug or set RUST_LOG for more detail."
            ),
        };
    }

    // Fallback for config/init errors
    let msg = err.to_string();
    if msg.contains("config") {
        return format!(
            "What happened: {msg}.\nHow to fix: Check the --config path and the TOML syntax."
        );
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use groover_core::error::BuildError;

    #[test]
    fn typed_build_errors_get_fix_hints() {
        let report = eyre::Report::new(BuildError::MissingDrive);
        let text = humanize(&report);
        assert!(text.contains("How to fix"));
        assert!(text.contains("with_drive"));
    }
}

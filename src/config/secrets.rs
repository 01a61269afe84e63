use tracing::debug;

/// Resolve a secret value. If the value starts with '$', treat it as an
/// environment variable reference and resolve from the environment.
pub fn resolve_secret(value: &str) -> String {
    if let Some(var_name) = value.strip_prefix('$') {
        match std::env::var(var_name) {
            Ok(resolved) => {
                debug!(var = %var_name, "Resolved secret from environment");
                resolved
            }
            Err(_) => {
                debug!(var = %var_name, "Environment variable not set, using literal");
                value.to_string()
            }
        }
    } else {
        value.to_string()
    }
}

/// The process environment is shared across test threads; tests that set
/// or remove variables serialize on this lock.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

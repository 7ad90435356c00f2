//! Environment configuration.

use std::env;

use crate::markup::theme::MarkupTheme;

#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Disable all ANSI styling (`PARLEY_PLAIN=1`).
    pub plain: bool,
    /// Disable syntax highlighting in code blocks (`PARLEY_NO_HIGHLIGHT=1`).
    pub no_highlight: bool,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            plain: env_flag("PARLEY_PLAIN"),
            no_highlight: env_flag("PARLEY_NO_HIGHLIGHT"),
        }
    }

    /// Markup theme honoring the environment toggles.
    pub fn theme(&self) -> MarkupTheme {
        if self.plain {
            return MarkupTheme::plain();
        }
        let mut theme = MarkupTheme::default_ansi();
        if self.no_highlight {
            theme.highlight_code = None;
        }
        theme
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::EnvConfig;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    #[test]
    fn env_defaults_are_false() {
        let _lock = env_lock();
        let _g1 = set_env_guard("PARLEY_PLAIN", None);
        let _g2 = set_env_guard("PARLEY_NO_HIGHLIGHT", None);

        let config = EnvConfig::from_env();
        assert!(!config.plain);
        assert!(!config.no_highlight);
    }

    #[test]
    fn env_flags_set_to_one_enable() {
        let _lock = env_lock();
        let _g1 = set_env_guard("PARLEY_PLAIN", Some("1"));
        let _g2 = set_env_guard("PARLEY_NO_HIGHLIGHT", Some("1"));

        let config = EnvConfig::from_env();
        assert!(config.plain);
        assert!(config.no_highlight);
    }

    #[test]
    fn no_highlight_strips_the_highlighter() {
        let _lock = env_lock();
        let _g1 = set_env_guard("PARLEY_PLAIN", None);
        let _g2 = set_env_guard("PARLEY_NO_HIGHLIGHT", Some("1"));

        let config = EnvConfig::from_env();
        let theme = config.theme();
        assert!(theme.highlight_code.is_none());
    }
}

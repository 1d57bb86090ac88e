//! Integration tests for env/file configuration loading.

#[cfg(test)]
mod integration_tests {
    use crate::config::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Env-var mutation must be serialized: tests run concurrently by default
    // and std::env is process-global.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn load_env_settings_applies_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        let settings = load_env_settings(None).unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.cache_ttr, 7200);
        assert_eq!(settings.cache_timeout, 1000);
    }

    #[test]
    fn load_env_settings_reads_base_file() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gateway.yaml");
        fs::write(&path, "port: 9090\nlog_group: \"from-file\"\n").unwrap();

        let settings = load_env_settings(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(settings.port, 9090);
        assert_eq!(settings.log_group, "from-file");
    }

    #[test]
    fn env_vars_override_base_file() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gateway.yaml");
        fs::write(&path, "port: 9090\n").unwrap();

        unsafe { std::env::set_var("GATEWAY__PORT", "7000") };
        let settings = load_env_settings(Some(path.to_str().unwrap())).unwrap();
        unsafe { std::env::remove_var("GATEWAY__PORT") };

        assert_eq!(settings.port, 7000);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gateway.toml");
        fs::write(&path, "port = 9090\n").unwrap();
        assert!(load_env_settings(Some(path.to_str().unwrap())).is_err());
    }

    #[test]
    fn substitute_env_vars_replaces_braced_refs() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe { std::env::set_var("GW_TEST_SECRET", "sk-abc123") };
        let out = substitute_env_vars("secret: ${GW_TEST_SECRET}");
        unsafe { std::env::remove_var("GW_TEST_SECRET") };
        assert_eq!(out, "secret: sk-abc123");
    }

    #[test]
    fn substitute_env_vars_leaves_missing_refs_untouched() {
        let out = substitute_env_vars("url: ${DEFINITELY_NOT_SET_XYZ}");
        assert_eq!(out, "url: ${DEFINITELY_NOT_SET_XYZ}");
    }
}

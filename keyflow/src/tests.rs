/// Config Testing
#[cfg(test)]
mod config {
    use std::time::Duration;

    use keyflow_core::config::{Command, Config as _, KeyCombo, Store};

    use crate::config::{Config, RonStore};
    use crate::errors::KeyflowError;

    const SAMPLE: &str = r#"
Config(
    debounce_ms: 80,
    shortcuts: [
        (keys: "ctrl + f12", command: VolumeUp),
        (keys: "Shift+Alt+B", command: Execute("notify-send hi")),
    ],
)
"#;

    #[test]
    fn parse_ron_config() {
        let config = Config::try_from(SAMPLE.to_owned()).expect("Failed to parse config.");
        assert_eq!(config.debounce_ms, 80);
        assert!(config.statistics);

        let shortcuts = config.shortcuts();
        assert_eq!(shortcuts.len(), 2);
        assert_eq!(shortcuts[0].keys, KeyCombo::normalize("Ctrl+F12"));
        assert_eq!(shortcuts[0].command, Command::VolumeUp);
        assert_eq!(shortcuts[1].keys.as_str(), "Alt+Shift+B");
        assert_eq!(
            shortcuts[1].command,
            Command::Execute("notify-send hi".to_owned())
        );

        let settings = config.settings();
        assert_eq!(settings.debounce, Duration::from_millis(80));
        assert!(settings.statistics);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::try_from("()".to_owned()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.settings().debounce, Duration::from_millis(50));
    }

    #[test]
    fn reject_garbage() {
        assert!(Config::try_from("Config(shortcuts: [".to_owned()).is_err());
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = RonStore::new(dir.path().join("config.ron"));
        assert!(matches!(store.read(), Err(KeyflowError::NoConfigFound)));
        assert!(Store::load(&store).unwrap().is_empty());
    }

    #[test]
    fn store_round_trip_keeps_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.ron");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, SAMPLE).unwrap();
        let store = RonStore::new(&path);

        let mut shortcuts = store.load().unwrap();
        shortcuts.retain(|shortcut| shortcut.command == Command::VolumeUp);
        store.save(&shortcuts).unwrap();

        let config = store.read().unwrap();
        assert_eq!(config.debounce_ms, 80);
        assert_eq!(config.shortcuts, shortcuts);
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn bind_replaces_same_combo() {
        let mut config = Config::default();
        config.bind("ctrl+f12", Command::VolumeUp).unwrap();
        config.bind("F12 + Ctrl", Command::VolumeMute).unwrap();
        assert_eq!(config.shortcuts.len(), 1);
        assert_eq!(config.shortcuts[0].command, Command::VolumeMute);

        assert!(config.bind("", Command::VolumeUp).is_err());
        assert!(config.bind("Ctrl+A+B", Command::VolumeUp).is_err());
    }

    #[test]
    fn unbind_by_normalized_combo() {
        let mut config = Config::try_from(SAMPLE.to_owned()).unwrap();
        let removed = config.unbind("CTRL+F12").unwrap();
        assert_eq!(removed.command, Command::VolumeUp);
        assert_eq!(config.shortcuts.len(), 1);
        assert!(matches!(
            config.unbind("Ctrl+F12"),
            Err(KeyflowError::ShortcutNotFound(_))
        ));
    }
}

/// Command Line Editing Testing
#[cfg(test)]
mod edit {
    use keyflow_core::config::{Command, KeyCombo, KeyId, Modifier, ModifierSet, Store};
    use keyflow_core::errors::{KeyflowError as CoreError, ValidationError};

    use crate::config::RonStore;
    use crate::errors::KeyflowError;

    #[test]
    fn add_then_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = RonStore::new(dir.path().join("keyflow").join("config.ron"));

        let added = crate::add(&store, "alt+up", "brightness_up").unwrap();
        assert_eq!(added.keys.as_str(), "Alt+Up");
        assert_eq!(added.command, Command::BrightnessUp);

        crate::add(&store, "Ctrl+Alt+T", "execute alacritty").unwrap();
        let config = store.read().unwrap();
        assert_eq!(config.shortcuts.len(), 2);
        assert_eq!(
            config.shortcuts[1].command,
            Command::Execute("alacritty".to_owned())
        );

        let removed = crate::remove(&store, "Up+Alt").unwrap();
        assert_eq!(removed.command, Command::BrightnessUp);
        assert_eq!(store.read().unwrap().shortcuts.len(), 1);
    }

    #[test]
    fn add_rejects_unknown_action() {
        let dir = tempfile::tempdir().unwrap();
        let store = RonStore::new(dir.path().join("config.ron"));
        assert!(crate::add(&store, "Ctrl+F1", "launch rockets").is_err());
        assert!(!store.path().exists());
    }

    #[test]
    fn add_keeps_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ron");
        std::fs::write(&path, "Config(debounce_ms: 80, statistics: false)").unwrap();
        let store = RonStore::new(&path);

        crate::add(&store, "Ctrl+F12", "VolumeUp").unwrap();

        let config = store.read().unwrap();
        assert_eq!(config.debounce_ms, 80);
        assert!(!config.statistics);
        assert_eq!(config.shortcuts.len(), 1);
    }

    #[test]
    fn non_ascii_binding_matches_hook_after_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = RonStore::new(dir.path().join("config.ron"));
        let ctrl = ModifierSet::NONE.with(Modifier::Ctrl);

        for key in ["ß", "é", "ﬀ"] {
            crate::add(&store, &format!("ctrl + {key}"), "VolumeUp").unwrap();
        }

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 3);
        for (shortcut, key) in loaded.iter().zip(["ß", "é", "ﬀ"]) {
            assert_eq!(shortcut.keys, KeyCombo::from_parts(ctrl, &KeyId::new(key)));
        }
    }

    #[test]
    fn missing_shortcut_keeps_its_combo() {
        let err = crate::config::into_core(KeyflowError::ShortcutNotFound("Ctrl+Z".to_owned()));
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::ActionNotFound(combo)) if combo == "Ctrl+Z"
        ));
    }
}

/// Control Handling Testing
#[cfg(test)]
mod control {
    use std::sync::Arc;

    use keyflow_core::hook::ChannelHook;
    use keyflow_core::ipc::Control;
    use keyflow_core::service::HotkeyService;

    use crate::config::{Config, RonStore};

    #[test]
    fn reload_reinstalls_and_forgets_tools() {
        let dir = tempfile::tempdir().unwrap();
        let store = RonStore::new(dir.path().join("config.ron"));
        let config = Config::default();
        let service = HotkeyService::with_config(Arc::new(ChannelHook::new()), &config);
        assert!(service.registry().is_empty());

        crate::add(&store, "Ctrl+F12", "VolumeUp").unwrap();
        assert!(service.launcher().tools().is_available("sh"));
        assert_eq!(service.launcher().tools().cached(), 1);

        crate::handle_control(&service, &store, Control::Reload);

        assert_eq!(service.registry().len(), 1);
        assert_eq!(service.launcher().tools().cached(), 0);
    }

    #[test]
    fn disable_and_enable() {
        let dir = tempfile::tempdir().unwrap();
        let store = RonStore::new(dir.path().join("config.ron"));
        let service =
            HotkeyService::with_config(Arc::new(ChannelHook::new()), &Config::default());

        crate::handle_control(&service, &store, Control::Enable);
        assert!(service.is_active());
        crate::handle_control(&service, &store, Control::Disable);
        assert!(!service.is_active());
        assert!(service.is_hooked());
        crate::handle_control(&service, &store, Control::Enable);
        assert!(service.is_active());
        service.unregister().unwrap();
    }
}

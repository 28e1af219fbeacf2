/* 📖 # End-to-end accessor scenarios

Each test builds a PreferenceAccessor on top of MockPal with a store laid out the
way the host writes it on one platform, then drives it like the UI would: list,
classify, watch, announce its own writes and poll the dirty flag.
*/

#[cfg(test)]
mod accessor_scenario_tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use expect_test::{Expect, expect};
    use prefscope_base::{FilePath, MockPal, PalHandle, RegistryData, RegistryValue};

    use crate::accessor::{PreferenceAccessor, PreferenceEntry};
    use crate::config::AccessorConfig;
    use crate::locator::Platform;
    use crate::partition::KeyOrigin;
    use crate::value::PreferenceValue;

    const PREFS: &str = ".config/unity3d/Acme/Game/prefs";
    const PLIST: &str = "Library/Preferences/unity.Acme.Game.plist";
    const KEY: &str = "SOFTWARE\\Unity\\UnityEditor\\Acme\\Game";

    const LINUX_PREFS: &str = r#"<unity_prefs version_major="1" version_minor="1">
	<pref name="volume" type="float">0.8</pref>
	<pref name="playerName" type="string">Tmlscw==</pref>
	<pref name="level" type="int">3</pref>
	<pref name="unity.cloud_userid" type="string">Y2xvdWQtNw==</pref>
</unity_prefs>
"#;

    const MACOS_PLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
	<key>level</key>
	<integer>3</integer>
	<key>playerName</key>
	<string>Nils</string>
	<key>volume</key>
	<real>0.80000001192092896</real>
	<key>unity.cloud_userid</key>
	<string>cloud-7</string>
</dict>
</plist>
"#;

    fn config(platform: Platform) -> AccessorConfig {
        AccessorConfig::new("Acme", "Game").with_platform(platform)
    }

    fn accessor(mock: &MockPal, config: &AccessorConfig) -> PreferenceAccessor {
        PreferenceAccessor::new(PalHandle::new(mock.clone()), config)
    }

    fn linux_store() -> MockPal {
        let mock = MockPal::new();
        mock.add_file(FilePath::from(PREFS), LINUX_PREFS);
        mock
    }

    fn render(entries: &[PreferenceEntry]) -> String {
        entries
            .iter()
            .map(|e| format!("{:?} {} = {} {}\n", e.origin, e.key, e.value.type_name(), e.value))
            .collect()
    }

    fn check_entries(accessor: &mut PreferenceAccessor, expected: Expect) {
        expected.assert_eq(&render(&accessor.entries(false)));
    }

    fn key_names(accessor: &mut PreferenceAccessor, reload: bool) -> Vec<String> {
        accessor
            .list_keys(reload)
            .into_iter()
            .map(|k| k.as_str().to_string())
            .collect()
    }

    #[test]
    fn test_linux_flat_file_store() {
        let mock = linux_store();
        let mut accessor = accessor(&mock, &config(Platform::Linux));

        assert_eq!(
            key_names(&mut accessor, true),
            ["level", "playerName", "unity.cloud_userid", "volume"]
        );
        assert_eq!(
            accessor.classify_and_read("volume"),
            Some(PreferenceValue::Float(0.8))
        );
        assert_eq!(
            accessor.classify_and_read("playerName"),
            Some(PreferenceValue::String("Nils".to_string()))
        );
        assert_eq!(accessor.classify_and_read("level"), Some(PreferenceValue::Int(3)));
        check_entries(
            &mut accessor,
            expect![[r#"
                UserDefined level = int 3
                UserDefined playerName = string "Nils"
                HostOwned unity.cloud_userid = string "cloud-7"
                UserDefined volume = float 0.8
            "#]],
        );
    }

    #[test]
    fn test_macos_property_list_store() {
        let mock = MockPal::new();
        mock.add_file(FilePath::from(PLIST), MACOS_PLIST);
        let mut accessor = accessor(&mock, &config(Platform::MacOs));

        check_entries(
            &mut accessor,
            expect![[r#"
                UserDefined level = int 3
                UserDefined playerName = string "Nils"
                HostOwned unity.cloud_userid = string "cloud-7"
                UserDefined volume = float 0.8
            "#]],
        );
    }

    #[test]
    fn test_windows_registry_store() {
        let mock = MockPal::new();
        mock.set_registry_values(
            KEY,
            vec![
                RegistryValue::new("volume_h3627519402", RegistryData::Qword(0.8f64.to_bits())),
                RegistryValue::new("playerName_h1116571510", RegistryData::Binary(b"Nils\0".to_vec())),
                RegistryValue::new("level_h187923445", RegistryData::Dword(3)),
                RegistryValue::new("UnityGraphicsQuality_h1669003810", RegistryData::Dword(5)),
            ],
        );
        let mut accessor = accessor(&mock, &config(Platform::Windows));

        check_entries(
            &mut accessor,
            expect![[r#"
                HostOwned UnityGraphicsQuality = int 5
                UserDefined level = int 3
                UserDefined playerName = string "Nils"
                UserDefined volume = float 0.8
            "#]],
        );
    }

    #[test]
    fn test_missing_store_is_empty_and_idle() {
        let mock = MockPal::new();
        let mut accessor = accessor(&mock, &config(Platform::Linux));
        assert!(accessor.list_keys(true).is_empty());
        assert!(accessor.entries(true).is_empty());
        assert!(!accessor.is_stale());
        assert!(!accessor.is_monitoring());
    }

    #[test]
    fn test_unsupported_platform_is_inert() {
        let mock = MockPal::new();
        let mut accessor = accessor(&mock, &config(Platform::Unsupported("haiku".into())));
        assert!(!accessor.descriptor().is_supported());
        assert!(accessor.list_keys(true).is_empty());
        assert!(!accessor.start_monitoring());
        assert!(!accessor.is_monitoring());
        assert_eq!(accessor.classify_and_read("volume"), None);
    }

    #[test]
    fn test_new_key_visible_only_after_reload() {
        let mock = linux_store();
        let mut accessor = accessor(&mock, &config(Platform::Linux));
        mock.add_file(
            FilePath::from(PREFS),
            LINUX_PREFS.replace(
                "</unity_prefs>",
                "\t<pref name=\"difficulty\" type=\"int\">2</pref>\n</unity_prefs>",
            ),
        );

        assert!(!key_names(&mut accessor, false).contains(&"difficulty".to_string()));
        assert_eq!(accessor.list_keys(false), accessor.list_keys(false));
        assert!(key_names(&mut accessor, true).contains(&"difficulty".to_string()));
        assert_eq!(
            accessor.classify_and_read("difficulty"),
            Some(PreferenceValue::Int(2))
        );
    }

    #[test]
    fn test_half_written_store_keeps_last_snapshot() {
        let mock = linux_store();
        let mut accessor = accessor(&mock, &config(Platform::Linux));
        let cut = LINUX_PREFS.find("<pref name=\"level\"").unwrap_or(LINUX_PREFS.len());
        mock.add_file(FilePath::from(PREFS), &LINUX_PREFS[..cut]);

        assert_eq!(accessor.list_keys(true).len(), 4);
        assert!(accessor.is_stale());
        assert_eq!(accessor.classify_and_read("level"), Some(PreferenceValue::Int(3)));

        mock.add_file(FilePath::from(PREFS), LINUX_PREFS);
        accessor.list_keys(true);
        assert!(!accessor.is_stale());
    }

    #[test]
    fn test_own_write_is_suppressed_external_write_is_not() {
        let mock = linux_store();
        let mut accessor = accessor(&mock, &config(Platform::Linux));
        let wakeups = Arc::new(AtomicUsize::new(0));
        let counter = wakeups.clone();
        accessor.on_change(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert!(accessor.start_monitoring());

        // The UI writes through the host API, which rewrites the prefs file.
        accessor.ignore_next_change();
        mock.trigger_change(&FilePath::from(PREFS));
        assert!(!accessor.take_pending_change());
        assert_eq!(wakeups.load(Ordering::SeqCst), 0);

        mock.trigger_change(&FilePath::from(PREFS));
        assert_eq!(wakeups.load(Ordering::SeqCst), 1);
        assert!(accessor.take_pending_change());
        assert!(!accessor.take_pending_change());
    }

    #[test]
    fn test_stop_monitoring_silences_changes() {
        let mock = linux_store();
        let mut accessor = accessor(&mock, &config(Platform::Linux).with_watch_on_start(true));
        assert!(accessor.is_monitoring());
        let signal = accessor.change_signal();

        accessor.stop_monitoring();
        assert!(!accessor.is_monitoring());
        assert_eq!(mock.trigger_change(&FilePath::from(PREFS)), 0);
        assert!(!signal.is_pending());
    }

    #[test]
    fn test_dirty_flag_drives_reload() {
        let mock = linux_store();
        let mut accessor = accessor(&mock, &config(Platform::Linux).with_watch_on_start(true));
        mock.add_file(
            FilePath::from(PREFS),
            r#"<unity_prefs><pref name="level" type="int">4</pref></unity_prefs>"#,
        );
        mock.trigger_change(&FilePath::from(PREFS));

        assert!(accessor.take_pending_change());
        let entries = accessor.entries(true);
        assert_eq!(
            entries,
            vec![PreferenceEntry {
                key: "level".into(),
                value: PreferenceValue::Int(4),
                origin: KeyOrigin::UserDefined,
            }]
        );
    }

    #[test]
    fn test_watch_on_start_without_permission_stays_idle() {
        let mock = linux_store();
        mock.deny_watches(true);
        let accessor = accessor(&mock, &config(Platform::Linux).with_watch_on_start(true));
        assert!(!accessor.is_monitoring());
    }

    #[test]
    fn test_dropping_accessor_stops_monitoring() {
        let mock = linux_store();
        {
            let _accessor = accessor(&mock, &config(Platform::Linux).with_watch_on_start(true));
            assert_eq!(mock.active_watch_count(), 1);
        }
        assert_eq!(mock.active_watch_count(), 0);
    }
}

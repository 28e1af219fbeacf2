use tracing::{debug, instrument};

use prefscope_base::{FilePath, PalHandle, PrefsError, PrefsResult, ResultExt};

use super::{StoreBackend, StoreSnapshot};
use crate::value::StoredValue;

/// Reads the property list the host keeps on macOS. Both XML and binary plists
/// are accepted; the root must be a dictionary.
#[derive(Debug)]
pub struct PropertyListBackend {
    path: FilePath,
}

impl PropertyListBackend {
    pub fn new(path: FilePath) -> Self {
        Self { path }
    }
}

impl StoreBackend for PropertyListBackend {
    fn name(&self) -> &'static str {
        "plist"
    }

    #[instrument(skip(self, pal), fields(path = %self.path))]
    fn load(&self, pal: &PalHandle) -> PrefsResult<Option<StoreSnapshot>> {
        let reader = match pal.read_file(&self.path) {
            Ok(reader) => reader,
            Err(e) if e.kind().is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };
        let root = plist::Value::from_reader(reader)
            .map_err(|e| Box::new(PrefsError::parse("property list", e.to_string())))
            .with_context(|| format!("reading {}", self.path))?;
        snapshot_from_value(root)
            .with_context(|| format!("reading {}", self.path))
            .map(Some)
    }
}

fn snapshot_from_value(root: plist::Value) -> PrefsResult<StoreSnapshot> {
    let plist::Value::Dictionary(dictionary) = root else {
        return Err(Box::new(PrefsError::parse(
            "property list",
            "root element is not a dictionary",
        )));
    };
    let mut snapshot = StoreSnapshot::new();
    for (key, value) in dictionary {
        let stored = stored_value(&value);
        debug!(%key, ?stored, "plist entry");
        snapshot.insert(key, stored);
    }
    Ok(snapshot)
}

fn stored_value(value: &plist::Value) -> StoredValue {
    match value {
        plist::Value::String(s) => StoredValue::String(s.clone()),
        plist::Value::Integer(i) => match i.as_signed().and_then(|i| i32::try_from(i).ok()) {
            Some(i) => StoredValue::Int(i),
            None => StoredValue::Other {
                type_name: "integer".to_string(),
            },
        },
        plist::Value::Real(f) => StoredValue::Float(*f as f32),
        plist::Value::Boolean(_) => other("boolean"),
        plist::Value::Data(_) => other("data"),
        plist::Value::Date(_) => other("date"),
        plist::Value::Array(_) => other("array"),
        plist::Value::Dictionary(_) => other("dictionary"),
        _ => other("unknown"),
    }
}

fn other(type_name: &str) -> StoredValue {
    StoredValue::Other {
        type_name: type_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::classify_and_read;
    use crate::value::PreferenceValue;
    use prefscope_base::MockPal;

    const PATH: &str = "Library/Preferences/unity.Acme.Game.plist";

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>level</key>
	<integer>3</integer>
	<key>playerName</key>
	<string>Nils</string>
	<key>volume</key>
	<real>0.80000001192092896</real>
	<key>muted</key>
	<true/>
	<key>huge</key>
	<integer>9000000000</integer>
</dict>
</plist>
"#;

    fn load(content: &str) -> PrefsResult<Option<StoreSnapshot>> {
        let mock = MockPal::new();
        mock.add_file(FilePath::from(PATH), content);
        PropertyListBackend::new(FilePath::from(PATH)).load(&PalHandle::new(mock))
    }

    #[test]
    fn test_load_sample() {
        let snapshot = load(SAMPLE).unwrap().unwrap();
        assert_eq!(snapshot.len(), 5);
        assert_eq!(snapshot.get("level"), Some(&StoredValue::Int(3)));
        assert_eq!(
            snapshot.get("playerName"),
            Some(&StoredValue::String("Nils".to_string()))
        );
        assert_eq!(snapshot.get("volume"), Some(&StoredValue::Float(0.8)));
        assert_eq!(snapshot.get("muted"), Some(&other("boolean")));
        assert_eq!(snapshot.get("huge"), Some(&other("integer")));
    }

    #[test]
    fn test_classification_of_sample() {
        let snapshot = load(SAMPLE).unwrap().unwrap();
        assert_eq!(
            classify_and_read(&snapshot, "volume"),
            Some(PreferenceValue::Float(0.8))
        );
        assert_eq!(
            classify_and_read(&snapshot, "level"),
            Some(PreferenceValue::Int(3))
        );
        assert_eq!(classify_and_read(&snapshot, "muted"), None);
    }

    #[test]
    fn test_missing_file_is_none() {
        let backend = PropertyListBackend::new(FilePath::from(PATH));
        assert_eq!(backend.load(&PalHandle::new(MockPal::new())).unwrap(), None);
    }

    #[test]
    fn test_truncated_plist_is_a_parse_error() {
        let truncated = &SAMPLE[..SAMPLE.len() / 2];
        let err = load(truncated).unwrap_err();
        assert!(matches!(
            err.kind(),
            prefscope_base::ErrorKind::Parse { .. }
        ));
        assert_eq!(err.get_context(), [format!("reading {}", PATH)]);
        assert!(load("").is_err());
    }

    #[test]
    fn test_non_dictionary_root_is_rejected() {
        let err = load(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0"><array><string>x</string></array></plist>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("not a dictionary"));
    }
}

/* 📖 # How is a value's type recovered without type metadata?

The host preference API offers one getter per type, and each getter returns the
caller's default both when the key is absent and when it holds another type.
Classification therefore asks each getter in turn with a default that no real
value should ever equal, and keeps the first answer that is not the default:

1. string, with a reserved marker string as default
2. float, with NaN as default
3. int, with `i32::MIN` as default

String goes first because no numeric default can tell "absent" apart from "is a
string". If all three getters return their default the key is left out.

Known limitation: a stored string equal to STRING_SENTINEL, a stored NaN float or
a stored int equal to INT_SENTINEL cannot be told apart from "absent", so the key
is omitted. This mirrors the host behaviour and is not worked around.
*/

use tracing::trace;

use crate::value::PreferenceValue;

/// Default passed to the string getter. Chosen to never occur as a real value.
pub const STRING_SENTINEL: &str = "<prefscope_absent_9c1f6e2a-4b7d-4e3a-8f05-d2b7a1c4e968>";

/// Default passed to the int getter.
pub const INT_SENTINEL: i32 = i32::MIN;

/// Per-type getters with caller-supplied defaults, as exposed by the host
/// preference API. Each getter returns `default` when the key is missing or
/// stored under a different type.
pub trait PreferenceLookup {
    fn get_string(&self, key: &str, default: &str) -> String;
    fn get_float(&self, key: &str, default: f32) -> f32;
    fn get_int(&self, key: &str, default: i32) -> i32;
}

/// Determine the type of `key` by sentinel probing and return its value.
///
/// Returns `None` if the key is absent or none of the typed getters can read it.
pub fn classify_and_read(lookup: &(impl PreferenceLookup + ?Sized), key: &str) -> Option<PreferenceValue> {
    let s = lookup.get_string(key, STRING_SENTINEL);
    if s != STRING_SENTINEL {
        return Some(PreferenceValue::String(s));
    }

    let f = lookup.get_float(key, f32::NAN);
    if !f.is_nan() {
        return Some(PreferenceValue::Float(f));
    }

    let i = lookup.get_int(key, INT_SENTINEL);
    if i != INT_SENTINEL {
        return Some(PreferenceValue::Int(i));
    }

    trace!(key, "key is not classifiable");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct CountingLookup {
        values: HashMap<String, PreferenceValue>,
        string_calls: Cell<usize>,
        float_calls: Cell<usize>,
        int_calls: Cell<usize>,
    }

    impl CountingLookup {
        fn with(key: &str, value: PreferenceValue) -> Self {
            let mut lookup = Self::default();
            lookup.values.insert(key.to_string(), value);
            lookup
        }

        fn calls(&self) -> (usize, usize, usize) {
            (
                self.string_calls.get(),
                self.float_calls.get(),
                self.int_calls.get(),
            )
        }
    }

    impl PreferenceLookup for CountingLookup {
        fn get_string(&self, key: &str, default: &str) -> String {
            self.string_calls.set(self.string_calls.get() + 1);
            match self.values.get(key) {
                Some(PreferenceValue::String(s)) => s.clone(),
                _ => default.to_string(),
            }
        }

        fn get_float(&self, key: &str, default: f32) -> f32 {
            self.float_calls.set(self.float_calls.get() + 1);
            match self.values.get(key) {
                Some(PreferenceValue::Float(f)) => *f,
                _ => default,
            }
        }

        fn get_int(&self, key: &str, default: i32) -> i32 {
            self.int_calls.set(self.int_calls.get() + 1);
            match self.values.get(key) {
                Some(PreferenceValue::Int(i)) => *i,
                _ => default,
            }
        }
    }

    #[test]
    fn test_string_stops_after_first_probe() {
        let lookup = CountingLookup::with("playerName", PreferenceValue::String("Nils".into()));
        assert_eq!(
            classify_and_read(&lookup, "playerName"),
            Some(PreferenceValue::String("Nils".into()))
        );
        assert_eq!(lookup.calls(), (1, 0, 0));
    }

    #[test]
    fn test_empty_string_is_a_string() {
        let lookup = CountingLookup::with("empty", PreferenceValue::String(String::new()));
        assert_eq!(
            classify_and_read(&lookup, "empty"),
            Some(PreferenceValue::String(String::new()))
        );
    }

    #[test]
    fn test_float_is_bit_exact() {
        for value in [0.8_f32, 0.1, -0.0, f32::MAX, f32::MIN_POSITIVE, 1e-42] {
            let lookup = CountingLookup::with("volume", PreferenceValue::Float(value));
            match classify_and_read(&lookup, "volume") {
                Some(PreferenceValue::Float(read)) => assert_eq!(read.to_bits(), value.to_bits()),
                other => panic!("expected float, got {:?}", other),
            }
            assert_eq!(lookup.calls(), (1, 1, 0));
        }
    }

    #[test]
    fn test_int_after_string_and_float() {
        let lookup = CountingLookup::with("level", PreferenceValue::Int(3));
        assert_eq!(classify_and_read(&lookup, "level"), Some(PreferenceValue::Int(3)));
        assert_eq!(lookup.calls(), (1, 1, 1));
    }

    #[test]
    fn test_absent_key_is_omitted() {
        let lookup = CountingLookup::default();
        assert_eq!(classify_and_read(&lookup, "missing"), None);
        assert_eq!(lookup.calls(), (1, 1, 1));
    }

    #[test]
    fn test_sentinel_collisions_are_omitted() {
        let lookup = CountingLookup::with("marker", PreferenceValue::String(STRING_SENTINEL.into()));
        assert_eq!(classify_and_read(&lookup, "marker"), None);

        let lookup = CountingLookup::with("min", PreferenceValue::Int(i32::MIN));
        assert_eq!(classify_and_read(&lookup, "min"), None);

        let lookup = CountingLookup::with("nan", PreferenceValue::Float(f32::NAN));
        assert_eq!(classify_and_read(&lookup, "nan"), None);
    }

    #[test]
    fn test_int_next_to_sentinel_is_classified() {
        let lookup = CountingLookup::with("almost", PreferenceValue::Int(i32::MIN + 1));
        assert_eq!(
            classify_and_read(&lookup, "almost"),
            Some(PreferenceValue::Int(i32::MIN + 1))
        );
    }
}

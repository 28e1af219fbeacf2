use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, instrument};

use prefscope_base::{FilePath, PalHandle, PrefsError, PrefsResult, ResultExt};

use super::{StoreBackend, StoreSnapshot};
use crate::value::StoredValue;

const ROOT_ELEMENT: &[u8] = b"unity_prefs";
const PREF_ELEMENT: &[u8] = b"pref";

/// Reads the flat prefs file used on Linux:
///
/// ```text
/// <unity_prefs version_major="1" version_minor="1">
///     <pref name="playerName" type="string">Tmlscw==</pref>
///     <pref name="level" type="int">3</pref>
/// </unity_prefs>
/// ```
///
/// String values are base64 encoded from format version 1.1 on. Files without a
/// version, or with an older one, hold them as plain text.
#[derive(Debug)]
pub struct FlatFileBackend {
    path: FilePath,
}

impl FlatFileBackend {
    pub fn new(path: FilePath) -> Self {
        Self { path }
    }
}

impl StoreBackend for FlatFileBackend {
    fn name(&self) -> &'static str {
        "flat-file"
    }

    #[instrument(skip(self, pal), fields(path = %self.path))]
    fn load(&self, pal: &PalHandle) -> PrefsResult<Option<StoreSnapshot>> {
        let text = match pal.read_file_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind().is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };
        parse_prefs(&text)
            .with_context(|| format!("reading {}", self.path))
            .map(Some)
    }
}

/// How `type="string"` values are written, decided by the root element's version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringEncoding {
    Plain,
    Base64,
}

/// First format version with base64 encoded strings.
const BASE64_SINCE: (u32, u32) = (1, 1);

/// A `<pref>` element collected while scanning.
struct PendingPref {
    name: String,
    type_name: Option<String>,
    text: String,
}

fn parse_error(message: impl std::fmt::Display) -> Box<PrefsError> {
    Box::new(PrefsError::parse("prefs file", message.to_string()))
}

/// Parse the prefs document. A document that ends before `</unity_prefs>` is
/// rejected, since that is what a file caught mid-write looks like.
pub(crate) fn parse_prefs(text: &str) -> PrefsResult<StoreSnapshot> {
    let mut reader = Reader::from_str(text);
    let mut snapshot = StoreSnapshot::new();
    let mut pending: Option<PendingPref> = None;
    let mut encoding = StringEncoding::Plain;
    let mut saw_root = false;
    let mut closed_root = false;

    loop {
        match reader.read_event().map_err(parse_error)? {
            Event::Start(e) if e.name().as_ref() == ROOT_ELEMENT => {
                saw_root = true;
                encoding = string_encoding(&e)?;
            }
            Event::Empty(e) if e.name().as_ref() == ROOT_ELEMENT => {
                saw_root = true;
                closed_root = true;
            }
            Event::End(e) if e.name().as_ref() == ROOT_ELEMENT => closed_root = true,
            Event::Start(e) if e.name().as_ref() == PREF_ELEMENT => {
                pending = Some(pref_from_element(&e)?);
            }
            Event::Empty(e) if e.name().as_ref() == PREF_ELEMENT => {
                let pref = pref_from_element(&e)?;
                insert_pref(&mut snapshot, pref, encoding);
            }
            Event::Text(t) => {
                if let Some(pref) = pending.as_mut() {
                    pref.text.push_str(&t.unescape().map_err(parse_error)?);
                }
            }
            Event::CData(t) => {
                if let Some(pref) = pending.as_mut() {
                    pref.text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::End(e) if e.name().as_ref() == PREF_ELEMENT => {
                if let Some(pref) = pending.take() {
                    insert_pref(&mut snapshot, pref, encoding);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root || !closed_root {
        return Err(parse_error("document ends before </unity_prefs>"));
    }
    Ok(snapshot)
}

fn string_encoding(root: &BytesStart<'_>) -> PrefsResult<StringEncoding> {
    let mut major = None;
    let mut minor = None;
    for attribute in root.attributes() {
        let attribute = attribute.map_err(parse_error)?;
        let value = attribute.unescape_value().map_err(parse_error)?;
        match attribute.key.as_ref() {
            b"version_major" => major = value.trim().parse::<u32>().ok(),
            b"version_minor" => minor = value.trim().parse::<u32>().ok(),
            _ => {}
        }
    }
    match (major, minor) {
        (Some(major), minor) if (major, minor.unwrap_or(0)) >= BASE64_SINCE => {
            Ok(StringEncoding::Base64)
        }
        _ => Ok(StringEncoding::Plain),
    }
}

fn pref_from_element(element: &BytesStart<'_>) -> PrefsResult<PendingPref> {
    let mut name = None;
    let mut type_name = None;
    for attribute in element.attributes() {
        let attribute = attribute.map_err(parse_error)?;
        let value = attribute.unescape_value().map_err(parse_error)?.into_owned();
        match attribute.key.as_ref() {
            b"name" => name = Some(value),
            b"type" => type_name = Some(value),
            _ => {}
        }
    }
    let name = name.ok_or_else(|| parse_error("<pref> without name attribute"))?;
    Ok(PendingPref {
        name,
        type_name,
        text: String::new(),
    })
}

fn insert_pref(snapshot: &mut StoreSnapshot, pref: PendingPref, encoding: StringEncoding) {
    let value = match pref.type_name.as_deref() {
        Some("string") => match encoding {
            StringEncoding::Plain => StoredValue::String(pref.text),
            StringEncoding::Base64 => match decode_base64(&pref.text) {
                Some(s) => StoredValue::String(s),
                None => StoredValue::Other {
                    type_name: "string".to_string(),
                },
            },
        },
        Some("int") => match pref.text.trim().parse::<i32>() {
            Ok(i) => StoredValue::Int(i),
            Err(_) => StoredValue::Other {
                type_name: "int".to_string(),
            },
        },
        Some("float") => match pref.text.trim().parse::<f32>() {
            Ok(f) => StoredValue::Float(f),
            Err(_) => StoredValue::Other {
                type_name: "float".to_string(),
            },
        },
        Some(other) => StoredValue::Other {
            type_name: other.to_string(),
        },
        None => infer_untyped(&pref.text),
    };
    debug!(key = %pref.name, ?value, "pref record");
    snapshot.insert(pref.name, value);
}

fn decode_base64(text: &str) -> Option<String> {
    let bytes = STANDARD.decode(text.trim()).ok()?;
    String::from_utf8(bytes).ok()
}

/// Records without a type attribute: int if the text parses as one, then float,
/// otherwise string.
fn infer_untyped(text: &str) -> StoredValue {
    let trimmed = text.trim();
    if let Ok(i) = trimmed.parse::<i32>() {
        return StoredValue::Int(i);
    }
    match trimmed.parse::<f32>() {
        Ok(f) if f.is_finite() => StoredValue::Float(f),
        _ => StoredValue::String(text.to_string()),
    }
}

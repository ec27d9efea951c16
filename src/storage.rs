//! Macro persistence: JSON (de)serialization plus a small on-disk
//! library of saved macros.
//!
//! The persisted shape is the classic flat format: macro metadata at the
//! top, one object per event tagged by `event_type`. Loading is atomic —
//! a malformed record yields a [`FormatError`] and installs nothing.
//!
//! [`FormatError`]: crate::error::Error::Format

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::event::Macro;

/// Serialize a macro to pretty-printed JSON.
pub fn to_json(mac: &Macro) -> Result<String> {
    Ok(serde_json::to_string_pretty(mac)?)
}

/// Parse a macro from JSON.
///
/// Unknown fields are ignored and missing optional fields take their
/// defaults, so records written by newer versions still load. Missing
/// required fields or an unrecognized `event_type` fail the whole parse.
pub fn from_json(json: &str) -> Result<Macro> {
    let mac: Macro = serde_json::from_str(json)?;
    validate(&mac)?;
    Ok(mac)
}

/// Write a macro to a file as JSON.
pub fn save(mac: &Macro, path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, mac)?;
    writer.flush()?;
    Ok(())
}

/// Read a macro back from a file.
pub fn load(path: impl AsRef<Path>) -> Result<Macro> {
    let file = File::open(path)?;
    let mac: Macro = serde_json::from_reader(BufReader::new(file))?;
    validate(&mac)?;
    Ok(mac)
}

fn validate(mac: &Macro) -> Result<()> {
    if mac.name.is_empty() {
        return Err(Error::Format("macro name must not be empty".into()));
    }
    Ok(())
}

/// Directory of saved macros, one JSON file each.
pub struct MacroStore {
    dir: PathBuf,
}

impl MacroStore {
    /// Store under `$HOME/.mousemacro`.
    pub fn new() -> Result<Self> {
        let home = std::env::var("HOME")
            .map_err(|_| Error::Format("HOME not set; use MacroStore::with_dir".into()))?;
        Self::with_dir(PathBuf::from(home).join(".mousemacro"))
    }

    pub fn with_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Save under a sanitized, timestamped filename. Returns the path
    /// written.
    pub fn save(&self, mac: &Macro) -> Result<PathBuf> {
        let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let filename = format!("{}_{}.json", sanitize(&mac.name), stamp);
        let path = self.dir.join(filename);
        save(mac, &path)?;
        Ok(path)
    }

    pub fn load(&self, filename: &str) -> Result<Macro> {
        load(self.dir.join(filename))
    }

    /// Saved macro filenames, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let name = entry?.file_name();
            if let Some(s) = name.to_str() {
                if s.ends_with(".json") {
                    files.push(s.to_string());
                }
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn delete(&self, filename: &str) -> Result<()> {
        fs::remove_file(self.dir.join(filename))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{MouseButton, MouseEvent};

    fn sample() -> Macro {
        Macro::new(
            "demo",
            1_700_000_000.5,
            "three step click",
            vec![
                MouseEvent::moved(0.0, 10, 10),
                MouseEvent::clicked(0.10, 10, 10, MouseButton::Left, true),
                MouseEvent::clicked(0.15, 10, 10, MouseButton::Left, false),
                MouseEvent::scrolled(0.9, 10, 10, 0, -3),
            ],
        )
    }

    #[test]
    fn round_trip_preserves_every_field() {
        let mac = sample();
        let back = from_json(&to_json(&mac).unwrap()).unwrap();
        assert_eq!(back, mac);
    }

    #[test]
    fn round_trip_of_empty_macro() {
        let mac = Macro::new("empty", 0.0, "", Vec::new());
        let back = from_json(&to_json(&mac).unwrap()).unwrap();
        assert_eq!(back, mac);
    }

    #[test]
    fn missing_optional_fields_default() {
        let mac = from_json(r#"{"name":"bare"}"#).unwrap();
        assert_eq!(mac.name, "bare");
        assert_eq!(mac.description, "");
        assert_eq!(mac.version, crate::event::FORMAT_VERSION);
        assert_eq!(mac.created_at, 0.0);
        assert!(mac.events.is_empty());
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let mac = from_json(r#"{"name":"fwd","color":"blue","events":[]}"#).unwrap();
        assert_eq!(mac.name, "fwd");
    }

    #[test]
    fn missing_name_is_format_error() {
        let err = from_json(r#"{"events":[]}"#).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn empty_name_is_format_error() {
        let err = from_json(r#"{"name":"","events":[]}"#).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn malformed_event_kind_is_format_error() {
        let err = from_json(
            r#"{"name":"bad","events":[{"timestamp":0.0,"event_type":"teleport","x":1,"y":2}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.json");
        let mac = sample();
        save(&mac, &path).unwrap();
        assert_eq!(load(&path).unwrap(), mac);
    }

    #[test]
    fn store_save_list_load_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = MacroStore::with_dir(dir.path()).unwrap();

        let mac = Macro::new("my macro!", 1.0, "", vec![MouseEvent::moved(0.0, 0, 0)]);
        let path = store.save(&mac).unwrap();
        let filename = path.file_name().unwrap().to_str().unwrap().to_string();
        // Punctuation sanitized out of the filename.
        assert!(filename.starts_with("my_macro_"));

        assert_eq!(store.list().unwrap(), vec![filename.clone()]);
        assert_eq!(store.load(&filename).unwrap(), mac);

        store.delete(&filename).unwrap();
        assert!(store.list().unwrap().is_empty());
    }
}

//! A minimal reader for Java-style `.properties` files.
//!
//! Only the subset used by machine-id configuration files is supported:
//! one `key=value` or `key: value` pair per line, `#` and `!` comment lines,
//! and whitespace trimmed around keys and values. Line continuations and
//! unicode escapes are not interpreted.

use std::{collections::HashMap, fs, io, path::Path};

/// Parsed key/value pairs of a properties file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: HashMap<String, String>,
}

impl Properties {
    /// Parses properties from text. Later duplicates win.
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
            .map(|line| match line.find(['=', ':']) {
                Some(at) => (line[..at].trim(), line[at + 1..].trim()),
                None => (line, ""),
            })
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Self { entries }
    }

    /// Reads and parses the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        fs::read_to_string(path).map(|text| Self::parse(&text))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_separators_and_skips_comments() {
        let props = Properties::parse(
            "# machine settings\n\
             ! legacy comment\n\
             machineId = 12\n\
             env:PRO\n\
             \n\
             empty\n",
        );
        assert_eq!(props.get("machineId"), Some("12"));
        assert_eq!(props.get("env"), Some("PRO"));
        assert_eq!(props.get("empty"), Some(""));
        assert_eq!(props.len(), 3);
    }

    #[test]
    fn later_duplicates_override_earlier_ones() {
        let props = Properties::parse("machineId=1\nmachineId=2");
        assert_eq!(props.get("machineId"), Some("2"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Properties::load("/definitely/not/here/idgen.properties").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}

use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use crate::error::DetectError;

/// Class names indexed by class id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    names: Vec<String>,
}

impl LabelTable {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Loads a newline-delimited label file. Surrounding whitespace is
    /// trimmed and blank lines are skipped.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DetectError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| DetectError::LabelLoad {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file).map_err(|source| DetectError::LabelLoad {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_reader<R: Read>(reader: R) -> std::io::Result<Self> {
        let mut names = Vec::new();
        for line in BufReader::new(reader).lines() {
            let line = line?;
            let name = line.trim();
            if !name.is_empty() {
                names.push(name.to_string());
            }
        }
        Ok(Self { names })
    }

    pub fn get(&self, class_id: usize) -> Option<&str> {
        self.names.get(class_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl<S: AsRef<str>> FromIterator<S> for LabelTable {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|s| s.as_ref().to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_lines_and_trims() {
        let labels = LabelTable::from_reader("phone\r\n\n  laptop \nwatch\n".as_bytes()).unwrap();
        assert_eq!(labels.names(), &["phone", "laptop", "watch"]);
        assert_eq!(labels.get(1), Some("laptop"));
        assert_eq!(labels.get(3), None);
    }

    #[test]
    fn missing_file_is_a_label_error() {
        let err = LabelTable::from_file("/definitely/not/here/labels.txt").unwrap_err();
        assert!(matches!(err, DetectError::LabelLoad { .. }));
    }
}

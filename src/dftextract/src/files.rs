//! Read-only views of a calculation directory
//!
//! Extractors never share a file handle. Each logical pass over a file goes
//! through [`TextFile::lines`] (or one of the helpers built on it), which
//! opens the file afresh, so a forward scan, a reverse scan and a substring
//! probe of the same file cannot disturb one another.

use crate::error::FieldError;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// `true` if `path` is a regular file; only "not found" maps to `false`
pub(crate) fn is_file(path: &Path) -> io::Result<bool> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Files in `dir` with extension `ext` (no dot), sorted by name
pub(crate) fn list_with_extension(dir: &Path, ext: &str) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|e| e == ext) && is_file(&path)? {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

/// One run directory
#[derive(Debug, Clone)]
pub struct Calculation {
    dir: PathBuf,
}

impl Calculation {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn has_file(&self, name: &str) -> Result<bool, FieldError> {
        let path = self.file(name);
        is_file(&path).map_err(|e| FieldError::io(path, e))
    }

    /// Text view of a file by name (the file need not exist yet)
    pub fn text(&self, name: &str) -> TextFile {
        TextFile::new(self.file(name))
    }

    /// First file (by name) carrying the given extension
    pub fn find_by_extension(&self, ext: &str) -> Result<Option<PathBuf>, FieldError> {
        list_with_extension(&self.dir, ext)
            .map(|files| files.into_iter().next())
            .map_err(|e| FieldError::io(&self.dir, e))
    }

    /// Path of `name` relative to the working directory, as reported in
    /// file references (`./` prefix removed)
    pub fn relative_path(&self, name: &str) -> String {
        let joined = self.file(name).to_string_lossy().into_owned();
        match joined.strip_prefix("./") {
            Some(stripped) => stripped.to_string(),
            None => joined,
        }
    }
}

/// Scoped read-only view of one text file
#[derive(Debug, Clone)]
pub struct TextFile {
    path: PathBuf,
    label: String,
}

impl TextFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, label }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name used in error messages
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn exists(&self) -> Result<bool, FieldError> {
        is_file(&self.path).map_err(|e| FieldError::io(&self.path, e))
    }

    /// Fresh forward pass over the file
    pub fn lines(&self) -> Result<Lines, FieldError> {
        let file = File::open(&self.path).map_err(|e| FieldError::io(&self.path, e))?;
        Ok(Lines {
            reader: BufReader::new(file),
            path: self.path.clone(),
            buf: Vec::new(),
        })
    }

    /// Every line, in file order
    pub fn read_lines(&self) -> Result<Vec<String>, FieldError> {
        self.lines()?.collect()
    }

    /// Fresh reverse pass over the file (last line first)
    pub fn lines_rev(&self) -> Result<impl Iterator<Item = String>, FieldError> {
        Ok(self.read_lines()?.into_iter().rev())
    }

    /// Whether any line contains `marker`
    pub fn contains(&self, marker: &str) -> Result<bool, FieldError> {
        for line in self.lines()? {
            if line?.contains(marker) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// First line containing `marker`
    pub fn first_with(&self, marker: &str) -> Result<Option<String>, FieldError> {
        for line in self.lines()? {
            let line = line?;
            if line.contains(marker) {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    /// Last line containing `marker`, found by scanning from the end
    pub fn last_with(&self, marker: &str) -> Result<Option<String>, FieldError> {
        Ok(self.lines_rev()?.find(|line| line.contains(marker)))
    }

    /// Every line containing `marker`, in file order
    pub fn all_with(&self, marker: &str) -> Result<Vec<String>, FieldError> {
        let mut found = Vec::new();
        for line in self.lines()? {
            let line = line?;
            if line.contains(marker) {
                found.push(line);
            }
        }
        Ok(found)
    }

    pub fn missing(&self, marker: &str) -> FieldError {
        FieldError::missing(&self.label, marker)
    }

    pub fn invalid(&self, marker: &str, value: &str) -> FieldError {
        FieldError::invalid(&self.label, marker, value)
    }
}

/// Line iterator over one open pass
///
/// Lines are decoded lossily so stray non-UTF-8 bytes in code output do not
/// turn into I/O failures; trailing `\r` is dropped.
pub struct Lines {
    reader: BufReader<File>,
    path: PathBuf,
    buf: Vec<u8>,
}

impl Iterator for Lines {
    type Item = Result<String, FieldError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
                    self.buf.pop();
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => Some(Err(FieldError::io(&self.path, e))),
        }
    }
}

/// Whitespace token `index` of `line`, negative indices counting from the end
pub(crate) fn token(line: &str, index: isize) -> Option<&str> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let i = if index < 0 {
        words.len().checked_sub(index.unsigned_abs())?
    } else {
        index as usize
    };
    words.get(i).copied()
}

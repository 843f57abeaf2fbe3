//! Character sources
//!
//! A character source hands the token stream one character at a time. It has
//! no lookahead and no pushback; the token stream keeps its own window.
//! `None` marks the end of input and keeps being returned once reached.

use std::fs::File;
use std::io::{self, BufReader, Bytes, Read};
use std::path::{Path, PathBuf};

use crate::error::Origin;

/// Something that yields characters one at a time.
pub trait CharSource {
    /// The next character, or `None` at end of input.
    fn next_char(&mut self) -> io::Result<Option<char>>;

    /// Where the characters come from.
    fn origin(&self) -> &Origin;
}

/// Reads a file one byte at a time. Each byte becomes the character with the
/// same code point; multi-byte sequences are not decoded.
pub struct FileSource {
    bytes: Bytes<BufReader<File>>,
    origin: Origin,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Ok(Self {
            bytes: BufReader::new(file).bytes(),
            origin: Origin::File(path.to_path_buf()),
        })
    }

    /// The path this source was opened with.
    pub fn path(&self) -> &Path {
        match &self.origin {
            Origin::File(path) => path,
            Origin::Str => Path::new(""),
        }
    }
}

impl CharSource for FileSource {
    fn next_char(&mut self) -> io::Result<Option<char>> {
        match self.bytes.next() {
            Some(byte) => Ok(Some(char::from(byte?))),
            None => Ok(None),
        }
    }

    fn origin(&self) -> &Origin {
        &self.origin
    }
}

/// Indexes into an in-memory string.
pub struct StrSource {
    chars: Vec<char>,
    index: usize,
    origin: Origin,
}

impl StrSource {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            index: 0,
            origin: Origin::Str,
        }
    }
}

impl CharSource for StrSource {
    fn next_char(&mut self) -> io::Result<Option<char>> {
        let ch = self.chars.get(self.index).copied();
        if ch.is_some() {
            self.index += 1;
        }
        Ok(ch)
    }

    fn origin(&self) -> &Origin {
        &self.origin
    }
}

/// Opens a character source for a resolved path. Used for the primary input
/// file and for every `include`.
pub trait SourceOpener {
    fn open(&self, path: &Path) -> io::Result<Box<dyn CharSource>>;
}

/// Opens files from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsOpener;

impl SourceOpener for FsOpener {
    fn open(&self, path: &Path) -> io::Result<Box<dyn CharSource>> {
        Ok(Box::new(FileSource::open(path)?))
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component. The filesystem is not consulted.
pub fn normalize_path(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = match out.components().next_back() {
                    Some(Component::Normal(_)) => out.pop(),
                    Some(Component::RootDir) | Some(Component::Prefix(_)) => true,
                    _ => false,
                };
                if !popped {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

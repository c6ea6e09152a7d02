// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSONL append log.
//!
//! One serde value per line. On open the whole file is replayed through a
//! callback; a torn final line (crash mid-append) is truncated with a
//! warning, while corruption anywhere earlier fails the open — that is
//! data loss, not a torn write, and deserves a human.

use serde::{de::DeserializeOwned, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::StoreError;

/// Append-only JSONL file.
pub struct Journal {
    file: File,
    path: PathBuf,
}

impl Journal {
    /// Open or create a journal, replaying every entry through `on_entry`.
    pub fn open_with<T, F>(path: &Path, mut on_entry: F) -> Result<Self, StoreError>
    where
        T: DeserializeOwned,
        F: FnMut(T),
    {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).read(true).append(true).open(path)?;

        // Scan existing entries, remembering where each line starts so a
        // torn tail can be cut off at the right offset.
        let mut reader = BufReader::new(&file);
        let mut offset: u64 = 0;
        let mut truncate_at: Option<u64> = None;
        let mut line_no = 0usize;
        let mut line = String::new();

        loop {
            line.clear();
            let read = reader.read_line(&mut line)?;
            if read == 0 {
                break;
            }
            line_no += 1;

            let trimmed = line.trim_end_matches('\n');
            if trimmed.is_empty() {
                offset += read as u64;
                continue;
            }

            match serde_json::from_str::<T>(trimmed) {
                Ok(entry) => on_entry(entry),
                Err(e) => {
                    // A parse failure on the final line is a torn write;
                    // anywhere else the file is damaged.
                    let mut rest = String::new();
                    std::io::Read::read_to_string(&mut reader, &mut rest)?;
                    if rest.trim().is_empty() {
                        warn!(
                            path = %path.display(),
                            line = line_no,
                            error = %e,
                            "truncating torn journal tail"
                        );
                        truncate_at = Some(offset);
                        break;
                    }
                    return Err(StoreError::Corrupt { line: line_no, message: e.to_string() });
                }
            }
            offset += read as u64;
        }

        if let Some(len) = truncate_at {
            file.set_len(len)?;
        }

        Ok(Self { file, path: path.to_path_buf() })
    }

    /// Append one entry and flush it to the OS.
    pub fn append<T: Serialize>(&mut self, entry: &T) -> Result<(), StoreError> {
        let mut buf = serde_json::to_vec(entry)?;
        buf.push(b'\n');
        self.file.write_all(&buf)?;
        self.file.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;

use anyhow::{Context, Result};
use std::io::{self, BufRead};

/// Files named on the command line, or else one per line on stdin
pub fn collect_files(args: Vec<String>) -> Result<Vec<String>> {
    if !args.is_empty() {
        return Ok(args);
    }
    read_file_list(io::stdin().lock()).context("Error reading filenames from stdin")
}

/// Read newline-separated filenames, trimming each line and skipping blanks
pub fn read_file_list<R: BufRead>(reader: R) -> io::Result<Vec<String>> {
    let mut files = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let name = line.trim();
        if !name.is_empty() {
            files.push(name.to_string());
        }
    }
    Ok(files)
}

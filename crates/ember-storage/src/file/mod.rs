//! Positional file I/O over the backing file.
//!
//! The page cache performs all disk access through [`DataFile`], a thin
//! wrapper over `pread`/`pwrite` style positional reads and writes. There
//! is no shared cursor, so one descriptor can serve many threads; the
//! uncached pool still clones a descriptor set to spread kernel-side
//! contention (see `direct`).

mod data_file;
mod error;

pub use data_file::DataFile;
pub use error::{FileError, FileResult};

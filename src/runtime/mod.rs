//! Runtime abstraction for system operations.
//!
//! This module provides a trait-based abstraction over system operations,
//! enabling dependency injection and testability.
//!
//! # Structure
//!
//! - `env` - Working directory and path resolution
//! - `fs` - File system operations (read, write, directory walk, permissions)
//! - `process` - Blocking subprocess execution with captured output

mod env;
mod fs;
mod process;

use anyhow::Result;
use std::path::{Path, PathBuf};

pub use process::CommandOutput;

#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    // Environment
    fn current_dir(&self) -> Result<PathBuf>;

    /// Resolve `path` to an absolute path with all symlinks resolved.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;

    // File System
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn is_symlink(&self, path: &Path) -> bool;
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
    fn open(&self, path: &Path) -> Result<Box<dyn std::io::Read + Send>>;

    /// Unix permission bits of a file. Always `None` on Windows.
    fn unix_mode(&self, path: &Path) -> Option<u32>;

    // Processes
    /// Run `program` with `args` to completion, capturing stdout and stderr.
    /// Only a failure to launch the program is an error; a non-zero exit is
    /// reported through [`CommandOutput`].
    fn run_command(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn current_dir(&self) -> Result<PathBuf> {
        self.current_dir_impl()
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        self.canonicalize_impl(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.write_impl(path, contents)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.rename_impl(from, to)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.create_dir_all_impl(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.remove_file_impl(path)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.remove_dir_all_impl(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.is_dir_impl(path)
    }

    fn is_symlink(&self, path: &Path) -> bool {
        self.is_symlink_impl(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.read_dir_impl(path)
    }

    fn open(&self, path: &Path) -> Result<Box<dyn std::io::Read + Send>> {
        self.open_impl(path)
    }

    fn unix_mode(&self, path: &Path) -> Option<u32> {
        self.unix_mode_impl(path)
    }

    fn run_command(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        self.run_command_impl(program, args)
    }
}

//! odt2epub CLI - Command-line interface library
//!
//! Converts an OpenDocument text (or a plain text file) into an EPUB
//! package or a single HTML page written beside the input.
//!
//! # Library Usage
//!
//! ```ignore
//! use odt2epub_cli::{convert_command, ConfigOverrides, OutputFormat};
//!
//! convert_command(&input, OutputFormat::Epub, None, &ConfigOverrides::default(), false)?;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # EPUB beside the input (novel.epub)
//! odt2epub novel.odt
//!
//! # Flat HTML preview with an inline stylesheet
//! odt2epub --format html --inline-css novel.odt
//!
//! # More logging on stderr
//! odt2epub -vv novel.odt
//! ```

pub mod app;

pub use app::{convert_command, init_logging, run_cli, ConfigOverrides, OutputFormat};

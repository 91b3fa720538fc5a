//! End-to-end runs.
//!
//! This module combines the [`crate::xml_elem`], [`crate::select`], and [`crate::output`] mods into a single workflow.
//! It's useful for building functionality like the CLI's, but running it within-process.
//!
//! ## Example
//!
//! ```
//! # use xmq::run;
//! use std::io::BufRead;
//!
//! // First, let's define a mocked I/O. Replace this with whatever you need.
//! #[derive(Default)]
//! struct MockIo {
//!     stdout: Vec<u8>,
//! }
//!
//! impl run::OsFacade for MockIo {
//!     fn read_stdin(&self) -> std::io::Result<Box<dyn BufRead>> {
//!         let xml = r#"<service><operation name="Get"/><operation name="Set"/></service>"#;
//!         Ok(Box::new(xml.as_bytes()))
//!     }
//!
//!     fn read_file(&self, path: &str) -> std::io::Result<Box<dyn BufRead>> {
//!         Err(std::io::Error::new(std::io::ErrorKind::NotFound, path))
//!     }
//!
//!     fn stdout(&mut self) -> impl std::io::Write {
//!         &mut self.stdout
//!     }
//!
//!     fn write_error(&mut self, err: run::Error) {
//!         eprintln!("{err}")
//!     }
//! }
//!
//! // Now, use it:
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! // Define our "CLI" options. Use the defaults, but add a positional arg for the selector.
//! let mut cli_options = run::RunOptions::default();
//! cli_options.selectors = "operation[name=Set]".to_string();
//!
//! let mut os_facade = MockIo::default();
//! let found_any = run::run(&cli_options, &mut os_facade);
//! let stdout_text = String::from_utf8(os_facade.stdout)?;
//!
//! assert_eq!(found_any, true);
//! assert_eq!(stdout_text, r#"{"items":[{"name":"operation","attributes":{"name":"Set"}}]}"#);
//! #
//! #     Ok(())
//! # }
//! ```
mod cli;
mod run_main;

pub use cli::*;
pub use run_main::*;

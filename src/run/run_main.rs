use crate::output::{ElementWriter, JsonWriter, NullWriter, PlainWriter};
use crate::query::ParseError;
use crate::run::cli::OutputFormat;
use crate::run::RunOptions;
use crate::select::{Namespaces, SelectError, Selector};
use crate::xml_elem::{Document, Element, InvalidXml, XmlReaderEvents};
use std::fmt::{Display, Formatter};
use std::io::{BufRead, Write};
use std::{env, io};

/// The run's overall possible error.
#[derive(Debug)]
pub enum Error {
    /// User provided an invalid selector string.
    ///
    /// This comes from [`Selector::parse_with`].
    QueryParse(QueryParseError),

    /// An input wasn't valid XML.
    ///
    /// This comes from [`Document::from_reader`], or from a streaming search's [`crate::select::StreamError`].
    XmlParse(Input, InvalidXml),

    /// Couldn't read an input file.
    FileReadError(Input, io::Error),

    /// A namespace binding wasn't of the form `PREFIX=URI`.
    Namespace(String),

    /// `--one` was given, but the run didn't find exactly one element.
    Select(SelectError),

    /// Couldn't write results.
    OutputError(io::Error),
}

impl std::error::Error for Error {}

/// Returned when the selector string is not valid.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryParseError {
    query_string: String,
    error: ParseError,
}

impl std::error::Error for QueryParseError {}

impl Display for QueryParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.error.render(&self.query_string))
    }
}

/// Stdin or an input file by path.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Input {
    Stdin,
    FilePath(String),
}

impl Error {
    pub(crate) fn from_io_error(error: io::Error, file: Input) -> Self {
        Error::FileReadError(file, error)
    }
}

impl Display for Input {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Input::Stdin => f.write_str("stdin"),
            Input::FilePath(file) => write!(f, "file {file:?}"),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::QueryParse(err) => {
                writeln!(f, "Syntax error in selector:")?;
                writeln!(f, "{err}")
            }
            Error::XmlParse(input, err) => {
                writeln!(f, "XML error in {input}:")?;
                writeln!(f, "{err}")
            }
            Error::FileReadError(file, err) => {
                if env::var("XMQ_PORTABLE_ERRORS").unwrap_or_default().is_empty() {
                    writeln!(f, "{err} while reading {file}")
                } else {
                    writeln!(f, "{} while reading {file}", err.kind())
                }
            }
            Error::Namespace(binding) => {
                writeln!(f, "{}", namespace_binding_message(binding))
            }
            Error::Select(err) => writeln!(f, "{err}"),
            Error::OutputError(err) => writeln!(f, "{err} while writing results"),
        }
    }
}

/// A simple facade for handling I/O.
///
/// This trait lets you do "I/O-y stuff" like mocking out stdin or reading files. The [`run`] method uses it.
pub trait OsFacade {
    /// Open stdin (or your mock of it) for reading.
    fn read_stdin(&self) -> io::Result<Box<dyn BufRead>>;

    /// Open a file path (or your mock of one) for reading.
    fn read_file(&self, path: &str) -> io::Result<Box<dyn BufRead>>;

    /// Get a writer for stdout (or your mock of it).
    fn stdout(&mut self) -> impl Write;

    /// Handle an error.
    fn write_error(&mut self, err: Error);

    /// Opens each of the given file paths, in order.
    ///
    /// The default implementation (which you should feel free to use) treats the file path `"-"` as stdin. The first
    /// `"-"` opens stdin (via [`Self::read_stdin`]), and subsequent `"-"`s get silently ignored. An empty list means
    /// just stdin.
    fn open_all(&self, xml_file_paths: &[String]) -> Result<Vec<(Input, Box<dyn BufRead>)>, Error> {
        if xml_file_paths.is_empty() {
            let stdin = self.read_stdin().map_err(|err| Error::from_io_error(err, Input::Stdin))?;
            return Ok(vec![(Input::Stdin, stdin)]);
        }
        let mut inputs = Vec::with_capacity(xml_file_paths.len());
        let mut have_read_stdin = false;
        for path in xml_file_paths {
            if path == "-" {
                if !have_read_stdin {
                    let stdin = self.read_stdin().map_err(|err| Error::from_io_error(err, Input::Stdin))?;
                    inputs.push((Input::Stdin, stdin));
                    have_read_stdin = true
                }
            } else {
                let input = Input::FilePath(path.to_string());
                let reader = self
                    .read_file(path)
                    .map_err(|err| Error::from_io_error(err, input.clone()))?;
                inputs.push((input, reader));
            }
        }
        Ok(inputs)
    }
}

/// Parses a `PREFIX=URI` namespace binding.
pub(crate) fn parse_namespace_binding(binding: &str) -> Result<(&str, &str), String> {
    match binding.split_once('=') {
        Some((prefix, uri)) if !prefix.is_empty() && !uri.is_empty() => Ok((prefix, uri)),
        _ => Err(namespace_binding_message(binding)),
    }
}

fn namespace_binding_message(binding: &str) -> String {
    format!("invalid namespace binding {binding:?}: expected PREFIX=URI")
}

/// Runs xmq end to end.
///
/// This uses the provided [RunOptions] and [OsFacade] to read each input, search it with the selector in
/// [`RunOptions::selectors`], and then write the matches to the given [`OsFacade`] in the format specified by
/// [`RunOptions::output`].
///
/// Returns whether the run succeeded: at least one element matched (or, with [`RunOptions::one`], exactly one did).
pub fn run(cli: &RunOptions, os: &mut impl OsFacade) -> bool {
    match run_or_error(cli, os) {
        Ok(ok) => ok,
        Err(err) => {
            os.write_error(err);
            false
        }
    }
}

fn run_or_error(cli: &RunOptions, os: &mut impl OsFacade) -> Result<bool, Error> {
    let mut namespaces = Namespaces::new();
    for binding in &cli.namespaces {
        let (prefix, uri) = parse_namespace_binding(binding).map_err(|_| Error::Namespace(binding.to_string()))?;
        namespaces.insert(prefix, uri);
    }

    let selectors_str = &cli.selectors;
    let selector = match Selector::parse_with(selectors_str, &namespaces) {
        Ok(selector) => selector,
        Err(error) => {
            return Err(Error::QueryParse(QueryParseError {
                query_string: selectors_str.to_string(),
                error,
            }));
        }
    };
    log::debug!("parsed selector: {selector}");

    let inputs = os.open_all(&cli.xml_file_paths)?;

    let quiet = cli.quiet;
    let output = cli.output;
    let mut stdout = os.stdout();
    let writer: Box<dyn ElementWriter + '_> = match (quiet, output) {
        (true, _) => Box::new(NullWriter),
        (false, OutputFormat::Json) => Box::new(JsonWriter::new(&mut stdout)),
        (false, OutputFormat::Plain) => Box::new(PlainWriter::new(&mut stdout)),
    };
    let mut sink = MatchSink::new(cli, writer);

    if let Err(err) = search_inputs(cli, &selector, inputs, &mut sink) {
        sink.abandon();
        return Err(err);
    }
    sink.finish(&selector)
}

fn search_inputs(
    cli: &RunOptions,
    selector: &Selector,
    inputs: Vec<(Input, Box<dyn BufRead>)>,
    sink: &mut MatchSink<'_>,
) -> Result<(), Error> {
    for (input, reader) in inputs {
        if sink.is_full() {
            break;
        }
        let before = sink.seen;
        if cli.stream {
            log::debug!("streaming {input}");
            for found in selector.stream(XmlReaderEvents::from_reader(reader)) {
                let elem = found.map_err(|err| Error::XmlParse(input.clone(), err.into()))?;
                sink.accept(&elem)?;
                if sink.is_full() {
                    break;
                }
            }
        } else {
            log::debug!("loading {input}");
            let doc = Document::from_reader(reader).map_err(|err| Error::XmlParse(input.clone(), err))?;
            for elem in doc.find(selector).elements() {
                sink.accept(elem)?;
                if sink.is_full() {
                    break;
                }
            }
        }
        log::debug!("{} match(es) in {input}", sink.seen - before);
    }
    Ok(())
}

/// Sends matches to the writer, enforcing `--limit` and `--one`.
struct MatchSink<'w> {
    writer: Box<dyn ElementWriter + 'w>,
    seen: usize,
    /// Stop once this many matches have been seen.
    cap: Option<usize>,
    /// With `--one`, matches are held back until we know there's exactly one.
    held: Option<Vec<Element>>,
}

impl<'w> MatchSink<'w> {
    fn new(cli: &RunOptions, writer: Box<dyn ElementWriter + 'w>) -> Self {
        let (cap, held) = if cli.one {
            // a second match is enough to know it's ambiguous
            (Some(2), Some(Vec::with_capacity(2)))
        } else {
            (cli.limit, None)
        };
        Self {
            writer,
            seen: 0,
            cap,
            held,
        }
    }

    fn is_full(&self) -> bool {
        self.cap.is_some_and(|cap| self.seen >= cap)
    }

    fn accept(&mut self, elem: &Element) -> Result<(), Error> {
        self.seen += 1;
        match &mut self.held {
            Some(held) => held.push(elem.clone()),
            None => self.writer.write(elem).map_err(Error::OutputError)?,
        }
        Ok(())
    }

    /// Closes off whatever's been written, after a failure. The failure is what gets reported, so a problem closing
    /// the output is only logged.
    fn abandon(mut self) {
        if let Err(err) = self.writer.abandon() {
            log::warn!("couldn't close output after an error: {err}");
        }
    }

    fn finish(mut self, selector: &Selector) -> Result<bool, Error> {
        if let Some(held) = self.held.take() {
            let query = selector.to_string();
            match held.as_slice() {
                [only] => self.writer.write(only).map_err(Error::OutputError)?,
                [] => return Err(Error::Select(SelectError::NoMatch { query })),
                _ => return Err(Error::Select(SelectError::Ambiguous { query, count: held.len() })),
            }
        }
        self.writer.finish().map_err(Error::OutputError)?;
        Ok(self.seen > 0)
    }
}

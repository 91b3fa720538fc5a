use crate::run::run_main::parse_namespace_binding;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use derive_builder::Builder;
use std::fmt::{Display, Formatter};

macro_rules! create_options_structs {
    (
        $(
            $(#[$meta:meta])*
            clap $clap:tt
            pub $name:ident : $ty:ty
        ),* $(,)?
    ) => {
        #[derive(Clone, Default, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Parser)]
        #[command(version, about, long_about = None)]
        #[doc(hidden)]
        pub struct CliOptions {
            $(
            $(#[$meta])*
            #[arg$clap]
            pub(crate) $name: $ty,
            )*

            // clap-only stuff:

            /// The selector, like `service[name=Users] operation input`.
            ///
            /// Steps separated by whitespace or commas match descendants at any depth; `>` between two steps requires
            /// an immediate child. Each step is a name (`operation`, `*`, `soap:Body` or `{urn:example}Body`) with any
            /// number of `[attr=value]` predicates. Quote values that contain spaces or brackets:
            /// `[title="a [b] c"]`.
            #[arg(value_name = "selector")]
            pub(crate) selectors: String,

            /// An optional list of XML files to search, by path. If not provided, standard input will be used.
            ///
            /// Each file is its own document, searched independently. Results are written in the order of the files.
            ///
            /// A path of "-" represents standard input. All but the first "-" are ignored.
            #[arg()]
            pub(crate) xml_file_paths: Vec<String>,
        }

        /// Options analogous to the xmq CLI's switches.
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Builder)]
        pub struct RunOptions {
            $(
            $(#[$meta])*
            pub $name: $ty,
            )*

            pub selectors: String,

            pub xml_file_paths: Vec<String>
        }

        impl From<CliOptions> for RunOptions {
            fn from(value: CliOptions) -> Self {
                Self {
                    $($name: value.$name,)*
                    selectors: value.selectors,
                    xml_file_paths: value.xml_file_paths,
                }
            }
        }
    };
}

create_options_structs! {
    /// Specifies the output format. Defaults to JSON.
    clap(long, short, default_value_t = OutputFormat::Json)
    pub output: OutputFormat,

    /// Search each input as a stream, without first loading it all into memory.
    ///
    /// Results are the same either way, but streaming starts writing them sooner, and only keeps the matched elements
    /// in memory. With --limit or --one, it also stops reading as soon as it has enough matches. If an input turns out
    /// to be malformed partway through, streaming will already have written the matches before that point.
    clap(long)
    pub stream: bool,

    /// Stop after this many matches, across all inputs.
    clap(long, short = 'n', conflicts_with = "one")
    pub limit: Option<usize>,

    /// Require exactly one match, across all inputs. Anything else is an error.
    clap(long)
    pub one: bool,

    /// Binds a namespace prefix for use in the selector, as PREFIX=URI. May be given multiple times.
    ///
    /// Prefixes in the selector are unrelated to whatever prefixes the documents happen to use; only the URIs are
    /// compared.
    clap(long = "ns", value_name = "PREFIX=URI")
    pub namespaces: Vec<String>,

    /// Quiet: do not print anything to stdout. The exit code will still be 0 if any elements match, and non-0 if none do.
    clap(long, short)
    pub quiet: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            output: OutputFormat::Json,
            stream: false,
            limit: None,
            one: false,
            namespaces: vec![],
            quiet: false,
            selectors: "".to_string(),
            xml_file_paths: vec![],
        }
    }
}

impl CliOptions {
    pub fn extra_validation(&self) -> bool {
        if self.limit == Some(0) {
            let _ = CliOptions::command()
                .error(ErrorKind::InvalidValue, "--limit must be at least 1")
                .print();
            return false;
        }
        for binding in &self.namespaces {
            if let Err(err) = parse_namespace_binding(binding) {
                let _ = CliOptions::command().error(ErrorKind::InvalidValue, err).print();
                return false;
            }
        }
        true
    }
}

/// Output formats, analogous to `--output` in the CLI.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
pub enum OutputFormat {
    /// Output results as JSON: `{"items": [...]}`, where each item has the element's `name`, and its `namespace`,
    /// `attributes`, `text` and `children` when they're not empty. Attribute names in a namespace are written as
    /// `{uri}name`.
    #[default]
    Json,

    /// Outputs just the text directly inside each matched element, one element per line.
    Plain,
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let self_str = match self {
            OutputFormat::Json => "json",
            OutputFormat::Plain => "plain",
        };
        f.write_str(self_str)
    }
}

#[cfg(test)]
mod tests {
    use crate::run::cli::{CliOptions, OutputFormat};
    use crate::run::{RunOptions, RunOptionsBuilder};
    use crate::util::utils_for_test::*;
    use clap::error::ErrorKind;
    use clap::{Error, Parser};

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        CliOptions::command().debug_assert();
    }

    #[test]
    fn selector_required() {
        let result = CliOptions::try_parse_from(["xmq"]);
        check_err(&result, "the following required arguments were not provided:");
    }

    #[test]
    fn just_selector_equals_default() {
        let result = CliOptions::try_parse_from(["xmq", "operation"]);
        unwrap!(result, Ok(cli));
        assert!(cli.xml_file_paths.is_empty());
        let from_cli: RunOptions = cli.into();
        let expected = RunOptions {
            selectors: "operation".to_string(),
            ..RunOptions::default()
        };
        assert_eq!(from_cli, expected);
    }

    #[test]
    fn selector_and_files() {
        let result = CliOptions::try_parse_from(["xmq", "service operation", "a.wsdl", "-"]);
        unwrap!(result, Ok(cli));
        assert_eq!(cli.xml_file_paths, ["a.wsdl", "-"]);
        let run_opts: RunOptions = cli.into();
        assert_eq!(run_opts.selectors, "service operation");
    }

    #[test]
    fn all_switches() {
        let result = CliOptions::try_parse_from([
            "xmq",
            "-o",
            "plain",
            "--stream",
            "-n",
            "3",
            "--ns",
            "s=urn:s",
            "--ns",
            "t=urn:t",
            "-q",
            "s:Body",
        ]);
        unwrap!(result, Ok(cli));
        assert!(cli.extra_validation());
        let run_opts: RunOptions = cli.into();
        let expected = RunOptionsBuilder::default()
            .output(OutputFormat::Plain)
            .stream(true)
            .limit(Some(3))
            .one(false)
            .namespaces(vec!["s=urn:s".to_string(), "t=urn:t".to_string()])
            .quiet(true)
            .selectors("s:Body".to_string())
            .xml_file_paths(vec![])
            .build()
            .unwrap();
        assert_eq!(run_opts, expected);
    }

    #[test]
    fn one_conflicts_with_limit() {
        let result = CliOptions::try_parse_from(["xmq", "--one", "--limit", "2", "a"]);
        unwrap!(result, Err(e));
        assert_eq!(e.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn zero_limit_fails_validation() {
        let result = CliOptions::try_parse_from(["xmq", "-n", "0", "a"]);
        unwrap!(result, Ok(cli));
        assert!(!cli.extra_validation());
    }

    #[test]
    fn bad_namespace_fails_validation() {
        let result = CliOptions::try_parse_from(["xmq", "--ns", "no-equals-sign", "a"]);
        unwrap!(result, Ok(cli));
        assert!(!cli.extra_validation());
    }

    fn check_err(result: &Result<CliOptions, Error>, expect: &str) {
        unwrap!(result, Err(e));
        let e_str = e.to_string();
        let first_line = e_str.split('\n').next().expect("no error string found");
        let mut expect_full = "error: ".to_string();
        expect_full.push_str(expect);
        assert_eq!(first_line, &expect_full);
    }
}

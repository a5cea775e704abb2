// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{ExpectedError, Result},
    exit_codes::GotestExitCode,
    output::{OutputContext, OutputOpts, ResultStyles},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use gotest_runner::{
    config::{AdapterConfig, ConfigExperimental},
    discovery::TestDiscovery,
    list::{OutputFormat, PositionId, PositionTree, SerializableFormat},
    marshal::{ResultMap, ResultMarshaler, TestStatus},
    run_spec::{RunSpec, RunSpecBuilder},
    source::FsSourceReader,
    test_output::OutputDir,
};
use owo_colors::OwoColorize;
use std::io::{self, BufWriter, Write};
use supports_color::Stream;
use tracing::{debug, info};

/// Discover, run and report Go tests.
///
/// Positions are identified by the path of their file or directory, followed
/// by `::`-separated test names: `/src/calc/calc_test.go::TestAdd::negative`.
#[derive(Debug, Parser)]
#[command(version, styles = crate::output::clap_styles())]
pub struct GotestApp {
    #[command(flatten)]
    output: OutputOpts,

    #[command(flatten)]
    config_opts: ConfigOpts,

    #[command(subcommand)]
    command: Command,
}

impl GotestApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the process exit code.
    pub fn exec(self, output: OutputContext) -> Result<i32> {
        let stdout = io::stdout();
        // Buffer the output to minimize syscalls.
        let mut writer = BufWriter::new(stdout.lock());
        let code = self.exec_with_writer(output, &mut writer)?;
        writer.flush().map_err(ExpectedError::write_output)?;
        Ok(code)
    }

    fn exec_with_writer(self, output: OutputContext, writer: &mut dyn Write) -> Result<i32> {
        let config = self.config_opts.make_config()?;
        let output_dir = self.config_opts.output_dir();
        let discovery = TestDiscovery::new(config.discovery_options())?;

        match self.command {
            Command::Discover {
                path,
                message_format,
            } => {
                let path = resolve_path(&path)?;
                let mut tree = discovery.discover(&path)?;
                if output.color.should_colorize(Stream::Stdout) {
                    tree.colorize();
                }
                tree.write(message_format.to_output_format(output.verbose), &mut *writer)
                    .map_err(ExpectedError::write_output)?;
            }
            Command::Build {
                selection,
                message_format,
                extra_args,
            } => {
                let (tree, id) = selection.resolve(&discovery)?;
                let spec = RunSpecBuilder::new(&config)
                    .set_extra_args(extra_args)
                    .set_output_dir(output_dir)
                    .build(&tree, &id, &FsSourceReader)?;
                write_run_spec(&spec, message_format, writer)?;
            }
            Command::Marshal {
                captured,
                selection,
                message_format,
            } => {
                let (tree, id) = selection.resolve(&discovery)?;
                let subtree = subtree(&tree, &id)?;
                let bytes = std::fs::read(&captured).map_err(|err| {
                    ExpectedError::ReadCapturedOutput {
                        path: captured.clone(),
                        err,
                    }
                })?;
                let results = ResultMarshaler::new(output_dir)
                    .marshal(&String::from_utf8_lossy(&bytes), &subtree)?;
                write_results(&results, message_format, output, writer)?;
            }
            Command::Run {
                selection,
                message_format,
                extra_args,
            } => {
                let (tree, id) = selection.resolve(&discovery)?;
                let subtree = subtree(&tree, &id)?;
                let spec = RunSpecBuilder::new(&config)
                    .set_extra_args(extra_args)
                    .set_output_dir(output_dir.clone())
                    .build(&tree, &id, &FsSourceReader)?;

                run_go_test(&spec)?;

                let results = ResultMarshaler::new(output_dir).marshal_spec(&spec, &subtree)?;
                write_results(&results, message_format, output, writer)?;
                writer.flush().map_err(ExpectedError::write_output)?;

                let failed = results
                    .values()
                    .filter(|result| result.status == TestStatus::Failed)
                    .count();
                if failed > 0 {
                    return Err(ExpectedError::TestRunFailed {
                        failed,
                        total: results.len(),
                    });
                }
            }
        }

        Ok(GotestExitCode::OK)
    }
}

#[derive(Debug, Args)]
struct ConfigOpts {
    /// Config file [default: ./.config/gotest.toml]
    #[arg(long, global = true, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,

    /// Discover the cases of table-driven tests
    #[arg(long, global = true)]
    table_tests: bool,

    /// Directory for results and output files [default: the system temp dir]
    #[arg(long, global = true, value_name = "DIR", env = "GOTEST_OUTPUT_DIR")]
    output_dir: Option<Utf8PathBuf>,
}

impl ConfigOpts {
    /// Creates a config from the current directory and the given options.
    fn make_config(&self) -> Result<AdapterConfig> {
        let current_dir = std::env::current_dir()
            .map_err(|err| ExpectedError::CurrentDirInvalid { err })?;
        let current_dir = Utf8PathBuf::try_from(current_dir).map_err(|err| {
            ExpectedError::CurrentDirInvalid {
                err: err.into_io_error(),
            }
        })?;

        let mut config = AdapterConfig::from_sources(&current_dir, self.config_file.as_deref())?;
        if self.table_tests {
            config = config.with_experimental([ConfigExperimental::TableTests]);
        }
        Ok(config)
    }

    fn output_dir(&self) -> OutputDir {
        match &self.output_dir {
            Some(dir) => OutputDir::new(dir.clone()),
            None => OutputDir::system_temp(),
        }
    }
}

#[derive(Debug, Args)]
struct SelectionOpts {
    /// A Go test file or a directory to search for test files
    #[arg(value_name = "PATH")]
    path: Utf8PathBuf,

    /// The position to select [default: PATH itself]
    ///
    /// Either a full position ID, or the part after PATH starting with `::`.
    #[arg(long, value_name = "ID")]
    id: Option<String>,
}

impl SelectionOpts {
    /// Discovers the tree at the selected path and returns it along with the selected ID.
    fn resolve(&self, discovery: &TestDiscovery) -> Result<(PositionTree, PositionId)> {
        let path = resolve_path(&self.path)?;
        let tree = discovery.discover(&path)?;
        let id = match &self.id {
            Some(id) if id.starts_with("::") => {
                PositionId::new(format!("{}{id}", tree.root().id))
            }
            Some(id) => PositionId::new(id.clone()),
            None => tree.root().id.clone(),
        };
        if tree.get(&id).is_none() {
            return Err(ExpectedError::PositionNotFound {
                id,
                root: tree.root().id.clone(),
            });
        }
        debug!(%id, positions = tree.len(), "resolved selection");
        Ok((tree, id))
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Discover tests in a file or directory
    ///
    /// Use --message-format json to get machine-readable output.
    Discover {
        /// A Go test file or a directory to search for test files
        #[arg(value_name = "PATH")]
        path: Utf8PathBuf,

        /// Output format
        #[arg(short = 'T', long, value_enum, default_value_t, value_name = "FMT")]
        message_format: MessageFormatOpts,
    },
    /// Build the go test command for a position without running it
    Build {
        #[command(flatten)]
        selection: SelectionOpts,

        /// Output format
        #[arg(short = 'T', long, value_enum, default_value_t, value_name = "FMT")]
        message_format: MessageFormatOpts,

        /// Extra arguments to pass to go test
        #[arg(last = true, value_name = "ARGS")]
        extra_args: Vec<String>,
    },
    /// Marshal previously captured go test -json output into results
    Marshal {
        /// The captured output of a go test -json run
        #[arg(value_name = "OUTPUT")]
        captured: Utf8PathBuf,

        #[command(flatten)]
        selection: MarshalSelectionOpts,

        /// Output format
        #[arg(short = 'T', long, value_enum, default_value_t, value_name = "FMT")]
        message_format: MessageFormatOpts,
    },
    /// Build, run and marshal the tests at a position
    ///
    /// Exits with code 100 if any test failed.
    Run {
        #[command(flatten)]
        selection: SelectionOpts,

        /// Output format
        #[arg(short = 'T', long, value_enum, default_value_t, value_name = "FMT")]
        message_format: MessageFormatOpts,

        /// Extra arguments to pass to go test
        #[arg(last = true, value_name = "ARGS")]
        extra_args: Vec<String>,
    },
}

/// Like [`SelectionOpts`], but with the path passed as `--path`.
#[derive(Debug, Args)]
struct MarshalSelectionOpts {
    /// The Go test file or directory the output was captured for
    #[arg(long, value_name = "PATH")]
    path: Utf8PathBuf,

    /// The position the output was captured for [default: PATH itself]
    #[arg(long, value_name = "ID")]
    id: Option<String>,
}

impl MarshalSelectionOpts {
    fn resolve(&self, discovery: &TestDiscovery) -> Result<(PositionTree, PositionId)> {
        SelectionOpts {
            path: self.path.clone(),
            id: self.id.clone(),
        }
        .resolve(discovery)
    }
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum MessageFormatOpts {
    #[default]
    Human,
    Json,
    JsonPretty,
}

impl MessageFormatOpts {
    fn to_output_format(self, verbose: bool) -> OutputFormat {
        match self {
            Self::Human => OutputFormat::Human { verbose },
            Self::Json => OutputFormat::Serializable(SerializableFormat::Json),
            Self::JsonPretty => OutputFormat::Serializable(SerializableFormat::JsonPretty),
        }
    }
}

fn resolve_path(path: &Utf8Path) -> Result<Utf8PathBuf> {
    path.canonicalize_utf8()
        .map_err(|err| ExpectedError::PathResolveFailed {
            path: path.to_owned(),
            err,
        })
}

fn subtree(tree: &PositionTree, id: &PositionId) -> Result<PositionTree> {
    tree.subtree(id)
        .ok_or_else(|| ExpectedError::PositionNotFound {
            id: id.clone(),
            root: tree.root().id.clone(),
        })
}

/// Runs the spec's command, capturing stdout at its results path.
///
/// Standard error is inherited so that build failures stay visible. A non-zero
/// exit is expected when tests fail and is not an error.
fn run_go_test(spec: &RunSpec) -> Result<()> {
    let command = spec.shell_command();
    info!("running `{command}` in {}", spec.cwd);

    let args = spec.args();
    let Some((program, args)) = args.split_first() else {
        return Err(ExpectedError::go_test_exec_failed(
            command,
            io::Error::new(io::ErrorKind::InvalidInput, "empty command"),
        ));
    };
    let output = duct::cmd(program.as_str(), args)
        .dir(spec.cwd.as_std_path())
        .stdout_path(spec.context.results_path.as_std_path())
        .unchecked()
        .run()
        .map_err(|err| ExpectedError::go_test_exec_failed(command.clone(), err))?;
    debug!(
        status = %output.status,
        results_path = %spec.context.results_path,
        "go test exited"
    );
    Ok(())
}

fn write_run_spec(
    spec: &RunSpec,
    message_format: MessageFormatOpts,
    writer: &mut dyn Write,
) -> Result<()> {
    match message_format.to_output_format(false).serializable() {
        Some(format) => format
            .write_document(spec, writer)
            .map_err(ExpectedError::serialize_output),
        None => {
            let RunSpec { cwd, context, .. } = spec;
            writeln!(writer, "command: {}", spec.shell_command())
                .and_then(|()| writeln!(writer, "cwd: {cwd}"))
                .and_then(|()| writeln!(writer, "results-path: {}", context.results_path))
                .and_then(|()| writeln!(writer, "package: {}", context.package))
                .map_err(ExpectedError::write_output)
        }
    }
}

fn write_results(
    results: &ResultMap,
    message_format: MessageFormatOpts,
    output: OutputContext,
    writer: &mut dyn Write,
) -> Result<()> {
    if let Some(format) = message_format.to_output_format(output.verbose).serializable() {
        return format
            .write_document(results, writer)
            .map_err(ExpectedError::serialize_output);
    }

    let mut styles = ResultStyles::default();
    if output.color.should_colorize(Stream::Stdout) {
        styles.colorize();
    }
    write_results_human(results, &styles, output.verbose, writer)
        .map_err(ExpectedError::write_output)
}

fn write_results_human(
    results: &ResultMap,
    styles: &ResultStyles,
    verbose: bool,
    writer: &mut dyn Write,
) -> io::Result<()> {
    for (id, result) in results {
        let status_style = match result.status {
            TestStatus::Passed => styles.passed,
            TestStatus::Failed => styles.failed,
            TestStatus::Skipped => styles.skipped,
        };
        let status = result.status.as_str().to_uppercase();
        writeln!(writer, "{:>7} {}", status.style(status_style), id.style(styles.id))?;

        for error in &result.errors {
            writeln!(writer, "        line {}: {}", error.line, error.message)?;
        }
        if verbose {
            writeln!(writer, "        output: {}", result.output.style(styles.dimmed))?;
        }
    }
    Ok(())
}

//! Purpose: `diagline` CLI entry point and command dispatch.
//! Role: Binary crate root; parses args, runs commands, emits converted output on stdout.
//! Invariants: stdout carries only converted data; reports and errors go to stderr.
//! Invariants: Non-interactive errors are emitted as one-line JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`, plus CLI-local 1/2.
use std::error::Error as StdError;
use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};

use clap::{
    CommandFactory, Parser, Subcommand, ValueEnum, ValueHint,
    error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod feed;

use diagline::api::{
    DiagnosticMessage, Error, MAX_CAUSE_DEPTH, decode_config, encode_config, to_exit_code,
};
use feed::{ErrorPolicy, FeedConfig, FeedError, FeedFailure, FeedOutcome, feed};

const DEFAULT_MAX_SNIPPET_BYTES: usize = 160;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            err.exit_code()
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, CliError> {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print()
                    .map_err(|io_err| CliError::io("failed to write help", io_err))?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(CliError::Usage {
                    message: clap_error_summary(&err),
                    hint: Some(clap_error_hint(&err)),
                });
            }
        },
    };

    match cli.command {
        Command::Feed {
            file,
            format,
            errors,
            summary,
        } => cmd_feed(file.as_deref(), format, errors, summary),
        Command::Config { command } => match command {
            ConfigCommand::Check { file } => cmd_config_check(file.as_deref()),
            ConfigCommand::Normalize { file } => cmd_config_normalize(file.as_deref()),
        },
        Command::Completions { shell } => cmd_completions(shell),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Debug, Parser)]
#[command(
    name = "diagline",
    version,
    about = "Convert tunnel-engine notice streams into diagnostic log lines",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"Engines emit one JSON notice per line. diagline turns those lines into
stable diagnostic records for feedback uploads and log aggregation.

Mental model:
  - `feed` converts a notice stream (stdin or file)
  - `config check` decodes a config document and reports shape problems
  - `config normalize` re-encodes a config document through the codec
"#,
    after_help = r#"EXAMPLES
  $ tunnel-engine 2>/dev/null | diagline feed           # live stream
  $ diagline feed notices.jsonl                         # replay a capture
  $ diagline feed --format json notices.jsonl | jq .message
  $ diagline config check client.config

LEARN MORE
  $ diagline <command> --help"#,
    arg_required_else_help = true,
    disable_help_subcommand = false
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Line,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, ValueEnum)]
enum ErrorPolicyCli {
    Stop,
    Skip,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Convert notice JSON lines into diagnostic lines",
        long_about = r#"Convert notice JSON lines into diagnostic lines.

Reads one JSON notice per line from FILE or stdin and writes one diagnostic
record per notice to stdout. Lines that are well-formed JSON but not notices
(no string `noticeType`) are skipped silently; malformed lines follow the
--errors policy."#,
        after_help = r#"EXAMPLES
  $ tunnel-engine 2>/dev/null | diagline feed
  $ diagline feed notices.jsonl --summary
  $ diagline feed notices.jsonl --errors stop
  $ diagline feed --format json notices.jsonl | jq .timestamp

NOTES
  - `--errors skip` (the default) reports each bad line on stderr and keeps going
  - `--errors stop` exits with the taxonomy code of the first bad line
  - `--summary` prints end-of-stream counters on stderr
  - stdout stays a clean data channel; all reporting goes to stderr"#
    )]
    Feed {
        #[arg(
            help = "Notice stream file (defaults to stdin)",
            value_hint = ValueHint::FilePath
        )]
        file: Option<PathBuf>,
        #[arg(
            long,
            default_value = "line",
            value_enum,
            help = "Output format per notice",
            long_help = r#"Output format per notice

  line   `[<timestamp>] <noticeType>: <data json>`
  json   one serialized diagnostic record per line"#
        )]
        format: OutputFormat,
        #[arg(
            short = 'e',
            long = "errors",
            default_value = "skip",
            value_enum,
            help = "Malformed-line policy: stop|skip"
        )]
        errors: ErrorPolicyCli,
        #[arg(long, help = "Print end-of-stream counters to stderr")]
        summary: bool,
    },
    #[command(
        arg_required_else_help = true,
        about = "Inspect engine config documents",
        long_about = r#"Decode and re-encode engine config documents.

Configs are opaque JSON objects; diagline checks shape (UTF-8, JSON, object
at the top level) without validating any individual setting."#,
        after_help = r#"EXAMPLES
  $ diagline config check client.config
  $ cat client.config | diagline config check
  $ diagline config normalize client.config > normalized.config"#
    )]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    #[command(
        about = "Generate shell completions",
        long_about = r#"Generate shell completion scripts.

Install the generated file in your shell's completion directory (or source it)
to get tab completion for diagline commands and flags.

EXAMPLES
  $ diagline completions bash > ~/.local/share/bash-completion/completions/diagline
  $ diagline completions zsh > ~/.zfunc/_diagline
  $ diagline completions fish > ~/.config/fish/completions/diagline.fish"#
    )]
    Completions {
        #[arg(value_enum, help = "Shell to generate completions for")]
        shell: Shell,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    #[command(about = "Decode a config document and report its shape")]
    Check {
        #[arg(
            help = "Config file (defaults to stdin)",
            value_hint = ValueHint::FilePath
        )]
        file: Option<PathBuf>,
    },
    #[command(about = "Re-encode a config document through the codec")]
    Normalize {
        #[arg(
            help = "Config file (defaults to stdin)",
            value_hint = ValueHint::FilePath
        )]
        file: Option<PathBuf>,
    },
}

#[derive(Debug)]
enum CliError {
    Usage { message: String, hint: Option<String> },
    Io { message: String, source: io::Error },
    Domain(Error),
}

impl CliError {
    fn io(message: impl Into<String>, source: io::Error) -> Self {
        CliError::Io {
            message: message.into(),
            source,
        }
    }

    fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage { .. } => 2,
            CliError::Io { .. } => 1,
            CliError::Domain(error) => to_exit_code(error.kind()),
        }
    }
}

impl From<Error> for CliError {
    fn from(error: Error) -> Self {
        CliError::Domain(error)
    }
}

impl From<FeedError> for CliError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::Io(source) => CliError::io("failed to stream notices", source),
            FeedError::Notice { line, error } => {
                let message = format!(
                    "line {line}: {}",
                    error.message().unwrap_or_else(|| error.kind().default_message())
                );
                CliError::Domain(error.with_message(message))
            }
        }
    }
}

fn cmd_feed(
    file: Option<&Path>,
    format: OutputFormat,
    errors: ErrorPolicyCli,
    summary: bool,
) -> Result<RunOutcome, CliError> {
    let config = FeedConfig {
        errors: match errors {
            ErrorPolicyCli::Stop => ErrorPolicy::Stop,
            ErrorPolicyCli::Skip => ErrorPolicy::Skip,
        },
        max_snippet_bytes: DEFAULT_MAX_SNIPPET_BYTES,
    };
    let reader: Box<dyn Read> = match file {
        Some(path) => Box::new(File::open(path).map_err(|err| {
            CliError::io(format!("failed to open {}", path.display()), err)
        })?),
        None => Box::new(io::stdin().lock()),
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let outcome = feed(
        reader,
        config,
        |message| write_message(&mut out, format, &message),
        |failure| emit_skip_report(&failure),
    )?;
    out.flush()
        .map_err(|err| CliError::io("failed to write diagnostic output", err))?;

    if summary {
        emit_summary(&outcome);
    }
    Ok(RunOutcome::ok())
}

fn write_message<W: Write>(
    out: &mut W,
    format: OutputFormat,
    message: &DiagnosticMessage,
) -> io::Result<()> {
    match format {
        OutputFormat::Line => writeln!(out, "[{}] {}", message.timestamp, message.message),
        OutputFormat::Json => {
            let json = serde_json::to_string(message).map_err(io::Error::other)?;
            writeln!(out, "{json}")
        }
    }
}

fn cmd_config_check(file: Option<&Path>) -> Result<RunOutcome, CliError> {
    let raw = read_input(file)?;
    let config = decode_config(&raw).map_err(CliError::Domain)?;
    println!("{}", json!({ "ok": true, "keys": config.len() }));
    Ok(RunOutcome::ok())
}

fn cmd_config_normalize(file: Option<&Path>) -> Result<RunOutcome, CliError> {
    let raw = read_input(file)?;
    let config = decode_config(&raw).map_err(CliError::Domain)?;
    let normalized = encode_config(&Value::Object(config)).map_err(CliError::Domain)?;
    println!("{normalized}");
    Ok(RunOutcome::ok())
}

fn cmd_completions(shell: Shell) -> Result<RunOutcome, CliError> {
    let mut command = Cli::command();
    clap_complete::aot::generate(shell, &mut command, "diagline", &mut io::stdout());
    Ok(RunOutcome::ok())
}

fn read_input(file: Option<&Path>) -> Result<Vec<u8>, CliError> {
    match file {
        Some(path) => std::fs::read(path)
            .map_err(|err| CliError::io(format!("failed to read {}", path.display()), err)),
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut buf)
                .map_err(|err| CliError::io("failed to read stdin", err))?;
            Ok(buf)
        }
    }
}

fn emit_skip_report(failure: &FeedFailure) {
    if io::stderr().is_terminal() {
        eprintln!("skipped: line {}: {}", failure.line, failure.message);
        return;
    }

    let mut inner = Map::new();
    inner.insert("line".to_string(), json!(failure.line));
    inner.insert("message".to_string(), json!(failure.message));
    if let Some(snippet) = &failure.snippet {
        inner.insert("snippet".to_string(), json!(snippet));
    }
    let mut outer = Map::new();
    outer.insert("skipped".to_string(), Value::Object(inner));
    let json = serde_json::to_string(&Value::Object(outer))
        .unwrap_or_else(|_| format!("{{\"skipped\":{{\"line\":{}}}}}", failure.line));
    eprintln!("{json}");
}

fn emit_summary(outcome: &FeedOutcome) {
    if io::stderr().is_terminal() {
        eprintln!(
            "summary: {} lines, {} notices, {} skipped, {} failed",
            outcome.lines, outcome.notices, outcome.skipped, outcome.failed
        );
        return;
    }

    let value = json!({
        "summary": {
            "lines": outcome.lines,
            "notices": outcome.notices,
            "skipped": outcome.skipped,
            "failed": outcome.failed,
        }
    });
    let json = serde_json::to_string(&value).unwrap_or_else(|_| "{\"summary\":{}}".to_string());
    eprintln!("{json}");
}

fn emit_error(err: &CliError) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }

    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"domain\":\"cli-error\",\"code\":1,\"message\":\"json encode failed\"}}"
            .to_string()
    });
    eprintln!("{json}");
}

fn error_text(err: &CliError) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(hint) = error_hint(err) {
        lines.push(format!("hint: {hint}"));
    }
    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!("caused by: {cause}"));
    }
    lines.join("\n")
}

fn error_json(err: &CliError) -> Value {
    let mut inner = Map::new();
    match err {
        CliError::Usage { message, .. } => {
            inner.insert("domain".to_string(), json!("cli-error"));
            inner.insert("code".to_string(), json!(2));
            inner.insert("message".to_string(), json!(message));
        }
        CliError::Io { message, .. } => {
            inner.insert("domain".to_string(), json!("cli-error"));
            inner.insert("code".to_string(), json!(1));
            inner.insert("message".to_string(), json!(message));
        }
        CliError::Domain(error) => {
            inner.insert("domain".to_string(), json!(error.domain().as_str()));
            inner.insert("code".to_string(), json!(error.code()));
            inner.insert(
                "message".to_string(),
                json!(error.message().unwrap_or_else(|| error.kind().default_message())),
            );
        }
    }
    if let Some(hint) = error_hint(err) {
        inner.insert("hint".to_string(), json!(hint));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_message(err: &CliError) -> String {
    match err {
        CliError::Usage { message, .. } => message.clone(),
        CliError::Io { message, .. } => message.clone(),
        CliError::Domain(error) => error.to_string(),
    }
}

fn error_hint(err: &CliError) -> Option<&str> {
    match err {
        CliError::Usage { hint, .. } => hint.as_deref(),
        CliError::Io { .. } => None,
        CliError::Domain(error) => error.hint(),
    }
}

fn error_causes(err: &CliError) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur: Option<&(dyn StdError + 'static)> = match err {
        CliError::Usage { .. } => None,
        CliError::Io { source, .. } => Some(source),
        CliError::Domain(error) => error.source(),
    };
    while let Some(source) = cur {
        if causes.len() == MAX_CAUSE_DEPTH {
            break;
        }
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);
    match usage {
        Some(usage) => format!("Usage: {usage}. Try `diagline --help`."),
        None => "Try `diagline --help`.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Cli, CliError, Command, ErrorPolicyCli, FeedError, OutputFormat, clap_error_hint,
        clap_error_summary, error_json, error_text, write_message,
    };
    use clap::Parser;
    use diagline::api::{DiagnosticMessage, Error, NoticeCode};

    #[test]
    fn cli_parses_feed_defaults() {
        let cli = Cli::try_parse_from(["diagline", "feed"]).expect("parse");
        let Command::Feed {
            file,
            format,
            errors,
            summary,
        } = cli.command
        else {
            panic!("expected feed command");
        };
        assert!(file.is_none());
        assert!(matches!(format, OutputFormat::Line));
        assert_eq!(errors, ErrorPolicyCli::Skip);
        assert!(!summary);
    }

    #[test]
    fn cli_rejects_unknown_format() {
        let err = Cli::try_parse_from(["diagline", "feed", "--format", "xml"]).unwrap_err();
        let summary = clap_error_summary(&err);
        assert!(summary.contains("xml"), "summary was: {summary}");
        assert!(clap_error_hint(&err).contains("--help"));
    }

    #[test]
    fn write_message_renders_both_formats() {
        let message = DiagnosticMessage::new(
            "Tunnels: {\"count\":2}",
            "2006-01-02T15:04:05.000-07:00",
        );

        let mut line = Vec::new();
        write_message(&mut line, OutputFormat::Line, &message).expect("write");
        assert_eq!(
            String::from_utf8(line).expect("utf8"),
            "[2006-01-02T15:04:05.000-07:00] Tunnels: {\"count\":2}\n"
        );

        let mut jsonl = Vec::new();
        write_message(&mut jsonl, OutputFormat::Json, &message).expect("write");
        let value: serde_json::Value = serde_json::from_slice(&jsonl).expect("json");
        assert_eq!(value["message"], "Tunnels: {\"count\":2}");
        assert_eq!(value["timestamp"], "2006-01-02T15:04:05.000-07:00");
    }

    #[test]
    fn error_json_carries_taxonomy_fields() {
        let err = CliError::Domain(
            Error::new(NoticeCode::DecodeJsonFailed)
                .with_message("line 2: decoding notice json failed")
                .with_source(std::io::Error::other("underlying")),
        );
        let value = error_json(&err);
        assert_eq!(value["error"]["domain"], "notice-error");
        assert_eq!(value["error"]["code"], 103);
        assert_eq!(value["error"]["message"], "line 2: decoding notice json failed");
        assert_eq!(value["error"]["causes"][0], "underlying");
    }

    #[test]
    fn error_text_shows_hint_and_first_cause() {
        let err = CliError::Domain(
            Error::new(NoticeCode::DecodeJsonFailed)
                .with_message("bad line")
                .with_hint("Use --errors skip to continue past malformed lines.")
                .with_source(std::io::Error::other("eof while parsing")),
        );
        let text = error_text(&err);
        assert!(text.starts_with("error: notice-error.103: bad line"));
        assert!(text.contains("hint: Use --errors skip"));
        assert!(text.contains("caused by: eof while parsing"));
    }

    #[test]
    fn feed_stop_errors_carry_the_line_number() {
        let err = CliError::from(FeedError::Notice {
            line: 7,
            error: Error::new(NoticeCode::DataMissing).with_message("timestamp missing"),
        });
        assert_eq!(err.exit_code(), 9);
        let CliError::Domain(error) = err else {
            panic!("expected domain error");
        };
        assert_eq!(error.message(), Some("line 7: timestamp missing"));
    }

    #[test]
    fn usage_and_io_exit_codes_are_cli_local() {
        let usage = CliError::Usage {
            message: "bad flag".to_string(),
            hint: None,
        };
        assert_eq!(usage.exit_code(), 2);
        let io_err = CliError::io("failed to open", std::io::Error::other("gone"));
        assert_eq!(io_err.exit_code(), 1);
    }
}

use std::ffi::OsString;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use chrono_tz::Tz;
use clap::Parser;
use dateseq_core::date::Date;
use dateseq_core::duration::DurationList;
use dateseq_core::format::{DEFAULT_OUTPUT_FORMAT, OutputFormat, parse_date, unescape};
use dateseq_core::sequence::DateSeq;
use dateseq_core::skip::SkipSet;
use tracing::debug;

/// Stands in for the sign of negative increments while clap parses, since
/// `-1m` would otherwise be read as a bundle of short flags.
const MINUS_MARK: char = '\u{2212}';

#[derive(Parser)]
#[command(
    name = "dseq",
    about = "Print a sequence of dates, like seq(1) but for dates",
    override_usage = "dseq [OPTIONS] FIRST [[INCREMENT] LAST]"
)]
struct Cli {
    /// FIRST [[INCREMENT] LAST]; LAST defaults to today, INCREMENT to 1d
    #[arg(required = true, num_args = 1..=3, value_name = "DATE")]
    inputs: Vec<String>,

    /// Output format (strftime style)
    #[arg(short, long)]
    format: Option<String>,

    /// Input format, tried in order (repeatable)
    #[arg(short, long = "input-format")]
    input_format: Vec<String>,

    /// Interpret backslash escapes in the output format
    #[arg(short = 'e', long)]
    backslash_escapes: bool,

    /// Weekdays to skip, e.g. `SS`, `Sa,Su` or `Fr-Mo` (repeatable)
    #[arg(short, long)]
    skip: Vec<String>,

    /// Suppress error messages
    #[arg(short, long)]
    quiet: bool,

    /// Time zone used to determine today's date (default: local)
    #[arg(short, long)]
    zone: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

/// Mark the sign of arguments such as `-7` or `-1m` so clap keeps them as
/// positionals.
fn fixup_negative<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| match arg.to_str() {
            Some(s) if s.len() > 1 && s.starts_with('-') && s.as_bytes()[1].is_ascii_digit() => {
                OsString::from(format!("{MINUS_MARK}{}", &s[1..]))
            }
            _ => arg,
        })
        .collect()
}

fn unfixup(input: &str) -> String {
    match input.strip_prefix(MINUS_MARK) {
        Some(rest) => format!("-{rest}"),
        None => input.to_string(),
    }
}

fn today(zone: Option<&str>) -> Result<Date> {
    match zone {
        Some(name) => {
            let tz: Tz = name
                .parse()
                .map_err(|e| anyhow!("unknown time zone `{name}': {e}"))?;
            Ok(Date::from(Utc::now().with_timezone(&tz).date_naive()))
        }
        None => Ok(Date::today()),
    }
}

fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    let skip = cli
        .skip
        .iter()
        .fold(SkipSet::EMPTY, |ss, spec| ss.with_spec(spec));

    let inputs: Vec<String> = cli.inputs.iter().map(|s| unfixup(s)).collect();
    let formats = &cli.input_format;
    let (first, step, last) = match inputs.as_slice() {
        [first] => (
            parse_date(first, formats)?,
            DurationList::default(),
            today(cli.zone.as_deref())?,
        ),
        [first, last] => (
            parse_date(first, formats)?,
            DurationList::default(),
            parse_date(last, formats)?,
        ),
        [first, step, last] => {
            let first = parse_date(first, formats)?;
            let step: DurationList = step.parse()?;
            (first, step, parse_date(last, formats)?)
        }
        _ => anyhow::bail!("expected FIRST [[INCREMENT] LAST]"),
    };

    let pattern = match &cli.format {
        Some(f) if cli.backslash_escapes => unescape(f),
        Some(f) => f.clone(),
        None => DEFAULT_OUTPUT_FORMAT.to_string(),
    };
    let format = OutputFormat::new(pattern)?;

    debug!("{first} to {last} by {step}, skipping [{skip}]");
    for date in DateSeq::new(first, last, step, skip)? {
        let date = date?;
        writeln!(out, "{}", format.format(&date)?).context("failed to write date")?;
    }
    Ok(())
}

fn is_broken_pipe(err: &anyhow::Error) -> bool {
    err.downcast_ref::<io::Error>()
        .is_some_and(|e| e.kind() == io::ErrorKind::BrokenPipe)
}

/// Usage errors exit with 1 like every other failure; `--help` exits with 0.
fn usage_status(err: &clap::Error) -> u8 {
    if err.use_stderr() { 1 } else { 0 }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse_from(fixup_negative(std::env::args_os())) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(usage_status(&e));
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let mut out = BufWriter::new(io::stdout().lock());
    let result = run(&cli, &mut out).and_then(|()| out.flush().context("failed to flush output"));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if is_broken_pipe(&e) => ExitCode::SUCCESS,
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

use serde_json::{Map, Value as JsonValue};
use simqle::{ConfigSource, Simqle};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: simqle [--config PATH] [--mode MODE] [--connection NAME] [--execute] SQL";

/// Command line options.
#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    mode: Option<String>,
    connection: Option<String>,
    execute: bool,
    sql: String,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut sql = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                parsed.config = Some(args.next().ok_or("--config needs a path")?.into());
            }
            "--mode" | "-m" => {
                parsed.mode = Some(args.next().ok_or("--mode needs a value")?);
            }
            "--connection" | "-n" => {
                parsed.connection = Some(args.next().ok_or("--connection needs a name")?);
            }
            "--execute" | "-e" => parsed.execute = true,
            "--help" | "-h" => return Err(USAGE.to_string()),
            _ if arg.starts_with('-') => return Err(format!("Unknown option {}\n{}", arg, USAGE)),
            _ if sql.is_none() => sql = Some(arg),
            _ => return Err(format!("Unexpected argument {}\n{}", arg, USAGE)),
        }
    }

    parsed.sql = sql.ok_or_else(|| USAGE.to_string())?;
    Ok(parsed)
}

fn run(args: Args) -> simqle::Result<()> {
    let source = args.config.map(ConfigSource::Path).unwrap_or_default();
    let mut db = Simqle::new(source, args.mode.as_deref())?;
    let connection = args.connection.as_deref();

    if args.execute {
        db.execute_sql(&args.sql, connection, None, None)?;
        info!("Statement executed");
        return Ok(());
    }

    let rs = db.recordset(&args.sql, connection, None, None)?;
    debug!("Fetched {} row(s)", rs.len());
    for row in &rs {
        let object: Map<String, JsonValue> = rs
            .headings()
            .iter()
            .cloned()
            .zip(row.iter().map(|v| serde_json::to_value(v).unwrap_or(JsonValue::Null)))
            .collect();
        println!("{}", JsonValue::Object(object));
    }
    Ok(())
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout stays machine readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("simqle: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, String> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_args() {
        let parsed = args(&["-c", "conns.yaml", "--mode", "testing", "-e", "DELETE FROM t"]).unwrap();
        assert_eq!(parsed.config, Some(PathBuf::from("conns.yaml")));
        assert_eq!(parsed.mode.as_deref(), Some("testing"));
        assert!(parsed.execute);
        assert_eq!(parsed.sql, "DELETE FROM t");
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(args(&[]).is_err());
        assert!(args(&["--config"]).is_err());
        assert!(args(&["--bogus", "SELECT 1"]).is_err());
        assert!(args(&["SELECT 1", "SELECT 2"]).is_err());
    }
}

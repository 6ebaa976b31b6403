use clap::{Parser, ValueEnum};
use schemaforge::Dialect;
use std::io;
use std::path::PathBuf;

mod command;

#[derive(Parser)]
#[command(name = "schemaforge")]
#[command(about = "Build a dependency-ordered migration plan from schema directives and a database introspection snapshot", long_about = None)]
struct Cli {
    /// Path to a JSON file holding the directive stream (the already-lexed
    /// output of the external annotation comment-lexer).
    #[arg(long)]
    directives: PathBuf,

    /// Path to a JSON introspection snapshot of the live database. When
    /// omitted, the target is treated as an empty schema.
    #[arg(long)]
    introspection: Option<PathBuf>,

    /// Target dialect.
    #[arg(long, value_enum, default_value_t = DialectArg::Postgres)]
    dialect: DialectArg,

    /// Extension names to union with the default ignore list (`plpgsql`).
    #[arg(long = "ignore-extension")]
    ignored_extensions: Vec<String>,

    /// Emit the diff and plan as JSON instead of a human-readable listing.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Copy, Clone, ValueEnum)]
enum DialectArg {
    Postgres,
    Mysql,
    Mariadb,
}

impl From<DialectArg> for Dialect {
    fn from(value: DialectArg) -> Self {
        match value {
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Mysql => Dialect::MySql,
            DialectArg::Mariadb => Dialect::MariaDb,
        }
    }
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();

    // Disable color when output is redirected or piped, same rationale as
    // the core's own diagnostics renderer: no ANSI codes in files/pipes.
    let enable_color = atty::is(atty::Stream::Stderr);

    let options = command::Options {
        directives_path: cli.directives,
        introspection_path: cli.introspection,
        dialect: cli.dialect.into(),
        ignored_extensions: cli.ignored_extensions,
        enable_color,
        json: cli.json,
    };

    command::migrate(&options)
}

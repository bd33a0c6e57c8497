use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::error::LoxError;
use rox::interpreter::{run_with_stack, Interpreter};
use rox::parser::Parser;
use rox::scanner::scan_all;

#[derive(ClapParser, Debug)]
#[command(version, about = "Rox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Print the token stream as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file and prints each statement's AST
    Parse { filename: Option<PathBuf> },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: Option<PathBuf> },

    /// Runs input from a file as a Rox program
    Run { filename: Option<PathBuf> },

    /// Starts an interactive session
    Repl,
}

/// Reads the contents of a file into a String
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    let source = String::from_utf8(buf).map_err(LoxError::from)?;

    Ok(source)
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // Configure env_logger to write to file with module and source line
    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("rox::").unwrap_or(module);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Print every diagnostic and exit with the code of the first one.
fn report(errors: &[LoxError]) -> ! {
    for e in errors {
        debug!("Reporting: {}", e);
        eprintln!("{}", e);
    }

    let code = errors.first().map_or(65, LoxError::exit_code);

    debug!("Exiting with code {}", code);

    std::process::exit(code);
}

fn no_input() {
    info!("No filepath provided");
    println!("No input filepath was provided. Exiting...");
}

fn tokenize(filename: &Path, json: bool) -> Result<()> {
    info!("Running Tokenize subcommand");

    let source = read_file(filename)?;
    let (tokens, errors) = scan_all(&source);

    for e in &errors {
        debug!("Tokenization debug: {}", e);
        eprintln!("{}", e);
    }

    if json {
        let rendered =
            serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?;
        println!("{}", rendered);
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }

    if !errors.is_empty() {
        debug!("Tokenization failed, exiting with code 65");
        std::process::exit(65);
    }

    info!("Tokenization completed successfully");
    Ok(())
}

fn parse(filename: &Path) -> Result<()> {
    info!("Running Parse subcommand");

    let source = read_file(filename)?;
    let (tokens, mut errors) = scan_all(&source);
    let (statements, parse_errors) = Parser::new(tokens).parse();
    errors.extend(parse_errors);

    if !errors.is_empty() {
        report(&errors);
    }

    for stmt in &statements {
        let ast_str = AstPrinter::print_stmt(stmt);
        debug!("AST: {}", ast_str);
        println!("{}", ast_str);
    }

    info!("Parse subcommand completed");
    Ok(())
}

fn evaluate(filename: &Path) -> Result<()> {
    info!("Running Evaluate subcommand");

    let source = read_file(filename)?;
    let mut interpreter = Interpreter::new();

    match interpreter.evaluate_source(&source) {
        Ok(value) => {
            debug!("Evaluated to: {}", value);
            println!("{}", value);
        }
        Err(errors) => report(&errors),
    }

    info!("Evaluate subcommand completed");
    Ok(())
}

fn run(filename: &Path) -> Result<()> {
    info!("Running Run subcommand");

    let source = read_file(filename)?;
    info!("Provided input:\n {}", source);

    let base_dir = filename
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let mut interpreter = Interpreter::new().with_base_dir(base_dir);

    match interpreter.run_source(&source) {
        Ok(()) => info!("Program executed successfully"),
        Err(errors) => report(&errors),
    }

    Ok(())
}

/// Lines ending in `;` or `}` run as statements; anything else is evaluated
/// as an expression and its value echoed.
fn repl() -> Result<()> {
    info!("Starting REPL");

    let mut interpreter = Interpreter::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        if read == 0 {
            println!();
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        debug!("REPL input: {}", line);

        if line.ends_with(';') || line.ends_with('}') {
            if let Err(errors) = interpreter.run_source(line) {
                errors.iter().for_each(|e| eprintln!("{}", e));
            }
        } else {
            match interpreter.evaluate_source(line) {
                Ok(value) => println!("{}", value),
                Err(errors) => errors.iter().for_each(|e| eprintln!("{}", e)),
            }
        }
    }

    info!("REPL finished");
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    // parsing and evaluation both recurse on the host stack
    let commands = args.commands;
    run_with_stack(move || dispatch(commands)).context("Failed to start interpreter thread")?
}

fn dispatch(commands: Commands) -> Result<()> {
    match commands {
        Commands::Tokenize { filename, json } => match filename {
            Some(filename) => tokenize(&filename, json)?,
            None => no_input(),
        },

        Commands::Parse { filename } => match filename {
            Some(filename) => parse(&filename)?,
            None => no_input(),
        },

        Commands::Evaluate { filename } => match filename {
            Some(filename) => evaluate(&filename)?,
            None => no_input(),
        },

        Commands::Run { filename } => match filename {
            Some(filename) => run(&filename)?,
            None => no_input(),
        },

        Commands::Repl => repl()?,
    }

    Ok(())
}

extern crate fitclub as lib;

use chrono::{Local, NaiveDate};
use flexi_logger::{FileSpec, Logger};
use lib::app::App;
use lib::cmds::CommandParser;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "fc",
    about = "Fitclub - member app screens driven by command scripts."
)]
pub struct Args {
    #[structopt(
        name = "SCRIPT",
        help = "command script to run, read from stdin if omitted",
        parse(from_os_str)
    )]
    pub script: Option<PathBuf>,

    #[structopt(
        name = "CONFIG",
        short = "c",
        long = "config",
        help = "path to config file",
        parse(from_os_str)
    )]
    pub configfile: Option<PathBuf>,

    #[structopt(long = "as-of", help = "date treated as today (YYYY-MM-DD)")]
    pub as_of: Option<NaiveDate>,

    #[structopt(
        short = "s",
        long = "show",
        help = "print the screen after the script finished"
    )]
    pub show: bool,

    #[structopt(long = "log-file", help = "path to log file", parse(from_os_str))]
    pub log_file: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::from_args();

    const DEFAULT_LOG_LEVEL: &str = if cfg!(debug_assertions) {
        "debug"
    } else {
        "warn"
    };

    let mut logger = Logger::try_with_env_or_str(DEFAULT_LOG_LEVEL)?;

    if let Some(log_file) = args.log_file {
        logger = logger
            .log_to_file(FileSpec::try_from(log_file)?)
            .print_message();
    }

    logger.start()?;

    std::panic::set_hook(Box::new(move |info| {
        eprintln!("fc ran into a fatal error!");
        eprintln!("{}", info);
        eprintln!("{:?}", backtrace::Backtrace::new());
    }));

    let config = lib::config::load_suitable_config(args.configfile.as_deref())?;
    let today = args.as_of.unwrap_or_else(|| Local::now().date_naive());

    let mut app = App::new(&config, today);

    let input: Box<dyn BufRead> = match &args.script {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut failed = 0;
    {
        let mut parser = CommandParser::new(&mut app);
        for (number, line) in input.lines().enumerate() {
            match parser.run_command(&line?) {
                Ok(Some(output)) => println!("{}", output),
                Ok(None) => {}
                Err(e) => {
                    log::warn!("line {}: {}", number + 1, e);
                    eprintln!("line {}: {}", number + 1, e);
                    failed += 1;
                }
            }
        }
    }

    if args.show {
        print!("{}", lib::render::screen(&app));
    }

    if failed > 0 {
        return Err(format!("{} command(s) failed", failed).into());
    }

    Ok(())
}

use std::{fs, path::{Path, PathBuf}, process::ExitCode};

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use serde::Serialize;
use simple_logger::SimpleLogger;

use ipcgen::{
    comp::{to_descriptor, BusLibraryCache, CompileOptions, Compiler},
    error::IpError,
    parser::{parse_entity, ParseOptions},
};

#[derive(Parser)]
#[command(version, rename_all="snake_case")]
/// IP core generator: compile IP core descriptions into a render context,
/// or rebuild a description from an entity declaration
struct IpGenArgs {
    #[command(subcommand)]
    cmd: IpGenCmd,
    /// Increase verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Explicit log level, overrides -v
    #[arg(long, global = true)]
    log_level: Option<LevelFilter>,
}

#[derive(Subcommand)]
#[command(rename_all="snake_case")]
enum IpGenCmd {
    /// Compile an IP core description into a render context
    Generate {
        /// Path to the IP core document (YAML or JSON)
        input: PathBuf,
        /// Output path (stdout when not set)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Default bus library (built-in library when not set)
        #[arg(long)]
        bus_library: Option<PathBuf>,
        /// Fail on unknown bus protocol instead of using AXI4-Lite
        #[arg(long, action)]
        strict: bool,
        /// Skip register model validation
        #[arg(long, action)]
        no_validate: bool,
        /// Fail when validation reports an issue
        #[arg(long, action)]
        deny_warnings: bool,
    },
    /// Rebuild an IP core description from an entity declaration
    Parse {
        /// Path to the HDL source
        input: PathBuf,
        /// Output path (stdout when not set)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
        format: OutputFormat,
        /// Do not group ports into bus interfaces
        #[arg(long, action)]
        no_bus_detect: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum OutputFormat {
    Json, Yaml
}

fn serialize<T: Serialize>(value: &T, format: OutputFormat) -> Result<String, IpError> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    })
}

fn emit(txt: &str, output: Option<&Path>) -> Result<(), IpError> {
    match output {
        Some(path) => {
            fs::write(path, txt).map_err(|e| IpError::io(path, e))?;
            log::info!("Written {}", path.display());
        }
        None => println!("{txt}"),
    }
    Ok(())
}

fn run(cmd: IpGenCmd) -> Result<(), IpError> {
    match cmd {
        IpGenCmd::Generate { input, output, format, bus_library, strict, no_validate, deny_warnings } => {
            let mut cache = BusLibraryCache::new(bus_library);
            let options = CompileOptions {
                strict_protocol: strict,
                validate: !no_validate,
            };
            let ctx = Compiler::new(&mut cache, options).compile_file(&input)?;
            if deny_warnings && ctx.has_warnings() {
                return Err(IpError::malformed(
                    input.display().to_string(),
                    format!("{} validation issue(s)", ctx.diagnostics.len()),
                ));
            }
            emit(&serialize(&ctx, format)?, output.as_deref())
        }
        IpGenCmd::Parse { input, output, format, no_bus_detect } => {
            let src = fs::read_to_string(&input).map_err(|e| IpError::io(&input, e))?;
            let options = ParseOptions { detect_bus: !no_bus_detect };
            let entity = parse_entity(&src, &options)?;
            log::info!(
                "Entity {}: {} generics, {} ports, {} bus interfaces",
                entity.name, entity.generics.len(), entity.ports.len(), entity.bus_interfaces.len()
            );
            emit(&serialize(&to_descriptor(&entity), format)?, output.as_deref())
        }
    }
}

fn main() -> ExitCode {

    let args = IpGenArgs::parse();

    let level = args.log_level.unwrap_or(match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    });
    // Logs go to stderr so that stdout only carries the generated document
    if let Err(e) = SimpleLogger::new().with_level(level).with_colors(true).env().init() {
        eprintln!("Unable to initialize logger: {e}");
    }

    match run(args.cmd) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

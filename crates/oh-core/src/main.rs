//! OpenHedgehog CLI entry point.
//!
//! Bootstraps the process (argv normalization, profile flags, environment
//! export) and dispatches the diagnostic subcommands:
//! - `paths`: resolved profile, state directory, config path and port
//! - `ports`: who is listening on a port
//! - `preflight`: fail fast when the gateway port is taken
//! - `format-command`: render a command for the active profile

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use oh_common::error::{format_error_human, StructuredError};
use oh_common::{EnvMap, OutputFormat, PROGRAM_NAME};
use oh_core::cli::{
    build_parse_argv, format_cli_command, get_flag_value, get_verbose_flag, has_flag,
    VerboseFlagOptions,
};
use oh_core::exit_codes::ExitCode;
use oh_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, LogLevel, Stage,
};
use oh_core::ports::{
    ensure_port_available, format_port_diagnostics, handle_port_error, inspect_port_usage,
    ProcessRuntime,
};
use oh_core::{bootstrap, log_event, BootstrapContext};
use serde_json::json;

/// OpenHedgehog gateway bootstrap and port diagnostics
#[derive(Parser)]
#[command(name = "openhedgehog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = "Profile flags (place before the subcommand):\n  --dev             Use the dev profile (~/.openhedgehog-dev, gateway port 19001)\n  --profile <NAME>  Use a named profile (~/.openhedgehog-<NAME>)")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Output format
    #[arg(long, global = true, default_value = "human")]
    format: OutputFormat,

    /// Log bootstrap decisions
    #[arg(long, global = true)]
    verbose: bool,

    /// Log at debug level
    #[arg(long, global = true)]
    debug: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log line format on stderr (human, jsonl)
    #[arg(long, global = true, env = "OPENHEDGEHOG_LOG_FORMAT")]
    log_format: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the resolved profile, state directory, config path and gateway port
    Paths,

    /// Show which processes are listening on a port
    Ports {
        /// Port to inspect (defaults to the gateway port)
        port: Option<u16>,
    },

    /// Check that the gateway port is free before starting
    Preflight {
        /// Port to check (defaults to the gateway port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Render a command with the active profile inserted
    FormatCommand {
        /// Command to render, e.g. `openhedgehog gateway stop`
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

/// Logging is configured from the raw argv so bootstrap itself is observable.
fn early_log_config(raw: &[String], env: &EnvMap) -> LogConfig {
    let (argv, _) = build_parse_argv(PROGRAM_NAME, Some(raw), &[]);
    let argv = argv.as_slice();

    let level = LogLevel::from_flags(
        has_flag(argv, "--quiet") || has_flag(argv, "-q"),
        has_flag(argv, "--debug"),
        get_verbose_flag(argv, VerboseFlagOptions::default()),
    );
    let format = get_flag_value(argv, "--log-format")
        .value()
        .and_then(|v| v.parse::<LogFormat>().ok());

    LogConfig::from_env_map(env, level, format)
}

fn main() {
    let raw: Vec<String> = std::env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    let env = EnvMap::from_process();

    init_logging(&early_log_config(&raw, &env));

    let ctx = match bootstrap(Some(&raw), &env, dirs::home_dir().as_deref()) {
        Ok(ctx) => ctx,
        Err(err) => {
            eprintln!("[{}] {}", PROGRAM_NAME, err);
            std::process::exit(ExitCode::for_error(&err).as_i32());
        }
    };
    ctx.export_to_process();

    let log_ctx = LogContext::new(generate_run_id()).with_profile(ctx.profile.as_deref());
    log_event!(
        log_ctx,
        DEBUG,
        event_names::STATE_DIR_RESOLVED,
        Stage::Paths,
        "bootstrap complete",
        state_dir = tracing::field::display(ctx.state_dir.path.display()),
        gateway_port = ctx.gateway_port
    );

    // argv[0] for clap is the program token; the host slot is dropped.
    let cli = Cli::parse_from(ctx.argv.iter().skip(1));
    tracing::debug!(
        quiet = cli.global.quiet,
        debug = cli.global.debug,
        log_format = ?cli.global.log_format,
        "logging configured before dispatch"
    );

    let exit_code = match &cli.command {
        Commands::Paths => run_paths(&cli.global, &ctx, &log_ctx),
        Commands::Ports { port } => run_ports(&cli.global, port.unwrap_or(ctx.gateway_port)),
        Commands::Preflight { port } => {
            run_preflight(&cli.global, &log_ctx, port.unwrap_or(ctx.gateway_port))
        }
        Commands::FormatCommand { command } => run_format_command(&ctx, &command.join(" ")),
    };

    std::process::exit(exit_code.as_i32());
}

fn print_json(value: &serde_json::Value) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{s}");
            ExitCode::Clean
        }
        Err(err) => {
            eprintln!("{}", StructuredError::from(&oh_common::Error::from(err)).to_json());
            ExitCode::InternalError
        }
    }
}

fn run_paths(global: &GlobalOpts, ctx: &BootstrapContext, log_ctx: &LogContext) -> ExitCode {
    match global.format {
        OutputFormat::Json => print_json(&json!({
            "run_id": log_ctx.run_id,
            "generated_at": Utc::now(),
            "profile": ctx.profile,
            "state_dir": ctx.state_dir.path,
            "state_dir_source": ctx.state_dir.source,
            "config_path": ctx.config_path,
            "gateway_port": ctx.gateway_port,
            "command_path": ctx.command_path,
            "needs_state_migration": ctx.needs_state_migration,
            "overlay": ctx.overlay.entries().iter().map(|(k, _)| k).collect::<Vec<_>>(),
        })),
        OutputFormat::Human => {
            println!("profile:      {}", ctx.profile.as_deref().unwrap_or("default"));
            println!(
                "state dir:    {} ({})",
                ctx.state_dir.path.display(),
                ctx.state_dir.source
            );
            println!("config path:  {}", ctx.config_path.display());
            println!("gateway port: {}", ctx.gateway_port);
            if global.verbose && !ctx.overlay.is_empty() {
                for (key, value) in ctx.overlay.entries() {
                    println!("  set {key}={value}");
                }
            }
            ExitCode::Clean
        }
    }
}

fn run_ports(global: &GlobalOpts, port: u16) -> ExitCode {
    let report = match inspect_port_usage(port) {
        Ok(report) => report,
        Err(err) => {
            let err = oh_common::Error::from(err);
            eprintln!("{}", format_error_human(&err, !global.no_color));
            return ExitCode::for_error(&err);
        }
    };

    let printed = match global.format {
        OutputFormat::Json => match serde_json::to_value(&report) {
            Ok(value) => print_json(&value),
            Err(err) => {
                eprintln!("{}", StructuredError::from(&oh_common::Error::from(err)).to_json());
                ExitCode::InternalError
            }
        },
        OutputFormat::Human => {
            for line in format_port_diagnostics(&report) {
                println!("{line}");
            }
            ExitCode::Clean
        }
    };

    if printed != ExitCode::Clean {
        return printed;
    }
    if report.is_busy() {
        ExitCode::PortInUse
    } else {
        ExitCode::Clean
    }
}

fn run_preflight(global: &GlobalOpts, log_ctx: &LogContext, port: u16) -> ExitCode {
    log_event!(log_ctx, INFO, event_names::PORT_PROBE, Stage::Port, "preflight", port = port);

    let err = match ensure_port_available(port) {
        Ok(()) => {
            if global.format == OutputFormat::Json {
                return print_json(&json!({ "port": port, "status": "free" }));
            }
            println!("Port {port} is available.");
            return ExitCode::Clean;
        }
        Err(err) => err,
    };

    match handle_port_error(err, port, "Gateway start", &mut ProcessRuntime) {
        // Address-in-use exits inside the runtime.
        Ok(()) => ExitCode::PortInUse,
        Err(other) => {
            let err = oh_common::Error::from(other);
            eprintln!("{}", format_error_human(&err, !global.no_color));
            ExitCode::for_error(&err)
        }
    }
}

fn run_format_command(ctx: &BootstrapContext, command: &str) -> ExitCode {
    println!("{}", format_cli_command(command, &ctx.env));
    ExitCode::Clean
}

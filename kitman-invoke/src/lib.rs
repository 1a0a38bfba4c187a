//! Command invocation plumbing for `kitman`: parses global arguments, opens
//! the database, installs tracing, and translates a command's `Result` into
//! a process exit code.

#![warn(missing_docs)]
#![warn(
    clippy::all,
    clippy::as_conversions,
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro
)]
#![allow(clippy::too_many_arguments, clippy::blocks_in_conditions)]

use clap::Parser;
use kitman_lib::core::effects::{Effects, Glyphs};
use kitman_lib::util::{ExitCode, EyreExitOr};
use kitman_opts::{ColorSetting, GlobalArgs, Opts};
use kitman_sqlite::SqliteStore;
use tracing::instrument;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Shared context threaded through every command.
pub struct CommandContext {
    /// The `Effects` to use for output and progress display.
    pub effects: Effects,

    /// The opened commit/tag/stream store.
    pub store: SqliteStore,
}

#[must_use = "Dropping the tracing guard immediately defeats installing it. Keep it alive for the duration of `main`."]
#[instrument]
fn install_tracing() -> eyre::Result<impl Drop> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse(std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| "kitman=warn".to_string()))?;
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(env_filter))
        .try_init()?;

    struct TrivialDrop;
    Ok(TrivialDrop)
}

/// Parse arguments, open the database, install tracing, run `f`, and turn
/// its result into a process exit code. This is the non-`process::exit`
/// half of [`invoke_main`], kept separate so tests can call it without
/// terminating the test process.
#[instrument(skip(f))]
pub fn do_main_and_drop_locals(f: impl Fn(CommandContext, Opts) -> EyreExitOr<()>) -> eyre::Result<i32> {
    let opts = Opts::parse();
    let GlobalArgs { db_path, color } = &opts.global_args;

    let glyphs = match color {
        Some(ColorSetting::Always) => Glyphs::pretty(),
        Some(ColorSetting::Never) => Glyphs::text(),
        Some(ColorSetting::Auto) | None => Glyphs::detect(),
    };
    let effects = Effects::new(glyphs);

    let _tracing_guard = install_tracing();

    let store = SqliteStore::open(db_path)?;
    let ctx = CommandContext { effects, store };

    let exit_code = match f(ctx, opts)? {
        Ok(()) => 0,
        Err(ExitCode(exit_code)) => exit_code.try_into()?,
    };
    Ok(exit_code)
}

/// Invoke `kitman`'s `main` function. Installs the panic handler, runs `f`,
/// and exits the process with the resulting code.
pub fn invoke_main(f: impl Fn(CommandContext, Opts) -> EyreExitOr<()>) {
    color_eyre::install().expect("could not install panic handler");
    let exit_code = do_main_and_drop_locals(f).expect("a fatal error occurred");
    std::process::exit(exit_code);
}

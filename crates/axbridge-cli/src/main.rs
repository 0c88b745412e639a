//! axbridge command-line tool
//!
//! Reads, writes and watches accessibility attributes of a running
//! application from the terminal.

use axbridge::BridgeError;
use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "axbridge")]
#[command(
  about = "Inspect and drive applications through the accessibility API",
  long_about = None
)]
#[command(version)]
struct Cli {
  /// Target application by PID (default: frontmost application)
  #[arg(long, global = true, conflicts_with = "system")]
  pid: Option<i32>,

  /// Target the system-wide element
  #[arg(long, global = true)]
  system: bool,

  /// Print values (and errors) as JSON
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Whether this process may use the accessibility API
  Enabled,

  /// PID of the frontmost application
  Frontmost,

  /// List attribute names
  Attrs,

  /// List action names
  Actions,

  /// Read an attribute
  Get {
    /// Attribute name, e.g. AXTitle
    attribute: String,
  },

  /// Write an attribute. `true`/`false`, numbers and `a,b` pairs are
  /// parsed, anything else is sent as text
  Set { attribute: String, value: String },

  /// Write text as a string value, skipping the type and settable checks
  SetString { attribute: String, text: String },

  /// Perform an action, e.g. AXPress
  Press { action: String },

  /// Block until a notification fires on the target
  Wait {
    /// Notification name, e.g. AXFocusedWindowChanged
    notification: String,
    /// Give up after this many seconds
    #[arg(short, long, default_value_t = 10.0)]
    timeout: f64,
  },

  /// Set the messaging timeout for calls on the target (0 restores the default)
  Timeout { seconds: f32 },
}

fn main() -> ExitCode {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
  let cli = Cli::parse();

  match run(&cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      if cli.json {
        eprintln!("{}", error_json(&e));
      } else {
        eprintln!("axbridge: {e}");
      }
      ExitCode::FAILURE
    }
  }
}

/// `{"error", "kind", "status"}` rendering of a failure for `--json`.
fn error_json(error: &BridgeError) -> serde_json::Value {
  serde_json::json!({
    "error": error.to_string(),
    "kind": error.kind(),
    "status": error.status(),
  })
}

#[cfg(target_os = "macos")]
fn run(cli: &Cli) -> axbridge::BridgeResult<()> {
  macos::run(cli)
}

#[cfg(not(target_os = "macos"))]
fn run(_cli: &Cli) -> axbridge::BridgeResult<()> {
  Err(BridgeError::Unsupported(
    "The accessibility bridge is only available on macOS".to_string(),
  ))
}

#[cfg(target_os = "macos")]
mod macos {
  use axbridge::host::NativeCallable;
  use axbridge::platform::{MacPlatform, Platform};
  use axbridge::{
    BridgeError, BridgeResult, ElementHandle, HostValue, NativeHost, WaitConfig, WaitOutcome,
    WaitRequest,
  };
  use serde::Serialize;
  use std::time::Duration;

  use super::{Cli, Commands};

  /// Parse a `set` argument into a host value.
  pub(super) fn parse_value<P: Platform>(raw: &str) -> HostValue<P> {
    match raw {
      "true" => return HostValue::Bool(true),
      "false" => return HostValue::Bool(false),
      _ => {}
    }
    if let Ok(n) = raw.parse::<i64>() {
      return HostValue::Int(n);
    }
    if let Ok(n) = raw.parse::<f64>() {
      return HostValue::Float(n);
    }
    if let Some((a, b)) = raw.split_once(',') {
      let (a, b) = (a.trim(), b.trim());
      if let (Ok(a), Ok(b)) = (a.parse::<i64>(), b.parse::<i64>()) {
        return HostValue::from((a, b));
      }
      if let (Ok(a), Ok(b)) = (a.parse::<f64>(), b.parse::<f64>()) {
        return HostValue::from((a, b));
      }
    }
    HostValue::Str(raw.to_string())
  }

  fn to_json<T: Serialize + ?Sized>(value: &T) -> BridgeResult<String> {
    serde_json::to_string(value).map_err(|e| BridgeError::Platform(e.to_string()))
  }

  fn print_value<P: Platform>(value: &HostValue<P>, json: bool) -> BridgeResult<()> {
    if json {
      println!("{}", to_json(value)?);
    } else {
      println!("{value:?}");
    }
    Ok(())
  }

  fn print_names(names: &[String], json: bool) -> BridgeResult<()> {
    if json {
      println!("{}", to_json(names)?);
    } else {
      for name in names {
        println!("{name}");
      }
    }
    Ok(())
  }

  fn target(cli: &Cli, platform: &MacPlatform) -> BridgeResult<ElementHandle<MacPlatform>> {
    if cli.system {
      return ElementHandle::system_wide(platform);
    }
    let pid = match cli.pid {
      Some(pid) => axbridge::ProcessId(pid),
      None => axbridge::frontmost_pid(platform)?,
    };
    log::debug!("targeting pid {pid}");
    ElementHandle::application(platform, pid)
  }

  fn wait(
    cli: &Cli,
    platform: &MacPlatform,
    notification: &str,
    timeout: f64,
  ) -> BridgeResult<HostValue<MacPlatform>> {
    let mut element = target(cli, platform)?;
    let host = NativeHost::new();
    let mut scope = host.enter();
    let request: WaitRequest<HostValue<MacPlatform>, NativeCallable<MacPlatform>> =
      WaitRequest::new(notification, Duration::ZERO).with_timeout_secs(timeout);

    log::info!("waiting up to {timeout}s for {notification}");
    match element.wait_for(&mut scope, request, &WaitConfig::default())? {
      WaitOutcome::Completed { value, deliveries } => {
        log::debug!("accepted after {deliveries} deliveries");
        Ok(value)
      }
      WaitOutcome::TimedOut => Ok(HostValue::Bool(false)),
    }
  }

  pub(super) fn run(cli: &Cli) -> BridgeResult<()> {
    let platform = MacPlatform;

    match &cli.command {
      Commands::Enabled => {
        let enabled = axbridge::api_enabled(&platform);
        print_value::<MacPlatform>(&HostValue::Bool(enabled), cli.json)
      }
      Commands::Frontmost => {
        let pid = axbridge::frontmost_pid(&platform)?;
        print_value::<MacPlatform>(&HostValue::Int(i64::from(pid.as_raw())), cli.json)
      }
      Commands::Attrs => print_names(&target(cli, &platform)?.attribute_names()?, cli.json),
      Commands::Actions => print_names(&target(cli, &platform)?.action_names()?, cli.json),
      Commands::Get { attribute } => {
        let value = target(cli, &platform)?.attribute(attribute)?;
        print_value(&value, cli.json)
      }
      Commands::Set { attribute, value } => {
        target(cli, &platform)?.set_attribute(attribute, &parse_value(value))
      }
      Commands::SetString { attribute, text } => {
        target(cli, &platform)?.set_attribute_as_string(attribute, text)
      }
      Commands::Press { action } => target(cli, &platform)?.perform_action(action),
      Commands::Wait {
        notification,
        timeout,
      } => {
        let value = wait(cli, &platform, notification, *timeout)?;
        print_value(&value, cli.json)
      }
      Commands::Timeout { seconds } => target(cli, &platform)?.set_messaging_timeout(*seconds),
    }
  }
}

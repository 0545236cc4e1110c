use anyhow::Result;
use log::debug;
use std::env;
use svcstatus::ServiceResolver;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.contains(&"--version".to_string()) || args.contains(&"-v".to_string()) {
        println!("svcstatus {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.contains(&"--help".to_string()) || args.contains(&"-h".to_string()) || args.len() < 2 {
        println!("svcstatus - query a service's existence and state");
        println!("Version: {}", env!("CARGO_PKG_VERSION"));
        println!("\nUsage: {} [OPTIONS] <service-name>\n", args[0]);
        println!("Options:");
        println!("  --help, -h     Show this help message");
        println!("  --version, -v  Show version information");
        println!("  --exists       Print only whether the service exists");
        println!("  --debug        Enable debug logging");
        println!("\nEnvironment Variables:");
        println!("  RUST_LOG=<level>  Set log level (error|warn|info|debug)");
        return Ok(());
    }

    let debug_mode = args.contains(&"--debug".to_string());
    let exists_mode = args.contains(&"--exists".to_string());

    if debug_mode {
        env::set_var("RUST_LOG", "debug");
    } else if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let name = pick_service_name(&args);

    debug!("query target: '{}', exists_mode: {}", name, exists_mode);

    let resolver = ServiceResolver::new();
    if exists_mode {
        println!("{}", resolver.exists(name)?);
    } else {
        let status = resolver.status(name)?;
        println!("{}", serde_json::to_string_pretty(&status)?);
    }

    Ok(())
}

/// First positional argument; anything dash-prefixed is a flag, not a
/// service name.
fn pick_service_name(args: &[String]) -> &str {
    args.iter()
        .skip(1)
        .find(|a| !a.starts_with('-'))
        .map(String::as_str)
        .unwrap_or("")
}

// Module declarations
mod cli;
mod config;
mod enrich;
mod errors;
mod http;
mod person_db;
mod query;
mod types;
mod util;

// Re-export module items at the crate root so cross-module references stay
// short and uniform.
#[allow(unused_imports)]
pub(crate) use cli::*;
#[allow(unused_imports)]
pub(crate) use config::*;
#[allow(unused_imports)]
pub(crate) use enrich::*;
#[allow(unused_imports)]
pub(crate) use errors::*;
#[allow(unused_imports)]
pub(crate) use http::*;
#[allow(unused_imports)]
pub(crate) use person_db::*;
#[allow(unused_imports)]
pub(crate) use query::*;
#[allow(unused_imports)]
pub(crate) use types::*;
#[allow(unused_imports)]
pub(crate) use util::*;

use clap::Parser;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Init { db } => {
            if db.exists() {
                eprintln!("Refusing to overwrite existing database: {}", db.display());
                std::process::exit(2);
            }
            let _ = PersonDb::open_or_create(&db)?;
            println!("Created {}", db.display());
            Ok(())
        }

        Command::Serve { db, bind, port } => {
            let mut config = ServiceConfig::from_env()?;
            if let Some(bind) = bind {
                config.bind = bind;
            }
            if let Some(port) = port {
                config.port = port;
            }

            // An unreachable store is fatal; there is nothing to serve.
            let store = PersonDb::open_or_create(&db)?;
            eprintln!("[store] opened {} ({} people)", db.display(), store.count());

            let state = ServiceState {
                db: store,
                enricher: Enricher::new(&config),
                max_limit: config.max_limit,
            };
            run_http_service(&config, &state)
        }

        Command::Enrich { name, json } => {
            if name.trim().is_empty() {
                eprintln!("name must not be empty");
                std::process::exit(2);
            }
            let config = ServiceConfig::from_env()?;
            let enricher = Enricher::new(&config);
            let profile = enricher.enrich(&name)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                let or_unknown = |value: &str| {
                    if value.is_empty() {
                        "unknown".to_string()
                    } else {
                        value.to_string()
                    }
                };
                println!("age: {}", profile.age);
                println!("gender: {}", or_unknown(&profile.gender));
                println!("nationality: {}", or_unknown(&profile.nationality));
            }
            Ok(())
        }
    }
}

//! Command-line entry point.
//!
//! # Responsibility
//! - Load `.env`, configuration and logging.
//! - Open the store, run the demo sequence once, close the store.
//!
//! # Invariants
//! - The store is closed on every path that opened it.
//! - The process exits with the default status, even after a failure.

use log::{error, info};
use people_core::db::{close_db, open_store};
use people_core::{
    core_version, init_logging, run_demo, AppConfig, PersonService, SqlitePersonRepository,
};

fn main() {
    // A missing .env file is normal; settings may come from the environment.
    let _ = dotenv::dotenv();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("people_cli: {err}");
            return;
        }
    };

    if let Err(err) = init_logging(&config.log_level, config.log_dir.as_deref()) {
        eprintln!("people_cli: {err}");
        return;
    }
    info!(
        "event=cli_start module=cli status=ok version={} store={}",
        core_version(),
        config.store
    );

    let conn = match open_store(&config.store) {
        Ok(conn) => conn,
        // open_store already logged the failure.
        Err(_) => return,
    };

    match SqlitePersonRepository::try_new(&conn) {
        Ok(repo) => {
            let service = PersonService::new(repo).with_insert_policy(config.insert_policy);
            match run_demo(&service) {
                Ok(report) => info!(
                    "event=cli_demo module=cli status=ok created={} remaining_pizza_lovers={}",
                    report.created_many.len() + 1,
                    report.chained.len()
                ),
                Err(err) => error!("event=cli_demo module=cli status=error error={err}"),
            }
        }
        Err(err) => error!("event=cli_demo module=cli status=error error={err}"),
    }

    // close_db logs its own outcome.
    let _ = close_db(conn);
}

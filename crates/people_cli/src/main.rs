//! Command-line walkthrough of the people collection.
//!
//! # Responsibility
//! - Connect using `PEOPLE_DB_URI`, exiting with status 1 on failure.
//! - Run the bulk delete and chained query walkthroughs and print results.

use log::{error, info};
use people_core::{init_logging, AppConfig, PersonService, SqlitePersonRepository};
use serde::Serialize;
use std::process::ExitCode;

const NAME_TO_REMOVE: &str = "Mary";
const FOOD_TO_SEARCH: &str = "burrito";

fn main() -> ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error connecting to database: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(log_dir) = &config.log_dir {
        if let Err(err) = init_logging(&config.log_level, log_dir) {
            eprintln!("Failed to initialize logging: {err}");
        }
    }

    let conn = match config.db_target.open() {
        Ok(conn) => conn,
        Err(err) => {
            error!("event=cli_connect module=cli status=error error={err}");
            eprintln!("Error connecting to database: {err}");
            return ExitCode::FAILURE;
        }
    };
    let repo = match SqlitePersonRepository::try_new(&conn) {
        Ok(repo) => repo,
        Err(err) => {
            error!("event=cli_connect module=cli status=error error={err}");
            eprintln!("Error connecting to database: {err}");
            return ExitCode::FAILURE;
        }
    };
    info!("event=cli_connect module=cli status=ok");
    println!("Successfully connected to database");

    let service = PersonService::new(repo);

    match service.remove_many_people(NAME_TO_REMOVE) {
        Ok(summary) => println!("People removed successfully: {}", to_json(&summary)),
        Err(err) => eprintln!("Error removing people: {err}"),
    }

    match service.query_chain(FOOD_TO_SEARCH) {
        Ok(people) => println!("Query results: {}", to_json(&people)),
        Err(err) => eprintln!("Error querying people: {err}"),
    }

    ExitCode::SUCCESS
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| format!("<unserializable: {err}>"))
}

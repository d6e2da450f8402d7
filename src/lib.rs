#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod updates;

use rocket::{Build, Rocket};

use crate::config::{ConfigFairing, DatabaseFairing};
use crate::logging::LoggerFairing;
use crate::updates::UpdateBus;

/// Assemble the server: routes, configuration, database, and the update bus
/// that drives live question-list snapshots.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .attach(LoggerFairing)
        .manage(UpdateBus::new())
}

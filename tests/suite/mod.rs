//! CLI integration tests, one module per subcommand family.

mod agent;
mod analyze;
mod diff;
mod files;
mod index_search;
mod run;

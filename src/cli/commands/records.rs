use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

pub const ARG_RECORDS_FILE: &str = "records-file";
pub const ARG_FOLLOWUP_CONTACTS: &str = "followup-contacts";

#[derive(Debug)]
pub struct Options {
    pub records_file: Option<PathBuf>,
    pub followup_contacts: Vec<String>,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        Self {
            records_file: matches
                .get_one::<String>(ARG_RECORDS_FILE)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            followup_contacts: matches
                .get_many::<String>(ARG_FOLLOWUP_CONTACTS)
                .map(|values| values.cloned().collect())
                .unwrap_or_default(),
        }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_RECORDS_FILE)
                .long(ARG_RECORDS_FILE)
                .help("JSON file with the initial records (array, newest first)")
                .env("NOTEORA_RECORDS_FILE"),
        )
        .arg(
            Arg::new(ARG_FOLLOWUP_CONTACTS)
                .long(ARG_FOLLOWUP_CONTACTS)
                .help("Contact persons whose records are due for follow-up")
                .env("NOTEORA_FOLLOWUP_CONTACTS")
                .value_delimiter(',')
                .default_value("ash,yvonne"),
        )
}

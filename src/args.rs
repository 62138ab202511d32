use clap::Parser;

use crate::auth::AuthFlow;
use crate::sheets::{InsertDataOption, ValueInputOption};

#[derive(Parser, Debug)]
#[command(name = "sheets_append")]
#[command(about = "Append a single row of values to a Google Sheets spreadsheet")]
#[command(version)]
pub struct Args {
    /// Spreadsheet ID (if omitted, the first VALUES entry is used)
    #[arg(long, value_name = "SPREADSHEET_ID")]
    pub spreadsheet: Option<String>,

    /// Range in A1 notation to append after (e.g., "Sheet1!A1")
    #[arg(long, value_name = "RANGE")]
    pub range: Option<String>,

    /// Print the update summary after a successful append
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to the OAuth client secret file
    #[arg(long, value_name = "PATH")]
    pub credentials: Option<String>,

    /// Path to the cached OAuth token
    #[arg(long, value_name = "PATH")]
    pub token: Option<String>,

    /// How the API interprets the submitted values
    #[arg(long, value_enum, value_name = "OPTION")]
    pub input_option: Option<ValueInputOption>,

    /// Whether new rows are inserted or existing empty cells overwritten
    #[arg(long, value_enum, value_name = "OPTION")]
    pub insert_option: Option<InsertDataOption>,

    /// How the authorization code reaches the program on first run
    #[arg(long, value_enum, value_name = "FLOW")]
    pub auth_flow: Option<AuthFlow>,

    /// Log level
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Path to config file
    #[arg(long, default_value = "sheets_append.toml")]
    pub config: String,

    /// Cell values of the appended row, in column order
    #[arg(value_name = "VALUES")]
    pub values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_and_values() {
        let args = Args::try_parse_from([
            "sheets_append",
            "--spreadsheet",
            "S",
            "--range",
            "Sheet1!A1",
            "-v",
            "a",
            "b",
            "c",
        ])
        .unwrap();

        assert_eq!(args.spreadsheet.as_deref(), Some("S"));
        assert_eq!(args.range.as_deref(), Some("Sheet1!A1"));
        assert!(args.verbose);
        assert_eq!(args.values, vec!["a", "b", "c"]);
        assert_eq!(args.config, "sheets_append.toml");
    }

    #[test]
    fn test_enum_options() {
        let args = Args::try_parse_from([
            "sheets_append",
            "--input-option",
            "raw",
            "--insert-option",
            "insert-rows",
            "--auth-flow",
            "redirect",
            "S",
            "x",
        ])
        .unwrap();

        assert_eq!(args.input_option, Some(ValueInputOption::Raw));
        assert_eq!(args.insert_option, Some(InsertDataOption::InsertRows));
        assert_eq!(args.auth_flow, Some(AuthFlow::Redirect));
    }

    #[test]
    fn test_unknown_input_option_rejected() {
        let result = Args::try_parse_from(["sheets_append", "--input-option", "typed", "S", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_values_still_parses() {
        // Missing values is reported by Cfg::validate with the usage text.
        let args = Args::try_parse_from(["sheets_append", "--spreadsheet", "S"]).unwrap();
        assert!(args.values.is_empty());
        assert!(!args.verbose);
    }
}

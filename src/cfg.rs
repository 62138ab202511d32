use anyhow::Result;
use clap::ValueEnum;
use config::{Config, File};
use thiserror::Error;
use tracing::{debug, info};

use crate::a1::{A1Range, RangeParseError};
use crate::args::Args;
use crate::auth::AuthFlow;
use crate::sheets::{AppendRequest, InsertDataOption, ValueInputOption};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CfgError {
    #[error("no spreadsheet ID given (use --spreadsheet or pass it as the first argument)")]
    MissingSpreadsheet,
    #[error("no values given for the row")]
    NoValues,
    #[error("invalid --range: {0}")]
    InvalidRange(#[from] RangeParseError),
    #[error("{0} path cannot be empty")]
    EmptyPath(&'static str),
    #[error("invalid {key} {value:?} in config file: {reason}")]
    InvalidOption {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cfg {
    pub spreadsheet_id: String,
    pub range: String,
    pub values: Vec<String>,
    pub verbose: bool,
    pub credentials_path: String,
    pub token_path: String,
    pub value_input_option: ValueInputOption,
    pub insert_data_option: Option<InsertDataOption>,
    pub auth_flow: AuthFlow,
    pub redirect_uri: Option<String>,
}

impl Cfg {
    pub fn load(args: Args) -> Result<Self> {
        let mut cfg = Cfg::default();

        if std::path::Path::new(&args.config).exists() {
            info!("Loading configuration from: {}", args.config);
            let config = Config::builder()
                .add_source(File::with_name(&args.config).required(false))
                .build()?;

            if let Ok(spreadsheet) = config.get_string("spreadsheet") {
                cfg.spreadsheet_id = spreadsheet;
            }
            if let Ok(range) = config.get_string("range") {
                cfg.range = range;
            }
            if let Ok(credentials_path) = config.get_string("credentials_path") {
                cfg.credentials_path = credentials_path;
            }
            if let Ok(token_path) = config.get_string("token_path") {
                cfg.token_path = token_path;
            }
            if let Ok(value) = config.get_string("value_input_option") {
                cfg.value_input_option = parse_option("value_input_option", &value)?;
            }
            if let Ok(value) = config.get_string("insert_data_option") {
                cfg.insert_data_option = Some(parse_option("insert_data_option", &value)?);
            }
            if let Ok(value) = config.get_string("auth_flow") {
                cfg.auth_flow = parse_option("auth_flow", &value)?;
            }
            if let Ok(redirect_uri) = config.get_string("redirect_uri") {
                cfg.redirect_uri = Some(redirect_uri);
            }
            debug!("Loaded configuration from file");
        } else {
            debug!("Config file not found, using defaults");
        }

        if let Some(range) = args.range {
            cfg.range = range;
        }
        if let Some(credentials) = args.credentials {
            cfg.credentials_path = credentials;
        }
        if let Some(token) = args.token {
            cfg.token_path = token;
        }
        if let Some(option) = args.input_option {
            cfg.value_input_option = option;
        }
        if let Some(option) = args.insert_option {
            cfg.insert_data_option = Some(option);
        }
        if let Some(flow) = args.auth_flow {
            cfg.auth_flow = flow;
        }
        cfg.verbose = args.verbose;

        let mut values = args.values;
        if let Some(spreadsheet) = args.spreadsheet {
            debug!("Overriding spreadsheet from command line");
            cfg.spreadsheet_id = spreadsheet;
        } else if cfg.spreadsheet_id.is_empty() && !values.is_empty() {
            debug!("Taking spreadsheet from first positional argument");
            cfg.spreadsheet_id = values.remove(0);
        }
        cfg.values = values;

        debug!("Final configuration: {:?}", cfg);
        Ok(cfg)
    }

    /// Checks everything that can be checked before touching the network.
    pub fn validate(&self) -> Result<(), CfgError> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(CfgError::MissingSpreadsheet);
        }
        if self.values.is_empty() {
            return Err(CfgError::NoValues);
        }

        let range = A1Range::parse(&self.range)?;
        debug!("Target range: {}", range);

        if self.credentials_path.is_empty() {
            return Err(CfgError::EmptyPath("credentials"));
        }
        if self.token_path.is_empty() {
            return Err(CfgError::EmptyPath("token"));
        }

        info!("Configuration validation passed");
        Ok(())
    }

    /// `load` followed by `validate`. Every usage problem, including a bad
    /// option in the config file, comes back as a `CfgError` in the chain.
    pub fn load_and_validate(args: Args) -> Result<Self> {
        let cfg = Cfg::load(args)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn append_request(&self) -> AppendRequest {
        AppendRequest {
            spreadsheet_id: self.spreadsheet_id.clone(),
            range: self.range.clone(),
            values: self.values.clone(),
            value_input_option: self.value_input_option,
            insert_data_option: self.insert_data_option,
        }
    }
}

fn parse_option<T: ValueEnum>(key: &'static str, value: &str) -> Result<T, CfgError> {
    T::from_str(value, true).map_err(|reason| CfgError::InvalidOption {
        key,
        value: value.to_string(),
        reason,
    })
}

impl Default for Cfg {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            range: "A1".to_string(),
            values: Vec::new(),
            verbose: false,
            credentials_path: "credentials.json".to_string(),
            token_path: "token.json".to_string(),
            value_input_option: ValueInputOption::UserEntered,
            insert_data_option: None,
            auth_flow: AuthFlow::Interactive,
            redirect_uri: None,
        }
    }
}

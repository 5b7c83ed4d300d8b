//! Command-line definition

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use yard_office::models::{ExportStatus, Role};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Parser)]
#[command(name = "yard-office")]
#[command(version)]
#[command(about = "Back-office client for vehicle yard shipments")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value_t = OutputFormat::Table, value_enum)]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the session
    Login {
        #[arg(long, short = 'u')]
        user_id: String,
        /// Read from YARD_PASSWORD when omitted
        #[arg(long, short = 'p', env = "YARD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    #[command(subcommand)]
    Shipments(ShipmentCommand),
    #[command(subcommand)]
    Vessels(VesselCommand),
    #[command(subcommand)]
    Users(UserCommand),
    #[command(subcommand)]
    Customer(CustomerCommand),
    #[command(subcommand)]
    Photos(PhotoCommand),
    #[command(subcommand)]
    Stats(StatsCommand),
}

/// Filters, paging and sorting shared by list commands.
#[derive(Args, Clone, Debug, Default)]
pub struct ListArgs {
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long)]
    pub chassis: Option<String>,
    #[arg(long)]
    pub client: Option<String>,
    #[arg(long)]
    pub vessel: Option<String>,
    #[arg(long)]
    pub yard: Option<u32>,
    #[arg(long, value_parser = parse_status)]
    pub status: Option<ExportStatus>,
    /// Date the range applies to (gateIn or gateOut)
    #[arg(long)]
    pub date_type: Option<String>,
    #[arg(long, value_parser = parse_date_arg)]
    pub from: Option<NaiveDate>,
    #[arg(long, value_parser = parse_date_arg)]
    pub to: Option<NaiveDate>,
    #[arg(long)]
    pub job_number: Option<String>,
    #[arg(long)]
    pub pod: Option<String>,
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    /// Page size; defaults to YARD_PAGE_SIZE
    #[arg(long)]
    pub limit: Option<u32>,
    /// Column to sort by; repeat to cycle asc, desc, default
    #[arg(long)]
    pub sort: Vec<String>,
}

#[derive(Args, Clone, Debug, Default)]
pub struct ShipmentFields {
    #[arg(long)]
    pub client: Option<String>,
    #[arg(long, value_parser = parse_date_arg)]
    pub gate_in: Option<NaiveDate>,
    #[arg(long, value_parser = parse_date_arg)]
    pub gate_out: Option<NaiveDate>,
    #[arg(long)]
    pub chassis: Option<String>,
    #[arg(long)]
    pub make_model: Option<String>,
    #[arg(long)]
    pub yard: Option<u32>,
    #[arg(long)]
    pub vessel: Option<String>,
    #[arg(long, value_parser = parse_status)]
    pub status: Option<ExportStatus>,
    #[arg(long)]
    pub remarks: Option<String>,
}

#[derive(Subcommand)]
pub enum ShipmentCommand {
    List(ListArgs),
    Show { id: String },
    Create(ShipmentFields),
    Update {
        id: String,
        #[command(flatten)]
        fields: ShipmentFields,
    },
    /// Replace the remarks of one shipment
    Remarks { id: String, text: String },
    Delete { id: String },
    BulkDelete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    AssignVessel {
        /// Existing vessel id
        #[arg(long, conflicts_with = "new_vessel")]
        vessel: Option<String>,
        /// Create a vessel with this name and assign it
        #[arg(long, requires = "job_number")]
        new_vessel: Option<String>,
        #[arg(long)]
        job_number: Option<String>,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    AssignGateOut {
        #[arg(long, value_parser = parse_date_arg)]
        date: NaiveDate,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Download the CSV export for the given filters
    Export {
        #[command(flatten)]
        list: ListArgs,
        /// Only print the export URL
        #[arg(long)]
        url_only: bool,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Clone, Debug, Default)]
pub struct VesselFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub job_number: Option<String>,
    #[arg(long, value_parser = parse_date_arg)]
    pub etd: Option<NaiveDate>,
    #[arg(long)]
    pub shipping_line: Option<String>,
    #[arg(long)]
    pub pod: Option<String>,
}

#[derive(Subcommand)]
pub enum VesselCommand {
    List(ListArgs),
    Create(VesselFields),
    Update {
        id: String,
        #[command(flatten)]
        fields: VesselFields,
    },
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum UserCommand {
    List {
        #[command(flatten)]
        list: ListArgs,
        /// Hide admin accounts
        #[arg(long)]
        customers_only: bool,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        user_id: String,
        #[arg(long, env = "YARD_NEW_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, value_parser = parse_role, default_value = "customer")]
        role: Role,
        #[arg(long)]
        mass_download: bool,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long, value_parser = parse_role)]
        role: Option<Role>,
        #[arg(long)]
        mass_download: Option<bool>,
    },
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum CustomerCommand {
    List(ListArgs),
    Export {
        #[command(flatten)]
        list: ListArgs,
        #[arg(long)]
        url_only: bool,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Bundle the photos of up to 20 shipments into a ZIP
    Download {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum PhotoCommand {
    /// Upload photo files to a shipment's car
    Upload {
        shipment: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Delete photos by storage key
    Delete {
        shipment: String,
        #[arg(required = true)]
        keys: Vec<String>,
    },
    UploadZip { shipment: String, file: PathBuf },
    /// Print signed download URLs
    Urls { shipment: String },
}

#[derive(Subcommand)]
pub enum StatsCommand {
    Dashboard,
    Gates {
        #[arg(long, value_parser = parse_date_arg)]
        from: Option<NaiveDate>,
        #[arg(long, value_parser = parse_date_arg)]
        to: Option<NaiveDate>,
    },
}

fn parse_date_arg(raw: &str) -> Result<NaiveDate, String> {
    yard_office::models::parse_date(raw).ok_or_else(|| format!("invalid date '{}'", raw))
}

fn parse_status(raw: &str) -> Result<ExportStatus, String> {
    raw.parse().map_err(|e: yard_office::AppError| e.to_string())
}

fn parse_role(raw: &str) -> Result<Role, String> {
    raw.parse().map_err(|e: yard_office::AppError| e.to_string())
}

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clipper_fare_core::model::RiderCategory;
use clipper_fare_core::{
    compute_trip, parse_leg_spec, parse_trip_hash, FareData, FareDataInput, FarePolicy,
    FareShape, NoticeContainer, NoticeSeverity, TripReport, TripRequest, FARE_PRODUCTS_FILE,
    FARE_TRANSFER_RULES_FILE, REFERENCE_FILE_NAMES,
};

#[derive(Debug, Parser)]
#[command(name = "clipper-fare")]
#[command(about = "Compare Clipper and Clipper 2.0 fares for a multi-agency trip")]
struct Args {
    /// Directory holding fare_products.txt, fare_transfer_rules.txt, stops.txt
    /// and gtfsoperators.xml
    #[arg(short = 'i', long = "input")]
    input: Option<PathBuf>,

    /// Base URL serving the same reference files
    #[arg(short = 'u', long = "url")]
    url: Option<String>,

    #[arg(short = 's', long = "storage_directory", alias = "storage-directory")]
    storage_directory: Option<PathBuf>,

    #[arg(short = 'c', long = "category", default_value = "adult", value_parser = parse_category)]
    category: RiderCategory,

    /// A trip leg: `AGENCY` or `AGENCY;FROM;TO`. Agencies may be ids, names or nicknames.
    #[arg(short = 'l', long = "leg")]
    legs: Vec<String>,

    /// A share hash such as `#adult#AC#BA;12TH;MONT`; overrides --category and --leg
    #[arg(short = 't', long = "trip")]
    trip: Option<String>,

    /// JSON file overriding the fare policy constants
    #[arg(long = "policy")]
    policy: Option<PathBuf>,

    #[arg(long = "json")]
    json: bool,

    #[arg(short = 'p', long = "pretty")]
    pretty: bool,

    /// Write load notices as JSON to this file
    #[arg(short = 'n', long = "notices")]
    notices: Option<PathBuf>,

    #[arg(long = "list-agencies", alias = "list_agencies")]
    list_agencies: bool,

    /// List the zones or stations of a matrix-priced agency
    #[arg(long = "list-stops", alias = "list_stops")]
    list_stops: Option<String>,

    #[arg(long = "log-level", alias = "log_level")]
    log_level: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());

    let policy = load_policy(args.policy.as_deref())?;
    let input = resolve_input(&args)?;
    info!("loading reference data from {}", input.path().display());

    let mut notices = NoticeContainer::new();
    let load_result = FareData::from_input_with_notices(&input, &policy, &mut notices);
    if let Some(path) = args.notices.as_deref() {
        write_notices(path, &notices, args.pretty)?;
    }
    let data = load_result
        .with_context(|| format!("load reference data from {}", input.path().display()))?;
    let warnings = notices.count_with_severity(NoticeSeverity::Warning);
    let errors = notices.count_with_severity(NoticeSeverity::Error);
    if warnings + errors > 0 {
        warn!("{} load errors, {} load warnings", errors, warnings);
    }

    if args.list_agencies {
        print_agencies(&data);
        return Ok(());
    }
    if let Some(agency) = args.list_stops.as_deref() {
        return print_stops(&data, agency);
    }

    let request = trip_request(&args)?
        .resolve_agencies(&data.agencies)
        .context("resolve trip agencies")?;
    if request.legs.is_empty() {
        bail!("a trip needs at least one --leg or a --trip hash");
    }

    let result = compute_trip(&data, &policy, &request.legs, request.category)
        .context("cannot price this trip")?;
    let report = TripReport::new(&result, &data.agencies, policy.annual_trips)
        .with_share_hash(request.to_hash());

    if args.json {
        let json = report.to_json(args.pretty).context("serialize trip report")?;
        println!("{}", json);
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_category(value: &str) -> Result<RiderCategory, String> {
    value.parse::<RiderCategory>().map_err(|err| err.to_string())
}

fn load_policy(path: Option<&Path>) -> anyhow::Result<FarePolicy> {
    let Some(path) = path else {
        return Ok(FarePolicy::default());
    };
    let json =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    FarePolicy::from_json_str(&json).with_context(|| format!("parse policy {}", path.display()))
}

fn trip_request(args: &Args) -> anyhow::Result<TripRequest> {
    if let Some(hash) = args.trip.as_deref() {
        if !args.legs.is_empty() {
            bail!("--trip and --leg cannot be provided at the same time");
        }
        return parse_trip_hash(hash).with_context(|| format!("parse trip hash {:?}", hash));
    }

    let mut legs = Vec::with_capacity(args.legs.len());
    for spec in &args.legs {
        if let Some(leg) =
            parse_leg_spec(spec).with_context(|| format!("parse --leg {:?}", spec))?
        {
            legs.push(leg);
        }
    }
    Ok(TripRequest::new(args.category, legs))
}

fn print_agencies(data: &FareData) {
    if let Some(generated) = data.agencies.last_generated() {
        println!("# registry generated {}", generated);
    }
    for agency in data.agencies.listed() {
        println!("{}\t{}", agency.id, data.agencies.display_label(agency));
    }
}

fn print_stops(data: &FareData, agency: &str) -> anyhow::Result<()> {
    let agency_id = data
        .agencies
        .resolve(agency)
        .with_context(|| format!("resolve agency {:?}", agency))?;
    let shape = data.fare_shapes.shape_for(&agency_id);
    let table = match shape {
        FareShape::Flat => bail!("{} charges a flat fare; it has no zones or stations", agency_id),
        FareShape::ZonalMatrix(table) | FareShape::StationMatrix(table) => table,
    };
    println!(
        "# {} / {}",
        shape.origin_label(&agency_id),
        shape.destination_label(&agency_id)
    );
    for (id, label) in table.iter() {
        println!("{}\t{}", id, label);
    }
    Ok(())
}

fn write_notices(path: &Path, notices: &NoticeContainer, pretty: bool) -> anyhow::Result<()> {
    let json = notices.to_json(pretty).context("serialize notices")?;
    std::fs::write(path, format!("{}\n", json))
        .with_context(|| format!("write {}", path.display()))?;
    info!("{} notices written to {}", notices.len(), path.display());
    Ok(())
}

fn resolve_input(args: &Args) -> anyhow::Result<FareDataInput> {
    match (&args.input, &args.url) {
        (Some(_), Some(_)) => {
            bail!("--input and --url cannot be provided at the same time");
        }
        (None, None) => {
            bail!("one of --input or --url must be provided");
        }
        (Some(path), None) => {
            if args.storage_directory.is_some() {
                bail!("--storage_directory requires --url");
            }
            FareDataInput::from_path(path).with_context(|| format!("load input {}", path.display()))
        }
        (None, Some(url)) => {
            if url.trim().is_empty() {
                bail!("--url must not be empty");
            }
            let download_dir = match args.storage_directory.clone() {
                Some(dir) => dir,
                None => std::env::temp_dir().join(format!(
                    "clipper_fare_download_{}_{}",
                    std::process::id(),
                    unique_suffix()
                )),
            };
            std::fs::create_dir_all(&download_dir).with_context(|| {
                format!("create storage directory {}", download_dir.display())
            })?;
            download_reference_files(url, &download_dir)?;
            FareDataInput::from_path(&download_dir)
                .with_context(|| format!("load input {}", download_dir.display()))
        }
    }
}

fn download_reference_files(base_url: &str, dir: &Path) -> anyhow::Result<()> {
    let client = Client::builder()
        .user_agent(format!("clipper-fare/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .context("build http client")?;

    let progress = ProgressBar::new(REFERENCE_FILE_NAMES.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    for &name in REFERENCE_FILE_NAMES {
        progress.set_message(format!("Downloading {}", name));
        let url = format!("{}/{}", base_url.trim_end_matches('/'), name);
        let required = name == FARE_PRODUCTS_FILE || name == FARE_TRANSFER_RULES_FILE;
        let downloaded = download_url_to_path(&client, &url, &dir.join(name), required)?;
        if !downloaded {
            warn!("{} not found at {}", name, url);
        }
        progress.inc(1);
    }
    progress.finish_with_message("Download complete");
    Ok(())
}

/// Returns `false` when an optional file is missing on the server. A copy
/// left at `path` by an earlier download is removed in that case.
fn download_url_to_path(
    client: &Client,
    url: &str,
    path: &Path,
    required: bool,
) -> anyhow::Result<bool> {
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("download {}", url))?;
    if !required && response.status() == StatusCode::NOT_FOUND {
        remove_stale_file(path)?;
        return Ok(false);
    }
    let mut response = response
        .error_for_status()
        .with_context(|| format!("download {}", url))?;
    let mut file =
        std::fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
    std::io::copy(&mut response, &mut file).with_context(|| format!("write {}", path.display()))?;
    Ok(true)
}

fn remove_stale_file(path: &Path) -> anyhow::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            warn!("removed stale {}", path.display());
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("remove {}", path.display())),
    }
}

fn unique_suffix() -> u128 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
}

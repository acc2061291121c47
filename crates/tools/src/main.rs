use std::env;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand, ValueEnum};
use elevation::{AltitudeAdapter, ElevationBatchClient, ElevationConfig, HttpElevationLookup};
use foundation::ids::PoiId;
use formats::{
    FilePreferencesStore, FinishAction, PreferencesStore, RcLostAction, WaylineOptions,
    export_kml, export_wayline_archive,
};
use mission::FlightPlanStore;
use mission::orbit::OrbitParams;
use mission::path::PathView;
use reqwest::Client;
use tools::{format_report, format_statistics, load_plan, save_plan, write_bytes};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Waypoint mission planning tools")]
struct Args {
    /// Elevation API URL (default: ELEVATION_API_URL or Open Topo Data SRTM 30m)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Points per elevation request (default: ELEVATION_BATCH_SIZE or 100)
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    /// Pause between elevation requests in ms (default: ELEVATION_BATCH_DELAY_MS or 1100)
    #[arg(long, global = true)]
    batch_delay_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print distance, hover time and duration of a plan
    Stats { plan: PathBuf },

    /// Export a wayline mission archive (KMZ)
    ExportWpml {
        plan: PathBuf,

        #[arg(long, default_value = "mission.kmz")]
        out: PathBuf,

        #[arg(long, default_value_t = 68)]
        drone_enum: u32,

        #[arg(long, default_value_t = 0)]
        drone_sub_enum: u32,

        #[arg(long, value_enum, default_value_t = FinishArg::GoHome)]
        finish: FinishArg,

        #[arg(long, value_enum, default_value_t = RcLostArg::GoBack)]
        rc_lost: RcLostArg,

        /// Speed to the first waypoint in m/s (default: plan cruise speed)
        #[arg(long)]
        transitional_speed: Option<f64>,
    },

    /// Export a generic KML document
    ExportKml {
        plan: PathBuf,

        #[arg(long, default_value = "plan.kml")]
        out: PathBuf,

        #[arg(long, default_value = "Waypoint mission")]
        name: String,
    },

    /// Append an orbit of POI-tracking waypoints around a POI
    Orbit {
        plan: PathBuf,

        #[arg(long)]
        poi: u32,

        #[arg(long)]
        radius: f64,

        #[arg(long, default_value_t = 8)]
        points: usize,

        /// Altitude relative to home (default: plan default altitude)
        #[arg(long)]
        altitude: Option<i32>,

        /// Output plan (default: overwrite input)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Keep a constant height above ground at every waypoint
    AdaptAgl {
        plan: PathBuf,

        #[arg(long)]
        agl: f64,

        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Fly every waypoint at one absolute altitude
    AdaptAmsl {
        plan: PathBuf,

        #[arg(long)]
        amsl: f64,

        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Set the home elevation from the ground under the first waypoint
    HomeElevation {
        plan: PathBuf,

        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Refresh ground elevation under every POI
    RefreshPois {
        plan: PathBuf,

        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show or set the persisted UI language
    Language {
        value: Option<String>,

        /// Config directory (default: WAYPOINT_CONFIG_DIR or ./.waypoint)
        #[arg(long)]
        config_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FinishArg {
    GoHome,
    NoAction,
    AutoLand,
    FirstWaypoint,
}

impl From<FinishArg> for FinishAction {
    fn from(arg: FinishArg) -> Self {
        match arg {
            FinishArg::GoHome => FinishAction::GoHome,
            FinishArg::NoAction => FinishAction::NoAction,
            FinishArg::AutoLand => FinishAction::AutoLand,
            FinishArg::FirstWaypoint => FinishAction::GotoFirstWaypoint,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RcLostArg {
    GoBack,
    Landing,
    Hover,
    Continue,
}

impl From<RcLostArg> for RcLostAction {
    fn from(arg: RcLostArg) -> Self {
        match arg {
            RcLostArg::GoBack => RcLostAction::GoBack,
            RcLostArg::Landing => RcLostAction::Landing,
            RcLostArg::Hover => RcLostAction::Hover,
            RcLostArg::Continue => RcLostAction::Continue,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = ElevationConfig::from_env();
    if let Some(url) = args.api_url {
        config.api_url = url;
    }
    if let Some(size) = args.batch_size {
        config.batch_size = size.max(1);
    }
    if let Some(ms) = args.batch_delay_ms {
        config.batch_delay = Duration::from_millis(ms);
    }
    let elevation_client = || {
        let lookup = HttpElevationLookup::new(Client::new(), config.api_url.clone());
        ElevationBatchClient::with_config(lookup, &config)
    };

    match args.command {
        Command::Stats { plan } => {
            let store = load_plan(&plan)?;
            let mut view = PathView::new();
            view.refresh(&store, &[]);
            println!("{}", format_statistics(&view.statistics()));
        }
        Command::ExportWpml {
            plan,
            out,
            drone_enum,
            drone_sub_enum,
            finish,
            rc_lost,
            transitional_speed,
        } => {
            let store = load_plan(&plan)?;
            let options = WaylineOptions {
                drone_enum_value: drone_enum,
                drone_sub_enum_value: drone_sub_enum,
                finish_action: finish.into(),
                rc_lost_action: rc_lost.into(),
                transitional_speed_mps: transitional_speed,
                timestamp_ms: Some(now_ms()),
                ..WaylineOptions::default()
            };
            let bytes = export_wayline_archive(&store, &options)?;
            write_bytes(&out, &bytes)?;
            info!("wrote {}", out.display());
        }
        Command::ExportKml { plan, out, name } => {
            let store = load_plan(&plan)?;
            write_bytes(&out, export_kml(&store, &name).as_bytes())?;
            info!("wrote {}", out.display());
        }
        Command::Orbit {
            plan,
            poi,
            radius,
            points,
            altitude,
            out,
        } => {
            let mut store = load_plan(&plan)?;
            let params = OrbitParams {
                radius_m: radius,
                point_count: points,
                altitude: altitude.unwrap_or(store.settings().default_altitude),
            };
            let outcome = store.add_orbit(PoiId::new(poi), &params)?;
            println!("added {} orbit waypoints", outcome.waypoints.len());
            write_plan(&store, &plan, out)?;
        }
        Command::AdaptAgl { plan, agl, out } => {
            let mut store = load_plan(&plan)?;
            let client = elevation_client();
            let report = AltitudeAdapter::new(&client)
                .adapt_to_agl(&mut store, agl)
                .await?;
            println!("{}", format_report(&report));
            write_plan(&store, &plan, out)?;
        }
        Command::AdaptAmsl { plan, amsl, out } => {
            let mut store = load_plan(&plan)?;
            let client = elevation_client();
            let report = AltitudeAdapter::new(&client)
                .adapt_to_amsl(&mut store, amsl)
                .await?;
            println!("{}", format_report(&report));
            write_plan(&store, &plan, out)?;
        }
        Command::HomeElevation { plan, out } => {
            let mut store = load_plan(&plan)?;
            let client = elevation_client();
            let home = AltitudeAdapter::new(&client)
                .home_elevation_from_first_waypoint(&mut store)
                .await?;
            println!("home elevation: {home:.1} m MSL");
            write_plan(&store, &plan, out)?;
        }
        Command::RefreshPois { plan, out } => {
            let mut store = load_plan(&plan)?;
            let client = elevation_client();
            let report = AltitudeAdapter::new(&client)
                .refresh_poi_elevations(&mut store)
                .await?;
            println!(
                "{} POIs updated, {} unresolved",
                report.updated,
                report.unresolved.len()
            );
            write_plan(&store, &plan, out)?;
        }
        Command::Language { value, config_dir } => {
            let dir = config_dir.unwrap_or_else(|| {
                env::var("WAYPOINT_CONFIG_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(".waypoint"))
            });
            let mut prefs_store = FilePreferencesStore::in_dir(dir);
            let mut prefs = prefs_store.load()?;
            match value {
                Some(language) => {
                    prefs.language = Some(language);
                    prefs_store.save(&prefs)?;
                    info!("saved preferences to {}", prefs_store.path().display());
                }
                None => println!("{}", prefs.language.as_deref().unwrap_or("(unset)")),
            }
        }
    }

    Ok(())
}

fn write_plan(
    store: &FlightPlanStore,
    input: &Path,
    out: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let target = out.unwrap_or_else(|| input.to_path_buf());
    save_plan(store, &target)?;
    info!("wrote {}", target.display());
    Ok(())
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

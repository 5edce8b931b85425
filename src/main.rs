//! weather-history
//!
//! Command-line front end: look up current weather, export forecasts into the
//! local history, seed past observations and inspect what has been stored.

use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use weather_history::{
    daily_records, default_history_path, CityDirectory, CityWeather, Config, CsvStore,
    CurrentWeather, HistoryLazyFrame, TemperatureSeries, Units, WeatherHistory,
    CITIES_FILE_NAME, DEFAULT_CITY_LIMIT,
};

/// Number of forecast days shown by `lookup`.
const FORECAST_DAYS: usize = 5;
/// Width of the temperature bars drawn by `chart`.
const CHART_WIDTH: usize = 40;

#[derive(Parser)]
#[command(name = "weather-history")]
#[command(author, version, about = "OpenWeatherMap forecasts with a reconciled local history", long_about = None)]
struct Cli {
    /// History CSV file (defaults to the user data directory)
    #[arg(long, global = true, env = "WEATHER_HISTORY_FILE")]
    file: Option<PathBuf>,

    /// Unit system requested from the API: imperial, metric or standard
    #[arg(long, global = true, env = "WEATHER_UNITS")]
    units: Option<Units>,

    /// Verbosity level
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current conditions and the 5-day forecast
    Lookup {
        city: String,
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        country: Option<String>,
    },

    /// Fetch the daily forecast and merge it into the history file
    Export {
        city: String,
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        country: Option<String>,
    },

    /// Fetch observations of the last days (today excluded) into the history file
    Seed {
        city: String,
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        country: Option<String>,
        /// Number of past days to fetch
        #[arg(long, default_value_t = weather_history::DEFAULT_SEED_DAYS)]
        days: u32,
    },

    /// Print the actual and predicted temperatures of one location
    Chart { city: String, state: String },

    /// Print the stored history
    Show {
        #[arg(long, requires = "state")]
        city: Option<String>,
        #[arg(long, requires = "city")]
        state: Option<String>,
        /// First weather date to include (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        /// Last weather date to include (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },

    /// List known "City, State" pairs whose name contains FILTER
    Cities {
        filter: Option<String>,
        /// CSV file with City and State columns
        #[arg(long = "cities-file", env = "WEATHER_CITIES_FILE", default_value = CITIES_FILE_NAME)]
        cities_file: PathBuf,
        /// Maximum number of cities listed
        #[arg(long, default_value_t = DEFAULT_CITY_LIMIT)]
        limit: usize,
    },
}

fn level_from_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(level_from_verbosity(cli.verbose))
        .parse_default_env()
        .init();

    match cli.command {
        Commands::Lookup {
            ref city,
            ref state,
            ref country,
        } => {
            let history = open_history(&cli)?;
            let city_weather = history
                .lookup(city)
                .maybe_state(state.as_deref())
                .maybe_country(country.as_deref())
                .call()
                .await?;
            print_current(&city_weather, history.units());
            print_forecast(&city_weather, history.units());
        }

        Commands::Export {
            ref city,
            ref state,
            ref country,
        } => {
            let history = open_history(&cli)?;
            let city_weather = history
                .lookup(city)
                .maybe_state(state.as_deref())
                .maybe_country(country.as_deref())
                .call()
                .await?;
            let summary = history.export_daily(&city_weather)?;

            println!(
                "Exported {} to {}",
                city_weather.location.display_name(),
                history.store().path().display()
            );
            println!("  Existing rows kept: {}", summary.kept);
            println!("  Forecast rows replaced: {}", summary.replaced);
            println!("  New rows added: {}", summary.added);
            if summary.collapsed > 0 {
                println!("  Duplicate rows collapsed: {}", summary.collapsed);
            }
            println!("  Total rows: {}", summary.records.len());
        }

        Commands::Seed {
            ref city,
            ref state,
            ref country,
            days,
        } => {
            let history = open_history(&cli)?;
            let report = history
                .seed_history(city)
                .maybe_state(state.as_deref())
                .maybe_country(country.as_deref())
                .days(days)
                .call()
                .await?;

            for (date, reason) in &report.failed {
                println!("Failed to fetch {date}: {reason}");
            }
            match report.merged {
                Some(summary) => println!(
                    "Seeded {} of {} days into {} ({} rows total)",
                    summary.added,
                    days,
                    history.store().path().display(),
                    summary.records.len()
                ),
                None => println!("No historical data could be fetched, history left unchanged"),
            }
        }

        Commands::Chart {
            ref city,
            ref state,
        } => {
            let store = open_store(&cli)?;
            let records = store.load()?;
            let series = TemperatureSeries::build(&records, city, state, Local::now().date_naive());
            print_chart(&series, cli.units.unwrap_or_default());
        }

        Commands::Show {
            ref city,
            ref state,
            from,
            to,
        } => {
            let store = open_store(&cli)?;
            let mut history = HistoryLazyFrame::from_records(&store.load()?)?;
            if let (Some(city), Some(state)) = (city, state) {
                history = history.for_location(city, state);
            }
            if let (Some(from), Some(to)) = (from, to) {
                history = history.get_range(from, to);
            }
            let df = history.sorted().frame.collect()?;
            println!("{df}");
        }

        Commands::Cities {
            ref filter,
            ref cities_file,
            limit,
        } => {
            let directory = CityDirectory::load(cities_file)?;
            let matches = directory.search(filter.as_deref().unwrap_or_default(), limit);
            if matches.is_empty() {
                println!("No matching cities in {}", cities_file.display());
            }
            for entry in matches {
                println!("{}", entry.label());
            }
        }
    }

    Ok(())
}

/// Reads the configuration (the API key is required here, before any request)
/// and applies the command-line overrides.
fn open_history(cli: &Cli) -> anyhow::Result<WeatherHistory> {
    let mut config = Config::from_env()?;
    if let Some(file) = &cli.file {
        config.history_path = file.clone();
    }
    if let Some(units) = cli.units {
        config.units = units;
    }
    Ok(WeatherHistory::new(&config)?)
}

/// Store access for the read-only commands, which need no API key.
fn open_store(cli: &Cli) -> anyhow::Result<CsvStore> {
    let path = match &cli.file {
        Some(file) => file.clone(),
        None => default_history_path().context("No history file given")?,
    };
    Ok(CsvStore::new(path))
}

fn print_current(city_weather: &CityWeather, units: Units) {
    println!("{}", city_weather.location.display_name());
    match &city_weather.weather.current {
        Some(current) => current_lines(current, units)
            .iter()
            .for_each(|line| println!("  {line}")),
        None => println!("  No current conditions reported"),
    }
}

fn current_lines(current: &CurrentWeather, units: Units) -> Vec<String> {
    let symbol = units.temperature_symbol();
    let mut lines = Vec::new();
    if let Some(temp) = current.temp {
        lines.push(format!("{temp:.1}{symbol}"));
    }
    if let Some(condition) = current.weather.first() {
        lines.push(weather_history::title_case(&condition.description));
    }
    lines.push(match current.feels_like {
        Some(feels_like) => format!("Feels like: {feels_like:.1}{symbol}"),
        None => "Feels like: --".to_string(),
    });
    lines.push(match current.humidity {
        Some(humidity) => format!("Humidity: {humidity}%"),
        None => "Humidity: --".to_string(),
    });
    if let Some(wind) = current.wind_speed {
        lines.push(format!("Wind: {wind:.1} {}", units.speed_symbol()));
    }
    // the API reports visibility in meters whatever the unit system
    lines.push(match current.visibility {
        Some(meters) => format!("Visibility: {:.1} km", meters as f64 / 1000.0),
        None => "Visibility: --".to_string(),
    });
    lines.push(match current.clouds {
        Some(clouds) => format!("Cloudiness: {clouds}%"),
        None => "Cloudiness: --".to_string(),
    });
    lines
}

fn print_forecast(city_weather: &CityWeather, units: Units) {
    println!();
    println!("{FORECAST_DAYS}-Day Forecast");
    for line in forecast_lines(city_weather, units, Local::now().date_naive()) {
        println!("  {line}");
    }
}

/// One line per forecast day: day name, day and night temperature, summary.
fn forecast_lines(city_weather: &CityWeather, units: Units, today: NaiveDate) -> Vec<String> {
    let symbol = units.temperature_symbol();
    let fmt_temp =
        |temp: Option<f64>| temp.map_or_else(|| "--".to_string(), |t| format!("{t:.0}{symbol}"));

    // daily_records yields one record per daily entry, in order
    let records = daily_records(&city_weather.location, &city_weather.weather, today, today);
    records
        .iter()
        .zip(&city_weather.weather.daily)
        .take(FORECAST_DAYS)
        .map(|(record, daily)| {
            let day = match (record.weather_date - today).num_days() {
                0 => "Today".to_string(),
                1 => "Tomorrow".to_string(),
                _ => record.weather_date.format("%A").to_string(),
            };
            let temps = format!("{} / {}", fmt_temp(daily.temp.day), fmt_temp(daily.temp.night));
            format!("{day:<10} {temps:>13}  {}", record.summary)
        })
        .collect()
}

fn print_chart(series: &TemperatureSeries, units: Units) {
    let symbol = units.temperature_symbol();
    let (Some((lo, hi)), Some((min, max))) = (series.y_limits, series.range) else {
        println!(
            "No temperature data for {}, {}. Export some weather data first.",
            series.city, series.state
        );
        return;
    };

    println!("Temperature Trends - {}, {}", series.city, series.state);
    println!("Range: {min:.1}{symbol} - {max:.1}{symbol}");
    println!();

    let mut today_marked = false;
    for (point, predicted) in series.points() {
        if !today_marked && point.date > series.today {
            println!("  {:-^width$}", " Today ", width = CHART_WIDTH + 22);
            today_marked = true;
        }
        let filled = (((point.temp - lo) / (hi - lo)) * CHART_WIDTH as f64).round() as usize;
        let marker = if predicted { "^" } else { "o" };
        let bar = marker.repeat(filled.clamp(1, CHART_WIDTH));
        println!(
            "  {}  {:>7.1}{symbol}  {:<9} {bar}",
            point.date.format("%m/%d"),
            point.temp,
            if predicted { "predicted" } else { "actual" },
        );
    }

    if let Some((from, to)) = series.bridge {
        println!();
        println!(
            "Today {:.1}{symbol} -> {} {:.1}{symbol}",
            from.temp,
            to.date.format("%m/%d"),
            to.temp
        );
    }
}

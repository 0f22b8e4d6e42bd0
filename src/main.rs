use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use polycal::{config, filter, filter::Selection, info, timetable, Config};

#[derive(Parser)]
#[clap(version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[clap(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Timetable export, i.e.: horsage.csv
    #[clap(short, long, value_name = "FILE")]
    timetable: Option<PathBuf>,

    /// Alternance legend, i.e.: alternance.csv
    #[clap(short, long, value_name = "FILE")]
    alternance: Option<PathBuf>,

    /// Export to iCalendar format (.ics)
    #[clap(short, long, value_name = "FILE NAME")]
    export: Option<PathBuf>,

    /// Groups to export, i.e.: LOG1810:c2,l4 (repeatable, replaces the configuration's)
    #[clap(short, long = "select", value_name = "SELECTION")]
    select: Vec<String>,

    /// Timezone of the classes, default to America/Toronto
    #[clap(long, value_name = "TZ")]
    timezone: Option<String>,

    /// Day following another weekday's schedule, i.e.: 2024-10-01=LUN (repeatable)
    #[clap(short, long = "override", value_name = "DATE=DAY")]
    overrides: Vec<String>,

    /// Only show the courses of the timetable
    #[clap(short, long)]
    list: bool,
}

impl Args {
    /// Configuration file values, overwritten by the command line
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(path) = &self.timetable {
            config.timetable.clone_from(path);
        }
        if let Some(path) = &self.alternance {
            config.alternance.clone_from(path);
        }
        if let Some(path) = &self.export {
            config.output.clone_from(path);
        }
        if let Some(tz) = &self.timezone {
            config.timezone.clone_from(tz);
        }
        for arg in &self.overrides {
            config.overrides.push(config::parse_override(arg)?);
        }
        // The selection of the command line replaces the one of the file
        if !self.select.is_empty() {
            let mut selection = Selection::default();
            for entry in &self.select {
                selection.add_entry(entry)?;
            }
            config.selection = selection;
        }

        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("polycal=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.config()?;
    // Fail before reading anything
    config.tz()?;

    println!("Lecture de l'horaire...");
    let courses = timetable::load(&config.timetable).context("Can't load the timetable")?;

    if args.list {
        timetable::display(&courses);
        return Ok(());
    }

    println!("Lecture du calendrier d'alternance...");
    let alternance = info::load(&config.alternance).context("Can't load the alternance")?;

    let selection = if config.selection.is_empty() {
        filter::interactive(&courses)?
    } else {
        config.selection.clone()
    };

    let count = polycal::generate(&config, &courses, &alternance, &selection)?;
    println!(
        "Fichier .ICS construit et exporté ({count} cours) => {}",
        config.output.display()
    );

    Ok(())
}

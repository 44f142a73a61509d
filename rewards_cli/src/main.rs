use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use rewards_core::metrics::{day_streak, resolve_as_of, weekly_consistency_streak};
use rewards_core::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rewards")]
#[command(about = "Workout rewards: badges, points, and levels", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a completed session and apply its rewards
    Log {
        /// Session type (strength, cardio, yoga, recovery, ...)
        #[arg(long)]
        category: String,

        /// Duration in seconds (values below 300 are read as minutes)
        #[arg(long)]
        duration: Option<i64>,

        /// When the session happened (YYYY-MM-DDTHH:MM[:SS]); defaults to now
        #[arg(long)]
        at: Option<String>,

        /// A set as exercise:weight:reps (repeatable)
        #[arg(long = "set")]
        sets: Vec<String>,

        /// Override the configured resolve mode (incremental, retroactive)
        #[arg(long)]
        mode: Option<String>,
    },

    /// Show points, level, and streaks (default)
    Status {
        /// Evaluate as of this date (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<String>,
    },

    /// List badges with unlock status and progress
    Badges {
        /// Evaluate as of this date (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<String>,

        /// Only show unlocked badges
        #[arg(long)]
        unlocked_only: bool,
    },

    /// Migrate stored badge ids and grant every badge already earned
    Backfill {
        /// Evaluate as of this date (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<String>,
    },

    /// Rebuild reward state from the full journal
    Replay,
}

fn main() -> Result<()> {
    rewards_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Some(Commands::Log {
            category,
            duration,
            at,
            sets,
            mode,
        }) => cmd_log(&data_dir, &config, category, duration, at, sets, mode),
        Some(Commands::Status { as_of }) => cmd_status(&data_dir, as_of),
        Some(Commands::Badges {
            as_of,
            unlocked_only,
        }) => cmd_badges(&data_dir, &config, as_of, unlocked_only),
        Some(Commands::Backfill { as_of }) => cmd_backfill(&data_dir, as_of),
        Some(Commands::Replay) => cmd_replay(&data_dir),
        None => cmd_status(&data_dir, None),
    }
}

fn load_catalog() -> Result<&'static Catalog> {
    let catalog = get_default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }
    Ok(catalog)
}

fn parse_date(raw: Option<String>) -> Result<Option<NaiveDate>> {
    raw.map(|s| {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|e| Error::InvalidInput(format!("invalid date '{}': {}", s, e)))
    })
    .transpose()
}

fn parse_datetime(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| Error::InvalidInput(format!("invalid timestamp '{}'", raw)))
}

fn parse_set(raw: &str) -> Result<(String, SetEntry)> {
    let parts: Vec<&str> = raw.rsplitn(3, ':').collect();
    if parts.len() != 3 || parts[2].trim().is_empty() {
        return Err(Error::InvalidInput(format!(
            "invalid set '{}', expected exercise:weight:reps",
            raw
        )));
    }

    let number = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|e| {
                Error::InvalidInput(format!("invalid number '{}' in set '{}': {}", s, raw, e))
            })
    };

    Ok((
        parts[2].trim().to_string(),
        SetEntry::new(number(parts[1])?, number(parts[0])?),
    ))
}

fn cmd_log(
    data_dir: &Path,
    config: &Config,
    category: String,
    duration: Option<i64>,
    at: Option<String>,
    sets: Vec<String>,
    mode: Option<String>,
) -> Result<()> {
    let catalog = load_catalog()?;
    let mode = match mode {
        Some(m) => m.parse::<ResolveMode>()?,
        None => config.rewards.default_mode,
    };

    let date = match at {
        Some(raw) => parse_datetime(&raw)?,
        None => chrono::Local::now().naive_local(),
    };

    let mut record = SessionRecord::new(date, category);
    record.id = Some(uuid::Uuid::new_v4());
    record.duration_seconds = duration;
    for raw in &sets {
        let (exercise, set) = parse_set(raw)?;
        record = record.with_sets(exercise, vec![set]);
    }

    tracing::debug!(
        "Logging '{}' session at {} ({:?} mode)",
        record.category_hint.as_deref().unwrap_or("-"),
        record.date,
        mode
    );

    std::fs::create_dir_all(data_dir)?;
    let mut journal = JsonlJournal::new(Config::journal_path(data_dir));

    // Append, score and save under one lock so concurrent logs cannot race
    let (state, (prior, outcome, new_badges)) =
        RewardState::update(&Config::state_path(data_dir), |state| {
            journal.append(&record)?;
            let history = journal.read_all()?;
            let prior = state.clone();

            // Score the session in its own context so backdated entries work
            let context: Vec<SessionRecord> = history
                .iter()
                .filter(|r| r.date <= record.date)
                .cloned()
                .collect();

            let Some(outcome) = apply_session(catalog, &context, &prior) else {
                return Err(Error::Other("journal is empty after logging".into()));
            };

            let mut next = outcome.state.clone();
            let mut new_badges = outcome.new_badges.clone();

            if mode == ResolveMode::Retroactive {
                let reconciled = backfill(catalog, &history, &next, None);
                new_badges.extend(reconciled.new_badges);
                next = reconciled.state;
            }

            *state = next;
            Ok((prior, outcome, new_badges))
        })?;

    println!("✓ Session logged! ({})", outcome.category);
    print!("  +{} points", outcome.session_points);
    if outcome.weekly_bonus {
        print!(" (weekly bonus)");
    }
    if outcome.streak_days > 1 {
        print!(" [{}-day streak]", outcome.streak_days);
    }
    println!();

    for badge in &new_badges {
        println!(
            "  ★ Badge unlocked: {} ({:?}) +{}",
            badge.name, badge.tier, badge.points_on_unlock
        );
    }

    let level = state.level();
    if level.level > prior.level().level {
        println!("  ▲ Level up! Now level {}", level.level);
    }
    println!(
        "  Total: {} points (level {}, {} to next)",
        state.total_points, level.level, level.points_to_next_level
    );

    Ok(())
}

fn cmd_status(data_dir: &Path, as_of: Option<String>) -> Result<()> {
    let history = JsonlJournal::new(Config::journal_path(data_dir)).read_all()?;
    let state = RewardState::load(&Config::state_path(data_dir))?;
    let as_of = resolve_as_of(&history, parse_date(as_of)?);

    let level = state.level();
    println!("Level {}", level.level);
    println!(
        "  Points: {} ({} into level, {} to next)",
        state.total_points, level.current_level_points, level.points_to_next_level
    );
    println!("  Badges: {}", state.unlocked_badge_ids.len());
    println!("  Sessions: {}", history.len());

    if !history.is_empty() {
        println!("  Day streak: {}", day_streak(&history, as_of));
        println!("  Weekly streak: {}", weekly_consistency_streak(&history, as_of));
    }

    Ok(())
}

fn cmd_badges(
    data_dir: &Path,
    config: &Config,
    as_of: Option<String>,
    unlocked_only: bool,
) -> Result<()> {
    let catalog = load_catalog()?;
    let history = JsonlJournal::new(Config::journal_path(data_dir)).read_all()?;
    let state = RewardState::load(&Config::state_path(data_dir))?;
    let as_of = resolve_as_of(&history, parse_date(as_of)?);

    let visible: Vec<SessionRecord> = history
        .iter()
        .filter(|r| r.date.date() <= as_of)
        .cloned()
        .collect();
    let metrics = AggregateMetrics::compute(&visible, as_of);
    let show_locked = config.rewards.show_locked && !unlocked_only;

    for badge in &catalog.badges {
        let granted = state.unlocked_badge_ids.contains(&badge.id);
        if granted {
            println!("  ★ {:<20} {}", badge.name, badge.description);
        } else if show_locked {
            let p = progress(&badge.condition, &metrics, &visible);
            println!(
                "  · {:<20} {} [{:.0}%]",
                badge.name,
                badge.description,
                p.fraction() * 100.0
            );
        }
    }

    println!(
        "\n{} of {} badges unlocked",
        catalog
            .badges
            .iter()
            .filter(|b| state.unlocked_badge_ids.contains(&b.id))
            .count(),
        catalog.len()
    );

    Ok(())
}

fn cmd_backfill(data_dir: &Path, as_of: Option<String>) -> Result<()> {
    let catalog = load_catalog()?;
    let as_of = parse_date(as_of)?;
    let journal = JsonlJournal::new(Config::journal_path(data_dir));

    let (_, outcome) = RewardState::update(&Config::state_path(data_dir), |state| {
        let history = journal.read_all()?;
        let outcome = backfill(catalog, &history, state, as_of);
        *state = outcome.state.clone();
        Ok(outcome)
    })?;

    if !outcome.dropped.is_empty() {
        println!("Dropped {} retired badge ids", outcome.dropped.len());
    }
    for badge in &outcome.new_badges {
        println!("  ★ Badge unlocked: {} (+{})", badge.name, badge.points_on_unlock);
    }
    println!(
        "✓ Backfill granted {} badges (+{} points)",
        outcome.new_badges.len(),
        outcome.badge_points
    );

    Ok(())
}

fn cmd_replay(data_dir: &Path) -> Result<()> {
    let catalog = load_catalog()?;
    let journal = JsonlJournal::new(Config::journal_path(data_dir));

    let (state, sessions) = RewardState::update(&Config::state_path(data_dir), |state| {
        let history = journal.read_all()?;
        *state = replay(catalog, &history);
        Ok(history.len())
    })?;

    println!(
        "✓ Replayed {} sessions: {} points, {} badges, level {}",
        sessions,
        state.total_points,
        state.unlocked_badge_ids.len(),
        state.level().level
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set() {
        let (name, set) = parse_set("bench press:80:8").unwrap();
        assert_eq!(name, "bench press");
        assert_eq!(set, SetEntry::new(80.0, 8.0));

        assert!(parse_set("bench:80").is_err());
        assert!(parse_set(":80:8").is_err());
        assert!(parse_set("bench:heavy:8").is_err());
    }

    #[test]
    fn test_parse_datetime_formats() {
        assert!(parse_datetime("2024-05-01T06:30").is_ok());
        assert!(parse_datetime("2024-05-01 06:30:15").is_ok());
        assert!(parse_datetime("yesterday").is_err());
    }
}

//! Binary entrypoint for the LifeLeveler CLI.
//!
//! Commands:
//! - `init` - create a starter `config.toml` and seed the tracker database
//! - `status` - level, xp, gold, streak and today's quests
//! - `quests [--category <c>]` - list quests, optionally one category
//! - `toggle-quest <id>` - complete or un-complete a quest
//! - `missions` - list missions and their milestones
//! - `toggle-milestone <mission> <milestone>` - complete or un-complete a milestone
//! - `add-mission --title <t> -m <title[:xp[:gold]]>...` - create a mission
//! - `add-task --title <t> --xp <n>` - create a side-hustle task
//! - `side-hustle` - side-hustle tasks grouped by week
//! - `rewards` - list the reward shop
//! - `buy <id>` - purchase a reward
//! - `reset-daily` - clear completion on repeatable daily quests
//!
//! See the library crate docs for module-level details: `lifeleveler::`.
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use rand::seq::SliceRandom;
use std::path::Path;

use lifeleveler::config::Config;
use lifeleveler::tracker::{
    Lookup, MilestoneDraft, MissionDraft, QuestCategory, SideHustleDraft, SledStore, StreakChange,
    Tracker, TrackerStore,
};

const QUOTES: &[&str] = &[
    "The secret of getting ahead is getting started.",
    "Your only limit is you.",
    "Don't stop when you're tired. Stop when you're done.",
    "The harder you work for something, the greater you'll feel when you achieve it.",
    "Push yourself, because no one else is going to do it for you.",
    "Great things never come from comfort zones.",
];

#[derive(Parser)]
#[command(name = "lifeleveler")]
#[command(about = "Level up your life: quests, missions and rewards")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and seed the database
    Init,
    /// Show level, streak and today's progress
    Status,
    /// List quests
    Quests {
        /// daily, weekly or side-hustle
        #[arg(long)]
        category: Option<QuestCategory>,
    },
    /// Complete or un-complete a quest
    ToggleQuest { id: String },
    /// List missions and milestones
    Missions,
    /// Complete or un-complete a mission milestone
    ToggleMilestone { mission: String, milestone: String },
    /// Create a mission with one or more milestones
    AddMission {
        #[arg(short, long)]
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        /// Milestone as `title[:xp[:gold]]`; repeat for each milestone
        #[arg(short = 'm', long = "milestone", required = true)]
        milestones: Vec<MilestoneDraft>,
    },
    /// Create a side-hustle task
    AddTask {
        #[arg(short, long)]
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(long)]
        xp: u32,
        #[arg(long)]
        gold: Option<u32>,
    },
    /// Side-hustle tasks grouped by week
    SideHustle,
    /// List rewards
    Rewards,
    /// Purchase a reward
    Buy { id: String },
    /// Clear completion on repeatable daily quests
    ResetDaily,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        return init(&cli.config).await;
    }

    let config = load_config(&cli.config).await?;
    init_logging(&Some(config.clone()), cli.verbose);

    let mut tracker = open_tracker(&config)?;

    match cli.command {
        // handled before the tracker is opened
        Commands::Init => {}
        Commands::Status => print_status(&tracker, &config),
        Commands::Quests { category } => {
            let categories = match category {
                Some(c) => vec![c],
                None => QuestCategory::ALL.to_vec(),
            };
            for category in categories {
                let summary = tracker.category_summary(category);
                println!("== {} ({}/{}) ==", category, summary.completed, summary.total);
                for quest in tracker.quests_in(category) {
                    println!(
                        "  [{}] {:<12} {} (+{} xp{})",
                        if quest.completed { "x" } else { " " },
                        quest.id,
                        quest.title,
                        quest.xp_reward,
                        gold_suffix(quest.gold_reward)
                    );
                }
            }
        }
        Commands::ToggleQuest { id } => match tracker.toggle_quest_completion(&id)? {
            Lookup::Updated(change) => {
                let verb = if change.quest.completed { "Completed" } else { "Reopened" };
                println!("{} '{}'", verb, change.quest.title);
                print_stats_line(&tracker);
            }
            Lookup::Unchanged(_) | Lookup::NotFound => return Err(anyhow!("No quest with id '{}'", id)),
        },
        Commands::Missions => {
            if tracker.missions().is_empty() {
                println!("No missions yet. Create one with `lifeleveler add-mission`.");
            }
            for mission in tracker.missions() {
                println!("== {} [{}] {}% ==", mission.title, mission.id, mission.progress);
                for ms in &mission.milestones {
                    println!(
                        "  [{}] {} {} (+{} xp{})",
                        if ms.completed { "x" } else { " " },
                        ms.id,
                        ms.title,
                        ms.xp_reward,
                        gold_suffix(ms.gold_reward)
                    );
                }
            }
        }
        Commands::ToggleMilestone { mission, milestone } => {
            match tracker.toggle_milestone_completion(&mission, &milestone)? {
                Lookup::Updated(change) => {
                    println!("'{}' is now {}% complete", change.mission.title, change.mission.progress);
                    print_stats_line(&tracker);
                }
                Lookup::Unchanged(_) | Lookup::NotFound => {
                    return Err(anyhow!("No milestone '{}' in mission '{}'", milestone, mission))
                }
            }
        }
        Commands::AddMission {
            title,
            description,
            milestones,
        } => {
            let draft = milestones
                .into_iter()
                .fold(MissionDraft::new(&title, &description), MissionDraft::with_milestone);
            let mission = tracker.add_mission(draft)?;
            println!("Created mission {} with {} milestone(s)", mission.id, mission.milestones.len());
        }
        Commands::AddTask {
            title,
            description,
            xp,
            gold,
        } => {
            let mut draft = SideHustleDraft::new(&title, xp).with_description(&description);
            if let Some(gold) = gold {
                draft = draft.with_gold_reward(gold);
            }
            let quest = tracker.add_side_hustle_task(draft)?;
            println!("Created side hustle task {}", quest.id);
        }
        Commands::SideHustle => {
            let weeks = tracker.side_hustle_weeks();
            if weeks.is_empty() {
                println!("No side hustle tasks yet. Add one with `lifeleveler add-task`.");
            }
            for week in weeks {
                println!(
                    "== Week of {} to {}: {}/{} done, {} xp, {} gold ==",
                    week.start,
                    week.end,
                    week.completed,
                    week.quests.len(),
                    week.xp_earned,
                    week.gold_earned
                );
                for quest in &week.quests {
                    println!(
                        "  [{}] {} {}",
                        if quest.completed { "x" } else { " " },
                        quest.id,
                        quest.title
                    );
                }
            }
        }
        Commands::Rewards => {
            for reward in tracker.rewards() {
                let status = if reward.purchased {
                    "owned".to_string()
                } else if lifeleveler::tracker::can_purchase(reward, tracker.stats()) {
                    "available".to_string()
                } else {
                    "locked".to_string()
                };
                println!(
                    "  {:<10} {} ({} xp{}) - {}",
                    reward.id,
                    reward.title,
                    reward.xp_cost,
                    gold_suffix(reward.gold_cost),
                    status
                );
            }
        }
        Commands::Buy { id } => match tracker.purchase_reward_item(&id)? {
            Lookup::Updated(outcome) => {
                println!("Reward unlocked: {}", outcome.reward.title);
                print_stats_line(&tracker);
            }
            Lookup::Unchanged(outcome) => {
                let reason = outcome
                    .refusal
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "Purchase failed".to_string());
                println!("{}", reason);
            }
            Lookup::NotFound => return Err(anyhow!("No reward with id '{}'", id)),
        },
        Commands::ResetDaily => {
            let reset = tracker.reset_daily_quests()?;
            println!("Reset {} daily quest(s)", reset);
        }
    }

    Ok(())
}

async fn init(path: &str) -> Result<()> {
    info!("Initializing new LifeLeveler configuration");
    if Path::new(path).exists() {
        warn!("Configuration file {} already exists; leaving it untouched", path);
    } else {
        Config::create_default(path).await?;
        info!("Configuration file created at {}", path);
    }
    let config = Config::load(path).await?;
    let tracker = open_tracker(&config)?;
    println!(
        "Tracker ready at {} with {} quests and {} rewards",
        config.tracker_db_path().display(),
        tracker.quests().len(),
        tracker.rewards().len()
    );
    Ok(())
}

/// Fall back to defaults when no config file exists yet.
async fn load_config(path: &str) -> Result<Config> {
    if Path::new(path).exists() {
        Config::load(path).await
    } else {
        Ok(Config::default())
    }
}

fn open_tracker(config: &Config) -> Result<Tracker<SledStore>> {
    std::fs::create_dir_all(&config.storage.data_dir)?;
    let store = TrackerStore::open(config.tracker_db_path())?;
    let mut tracker = Tracker::load(store)?;
    if config.tracker.auto_daily_reset && tracker.streak_change() != StreakChange::SameDay {
        let reset = tracker.reset_daily_quests()?;
        info!("New day: reset {} daily quest(s)", reset);
    }
    Ok(tracker)
}

fn gold_suffix(gold: Option<u32>) -> String {
    match gold {
        Some(g) if g > 0 => format!(", {} gold", g),
        _ => String::new(),
    }
}

fn print_stats_line(tracker: &Tracker<SledStore>) {
    let s = tracker.stats();
    println!(
        "Level {} | {}/{} xp | {} gold | {} day streak",
        s.level, s.xp, s.xp_to_next_level, s.gold, s.streak
    );
}

fn print_status(tracker: &Tracker<SledStore>, config: &Config) {
    println!("Welcome back, {}!", config.tracker.player_name);
    if config.tracker.show_quotes {
        if let Some(quote) = QUOTES.choose(&mut rand::thread_rng()) {
            println!("\"{}\"", quote);
        }
    }
    print_stats_line(tracker);
    println!("Level progress: {}%", tracker.stats().level_progress());

    let dash = tracker.dashboard();
    println!(
        "Daily quests: {}/{} done",
        dash.completed_daily.len(),
        dash.completed_daily.len() + dash.pending_daily.len()
    );
    for quest in &dash.pending_daily {
        println!("  [ ] {:<12} {}", quest.id, quest.title);
    }
    if !dash.active_missions.is_empty() {
        println!("Active missions:");
        for mission in &dash.active_missions {
            println!("  {} {}%", mission.title, mission.progress);
        }
    }
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let configured = config
        .as_ref()
        .and_then(|c| c.logging.level.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info);
    let base_level = match verbosity {
        0 => configured,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    // sled is chatty at debug
    builder.filter_module("sled", log::LevelFilter::Warn);

    let file = config.as_ref().and_then(|c| c.logging.file.clone());
    let sink = file.and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });
    if let Some(f) = sink {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Echo to the console only when attached to a terminal
        let is_tty = atty::is(atty::Stream::Stderr);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}

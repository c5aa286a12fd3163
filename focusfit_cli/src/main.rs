use chrono::Utc;
use clap::{ArgGroup, Parser, Subcommand};
use focusfit_core::config::MAX_TIMER_MINUTES;
use focusfit_core::history::recent_sessions;
use focusfit_core::notify::{daily_reminder_request, parse_reminder_time, Trigger};
use focusfit_core::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::Cell;
use std::io::{self, BufRead, Write};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Parser)]
#[command(name = "focusfit")]
#[command(about = "Focus timer with short bodyweight workouts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a focus timer
    Focus {
        /// Session length in minutes (defaults to timer.focus_minutes)
        #[arg(long)]
        minutes: Option<u32>,

        /// Run a break timer instead; breaks are not recorded
        #[arg(long = "break")]
        take_break: bool,

        /// Simulate the clock so the session completes immediately
        #[arg(long)]
        auto_complete: bool,
    },

    /// Pick and run a short workout
    Workout {
        /// Difficulty for this workout only (easy, medium, hard)
        #[arg(long)]
        difficulty: Option<String>,

        /// Seed the exercise picker for a repeatable selection
        #[arg(long)]
        seed: Option<u64>,

        /// Show the selection without running or logging it
        #[arg(long)]
        dry_run: bool,

        /// Start every exercise automatically and skip waiting between ticks
        #[arg(long)]
        auto_complete: bool,
    },

    /// Show totals, streaks and achievements (default)
    Progress,

    /// List the exercise catalog
    Exercises,

    /// Show or change workout settings
    Settings {
        #[arg(long)]
        difficulty: Option<String>,

        #[arg(long = "add-equipment", value_name = "ITEM")]
        add_equipment: Vec<String>,

        #[arg(long = "remove-equipment", value_name = "ITEM")]
        remove_equipment: Vec<String>,

        /// Never pick this exercise
        #[arg(long, value_name = "NAME")]
        exclude: Vec<String>,

        /// Allow a previously excluded exercise again
        #[arg(long, value_name = "NAME")]
        include: Vec<String>,
    },

    /// Manage the daily reminder
    #[command(group(ArgGroup::new("reminder").args(["at", "off"])))]
    Remind {
        /// Reminder time as HH:MM (UTC)
        #[arg(long)]
        at: Option<String>,

        /// Remove the daily reminder
        #[arg(long)]
        off: bool,
    },

    /// Push pending settings and progress to the sync backend
    Sync,

    /// Write a config file with default values
    InitConfig {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },

    /// Roll up session history to CSV
    Rollup {
        /// Clean up processed history files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

fn main() -> Result<()> {
    focusfit_core::logging::init();

    let cli = Cli::parse();

    if let Some(Commands::InitConfig { force }) = cli.command {
        let path = cli.config.unwrap_or_else(Config::default_config_path);
        return cmd_init_config(&path, force);
    }

    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);
    let ctx = AppContext::new(config, data_dir);

    match cli.command {
        Some(Commands::Focus {
            minutes,
            take_break,
            auto_complete,
        }) => cmd_focus(&ctx, minutes, take_break, auto_complete),
        Some(Commands::Workout {
            difficulty,
            seed,
            dry_run,
            auto_complete,
        }) => cmd_workout(&ctx, difficulty, seed, dry_run, auto_complete),
        Some(Commands::Progress) | None => cmd_progress(&ctx),
        Some(Commands::Exercises) => cmd_exercises(&ctx),
        Some(Commands::Settings {
            difficulty,
            add_equipment,
            remove_equipment,
            exclude,
            include,
        }) => cmd_settings(
            &ctx,
            difficulty,
            add_equipment,
            remove_equipment,
            exclude,
            include,
        ),
        Some(Commands::Remind { at, off }) => cmd_remind(&ctx, at, off),
        Some(Commands::Sync) => cmd_sync(&ctx),
        Some(Commands::Rollup { cleanup }) => cmd_rollup(&ctx, cleanup),
        Some(Commands::InitConfig { .. }) => Ok(()),
    }
}

// ============================================================================
// focus
// ============================================================================

fn cmd_focus(
    ctx: &AppContext,
    minutes: Option<u32>,
    take_break: bool,
    auto_complete: bool,
) -> Result<()> {
    let default_minutes = if take_break {
        ctx.config.timer.break_minutes
    } else {
        ctx.config.timer.focus_minutes
    };
    let minutes = minutes.unwrap_or(default_minutes);
    if minutes == 0 || minutes > MAX_TIMER_MINUTES {
        eprintln!("--minutes must be between 1 and {}", MAX_TIMER_MINUTES);
        return Err(Error::InvalidInput(format!("invalid timer length {}", minutes)));
    }
    let duration = minutes
        .checked_mul(60)
        .ok_or_else(|| Error::InvalidInput(format!("invalid timer length {}", minutes)))?;
    let label = if take_break { "Break" } else { "Focus" };

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {} · {}", label.to_uppercase(), format_time(u64::from(duration)));
    println!("╰─────────────────────────────────────────╯\n");

    let sound = ctx.config.notifications.sound.clone();
    let started_at = Utc::now();
    let completed = if auto_complete {
        let clock = ManualClock::new(started_at);
        let timer = FocusTimer::new(duration, &clock, LogNotifier::new()).with_sound(sound);
        run_timer(timer, Ticker::immediate(), || clock.advance_secs(1), false)?
    } else {
        let timer = FocusTimer::new(duration, SystemClock, LogNotifier::new()).with_sound(sound);
        let ticker = Ticker::every_second();
        println!("  'q' + Enter to stop");
        stop_on_quit(ticker.handle());
        run_timer(timer, ticker, || {}, true)?
    };

    if !completed {
        println!("\nTimer stopped.");
        return Ok(());
    }

    println!("\n✓ {} session complete!", label);
    if take_break {
        return Ok(());
    }

    let completed_at = if auto_complete {
        started_at + chrono::Duration::seconds(i64::from(duration))
    } else {
        Utc::now()
    };
    let record = SessionRecord::new(SessionKind::Focus, started_at, completed_at, duration, vec![]);
    let unlocked = ctx.record_completion(&record)?;
    print_unlocked(&unlocked);
    Ok(())
}

/// Cancel the ticker when the user enters `q`
fn stop_on_quit(handle: CancelHandle) {
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) if line.trim().eq_ignore_ascii_case("q") => {
                    handle.cancel();
                    break;
                }
                Ok(_) => continue,
                Err(e) => {
                    tracing::debug!("Stopped watching stdin: {}", e);
                    break;
                }
            }
        }
    });
}

/// Drive a timer with the ticker until it completes
///
/// `advance` runs before each tick (moves a simulated clock).
fn run_timer<C: Clock, N: Notifier>(
    mut timer: FocusTimer<C, N>,
    ticker: Ticker,
    advance: impl Fn(),
    live_display: bool,
) -> Result<bool> {
    let done = Rc::new(Cell::new(false));
    let flag = done.clone();
    timer.on_complete(move || flag.set(true));
    timer.start(None)?;

    ticker.run(|_| {
        advance();
        match timer.tick() {
            TickOutcome::Running { seconds_left } => {
                if live_display {
                    print!("\r  ⏱ {} remaining ", format_time(u64::from(seconds_left)));
                    let _ = io::stdout().flush();
                }
                ControlFlow::Continue(())
            }
            TickOutcome::Completed | TickOutcome::Idle => ControlFlow::Break(()),
        }
    });

    Ok(done.get())
}

// ============================================================================
// workout
// ============================================================================

/// Terminal bell for audio cues
struct TerminalCues {
    audible: bool,
}

impl CueSink for TerminalCues {
    fn play(&mut self, cue: Cue) {
        if !self.audible {
            return;
        }
        let bells = match cue {
            Cue::CountdownTick => "\x07",
            Cue::CountdownGo => "\x07\x07",
            Cue::ExerciseEnd => "\x07\x07\x07",
        };
        print!("{}", bells);
        let _ = io::stdout().flush();
    }
}

enum PreviewAction {
    Start,
    Skip,
    Shuffle,
    Quit,
}

fn cmd_workout(
    ctx: &AppContext,
    difficulty: Option<String>,
    seed: Option<u64>,
    dry_run: bool,
    auto_complete: bool,
) -> Result<()> {
    let mut settings = ctx.load_settings()?;
    if let Some(ref d) = difficulty {
        settings.set_difficulty(d.parse()?);
    }

    let catalog = catalog_with_custom(&ctx.config);
    let errors = catalog::validate(&catalog);
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let picks = select_workout(&catalog, &settings, &mut rng);
    if picks.is_empty() {
        eprintln!(
            "No workout available for your settings. Try another difficulty, \
             add equipment or include excluded exercises."
        );
        return Err(Error::NoWorkoutAvailable);
    }

    // Slots stay aligned with the session's exercises; shuffle replaces in place
    let (slots, exercises): (Vec<Slot>, Vec<Exercise>) = picks.into_iter().unzip();
    let mut session = WorkoutSession::new(exercises, TerminalCues { audible: !auto_complete })?
        .with_timing(&ctx.config.workout);
    display_workout(&session, settings.difficulty);

    if dry_run {
        println!("\n[Dry run - not starting workout]");
        return Ok(());
    }

    let done = Rc::new(Cell::new(false));
    let flag = done.clone();
    session.on_complete(move || flag.set(true));

    let started_at = Utc::now();
    let ticker = if auto_complete {
        Ticker::immediate()
    } else {
        Ticker::every_second()
    };

    while !done.get() {
        if session.phase() == Phase::Preview {
            display_preview(&session);
            let action = if auto_complete {
                PreviewAction::Start
            } else {
                prompt_preview_action()?
            };
            match action {
                PreviewAction::Start => {
                    session.start_exercise()?;
                    if session.phase() == Phase::Active {
                        print_go(session.current_exercise());
                    }
                }
                PreviewAction::Skip => {
                    println!("  Skipped {}", session.current_exercise().name);
                    session.skip()?;
                }
                PreviewAction::Shuffle => {
                    let taken: Vec<String> =
                        session.exercises().iter().map(|e| e.name.clone()).collect();
                    match find_alternative(
                        &catalog,
                        &settings,
                        slots[session.current_index()],
                        session.current_exercise(),
                        &taken,
                        &mut rng,
                    ) {
                        Some(replacement) => session.shuffle(replacement)?,
                        None => println!("  No other exercise fits this slot."),
                    }
                    continue;
                }
                PreviewAction::Quit => {
                    println!("\nWorkout abandoned - nothing logged.");
                    return Ok(());
                }
            }
        }

        ticker.run(|_| {
            let event = session.tick();
            match event {
                WorkoutEvent::Countdown { seconds_left } => {
                    println!("  {}...", seconds_left);
                }
                WorkoutEvent::ExerciseStarted { .. } => print_go(session.current_exercise()),
                WorkoutEvent::Active { seconds_left } => {
                    if !auto_complete {
                        print!("\r    {} left ", format_time(u64::from(seconds_left)));
                        let _ = io::stdout().flush();
                    }
                }
                WorkoutEvent::NextExercise { .. } => {
                    println!("\n  ✓ Done. Next up: {}", session.current_exercise().name);
                    return ControlFlow::Break(());
                }
                WorkoutEvent::WorkoutCompleted => {
                    println!("\n  ✓ Last exercise done.");
                }
                WorkoutEvent::CompletionNotified => return ControlFlow::Break(()),
                WorkoutEvent::Waiting => {
                    if session.phase() == Phase::Preview {
                        return ControlFlow::Break(());
                    }
                }
            }
            ControlFlow::Continue(())
        });
    }

    let duration = session.active_seconds();
    if duration == 0 {
        println!("\nEvery exercise was skipped - nothing logged.");
        return Ok(());
    }

    println!("\n✓ Workout complete!");

    let completed_at = if auto_complete {
        started_at + chrono::Duration::seconds(i64::from(duration))
    } else {
        Utc::now()
    };
    let names = session.exercises().iter().map(|e| e.name.clone()).collect();
    let record = SessionRecord::new(SessionKind::Workout, started_at, completed_at, duration, names);
    let unlocked = ctx.record_completion(&record)?;
    print_unlocked(&unlocked);
    Ok(())
}

fn print_go(exercise: &Exercise) {
    println!(
        "  ▶ GO: {} ({})",
        exercise.name,
        format_time(u64::from(exercise.duration))
    );
}

fn display_workout<S: CueSink>(session: &WorkoutSession<S>, difficulty: Difficulty) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  WORKOUT · {}", difficulty.to_string().to_uppercase());
    println!("╰─────────────────────────────────────────╯");
    println!();
    for (i, exercise) in session.exercises().iter().enumerate() {
        println!(
            "  {}. {} ({})",
            i + 1,
            exercise.name,
            format_time(u64::from(exercise.duration))
        );
    }
    if session.exercises().len() < 3 {
        println!("  (only {} exercises fit your settings)", session.exercises().len());
    }
    println!();
    println!(
        "  Total: {}",
        format_time(u64::from(session.total_duration()))
    );
}

fn display_preview<S: CueSink>(session: &WorkoutSession<S>) {
    let exercise = session.current_exercise();
    println!();
    println!(
        "  [{}/{}] {}",
        session.current_index() + 1,
        session.exercises().len(),
        exercise.name
    );
    for (i, step) in exercise.instructions.iter().enumerate() {
        println!("    {}. {}", i + 1, step);
    }
    if let Some(ref equipment) = exercise.equipment {
        if !equipment.is_empty() {
            println!("    Needs: {}", equipment.join(", "));
        }
    }
}

fn prompt_preview_action() -> Result<PreviewAction> {
    println!("─────────────────────────────────────────");
    println!("Press Enter to start");
    println!("  's' + Enter to skip");
    println!("  'r' + Enter for a different exercise");
    println!("  'q' + Enter to quit");
    print!("> ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let action = match input.trim().to_lowercase().as_str() {
        "s" => PreviewAction::Skip,
        "r" => PreviewAction::Shuffle,
        "q" => PreviewAction::Quit,
        _ => PreviewAction::Start,
    };

    Ok(action)
}

fn print_unlocked(unlocked: &[&'static str]) {
    for id in unlocked {
        match achievements::find(id) {
            Some(a) => println!("🏆 Achievement unlocked: {} - {}", a.title, a.description),
            None => println!("🏆 Achievement unlocked: {}", id),
        }
    }
}

// ============================================================================
// progress / exercises / settings
// ============================================================================

fn cmd_progress(ctx: &AppContext) -> Result<()> {
    let progress = ctx.load_progress()?;

    println!("\nFocus sessions:  {}", progress.total_focus_sessions);
    println!(
        "Focus time:      {}",
        format_time(progress.total_focus_duration)
    );
    println!("Focus streak:    {} day(s)", progress.focus_streak);
    println!();
    println!("Workouts:        {}", progress.total_workouts);
    println!(
        "Workout time:    {}",
        format_time(progress.total_workout_duration)
    );
    println!("Workout streak:  {} day(s)", progress.workout_streak);
    println!();

    let week_ago = Utc::now() - chrono::Duration::days(7);
    let history = ctx.history_path();
    let workouts = recent_sessions(&history, SessionKind::Workout, week_ago)?;
    let focus = recent_sessions(&history, SessionKind::Focus, week_ago)?;
    println!(
        "Last 7 days:     {} focus session(s), {} workout(s)",
        focus.len(),
        workouts.len()
    );
    if let Some(last) = workouts.first() {
        println!(
            "Last workout:    {} ({})",
            last.completed_at.format("%Y-%m-%d %H:%M UTC"),
            last.exercises.join(", ")
        );
    }
    println!();
    println!(
        "Achievements ({}/{}):",
        progress.achievements.len(),
        achievements::ACHIEVEMENTS.len()
    );
    for a in achievements::ACHIEVEMENTS {
        let mark = if progress.achievements.contains(a.id) {
            "✓"
        } else {
            " "
        };
        println!("  [{}] {} - {}", mark, a.title, a.description);
    }
    Ok(())
}

fn cmd_exercises(ctx: &AppContext) -> Result<()> {
    let settings = ctx.load_settings()?;
    let catalog = catalog_with_custom(&ctx.config);

    println!("\n✓ = eligible with your current settings\n");
    for exercise in &catalog {
        let mark = if is_eligible(exercise, &settings) {
            "✓"
        } else {
            " "
        };
        let difficulty: Vec<String> = exercise.difficulty.iter().map(|d| d.to_string()).collect();
        let equipment = exercise
            .equipment
            .as_ref()
            .filter(|e| !e.is_empty())
            .map(|e| e.join(", "))
            .unwrap_or_else(|| "bodyweight".into());
        println!(
            "  [{}] {:<26} {:<9} {:>5}  {:<20} {}",
            mark,
            exercise.name,
            format!("{:?}", exercise.category).to_lowercase(),
            format_time(u64::from(exercise.duration)),
            difficulty.join("/"),
            equipment
        );
    }
    Ok(())
}

fn cmd_settings(
    ctx: &AppContext,
    difficulty: Option<String>,
    add_equipment: Vec<String>,
    remove_equipment: Vec<String>,
    exclude: Vec<String>,
    include: Vec<String>,
) -> Result<()> {
    let mut settings = ctx.load_settings()?;
    let original = settings.clone();

    if let Some(ref d) = difficulty {
        settings.set_difficulty(d.parse()?);
    }
    for item in &add_equipment {
        settings.add_equipment(item)?;
    }
    for item in &remove_equipment {
        if !settings.remove_equipment(item) {
            eprintln!("Equipment '{}' was not in your list", item);
        }
    }

    let catalog = catalog_with_custom(&ctx.config);
    for name in &exclude {
        if !catalog.iter().any(|e| &e.name == name) {
            eprintln!("Unknown exercise: {}", name);
            return Err(Error::InvalidInput(format!("unknown exercise '{}'", name)));
        }
        settings.exclude(name)?;
    }
    for name in &include {
        settings.include(name);
    }

    if settings != original {
        ctx.save_settings(&settings)?;
        println!("✓ Settings saved");
    }

    println!("\nDifficulty: {}", settings.difficulty);
    println!(
        "Equipment:  {}",
        if settings.equipment.is_empty() {
            "none (bodyweight only)".to_string()
        } else {
            settings.equipment.iter().cloned().collect::<Vec<_>>().join(", ")
        }
    );
    println!(
        "Excluded:   {}",
        if settings.excluded_exercises.is_empty() {
            "none".to_string()
        } else {
            settings
                .excluded_exercises
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        }
    );
    Ok(())
}

// ============================================================================
// remind / sync / rollup
// ============================================================================

fn cmd_remind(ctx: &AppContext, at: Option<String>, off: bool) -> Result<()> {
    let mut notifier = StoredNotifier::new(ctx.store().clone());

    if off {
        let removed = notifier.cancel_daily()?;
        println!("✓ Removed {} daily reminder(s)", removed);
        return Ok(());
    }

    if let Some(at) = at.or_else(|| ctx.config.notifications.daily_reminder.clone()) {
        let time = parse_reminder_time(&at)?;
        notifier.cancel_daily()?;
        let request =
            daily_reminder_request(time).with_sound(ctx.config.notifications.sound.clone());
        let next = request.trigger.next_after(Utc::now());
        notifier.schedule(request)?;
        println!("✓ Daily reminder set for {}", time.format("%H:%M"));
        if let Some(next) = next {
            println!("  Next: {}", next.format("%Y-%m-%d %H:%M UTC"));
        }
        return Ok(());
    }

    let daily: Vec<_> = notifier
        .pending()?
        .into_iter()
        .filter_map(|n| match n.request.trigger {
            Trigger::Daily { time } => Some(time),
            Trigger::At { .. } => None,
        })
        .collect();
    if daily.is_empty() {
        println!("No daily reminder set.");
    } else {
        for time in daily {
            println!("Daily reminder at {}", time.format("%H:%M"));
        }
    }
    Ok(())
}

fn cmd_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        eprintln!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
        return Err(Error::Config(format!("{} already exists", path.display())));
    }
    Config::default().save_to(path)?;
    println!("✓ Wrote default config to {}", path.display());
    Ok(())
}

fn cmd_sync(ctx: &AppContext) -> Result<()> {
    match ctx.sync_now()? {
        None => {
            println!("Sync is not configured (set sync.user_id and sync.remote_dir).");
        }
        Some(report) => {
            println!("✓ Synced {} record(s)", report.pushed);
            if report.failed > 0 {
                println!(
                    "  {} record(s) could not be synced and stay queued",
                    report.failed
                );
            }
        }
    }
    Ok(())
}

fn cmd_rollup(ctx: &AppContext, cleanup: bool) -> Result<()> {
    let history_path = ctx.history_path();
    let csv_path = ctx.csv_path();

    if !history_path.exists() {
        println!("No session history found - nothing to roll up.");
        return Ok(());
    }

    let count = export::rollup_to_csv(&history_path, &csv_path)?;

    println!("✓ Rolled up {} sessions to CSV", count);
    println!("  CSV: {}", csv_path.display());

    if cleanup {
        let cleaned = export::cleanup_processed(&ctx.history_dir())?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed history files", cleaned);
        }
    }

    Ok(())
}

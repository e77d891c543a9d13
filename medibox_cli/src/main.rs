use chrono::{DateTime, FixedOffset, Local};
use clap::{Parser, Subcommand};
use medibox_core::config::{FeedbackConfig, InventoryConfig};
use medibox_core::feedback::GatedFeedback;
use medibox_core::timeline::{format_remaining, time_until, DoseStatus};
use medibox_core::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "medibox")]
#[command(about = "Medication box dose tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Pin the clock to an RFC 3339 timestamp instead of the local time
    #[arg(long, global = true, value_parser = parse_now)]
    now: Option<DateTime<FixedOffset>>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's doses (default)
    Today,

    /// Work through today's doses
    Session {
        /// Administer this many doses without prompting
        #[arg(long)]
        take: Option<u32>,

        /// Reset progress when finished
        #[arg(long)]
        reset: bool,
    },

    /// List compartments at or below their low-stock threshold
    Alerts,

    /// Show every compartment with its quantity and schedules
    List,

    /// Set every compartment's remaining quantity
    Restock {
        /// Target quantity (defaults to inventory.reset_quantity)
        #[arg(long)]
        quantity: Option<u32>,
    },

    /// Edit a compartment's medication details
    Configure {
        /// Compartment slot id
        #[arg(long)]
        slot: u32,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        dosage: Option<String>,

        /// none, before-meal, after-meal, with-food, before-sleep
        #[arg(long)]
        instruction: Option<Instruction>,

        /// Low-stock threshold
        #[arg(long)]
        threshold: Option<u32>,
    },

    /// Manage daily administration times
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },
}

#[derive(Subcommand)]
enum ScheduleAction {
    /// Add a daily time to a compartment
    Add {
        #[arg(long)]
        slot: u32,

        /// Time of day, e.g. 08:30
        #[arg(long)]
        at: String,
    },

    /// Remove one schedule by id
    Remove {
        #[arg(long)]
        id: uuid::Uuid,
    },

    /// Remove all schedules of a compartment
    Clear {
        #[arg(long)]
        slot: u32,
    },
}

/// Source of "now" for every command
#[derive(Clone, Copy)]
enum Clock {
    Fixed(DateTime<FixedOffset>),
    Local,
}

impl Clock {
    fn now(&self) -> DateTime<FixedOffset> {
        match self {
            Clock::Fixed(now) => *now,
            Clock::Local => Local::now().fixed_offset(),
        }
    }
}

/// Rings the terminal bell on success and warning cues
struct TerminalBell {
    sound_enabled: bool,
}

impl FeedbackSink for TerminalBell {
    fn signal(&self, event: FeedbackEvent) {
        tracing::debug!("Feedback: {:?}", event);
        if self.sound_enabled && event != FeedbackEvent::Click {
            let mut err = io::stderr();
            let _ = err.write_all(b"\x07");
            let _ = err.flush();
        }
    }
}

fn parse_now(s: &str) -> std::result::Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(s).map_err(|e| format!("expected RFC 3339 timestamp: {}", e))
}

fn main() -> Result<()> {
    medibox_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let box_path = data_dir.join("box.json");
    let clock = cli.now.map(Clock::Fixed).unwrap_or(Clock::Local);

    match cli.command {
        None | Some(Commands::Today) => cmd_today(&box_path, &config.inventory, clock),
        Some(Commands::Session { take, reset }) => cmd_session(
            &box_path,
            &config.inventory,
            config.feedback,
            clock,
            take,
            reset,
        ),
        Some(Commands::Alerts) => cmd_alerts(&box_path, &config.inventory),
        Some(Commands::List) => cmd_list(&box_path, &config.inventory),
        Some(Commands::Restock { quantity }) => cmd_restock(
            &box_path,
            &config.inventory,
            quantity.unwrap_or(config.inventory.reset_quantity),
        ),
        Some(Commands::Configure {
            slot,
            name,
            dosage,
            instruction,
            threshold,
        }) => cmd_configure(
            &box_path,
            &config.inventory,
            CompartmentId(slot),
            name,
            dosage,
            instruction,
            threshold,
        ),
        Some(Commands::Schedule { action }) => cmd_schedule(&box_path, &config.inventory, action),
    }
}

fn cmd_today(box_path: &Path, inventory: &InventoryConfig, clock: Clock) -> Result<()> {
    let medibox = MediBox::load(box_path, inventory)?;
    let now = clock.now();
    let timeline = build_today(&medibox.compartments, &now);

    println!("Today's schedule ({})", now.format("%Y-%m-%d"));
    if timeline.is_empty() {
        println!("  No doses scheduled today.");
    } else {
        for view in annotate(&timeline, 0, &now) {
            print_dose_line(&medibox.compartments, &view);
        }
    }

    print_low_stock(&medibox.compartments);
    Ok(())
}

fn cmd_session(
    box_path: &Path,
    inventory: &InventoryConfig,
    feedback_config: FeedbackConfig,
    clock: Clock,
    take: Option<u32>,
    reset: bool,
) -> Result<()> {
    let medibox = MediBox::load(box_path, inventory)?;
    let mut session = Session::new(medibox.compartments);
    let feedback = GatedFeedback::new(
        TerminalBell {
            sound_enabled: feedback_config.sound_enabled,
        },
        feedback_config,
    );

    if let Some(count) = take {
        for _ in 0..count {
            administer_and_flush(&mut session, box_path, inventory, clock, &feedback)?;
        }
        if reset {
            session.reset(&feedback);
            println!("↺ Progress reset.");
        }
        print_progress(&session, clock);
        return Ok(());
    }

    loop {
        reload_box(&mut session, box_path, inventory)?;
        print_progress(&session, clock);

        match prompt_user_action()? {
            UserAction::Administer => {
                administer_and_flush(&mut session, box_path, inventory, clock, &feedback)?;
            }
            UserAction::Reset => {
                session.reset(&feedback);
                println!("\n↺ Progress reset.");
            }
            UserAction::Quit => break,
        }
    }

    if reset {
        session.reset(&feedback);
    }
    Ok(())
}

/// Pick up edits other invocations made to the box file. The cursor is kept.
fn reload_box(session: &mut Session, box_path: &Path, inventory: &InventoryConfig) -> Result<()> {
    let medibox = MediBox::load(box_path, inventory)?;
    session.replace_compartments(medibox.compartments);
    Ok(())
}

fn administer_and_flush(
    session: &mut Session,
    box_path: &Path,
    inventory: &InventoryConfig,
    clock: Clock,
    feedback: &dyn FeedbackSink,
) -> Result<()> {
    // Decrement on top of the latest file so a concurrent edit is not overwritten
    reload_box(session, box_path, inventory)?;
    let now = clock.now();
    let Some(done) = session.administer_next(&now, feedback) else {
        let timeline = session.timeline(&now);
        match session.tracker().state(&timeline) {
            DayState::Empty => println!("No doses scheduled today."),
            _ => println!("All doses taken for today."),
        }
        return Ok(());
    };

    let name = find_compartment(session.compartments(), done.dose.compartment_id)
        .map(|c| c.display_name())
        .unwrap_or_else(|| "removed compartment".into());
    match done.remaining_after {
        Some(left) => println!(
            "✓ Took {} {} ({}), {} left",
            done.dose.time.format("%H:%M"),
            name,
            done.dose.compartment_id,
            left
        ),
        None => println!("✓ Took {} {}", done.dose.time.format("%H:%M"), name),
    }

    let snapshot = MediBox {
        compartments: session.compartments().to_vec(),
    };
    snapshot.flush(box_path)
}

fn print_progress(session: &Session, clock: Clock) {
    let now = clock.now();
    let timeline = session.timeline(&now);
    let tracker = session.tracker();

    println!();
    match tracker.state(&timeline) {
        DayState::Empty => println!("No doses scheduled today."),
        DayState::Completed => println!("All {} doses taken for today.", timeline.len()),
        DayState::Pending => {
            println!("Progress: {}/{}", tracker.cursor(), timeline.len());
            if let Some(next) = tracker.peek_next(&timeline) {
                let name = find_compartment(session.compartments(), next.compartment_id)
                    .map(|c| c.display_name())
                    .unwrap_or_default();
                println!(
                    "Next: {} {} ({}), {}",
                    next.time.format("%H:%M"),
                    name,
                    next.compartment_id,
                    format_remaining(time_until(next, &now))
                );
            }
        }
    }
}

fn cmd_alerts(box_path: &Path, inventory: &InventoryConfig) -> Result<()> {
    let medibox = MediBox::load(box_path, inventory)?;
    let alerts = alerts::alerts(&medibox.compartments);

    if alerts.is_empty() {
        println!("All compartments stocked.");
    }
    for alert in alerts {
        println!(
            "⚠ {} ({}): {} left (threshold {})",
            alert.name, alert.compartment_id, alert.remaining, alert.threshold
        );
    }
    Ok(())
}

fn cmd_list(box_path: &Path, inventory: &InventoryConfig) -> Result<()> {
    let medibox = MediBox::load(box_path, inventory)?;

    for c in &medibox.compartments {
        println!(
            "{} {}{}  qty {} (low at {})  [{}]",
            c.id,
            c.display_name(),
            c.dosage
                .as_ref()
                .map(|d| format!(" {}", d))
                .unwrap_or_default(),
            c.remaining_quantity,
            c.low_stock_threshold,
            c.instruction.label()
        );
        for s in &c.schedules {
            println!("    {}  {}", s.time, s.id);
        }
    }
    Ok(())
}

fn cmd_restock(box_path: &Path, inventory: &InventoryConfig, quantity: u32) -> Result<()> {
    let medibox = MediBox::update(box_path, inventory, |medibox| {
        reset_all(&mut medibox.compartments, quantity);
        Ok(())
    })?;

    println!(
        "✓ Restocked {} compartments to {}",
        medibox.compartments.len(),
        quantity
    );
    Ok(())
}

fn cmd_configure(
    box_path: &Path,
    inventory: &InventoryConfig,
    slot: CompartmentId,
    name: Option<String>,
    dosage: Option<String>,
    instruction: Option<Instruction>,
    threshold: Option<u32>,
) -> Result<()> {
    MediBox::update(box_path, inventory, |medibox| {
        let compartment = medibox.compartment_mut(slot)?;
        if let Some(name) = name {
            compartment.medication_name = Some(name).filter(|n| !n.trim().is_empty());
        }
        if let Some(dosage) = dosage {
            compartment.dosage = Some(dosage).filter(|d| !d.trim().is_empty());
        }
        if let Some(instruction) = instruction {
            compartment.instruction = instruction;
        }
        if let Some(threshold) = threshold {
            compartment.low_stock_threshold = threshold;
        }
        Ok(())
    })?;

    println!("✓ Compartment {} updated", slot);
    Ok(())
}

fn cmd_schedule(box_path: &Path, inventory: &InventoryConfig, action: ScheduleAction) -> Result<()> {
    match action {
        ScheduleAction::Add { slot, at } => {
            let mut schedule_id = None;
            MediBox::update(box_path, inventory, |medibox| {
                schedule_id = Some(medibox.add_schedule(CompartmentId(slot), &at)?);
                Ok(())
            })?;
            if let Some(id) = schedule_id {
                println!("✓ Scheduled {} for compartment #{} ({})", at, slot, id);
            }
        }
        ScheduleAction::Remove { id } => {
            let mut removed = false;
            MediBox::update(box_path, inventory, |medibox| {
                removed = medibox.remove_schedule(id);
                Ok(())
            })?;
            if removed {
                println!("✓ Removed schedule {}", id);
            } else {
                println!("No schedule with id {}", id);
            }
        }
        ScheduleAction::Clear { slot } => {
            let mut removed = 0;
            MediBox::update(box_path, inventory, |medibox| {
                removed = medibox.clear_schedules(CompartmentId(slot))?;
                Ok(())
            })?;
            println!("✓ Cleared {} schedules from compartment #{}", removed, slot);
        }
    }
    Ok(())
}

fn print_dose_line(compartments: &[Compartment], view: &DoseView) {
    let compartment = find_compartment(compartments, view.dose.compartment_id);
    let name = compartment.map(|c| c.display_name()).unwrap_or_default();
    let instruction = compartment
        .filter(|c| c.instruction != Instruction::None)
        .map(|c| format!(" ({})", c.instruction.label()))
        .unwrap_or_default();
    let status = match view.status {
        DoseStatus::Taken => "taken".to_string(),
        DoseStatus::Overdue | DoseStatus::Upcoming => format_remaining(view.remaining),
    };

    println!(
        "  {}  {} {}{}  {}",
        view.dose.time.format("%H:%M"),
        view.dose.compartment_id,
        name,
        instruction,
        status
    );
}

fn print_low_stock(compartments: &[Compartment]) {
    let low = low_stock(compartments);
    if low.is_empty() {
        return;
    }
    println!();
    for c in low {
        println!("⚠ Low stock: {} ({}) {} left", c.display_name(), c.id, c.remaining_quantity);
    }
}

enum UserAction {
    Administer,
    Reset,
    Quit,
}

fn prompt_user_action() -> Result<UserAction> {
    println!("─────────────────────────────────────────");
    println!("Press Enter to take the next dose");
    println!("  'r' + Enter to reset progress");
    println!("  'q' + Enter to quit");
    print!("> ");
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(UserAction::Quit);
    }

    let action = match input.trim().to_lowercase().as_str() {
        "r" => UserAction::Reset,
        "q" => UserAction::Quit,
        _ => UserAction::Administer,
    };

    Ok(action)
}

//! `hospnav` - CLI for the hospital navigation assistant
//!
//! This binary exposes the zone router, the local record store, the
//! medication recognition workflow and the dispenser from the command line.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing::error;

use hospnav::cli::{
    Cli, Command, ConfigCommand, FamilyCommand, FamilySaveArgs, HistoryCommand, ListArgs,
    OutputFormat, RecognizeCommand,
};
use hospnav::directory::{self, recognition_result_path, route_planner_path};
use hospnav::records::family::{
    default_member, delete_family_member, find_member, upsert_family_member,
};
use hospnav::records::medication::load_medications;
use hospnav::records::recognition::find_recognition;
use hospnav::records::{filter_by_name_substring, FamilyMemberForm, Named};
use hospnav::recognition::FileCamera;
use hospnav::validation::{mask_id_card, mask_phone};
use hospnav::zone::back_target;
use hospnav::{
    classify_zone, init_logging, title_for_path, CaptureSession, Config, DispenserClient, Error,
    FamilyMember, MedicationRecognition, RecordStore, Result, SampleRecognizer, SqliteStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Config commands must work even when the file is broken
    if let Command::Config(config_cmd) = cli.command {
        return handle_config(cli.config, config_cmd);
    }

    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Zone(cmd) => {
            let zone = classify_zone(&cmd.path, cmd.referrer.as_deref());
            println!("{zone}");
            println!("  home: {}", zone.home_path());
            println!("  back: {}", back_target(&cmd.path, cmd.referrer.as_deref()));
            Ok(())
        }
        Command::Title(cmd) => {
            println!("{}", title_for_path(&cmd.path));
            Ok(())
        }
        Command::Family(family_cmd) => handle_family(&config, family_cmd),
        Command::History(history_cmd) => handle_history(&config, history_cmd),
        Command::Recognize(recognize_cmd) => handle_recognize(&config, recognize_cmd).await,
        Command::Medications(args) => {
            let store = open_store(&config)?;
            let medications = load_medications(&RecordStore::new(&store))?;
            let found = filter_by_name_substring(&medications, args.term());
            print_list(&args, &found, |m| {
                format!(
                    "{:<8} {:<34} {:<8} {:<14} {}",
                    m.id,
                    m.name,
                    m.dosage,
                    m.frequency,
                    m.times.join(", ")
                )
            })
        }
        Command::Departments(args) => {
            let found = filter_by_name_substring(directory::departments(), args.term());
            print_list(&args, &found, |d| {
                format!(
                    "{:<14} {:<22} {}  -> {}",
                    d.name,
                    d.location,
                    d.description,
                    route_planner_path(d.name)
                )
            })
        }
        Command::Contacts(args) => {
            let found = filter_by_name_substring(directory::emergency_contacts(), args.term());
            print_list(&args, &found, |c| {
                format!("{:<24} {:<16} {}", c.name, c.phone, c.description)
            })
        }
        Command::Dispense(cmd) => {
            let client = DispenserClient::from_config(&config.dispenser)?;
            let response = client.open(cmd.medication_id.as_deref()).await?;
            println!("Dispenser opened.");
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        // Handled before the configuration is loaded
        Command::Config(_) => Ok(()),
    }
}

fn open_store(config: &Config) -> Result<SqliteStore> {
    Ok(SqliteStore::open(config.database_path())?.with_quota(config.quota()))
}

fn print_list<T: Named + Serialize>(
    args: &ListArgs,
    items: &[T],
    row: impl Fn(&T) -> String,
) -> Result<()> {
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(items)?),
        OutputFormat::Plain => {
            for item in items {
                println!("{}", item.display_name());
            }
        }
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No results.");
            }
            for item in items {
                println!("{}", row(item));
            }
        }
    }
    Ok(())
}

fn describe_member(member: &FamilyMember, unmasked: bool) -> String {
    let mask = |value: &Option<String>, f: fn(&str) -> String| match value {
        Some(v) if unmasked => v.clone(),
        Some(v) => f(v),
        None => "-".to_string(),
    };
    format!(
        "{:<20} {:<16} {:<10} id card: {:<20} phone: {:<14} card: {}{}",
        member.id,
        member.name,
        member.relation,
        mask(&member.id_card, mask_id_card),
        mask(&member.phone, mask_phone),
        member.medical_card_no.as_deref().unwrap_or("-"),
        if member.is_default { "  (default)" } else { "" }
    )
}

fn handle_family(config: &Config, cmd: FamilyCommand) -> Result<()> {
    let store = open_store(config)?;
    let records = RecordStore::new(&store);
    let members: Vec<FamilyMember> = records.load()?;

    match cmd {
        FamilyCommand::List(args) => {
            let found = filter_by_name_substring(&members, args.term());
            print_list(&args, &found, |m| describe_member(m, false))
        }
        FamilyCommand::Show { id, unmasked } => {
            let member = find_member(&members, &id)
                .ok_or_else(|| Error::validation("id", format!("no family member with id '{id}'")))?;
            println!("{}", describe_member(member, unmasked));
            Ok(())
        }
        FamilyCommand::Save(args) => {
            let form = build_form(&members, args);
            let members = upsert_family_member(members, form)?;
            records.save(&members)?;
            if let Some(member) = default_member(&members) {
                println!("Saved. Default member: {} ({})", member.name, member.id);
            }
            Ok(())
        }
        FamilyCommand::Delete { id } => {
            let members = delete_family_member(members, &id)?;
            records.save(&members)?;
            println!("Deleted {id}.");
            Ok(())
        }
    }
}

/// Start from the stored member when editing, then apply the given flags.
fn build_form(members: &[FamilyMember], args: FamilySaveArgs) -> FamilyMemberForm {
    let mut form = match args.id.as_deref() {
        Some(id) => find_member(members, id).map_or_else(
            || FamilyMemberForm {
                id: Some(id.to_string()),
                ..FamilyMemberForm::default()
            },
            FamilyMemberForm::from,
        ),
        None => FamilyMemberForm::default(),
    };

    if let Some(name) = args.name {
        form.name = name;
    }
    if args.relation.is_some() {
        form.relation = args.relation;
    }
    if args.id_card.is_some() {
        form.id_card = args.id_card;
    }
    if args.phone.is_some() {
        form.phone = args.phone;
    }
    if args.medical_card_no.is_some() {
        form.medical_card_no = args.medical_card_no;
    }
    form.is_default |= args.default;
    form
}

fn describe_recognition(record: &MedicationRecognition) -> String {
    format!(
        "{:<20} {}  {:<34} {:>3}%  {}",
        record.id,
        record.timestamp.format("%Y-%m-%d %H:%M"),
        record.medication_name,
        record.confidence,
        if record.matched { "matched" } else { "not matched" }
    )
}

fn handle_history(config: &Config, cmd: HistoryCommand) -> Result<()> {
    let store = open_store(config)?;
    let records = RecordStore::new(&store);

    match cmd {
        HistoryCommand::List(args) => {
            let history: Vec<MedicationRecognition> = records.load()?;
            let found = filter_by_name_substring(&history, args.term());
            print_list(&args, &found, describe_recognition)
        }
        HistoryCommand::Show { id } => {
            let history: Vec<MedicationRecognition> = records.load()?;
            let record = find_recognition(&history, &id)
                .ok_or_else(|| Error::validation("id", format!("no recognition with id '{id}'")))?;
            println!("{}", describe_recognition(record));
            println!("  page: {}", recognition_result_path(&record.id));
            Ok(())
        }
        HistoryCommand::Clear { yes } => {
            if !yes {
                println!("This will delete all recognition history.");
                println!("Use --yes to confirm.");
                return Ok(());
            }
            records.clear::<MedicationRecognition>()?;
            println!("Recognition history cleared.");
            Ok(())
        }
    }
}

async fn handle_recognize(config: &Config, cmd: RecognizeCommand) -> Result<()> {
    let store = open_store(config)?;
    let records = RecordStore::new(&store);

    let medications = load_medications(&records)?;
    let mut recognizer = SampleRecognizer::new(medications, &config.recognition)?;
    if let Some(seed) = cmd.seed {
        recognizer = recognizer.with_seed(seed);
    }

    let mut session = CaptureSession::new(FileCamera::new(&cmd.image));
    session.start()?;
    session.take_snapshot()?;
    if !cmd.json {
        println!("Recognising...");
    }
    let record = session.recognize(&recognizer, &records).await?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("{}", describe_recognition(&record));
        println!("  page: {}", recognition_result_path(&record.id));
    }
    Ok(())
}

fn handle_config(path: Option<std::path::PathBuf>, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Quota (bytes):      {}", config.storage.quota_bytes);
                println!();
                println!("[Recognition]");
                println!("  Delay (ms):         {}", config.recognition.delay_ms);
                println!(
                    "  Confidence:         {}-{}%",
                    config.recognition.min_confidence, config.recognition.max_confidence
                );
                println!("  Match probability:  {}", config.recognition.match_probability);
                println!();
                println!("[Dispenser]");
                println!("  Mode:               {:?}", config.dispenser.mode);
                println!(
                    "  Target:             {}",
                    hospnav::dispenser::resolve_target(&config.dispenser)?
                );
                println!("  Timeout (s):        {}", config.dispenser.timeout_secs);
            }
        }
        ConfigCommand::Path => {
            println!("{}", path.unwrap_or_else(Config::default_config_path).display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.or(path).unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

//! Sheet Rolls CLI
//!
//! A command-line D6 pip-code roller with character sheet support.

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::error::Error;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use sheetrolls::dice::{self, DiceCode, DieKind, RollResult};
use sheetrolls::session::{self, EditorSession, RollSeverity, SessionOptions};
use sheetrolls::settings::EditorSettings;
use sheetrolls::sheet::{
    FantasyData, FantasyText, GameSystem, SheetData, SheetId, StarWarsData, StarWarsEdit,
    StarWarsText,
};
use sheetrolls::store::{SheetStore, SurrealSheetStore};

/// Sheet Rolls - D6 dice roller
#[derive(Parser)]
#[command(name = "sheetrolls")]
#[command(
    author,
    version,
    about = "Sheet Rolls - A command-line D6 pip-code dice roller"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Dice code to roll (e.g., "4D+2", "2k6+1")
    #[arg(short, long, value_parser = parse_dice_arg)]
    dice: Option<u32>,

    /// Label shown for a --dice roll
    #[arg(short, long)]
    label: Option<String>,

    /// Directory of the local sheet database (SurrealDB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SystemArg {
    StarWars,
    Fantasy,
}

impl From<SystemArg> for GameSystem {
    fn from(system: SystemArg) -> Self {
        match system {
            SystemArg::StarWars => GameSystem::StarWars,
            SystemArg::Fantasy => GameSystem::Fantasy,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Roll a dice code
    Roll {
        #[arg(value_parser = parse_dice_arg)]
        code: u32,
        #[arg(short, long, default_value = "Dobás")]
        label: String,
    },

    /// Show a pip count as a dice code
    Format { value: u32 },

    /// Read free-form dice text into a pip count
    Parse { text: String },

    /// Create a new character sheet
    New {
        #[arg(value_enum)]
        system: SystemArg,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "local")]
        owner: String,
        #[arg(long)]
        player: Option<String>,
    },

    /// List stored character sheets
    List,

    /// Display a character sheet
    Stats { id: i64 },

    /// Delete a character sheet
    Delete { id: i64 },

    /// Roll a skill from a Star Wars sheet
    Skill { id: i64, skill: String },

    /// Roll an attribute from a Star Wars sheet
    Attribute { id: i64, name: String },

    /// Roll weapon damage from a Star Wars sheet
    Weapon { id: i64, name: String },

    /// Set (or learn) a skill; "0D" forgets it
    SetSkill {
        id: i64,
        attribute: String,
        skill: String,
        #[arg(value_parser = parse_strict_code)]
        value: u32,
    },

    /// Set an attribute
    SetAttribute {
        id: i64,
        name: String,
        #[arg(value_parser = parse_strict_code)]
        value: u32,
    },
}

fn parse_dice_arg(s: &str) -> Result<u32, String> {
    match dice::parse_dice(s) {
        0 => Err(format!(
            "Invalid dice code: {}. Use format like '4D', '2D+1' or '3k'",
            s
        )),
        value => Ok(value),
    }
}

fn parse_strict_code(s: &str) -> Result<u32, String> {
    s.parse::<DiceCode>()
        .map(DiceCode::value)
        .map_err(|e| e.to_string())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    // A bare --dice roll needs no database
    if let Some(value) = cli.dice {
        let label = cli.label.as_deref().unwrap_or("Dobás");
        print_roll(&session::roll_dice(value, label)?, RollSeverity::Normal);
        return Ok(());
    }

    let Some(command) = cli.command else {
        eprintln!("{} No command specified", "Error:".red().bold());
        eprintln!("Use --help to see available commands");
        eprintln!("\nExamples:");
        eprintln!("  sheetrolls --dice 4D+2");
        eprintln!("  sheetrolls new star-wars --name Kira");
        eprintln!("  sheetrolls skill 1 Atlétika");
        eprintln!("  sheetrolls stats 1");
        std::process::exit(1);
    };

    match command {
        Commands::Roll { code, label } => {
            print_roll(&session::roll_dice(code, &label)?, RollSeverity::Normal);
        }
        Commands::Format { value } => println!("{}", dice::format(value)),
        Commands::Parse { text } => {
            let value = dice::parse_dice(&text);
            println!("{} ({})", value, dice::format(value));
        }
        Commands::New {
            system,
            name,
            owner,
            player,
        } => {
            let store = open_store(cli.db)?;
            let data = match GameSystem::from(system) {
                GameSystem::StarWars => {
                    let mut data = StarWarsData::default();
                    data.set_text(StarWarsText::Name, &name);
                    data.set_text(StarWarsText::PlayerName, player.as_deref().unwrap_or(""));
                    SheetData::StarWars(data)
                }
                GameSystem::Fantasy => {
                    let mut data = FantasyData::default();
                    data.set_text(FantasyText::Name, &name);
                    data.set_text(FantasyText::PlayerName, player.as_deref().unwrap_or(""));
                    SheetData::Fantasy(data)
                }
            };
            let id = store.create(&owner, data)?;
            println!(
                "{} {} {}",
                "Created".green().bold(),
                name.bold(),
                format!("(id {})", id).dimmed()
            );
        }
        Commands::List => {
            let store = open_store(cli.db)?;
            let sheets = store.list()?;
            if sheets.is_empty() {
                println!("{}", "No character sheets yet".dimmed());
            }
            for sheet in sheets {
                println!(
                    "  {:>4}  {}  {}  {}",
                    sheet.id.to_string().cyan(),
                    display_name(&sheet.name).bold(),
                    sheet.system.name().yellow(),
                    sheet.player_name.dimmed()
                );
            }
        }
        Commands::Stats { id } => {
            let store = open_store(cli.db)?;
            let settings = EditorSettings::load(&store);
            let sheet = store.load(SheetId(id))?;
            match &sheet.data {
                SheetData::StarWars(data) => display_star_wars(data, &settings),
                SheetData::Fantasy(data) => display_fantasy(data),
            }
        }
        Commands::Delete { id } => {
            let store = open_store(cli.db)?;
            let mut session = EditorSession::open(
                &store,
                SheetId(id),
                SessionOptions::from_settings(&EditorSettings::load(&store), true),
            )?;
            let name = session.data().name().to_string();
            session.delete()?;
            println!("{} {}", "Deleted".red().bold(), display_name(&name));
        }
        Commands::Skill { id, skill } => {
            let store = open_store(cli.db)?;
            let session = open_read_only(&store, id)?;
            let data = session
                .data()
                .as_star_wars()
                .ok_or("Skill rolls need a Star Wars sheet")?;
            let attribute = match data.find_skill(&skill) {
                Some((attr, _)) => attr.name.clone(),
                None => {
                    return Err(format!(
                        "Unknown skill '{}'. Known skills: {}",
                        skill,
                        data.skill_names().join(", ")
                    )
                    .into())
                }
            };
            print_roll(
                &session.roll_skill(&attribute, &skill)?,
                session.roll_severity(),
            );
        }
        Commands::Attribute { id, name } => {
            let store = open_store(cli.db)?;
            let session = open_read_only(&store, id)?;
            print_roll(&session.roll_attribute(&name)?, session.roll_severity());
        }
        Commands::Weapon { id, name } => {
            let store = open_store(cli.db)?;
            let session = open_read_only(&store, id)?;
            let wanted = name.to_lowercase();
            let index = session
                .data()
                .as_star_wars()
                .and_then(|data| {
                    data.weapons
                        .iter()
                        .position(|w| w.name.to_lowercase() == wanted)
                })
                .ok_or_else(|| format!("Weapon '{}' not found", name))?;
            print_roll(&session.roll_weapon(index)?, RollSeverity::Normal);
        }
        Commands::SetSkill {
            id,
            attribute,
            skill,
            value,
        } => {
            let store = open_store(cli.db)?;
            let mut session = open_editable(&store, id)?;
            let known = session
                .data()
                .as_star_wars()
                .and_then(|data| data.skill(&attribute, &skill))
                .is_some();
            if !known && value > 0 {
                session.apply(StarWarsEdit::AddSkill {
                    attribute: attribute.clone(),
                    skill: skill.clone(),
                });
            }
            let changed = session.apply(StarWarsEdit::SetSkill {
                attribute,
                skill,
                value,
            });
            finish_edit(session, changed)?;
        }
        Commands::SetAttribute { id, name, value } => {
            let store = open_store(cli.db)?;
            let mut session = open_editable(&store, id)?;
            let changed = session.apply(StarWarsEdit::SetAttribute {
                attribute: name,
                value,
            });
            finish_edit(session, changed)?;
        }
    }

    Ok(())
}

// ============================================================================
// Store & Session Helpers
// ============================================================================

fn open_store(db: Option<PathBuf>) -> Result<SurrealSheetStore, Box<dyn Error>> {
    let store = match db {
        Some(dir) => SurrealSheetStore::open_in_dir(dir)?,
        None => SurrealSheetStore::open()?,
    };
    debug!("Using sheet store at {:?}", store.db_path);
    Ok(store)
}

fn open_read_only(
    store: &SurrealSheetStore,
    id: i64,
) -> Result<EditorSession<&SurrealSheetStore>, Box<dyn Error>> {
    let options = SessionOptions::from_settings(&EditorSettings::load(store), false);
    Ok(EditorSession::open(store, SheetId(id), options)?)
}

fn open_editable(
    store: &SurrealSheetStore,
    id: i64,
) -> Result<EditorSession<&SurrealSheetStore>, Box<dyn Error>> {
    let options = SessionOptions::from_settings(&EditorSettings::load(store), true);
    let mut session = EditorSession::open(store, SheetId(id), options)?;
    session.on_saved(|summary| {
        println!(
            "{} {}",
            "Saved".green().bold(),
            display_name(&summary.name).bold()
        );
    });
    Ok(session)
}

fn finish_edit(
    session: EditorSession<&SurrealSheetStore>,
    changed: bool,
) -> Result<(), Box<dyn Error>> {
    if !changed {
        println!("{}", "Nothing changed".dimmed());
        return Ok(());
    }
    match session.close() {
        Some(completion) if !completion.is_saved() => {
            Err(format!("Failed to save sheet: {:?}", completion).into())
        }
        _ => Ok(()),
    }
}

fn display_name(name: &str) -> &str {
    if name.is_empty() {
        "(névtelen)"
    } else {
        name
    }
}

// ============================================================================
// Output
// ============================================================================

fn print_roll(result: &RollResult, severity: RollSeverity) {
    println!("\n{}", "═══════════════════════════════════════".cyan());
    let headline = match severity {
        RollSeverity::Hurt => result.summary().red().bold(),
        RollSeverity::Normal => result.summary().yellow().bold(),
    };
    println!("{} {}", "Rolling:".bold().white(), headline);

    let faces: Vec<String> = result
        .dice
        .iter()
        .map(|die| match die.kind {
            DieKind::Full => match die.face {
                6 => format!("[{}]", die.face).bright_green().bold().to_string(),
                1 => format!("[{}]", die.face).bright_red().bold().to_string(),
                _ => format!("[{}]", die.face).bright_white().bold().to_string(),
            },
            DieKind::Partial { .. } => format!("({})", die.face).cyan().to_string(),
        })
        .collect();
    println!("{} {}", "Dice:".bold().white(), faces.join(" "));

    println!(
        "{} {}",
        "Total:".bold().white(),
        result.total.to_string().bold()
    );
    if severity == RollSeverity::Hurt {
        println!("{}", "Wound penalty applied".red());
    }
    println!("{}", "═══════════════════════════════════════".cyan());
}

fn display_star_wars(data: &StarWarsData, settings: &EditorSettings) {
    println!("\n{}", "═══════════════════════════════════════".cyan());
    println!("{}", "CHARACTER SHEET".bold().yellow());
    println!("{}", "═══════════════════════════════════════".cyan());
    println!("{} {}", "Name:".bold().white(), display_name(&data.name).green());
    if !data.species.is_empty() {
        println!("{} {}", "Species:".bold().white(), data.species.yellow());
    }
    if !data.player_name.is_empty() {
        println!("{} {}", "Player:".bold().white(), data.player_name);
    }

    println!("\n{}", "ATTRIBUTES".bold().yellow());
    for attr in &data.attributes {
        println!("  {} {}", format!("{}:", attr.name).bold(), dice::format(attr.value));
        for skill in &attr.skills {
            println!(
                "    {} +{} ({})",
                skill.name,
                dice::format(skill.value),
                dice::format(attr.value.saturating_add(skill.value)).cyan()
            );
            for spec in &skill.specs {
                println!(
                    "      ↳ {} +{} ({})",
                    spec.name,
                    dice::format(spec.value),
                    dice::format(
                        attr.value
                            .saturating_add(skill.value)
                            .saturating_add(spec.value)
                    )
                    .cyan()
                );
            }
        }
    }

    if data.force_sensitive {
        println!("\n{}", "FORCE".bold().yellow());
        println!("  {} {}", "Kontrol:".bold(), dice::format(data.control));
        println!("  {} {}", "Észlelés:".bold(), dice::format(data.sense));
        println!("  {} {}", "Változtatás:".bold(), dice::format(data.alter));
    }

    println!("\n{}", "COMBAT".bold().yellow());
    println!(
        "  {} {}  {} {}  {} {}",
        "Block:".bold(),
        data.block,
        "Dodge:".bold(),
        data.dodge,
        "Parry:".bold(),
        data.parry
    );
    println!("  {} {}", "Move:".bold(), data.movement);
    for weapon in &data.weapons {
        println!(
            "  {} {} {}",
            display_name(&weapon.name).bold(),
            weapon.damage,
            weapon.range.dimmed()
        );
    }

    let penalty = data.wound_penalty(&settings.room);
    if penalty > 0 || data.incapacitated {
        println!("\n{}", "CONDITION".bold().red());
        if penalty > 0 {
            println!("  {} -{}", "Wound penalty:".bold(), dice::format(penalty));
        }
        if data.incapacitated {
            println!("  {}", "Incapacitated".red().bold());
        }
    }

    println!(
        "\n{} {} / {} / {}",
        "Totals:".bold().white(),
        dice::format(data.attributes_sum()),
        dice::format(data.skills_sum()),
        dice::format(data.specs_sum())
    );
    println!("{}", "═══════════════════════════════════════".cyan());
}

fn display_fantasy(data: &FantasyData) {
    println!("\n{}", "═══════════════════════════════════════".cyan());
    println!("{}", "CHARACTER SHEET".bold().yellow());
    println!("{}", "═══════════════════════════════════════".cyan());
    println!("{} {}", "Name:".bold().white(), display_name(&data.name).green());
    println!(
        "{} Level {} {}",
        "Class:".bold().white(),
        data.level,
        data.class.cyan()
    );

    println!("\n{}", "ATTRIBUTES".bold().yellow());
    for (label, score) in data.attributes.as_vec() {
        println!("  {} {}", format!("{}:", label).bold(), score);
    }

    println!("\n{}", "COMBAT".bold().yellow());
    println!(
        "  {} {} ({}{})",
        "Armor:".bold(),
        data.sum_armor,
        data.armor.label(),
        if data.shield { " + pajzs" } else { "" }
    );
    println!("  {} {} ({}k)", "HP:".bold(), data.hp, data.hp_dice);

    if !data.skills.is_empty() {
        println!("\n{} {}", "Skills:".bold().yellow(), data.skills.join(", "));
    }
    if !data.abilities.is_empty() {
        println!("{} {}", "Abilities:".bold().yellow(), data.abilities.join(", "));
    }
    println!("{}", "═══════════════════════════════════════".cyan());
}

// ============================================================================
// Tests
// ============================================================================

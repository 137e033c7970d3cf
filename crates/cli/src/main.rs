use clap::{Parser, Subcommand};
use preflight_core::{
    extraction, ChecklistService, CoreConfig, DiscrepancyCoordinator, DiscrepancyKind,
};
use preflight_files::{DocumentKind, DocumentsService};
use preflight_types::{NonEmptyText, StudentId};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "preflight")]
#[command(about = "Preflight pilot-training checklist CLI")]
struct Cli {
    /// Data directory (defaults to PREFLIGHT_DATA_DIR or /preflight_data)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a student profile
    Init {
        /// Student display name
        display_name: String,
    },
    /// List all students
    List,
    /// Show a student's checklist
    Show {
        /// Student id (32 lowercase hex characters)
        student_id: String,
    },
    /// Set or clear completion of a checklist item
    Complete {
        /// Student id
        student_id: String,
        /// Checklist item id
        item_id: String,
        /// Clear instead of set
        #[arg(long)]
        clear: bool,
    },
    /// Write a document name and re-run the discrepancy check
    SetName {
        /// Student id
        student_id: String,
        /// Checklist item id ("101" certificate, "201" medical)
        item_id: String,
        /// The name as printed on the document
        name: String,
    },
    /// Acknowledge a pending name discrepancy
    Acknowledge {
        /// Student id
        student_id: String,
        /// Discrepancy kind: middle_name or general
        kind: String,
    },
    /// Scrape name/number/date fields from an OCR text file
    Extract {
        /// Path to a file of OCR'd text
        path: PathBuf,
    },
    /// Store a captured document photo
    ImportDocument {
        /// Student id
        student_id: String,
        /// Path to the photo
        path: PathBuf,
        /// Document kind: pilot_certificate or medical_certificate
        kind: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = cli
        .data_dir
        .or_else(|| std::env::var("PREFLIGHT_DATA_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("/preflight_data"));
    let config = CoreConfig::new(data_dir)?;
    let service = ChecklistService::new(&config)?;

    match cli.command {
        Commands::Init { display_name } => {
            let profile = service.create_student(NonEmptyText::new(&display_name)?)?;
            println!("{}", profile.id);
        }
        Commands::List => {
            for profile in service.list_students() {
                println!("{}  {}", profile.id, profile.display_name);
            }
        }
        Commands::Show { student_id } => {
            let id = StudentId::parse(&student_id)?;
            for section in service.checklist(id)? {
                println!("{}", section.title);
                for item in section.items {
                    let mark = if item.completed { "x" } else { " " };
                    match item.value {
                        Some(value) => {
                            println!("  [{}] {} {} ({})", mark, item.id, item.title, value)
                        }
                        None => println!("  [{}] {} {}", mark, item.id, item.title),
                    }
                }
            }
        }
        Commands::Complete {
            student_id,
            item_id,
            clear,
        } => {
            let id = StudentId::parse(&student_id)?;
            let mut coordinator = DiscrepancyCoordinator::new();
            service.evaluate(id, &mut coordinator)?;
            service.set_completed(id, &item_id, !clear, &coordinator)?;
        }
        Commands::SetName {
            student_id,
            item_id,
            name,
        } => {
            let id = StudentId::parse(&student_id)?;
            let mut coordinator = DiscrepancyCoordinator::new();
            service.evaluate(id, &mut coordinator)?;
            let status = service.set_item_name(id, &item_id, Some(name), &mut coordinator)?;
            println!("classification: {:?}", status.classification);
            if status.dialogs.show_middle_name_dialog {
                println!("middle-name discrepancy: acknowledge with `preflight acknowledge {} middle_name`", id);
            }
            if status.dialogs.show_general_dialog {
                println!(
                    "name discrepancy: acknowledge with `preflight acknowledge {} general`",
                    id
                );
            }
        }
        Commands::Acknowledge { student_id, kind } => {
            let id = StudentId::parse(&student_id)?;
            let kind = match kind.as_str() {
                "middle_name" => DiscrepancyKind::MiddleName,
                "general" => DiscrepancyKind::General,
                other => anyhow::bail!("unknown discrepancy kind: {other}"),
            };
            let mut coordinator = DiscrepancyCoordinator::new();
            service.evaluate(id, &mut coordinator)?;
            let (outcome, status) = service.acknowledge(id, kind, &mut coordinator)?;
            println!("{:?} -> {:?}", outcome, status.state);
        }
        Commands::Extract { path } => {
            let text = std::fs::read_to_string(&path)?;
            println!("name: {}", extraction::extract_holder_name(&text).as_deref().unwrap_or("-"));
            println!(
                "certificate number: {}",
                extraction::extract_certificate_number(&text)
                    .as_deref()
                    .unwrap_or("-")
            );
            println!(
                "date: {}",
                extraction::extract_date(&text).as_deref().unwrap_or("-")
            );
        }
        Commands::ImportDocument {
            student_id,
            path,
            kind,
        } => {
            let id = StudentId::parse(&student_id)?;
            let kind = DocumentKind::parse(&kind)?;
            let documents = DocumentsService::new(&config.students_dir(), id)?;
            let metadata = documents.add(&path, kind)?;
            println!("{}  {}", metadata.hash, metadata.relative_path);
        }
    }

    Ok(())
}

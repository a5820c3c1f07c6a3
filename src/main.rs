use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod error;
mod filter;
mod models;
mod normalize;
mod report;
mod review;
mod schools;
mod session;
mod workbook;

use crate::config::Config;
use crate::filter::{SchoolFilter, Selection, StatusFilter};
use crate::models::{Difficulty, Student};
use crate::session::Session;

#[derive(Parser)]
#[command(name = "placehub-roster")]
#[command(about = "Student roster review and export for PlaceHub admins", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Source {
    /// Workbook to read (.xlsx, .xls, .xlsb, .ods or .csv)
    file: PathBuf,
    /// Sheet to process; defaults to the first sheet
    #[arg(long)]
    sheet: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sheets of a workbook
    Sheets { file: PathBuf },
    /// Show filter counts and the students matching a filter
    List {
        #[command(flatten)]
        source: Source,
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        #[arg(long, default_value = "all")]
        school: SchoolFilter,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show one student's details
    Show {
        #[command(flatten)]
        source: Source,
        #[arg(long)]
        id: usize,
        /// Run the automated review before printing
        #[arg(long)]
        review: bool,
    },
    /// Review every student and export the review sheets by school
    Review {
        #[command(flatten)]
        source: Source,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Also export the full sheet with review columns filled in
        #[arg(long)]
        all_data: bool,
    },
    /// Edit one student and export the full sheet
    Update {
        #[command(flatten)]
        source: Source,
        #[arg(long)]
        id: usize,
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        feedback: Option<String>,
        #[arg(long)]
        resume_score: Option<f64>,
        #[arg(long)]
        project_score: Option<f64>,
        #[arg(long)]
        difficulty: Option<Difficulty>,
        /// Fill the review fields with the automated review first
        #[arg(long)]
        auto_review: bool,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Export the sheet as-is, or the review sheets by school
    Export {
        #[command(flatten)]
        source: Source,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        by_school: bool,
    },
    /// Write a Markdown summary of the roster
    Report {
        #[command(flatten)]
        source: Source,
        /// Run the automated review over everyone first
        #[arg(long)]
        review: bool,
        #[arg(long, default_value = "roster-report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("placehub_roster={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli, &config).await {
        error!("{err:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn open(source: &Source, config: &Config) -> anyhow::Result<Session> {
    let schools = config.school_table()?;
    let session = Session::open(&source.file, source.sheet.as_deref(), schools)
        .await
        .with_context(|| format!("failed to load {}", source.file.display()))?;
    info!(
        "Loaded {} students from \"{}\"",
        session.students().len(),
        session.sheet_name()
    );
    Ok(session)
}

fn out_dir<'a>(flag: &'a Option<PathBuf>, config: &'a Config) -> &'a Path {
    flag.as_deref().unwrap_or(&config.output_dir)
}

async fn run(cli: Cli, config: &Config) -> anyhow::Result<()> {
    match cli.command {
        Commands::Sheets { file } => {
            let sheets = workbook::list_sheets_async(file.clone())
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            for sheet in sheets {
                println!("{sheet}");
            }
        }
        Commands::List {
            source,
            status,
            school,
            json,
        } => {
            let mut session = open(&source, config).await?;
            session.set_selection(Selection { status, school });

            if json {
                let listing = serde_json::json!({
                    "sheet": session.sheet_name(),
                    "total": session.counts().total,
                    "statuses": session.status_options(),
                    "schools": session.school_options(),
                    "students": session.visible(),
                });
                println!("{}", serde_json::to_string_pretty(&listing)?);
                return Ok(());
            }

            println!("Statuses (all: {}):", session.counts().total);
            for option in session.status_options() {
                println!("  {:<28} {}", option.label, option.count);
            }
            println!("Schools:");
            for option in session.school_options() {
                println!("  {:<28} {}", option.label, option.count);
            }

            let visible = session.visible();
            println!("Students ({}):", visible.len());
            if visible.is_empty() {
                println!("No students found with the selected filter.");
            }
            for student in visible {
                println!(
                    "  #{:<4} {:<24} {:<26} {:<16} {}",
                    student.id,
                    student.name,
                    student.status_label(),
                    student.phone,
                    student.school
                );
            }
        }
        Commands::Show { source, id, review } => {
            let mut session = open(&source, config).await?;
            if review {
                session.review_student(id)?;
            }
            let student = session
                .student(id)
                .ok_or(error::RosterError::UnknownStudent(id))?;
            print_student(student);
        }
        Commands::Review {
            source,
            out_dir: out,
            all_data,
        } => {
            let mut session = open(&source, config).await?;
            let reviewed = session.auto_review_all()?;
            println!("Automated review completed for {reviewed} student(s).");

            let dir = out_dir(&out, config);
            let exported = session.export_reviews(dir)?;
            println!(
                "Exported {} review sheet(s) to {}.",
                exported.sheets.len(),
                exported.path.display()
            );
            if all_data {
                let exported = session.export_all(dir)?;
                println!("Exported all data to {}.", exported.path.display());
            }
        }
        Commands::Update {
            source,
            id,
            group,
            feedback,
            resume_score,
            project_score,
            difficulty,
            auto_review,
            out_dir: out,
        } => {
            let mut session = open(&source, config).await?;
            if auto_review {
                session.review_student(id)?;
            }

            let mut student = session
                .student(id)
                .cloned()
                .ok_or(error::RosterError::UnknownStudent(id))?;
            if let Some(group) = group {
                student.group = group;
            }
            if let Some(feedback) = feedback {
                student.feedback = feedback;
            }
            if let Some(score) = resume_score {
                student.resume_score = Some(score.clamp(0.0, 10.0));
            }
            if let Some(score) = project_score {
                student.project_score = Some(score.clamp(0.0, 10.0));
            }
            if difficulty.is_some() {
                student.project_difficulty = difficulty;
            }
            session.update_student(student)?;
            println!("Student updated successfully.");

            let exported = session.export_all(out_dir(&out, config))?;
            println!("Exported all data to {}.", exported.path.display());
        }
        Commands::Export {
            source,
            out_dir: out,
            by_school,
        } => {
            let session = open(&source, config).await?;
            let dir = out_dir(&out, config);
            let exported = if by_school {
                session.export_reviews(dir)?
            } else {
                session.export_all(dir)?
            };
            println!(
                "Exported {} row(s) in {} sheet(s) to {}.",
                exported.rows,
                exported.sheets.len(),
                exported.path.display()
            );
        }
        Commands::Report {
            source,
            review,
            out,
        } => {
            let mut session = open(&source, config).await?;
            if review {
                session.auto_review_all()?;
            }
            let report = report::build_report(&session, chrono::Utc::now().date_naive());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn print_student(student: &Student) {
    let field = |label: &str, value: &str| {
        if !value.is_empty() {
            println!("{label:<20} {value}");
        }
    };
    let score = |value: Option<f64>| value.map(|s| format!("{s:.1}/10")).unwrap_or_default();

    field("Id", &student.id.to_string());
    field("Name", &student.name);
    field("Status", student.status_label());
    field("Email", &student.email);
    field("Phone", &student.phone);
    field("Campus", &student.campus);
    field("School", &student.school);
    field("Resume", &student.resume);
    field("Projects", &student.projects);
    field("Group", &student.group);
    field("Feedback", &student.feedback);
    field("Resume score", &score(student.resume_score));
    field("Resume structure", &student.resume_structure);
    field("Resume projects", &student.resume_projects);
    field("Project score", &score(student.project_score));
    field(
        "Project difficulty",
        student.project_difficulty.map(|d| d.as_str()).unwrap_or(""),
    );
    field("Project review", &student.project_review);
}

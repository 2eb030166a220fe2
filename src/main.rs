use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod artifacts;
mod classifier;
mod config;
mod encoding;
mod error;
mod models;
mod records;
mod report;
mod risk;

use artifacts::ModelArtifacts;
use models::{PredictionResult, StudentRecord, Subject};

#[derive(Parser)]
#[command(name = "edustat-risk")]
#[command(about = "At-risk student prediction for EduStat", long_about = None)]
struct Cli {
    /// Directory with student_model.json, encoders.json and target_encoder.json
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict risk for a single student
    Predict {
        #[command(flatten)]
        student: StudentArgs,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Score every student in a CSV file
    Batch {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Generate a markdown report for a CSV file
    Report {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Show the loaded category encodings
    Encoders,
}

#[derive(Args)]
struct StudentArgs {
    #[arg(long)]
    gender: String,
    #[arg(long)]
    age: u32,
    #[arg(long)]
    class_level: String,
    #[arg(long, default_value_t = 85.0)]
    attendance: f64,
    #[arg(long, default_value_t = 60.0)]
    math: f64,
    #[arg(long, default_value_t = 62.0)]
    english: f64,
    #[arg(long, default_value_t = 58.0)]
    science: f64,
    #[arg(long)]
    prev_math: Option<f64>,
    #[arg(long)]
    prev_english: Option<f64>,
    #[arg(long)]
    prev_science: Option<f64>,
    #[arg(long, default_value_t = 10)]
    study_hours: u32,
    #[arg(long)]
    parental_support: String,
    #[arg(long)]
    food_security: String,
}

impl From<StudentArgs> for StudentRecord {
    fn from(args: StudentArgs) -> Self {
        StudentRecord {
            student_id: None,
            gender: args.gender,
            age: args.age,
            class_level: args.class_level,
            attendance_rate: args.attendance,
            math_score: args.math,
            english_score: args.english,
            science_score: args.science,
            prev_math_score: args.prev_math,
            prev_english_score: args.prev_english,
            prev_science_score: args.prev_science,
            study_hours: args.study_hours,
            parental_support: args.parental_support,
            food_security: args.food_security,
        }
    }
}

fn print_result(result: &PredictionResult) {
    if result.risk_label.is_at_risk() {
        println!("The student is AT RISK. Please take action.");
    } else {
        println!("The student is NOT at risk. Keep supporting their learning!");
    }
    println!("Weakest subject: {}", result.weakest_subject);
    for subject in Subject::ALL {
        if let Some(trend) = result.subject_trend.get(&subject) {
            println!("  {subject}: {} ({trend:?})", trend.arrow());
        }
    }
    println!("Readiness score: {:.2}", result.readiness_score);
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = config::Config::from_env().with_model_dir(cli.model_dir);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let artifacts = ModelArtifacts::load(&config.model_dir).with_context(|| {
        format!(
            "failed to load model artifacts from {}",
            config.model_dir.display()
        )
    })?;
    let engine = artifacts.engine();

    match cli.command {
        Commands::Predict { student, json } => {
            let record = StudentRecord::from(student);
            let result = engine.predict(&record)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result);
            }
        }
        Commands::Batch { csv, limit } => {
            let records = records::load_csv(&csv)?;
            tracing::info!(rows = records.len(), path = %csv.display(), "scoring batch");
            let mut scored = records::score_records(&engine, records)?;
            records::rank(&mut scored);

            if scored.is_empty() {
                println!("No students found in {}.", csv.display());
                return Ok(());
            }

            let at_risk = scored
                .iter()
                .filter(|s| s.result.risk_label.is_at_risk())
                .count();
            println!("{} of {} students predicted at risk.", at_risk, scored.len());
            for student in scored.iter().take(limit) {
                println!(
                    "- {} ({}) {:?} readiness {:.2}, weakest {}",
                    student.record.label(),
                    student.record.class_level,
                    student.result.risk_label,
                    student.result.readiness_score,
                    student.result.weakest_subject
                );
            }
        }
        Commands::Report { csv, out } => {
            let records = records::load_csv(&csv)?;
            let mut scored = records::score_records(&engine, records)?;
            records::rank(&mut scored);
            let report = report::build_report(
                &csv.display().to_string(),
                chrono::Utc::now().date_naive(),
                &scored,
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Encoders => {
            for (field, table) in artifacts.encoding.tables() {
                let codes: Vec<String> = table
                    .classes()
                    .iter()
                    .enumerate()
                    .map(|(code, class)| format!("{class}={code}"))
                    .collect();
                println!("{field}: {}", codes.join(", "));
            }
            println!("target: {}", artifacts.decoder.classes().join(", "));
        }
    }

    Ok(())
}

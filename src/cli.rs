use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::answers::Score;
use crate::features::Feature;
use crate::llm::LlmProvider;
use crate::models::{AssessmentId, AssessmentType};
use crate::report::OutputFormat;

/// Command line interface definition for hria.
#[derive(Parser, Debug)]
#[command(name = "hria")]
#[command(about = "Human rights impact assessment: analyze a project, answer the questionnaire, export a scored report")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbosity")]
    pub quiet: bool,

    /// Enable feature flags (comma-separated)
    #[arg(long, value_enum, value_delimiter = ',', global = true)]
    pub features: Option<Vec<Feature>>,

    /// Directory holding saved assessments
    #[arg(long, env = "HRIA_DATA_DIR", default_value = ".hria", global = true)]
    pub data_dir: PathBuf,

    #[command(flatten)]
    pub llm: LlmArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Analysis provider overrides; environment variables fill the gaps.
#[derive(Args, Debug, Clone, Default)]
pub struct LlmArgs {
    /// LLM provider: gemini, claude or opencode
    #[arg(long = "llm-provider", global = true)]
    pub provider: Option<LlmProvider>,

    /// Model to try, in order (repeatable; replaces the default list)
    #[arg(long = "llm-model", global = true)]
    pub model: Vec<String>,

    /// Per-model timeout in seconds
    #[arg(long = "llm-timeout", global = true)]
    pub timeout: Option<u64>,

    /// Backend for opencode (e.g. lmstudio, ollama)
    #[arg(long, global = true)]
    pub opencode_backend: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create an assessment and run the analysis
    New(NewArgs),
    /// Re-run the analysis for an assessment, replacing its questionnaire
    Analyze(AnalyzeArgs),
    /// Show the questionnaire with current answers
    Show { id: AssessmentId },
    /// Answer a question: yes, partial, no (or 1, 0.5, 0)
    Answer(AnswerArgs),
    /// Write the evidence note for a question
    Evidence(EvidenceArgs),
    /// Mark the assessment completed and print its report
    Finish(ReportArgs),
    /// Render the report of an assessment
    Report(ReportArgs),
    /// List saved assessments
    List,
    /// Delete an assessment
    Delete { id: AssessmentId },
    /// Overview of all assessments
    Dashboard,
    /// Ask the HRIA advisor a question
    Ask(AskArgs),
}

#[derive(Args, Debug, Clone)]
pub struct NewArgs {
    /// Project, plan, policy or law name
    #[arg(long)]
    pub name: String,

    /// Assessment type: legislation, policy, plan or project
    #[arg(long = "type")]
    pub assessment_type: AssessmentType,

    /// Sector id (see `--sector help` for the list)
    #[arg(long)]
    pub sector: String,

    /// Free-text sector, used with `--sector other`
    #[arg(long)]
    pub custom_sector: Option<String>,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long, default_value = "")]
    pub owner: String,

    /// Supporting documents (.pdf or text), repeatable
    #[arg(long = "doc")]
    pub documents: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    pub id: AssessmentId,

    /// Supporting documents (.pdf or text), repeatable
    #[arg(long = "doc")]
    pub documents: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct AnswerArgs {
    pub id: AssessmentId,

    /// Question id or its 1-based number from `show`
    pub question: String,

    pub answer: Score,

    /// Evidence note to store with the answer
    #[arg(long, conflicts_with = "edit")]
    pub evidence: Option<String>,

    /// Write the evidence note in $EDITOR
    #[arg(long)]
    pub edit: bool,
}

#[derive(Args, Debug, Clone)]
pub struct EvidenceArgs {
    pub id: AssessmentId,

    /// Question id or its 1-based number from `show`
    pub question: String,

    /// Note text; opens $EDITOR when omitted
    pub text: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    pub id: AssessmentId,

    #[arg(long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,

    /// Write to this file, or into this directory under the export file name
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct AskArgs {
    pub message: String,

    /// Give the advisor this assessment's project details
    #[arg(long)]
    pub assessment: Option<AssessmentId>,
}

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Generate(GenerateArgs),
    Watch(WatchArgs),
    Status(StatusArgs),
    Sections(SectionsArgs),
    Fix(FixArgs),
    Regenerate(RegenerateArgs),
    UpdateCode(UpdateCodeArgs),
    Compile(CompileArgs),
    Translate {
        #[command(subcommand)]
        command: TranslateCommand,
    },
}

pub fn default_api_url() -> String {
    std::env::var("DOCUVID_API_URL").unwrap_or_else(|_| "http://127.0.0.1:8008/api".to_owned())
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Path to the analysis result JSON (saved from the analyze step).
    #[arg(long)]
    pub analysis: String,

    /// Comma-separated topic indices to generate, e.g. `0,2,3`.
    #[arg(long)]
    pub topics: String,

    /// Resume a previously failed job, reusing its completed sections.
    #[arg(long)]
    pub resume_from: Option<String>,

    /// Poll interval while watching the job.
    #[arg(long, default_value_t = 2000)]
    pub interval_ms: u64,

    /// Base URL of the generation service API.
    #[arg(long, default_value_t = default_api_url())]
    pub api_url: String,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Job id to watch.
    #[arg(long)]
    pub job: String,

    /// Poll interval.
    #[arg(long, default_value_t = 2000)]
    pub interval_ms: u64,

    /// Base URL of the generation service API.
    #[arg(long, default_value_t = default_api_url())]
    pub api_url: String,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Job id to inspect.
    #[arg(long)]
    pub job: String,

    /// Base URL of the generation service API.
    #[arg(long, default_value_t = default_api_url())]
    pub api_url: String,
}

#[derive(Debug, Args)]
pub struct SectionsArgs {
    /// Job id whose sections to list.
    #[arg(long)]
    pub job: String,

    /// Base URL of the generation service API.
    #[arg(long, default_value_t = default_api_url())]
    pub api_url: String,
}

#[derive(Debug, Args)]
pub struct FixArgs {
    /// Job id the section belongs to.
    #[arg(long)]
    pub job: String,

    /// Section id to repair.
    #[arg(long)]
    pub section: String,

    /// Natural-language correction request for the AI fixer.
    #[arg(long)]
    pub prompt: Option<String>,

    /// Visual context frame as `TIMESTAMP=IMAGE_PATH`, e.g.
    /// `12.5=frames/overlap.png`. Repeatable.
    #[arg(long)]
    pub frame: Vec<String>,

    /// Base URL of the generation service API.
    #[arg(long, default_value_t = default_api_url())]
    pub api_url: String,
}

#[derive(Debug, Args)]
pub struct RegenerateArgs {
    /// Job id the section belongs to.
    #[arg(long)]
    pub job: String,

    /// Section id to regenerate.
    #[arg(long)]
    pub section: String,

    /// Base URL of the generation service API.
    #[arg(long, default_value_t = default_api_url())]
    pub api_url: String,
}

#[derive(Debug, Args)]
pub struct UpdateCodeArgs {
    /// Job id the section belongs to.
    #[arg(long)]
    pub job: String,

    /// Section id whose code to replace.
    #[arg(long)]
    pub section: String,

    /// Path to a file with the replacement animation source code.
    #[arg(long)]
    pub code_file: String,

    /// Base URL of the generation service API.
    #[arg(long, default_value_t = default_api_url())]
    pub api_url: String,
}

#[derive(Debug, Args)]
pub struct CompileArgs {
    /// Completed job id to compile at high quality.
    #[arg(long)]
    pub job: String,

    /// Render quality preset.
    #[arg(long, default_value = "high")]
    pub quality: String,

    /// Poll interval while watching the compile job.
    #[arg(long, default_value_t = 2000)]
    pub interval_ms: u64,

    /// Base URL of the generation service API.
    #[arg(long, default_value_t = default_api_url())]
    pub api_url: String,
}

#[derive(Debug, Subcommand)]
pub enum TranslateCommand {
    Languages(TranslateLanguagesArgs),
    List(TranslateListArgs),
    Request(TranslateRequestArgs),
}

#[derive(Debug, Args)]
pub struct TranslateLanguagesArgs {
    /// Base URL of the generation service API.
    #[arg(long, default_value_t = default_api_url())]
    pub api_url: String,
}

#[derive(Debug, Args)]
pub struct TranslateListArgs {
    /// Primary job id.
    #[arg(long)]
    pub job: String,

    /// Base URL of the generation service API.
    #[arg(long, default_value_t = default_api_url())]
    pub api_url: String,
}

#[derive(Debug, Args)]
pub struct TranslateRequestArgs {
    /// Primary job id (must be completed).
    #[arg(long)]
    pub job: String,

    /// Target language code, e.g. `fr`.
    #[arg(long)]
    pub to: String,

    /// Narration voice for the translated audio.
    #[arg(long)]
    pub voice: Option<String>,

    /// Base URL of the generation service API.
    #[arg(long, default_value_t = default_api_url())]
    pub api_url: String,
}

use anyhow::Context as _;
use apply_core::{
    constants::TEMPLATE_DIR_ENV, resolve_activity_definition, resolve_template_dir, ApplyContext,
    ApplyHints, ApplyOutcome, ApplyService, DirectoryTemplateRepository, FieldRules,
    LiteralEvaluator, Requirement, ResourcePathResolver,
};
use clap::{Args, Parser, Subcommand};
use fhir::{ActivityDefinition, RecordKind, TemplateFormat};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "apply")]
#[command(about = "Resolve FHIR ActivityDefinition templates into request and event records")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a template from the template directory
    Apply {
        /// ActivityDefinition id (with or without the `ActivityDefinition/` prefix)
        id: String,
        #[command(flatten)]
        context: ContextArgs,
        /// Template directory (defaults to $APPLY_TEMPLATE_DIR, then ./activity-definitions)
        #[arg(long)]
        template_dir: Option<PathBuf>,
    },
    /// Apply a template read from a JSON or YAML file
    ApplyFile {
        /// Path to the ActivityDefinition document
        path: PathBuf,
        #[command(flatten)]
        context: ContextArgs,
    },
    /// List the supported activity kinds and their field rules
    Kinds,
}

#[derive(Args, Debug)]
struct ContextArgs {
    /// Subject reference, e.g. Patient/123
    #[arg(long)]
    patient: String,
    /// Practitioner reference
    #[arg(long)]
    practitioner: Option<String>,
    /// Organization reference
    #[arg(long)]
    organization: Option<String>,
    #[arg(long)]
    encounter: Option<String>,
    #[arg(long)]
    user_type: Option<String>,
    #[arg(long)]
    user_language: Option<String>,
    #[arg(long)]
    user_task_context: Option<String>,
    #[arg(long)]
    setting: Option<String>,
    #[arg(long)]
    setting_context: Option<String>,
}

impl ContextArgs {
    fn into_context(self) -> anyhow::Result<ApplyContext> {
        let ctx = ApplyContext::from_ids(
            &self.patient,
            self.practitioner.as_deref(),
            self.organization.as_deref(),
        )?;
        Ok(ctx.with_hints(ApplyHints {
            encounter: self.encounter,
            user_type: self.user_type,
            user_language: self.user_language,
            user_task_context: self.user_task_context,
            setting: self.setting,
            setting_context: self.setting_context,
        }))
    }
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("apply_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Apply {
            id,
            context,
            template_dir,
        }) => {
            let ctx = context.into_context()?;
            let override_dir =
                template_dir.or_else(|| std::env::var(TEMPLATE_DIR_ENV).ok().map(PathBuf::from));
            let dir = resolve_template_dir(override_dir)?;
            tracing::debug!("using template directory {}", dir.display());

            let service = ApplyService::new(DirectoryTemplateRepository::new(dir), LiteralEvaluator);
            let outcome = service
                .apply_by_id(&id, &ctx)
                .with_context(|| format!("failed to apply ActivityDefinition/{id}"))?;

            let failed = outcome.is_diagnostic();
            print_json(&outcome.into_resource_or_outcome()?)?;
            if failed {
                return Ok(ExitCode::FAILURE);
            }
        }
        Some(Commands::ApplyFile { path, context }) => {
            let ctx = context.into_context()?;
            let template = read_template(&path)?;
            let resource =
                resolve_activity_definition(&template, &ctx, &LiteralEvaluator, &ResourcePathResolver)
                    .with_context(|| format!("failed to apply {}", path.display()))?;
            print_json(&ApplyOutcome::Resource(resource).into_resource_or_outcome()?)?;
        }
        Some(Commands::Kinds) => {
            for kind in RecordKind::ALL {
                println!("{}", describe_kind(kind));
            }
        }
        None => {
            println!("No command given. Use --help for usage.");
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn read_template(path: &Path) -> anyhow::Result<ActivityDefinition> {
    let format = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(TemplateFormat::from_extension)
        .unwrap_or(TemplateFormat::Json);
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    ActivityDefinition::parse(&text, format)
        .with_context(|| format!("failed to parse {}", path.display()))
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn describe_kind(kind: RecordKind) -> String {
    let rules = FieldRules::for_kind(kind);
    let required: Vec<String> = rules
        .required
        .iter()
        .map(|(field, requirement)| match requirement {
            Requirement::Always => field.to_string(),
            Requirement::UnlessDynamicValues => format!("{field} (unless dynamicValue)"),
        })
        .collect();
    let forbidden: Vec<&str> = rules.forbidden.iter().map(|field| field.as_str()).collect();

    let mut line = kind.as_code().to_string();
    if !required.is_empty() {
        line.push_str(&format!("  required: {}", required.join(", ")));
    }
    if !forbidden.is_empty() {
        line.push_str(&format!("  forbidden: {}", forbidden.join(", ")));
    }
    line
}

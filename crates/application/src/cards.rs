//! README cards for the results dataset and the viewer Space.

use evaljobs_domain::{
    EvalSource, ExportFormat, HostingLocation, JobRequest, MultiModelPolicy, DEFAULT_FLAVOR,
};

const EVALJOBS_REPO: &str = "https://github.com/dvsrepo/evaljobs";
const INSPECT_EVALS_DOCS: &str = "https://ukgovernmentbeis.github.io/inspect_evals/";
const PROVIDERS_DOCS: &str = "https://inspect.aisi.org.uk/providers.html";

/// Rendered cards for both repositories of a hosting location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCards {
    /// `README.md` of the dataset
    pub dataset: String,
    /// `README.md` of the Space
    pub space: String,
}

impl RepoCards {
    /// Render both cards for one invocation.
    ///
    /// `reference` is the eval reference exactly as the operator typed it.
    pub fn render(reference: &str, request: &JobRequest, endpoint: &str, export: ExportFormat) -> Self {
        let endpoint = endpoint.trim_end_matches('/');
        let evaljobs_cmd = evaljobs_command(reference, request);
        let inspect_cmd = inspect_command(request);
        let rerun = rerun_command(&rerun_reference(&request.source, &request.location, endpoint), request);

        Self {
            dataset: dataset_card(request, endpoint, export, &evaljobs_cmd, &inspect_cmd, &rerun),
            space: space_card(request, endpoint, &evaljobs_cmd, &inspect_cmd, &rerun),
        }
    }
}

/// The `evaljobs` command that reproduces the invocation
pub fn evaljobs_command(reference: &str, request: &JobRequest) -> String {
    let mut lines = vec![
        format!("evaljobs {}", reference),
        format!("  --model {}", request.models),
        format!("  --name {}", request.location.name()),
    ];
    if request.flavor != DEFAULT_FLAVOR {
        lines.push(format!("  --flavor {}", request.flavor));
    }
    if !request.timeout.is_default() {
        lines.push(format!("  --timeout {}", request.timeout));
    }
    if let Some(limit) = request.limit {
        lines.push(format!("  --limit {}", limit));
    }
    if request.policy != MultiModelPolicy::default() {
        lines.push(format!("  --multi-model {}", request.policy));
    }
    if !request.extra_args.is_empty() {
        lines.push("  --".to_string());
        lines.extend(pair_args(&request.extra_args).into_iter().map(|a| format!("  {}", a)));
    }
    lines.join(" \\\n")
}

/// The evaluation framework command the runner executes
pub fn inspect_command(request: &JobRequest) -> String {
    let target = match &request.source {
        EvalSource::Package { id } => id.as_str(),
        _ => "eval.py",
    };
    let subcommand = if request.models.is_set() && request.policy == MultiModelPolicy::EvalSet {
        "eval-set"
    } else {
        "eval"
    };

    let mut lines = vec![
        format!("inspect {} {}", subcommand, target),
        format!("  --model {}", request.models),
    ];
    if let Some(limit) = request.limit {
        lines.push(format!("  --limit {}", limit));
    }
    lines.push("  --log-shared".to_string());
    lines.push("  --log-buffer 100".to_string());
    lines.extend(pair_args(&request.extra_args).into_iter().map(|a| format!("  {}", a)));
    lines.join(" \\\n")
}

/// Group pass-through arguments as `--flag value` when the next token is a value
pub fn pair_args(args: &[String]) -> Vec<String> {
    let mut paired = Vec::with_capacity(args.len());
    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        match args.get(i + 1) {
            Some(next) if arg.starts_with("--") && !next.starts_with("--") => {
                paired.push(format!("{} {}", arg, next));
                i += 2;
            }
            _ => {
                paired.push(arg.clone());
                i += 1;
            }
        }
    }
    paired
}

/// `gpqa_diamond` -> `Gpqa Diamond`
pub fn title_from_name(name: &str) -> String {
    name.replace(['_', '-'], " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// What to pass to `evaljobs` to rerun the same eval with another model
fn rerun_reference(source: &EvalSource, location: &HostingLocation, endpoint: &str) -> String {
    match source {
        EvalSource::Package { id } => id.clone(),
        EvalSource::Hosted { space } => format!("spaces/{}", space),
        EvalSource::Local { .. } => location.space_url(endpoint),
    }
}

fn rerun_command(reference: &str, request: &JobRequest) -> String {
    [
        format!("evaljobs {}", reference),
        "  --model <your-model>".to_string(),
        "  --name <your-name>".to_string(),
        format!("  --flavor {}", request.flavor),
    ]
    .join(" \\\n")
}

fn eval_description(request: &JobRequest, endpoint: &str) -> String {
    match &request.source {
        EvalSource::Package { id } if id.starts_with("inspect_evals/") => {
            format!("the eval `{}` from [Inspect Evals]({})", id, INSPECT_EVALS_DOCS)
        }
        EvalSource::Package { id } => format!("the packaged eval `{}`", id),
        EvalSource::Local { file_name, .. } => format!(
            "the eval script [{}]({}/spaces/{}/blob/main/eval.py)",
            file_name,
            endpoint,
            request.location.id()
        ),
        EvalSource::Hosted { space } => format!(
            "the eval script from [spaces/{}]({}/spaces/{})",
            space, endpoint, space
        ),
    }
}

fn dataset_card(
    request: &JobRequest,
    endpoint: &str,
    export: ExportFormat,
    evaljobs_cmd: &str,
    inspect_cmd: &str,
    rerun: &str,
) -> String {
    let repo_id = request.location.id();
    let mut card = String::new();

    if let Some(ext) = export.extension() {
        card.push_str(&format!(
            "---\nconfigs:\n  - config_name: default\n    data_files:\n      - split: evals\n        path: evals.{ext}\n      - split: samples\n        path: samples.{ext}\n---\n\n",
            ext = ext
        ));
    }

    card.push_str(&format!(
        "# {name} Evaluation Results\n\n\
         Eval created with [evaljobs]({repo}).\n\n\
         This dataset contains evaluation results for the model(s) `{models}` using {description}.\n\n\
         To browse the results interactively, visit [this Space]({space_url}).\n\n\
         ## Command\n\n\
         This eval was run with:\n\n\
         ```bash\n{evaljobs_cmd}\n```\n\n\
         ## Run with other models\n\n\
         To run this eval with a different model, use:\n\n\
         ```bash\nexport HF_TOKEN=your_token_here\n\n{rerun}\n```\n\n\
         **Note:** For model selection, see the [Inspect AI providers documentation]({providers}). Common examples:\n\
         - Hugging Face models: `hf/meta-llama/Llama-3.1-8B-Instruct` (requires `--flavor` with GPU, e.g., `--flavor t4-medium`)\n\
         - HF Inference Providers: `hf-inference-providers/openai/gpt-oss-120b:fastest` (use `--flavor cpu-basic` or omit)\n\n\
         ## Inspect eval command\n\n\
         The eval was executed with:\n\n\
         ```bash\n{inspect_cmd}\n```\n",
        name = request.location.name(),
        repo = EVALJOBS_REPO,
        models = request.models,
        description = eval_description(request, endpoint),
        space_url = request.location.space_url(endpoint),
        evaljobs_cmd = evaljobs_cmd,
        rerun = rerun,
        providers = PROVIDERS_DOCS,
        inspect_cmd = inspect_cmd,
    ));

    if export.extension().is_some() {
        card.push_str(&format!(
            "\n## Splits\n\n\
             - **evals**: Evaluation runs metadata (one row per evaluation run)\n\
             - **samples**: Sample-level data (one row per sample)\n\n\
             ## Loading\n\n\
             ```python\nfrom datasets import load_dataset\n\n\
             evals = load_dataset('{id}', split='evals')\n\
             samples = load_dataset('{id}', split='samples')\n```\n",
            id = repo_id
        ));
    }

    card.push_str(
        "\n## Job logs\n\n\
         Console output and a status manifest of every job are stored under `jobs/`.\n",
    );
    card
}

fn space_card(
    request: &JobRequest,
    endpoint: &str,
    evaljobs_cmd: &str,
    inspect_cmd: &str,
    rerun: &str,
) -> String {
    let eval_name = request.source.eval_name();
    format!(
        "---\n\
         title: {title}\n\
         emoji: 📊\n\
         colorFrom: blue\n\
         colorTo: purple\n\
         sdk: docker\n\
         sdk_version: \"latest\"\n\
         pinned: false\n\
         ---\n\n\
         # {eval_name}\n\n\
         This eval was run using [evaljobs]({repo}).\n\n\
         Live log viewer for eval results stored in [{id}]({dataset_url}). \
         Logs are read from `{log_dir}`.\n\n\
         ## Command\n\n\
         ```bash\n{evaljobs_cmd}\n```\n\n\
         ## Run with other models\n\n\
         To run this eval with a different model, use:\n\n\
         ```bash\n{rerun}\n```\n\n\
         ## Inspect eval command\n\n\
         The eval was executed with:\n\n\
         ```bash\n{inspect_cmd}\n```\n",
        title = title_from_name(&eval_name),
        eval_name = eval_name,
        repo = EVALJOBS_REPO,
        id = request.location.id(),
        dataset_url = request.location.dataset_url(endpoint),
        log_dir = request.location.log_dir(),
        evaljobs_cmd = evaljobs_cmd,
        rerun = rerun,
        inspect_cmd = inspect_cmd,
    )
}

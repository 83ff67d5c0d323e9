use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;

// Import from istex-core
use istex_core::{
    dates, enrichments, flat_path, istex_path, match_all, match_first_of, post, url, Criterion,
    FileDescriptor, FileLocation, IstexConfig, PathRequest, PostRequest, TransformRequest,
    XsltProcessor,
};

// Import CLI utilities
use istex_utils::{inputs, logging};

#[derive(Parser)]
#[command(name = "istex-utils")]
#[command(about = "LoadIstex helpers: select document files, build corpus paths, write enrichments, call services")]
struct Args {
    /// Path to config file (YAML format)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log library activity to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Select file descriptors from a docObject or a file list
    Select {
        /// docObject (with --container) or JSON array of file descriptors
        #[arg(short, long)]
        files: PathBuf,

        /// docObject key holding the files: fulltext, metadata, …
        #[arg(long)]
        container: Option<String>,

        /// YAML/JSON file with an ordered list of criteria
        #[arg(long, conflicts_with = "selection")]
        criteria: Option<PathBuf>,

        /// Named criteria list from the config (e.g. fulltext_txt)
        #[arg(short, long)]
        selection: Option<String>,

        /// Return every matching file instead of the best one
        #[arg(long)]
        all: bool,
    },

    /// Compute directory and filename of a document file
    Path {
        #[arg(long)]
        id: String,

        /// metadata, fulltext, enrichments, …
        #[arg(short = 't', long = "type", default_value = "enrichments")]
        doc_type: String,

        /// Module label
        #[arg(short, long, default_value = "")]
        label: String,

        #[arg(short, long, default_value = "")]
        extension: String,

        /// Corpus output root (defaults to the config's output_path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Use `<output>/<label>` instead of the fanned-out corpus tree
        #[arg(long)]
        flat: bool,
    },

    /// Render a TEI template and write the fragment into the corpus tree
    Enrich {
        #[arg(long)]
        template: PathBuf,

        /// JSON file with the template data
        #[arg(long)]
        data: PathBuf,

        #[arg(long)]
        id: String,

        #[arg(short, long)]
        label: String,

        #[arg(short, long, default_value = ".tei.xml")]
        extension: String,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        flat: bool,

        /// docObject whose `enrichments` gets the written file recorded
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Apply an XSLT stylesheet to a service result
    Transform {
        #[arg(long)]
        xslt: PathBuf,

        #[arg(long)]
        xml: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(long)]
        document_id: String,

        /// Defaults to a fresh v4 UUID
        #[arg(long)]
        run_id: Option<String>,
    },

    /// Upload a file to a web service (multipart `file` field)
    Post {
        #[arg(short, long)]
        file: PathBuf,

        /// Defaults to the config's services.upload_url
        #[arg(short, long)]
        url: Option<String>,
    },

    /// Build a GET url from key=value parameters
    Url {
        #[arg(short, long)]
        base: String,

        /// key=value pairs, appended in order
        params: Vec<String>,
    },

    /// Print the current date
    Now {
        /// dateformat mask, e.g. yyyy-mm-dd
        #[arg(short, long)]
        format: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let config = IstexConfig::load_with_fallback(args.config.as_deref());

    match args.command {
        Command::Select { files, container, criteria, selection, all } => {
            let files = inputs::read_files(&files, container.as_deref())?;
            let criteria = match (criteria, selection) {
                (Some(path), _) => inputs::read_criteria(&path)?,
                (None, Some(name)) => config.selection(&name)?.to_vec(),
                (None, None) => return Err(anyhow!("pass --criteria <file> or --selection <name>")),
            };
            run_select(&files, &criteria, all)?;
        }
        Command::Path { id, doc_type, label, extension, output, flat } => {
            let request = PathRequest::new(output.unwrap_or(config.output_path), &id, doc_type)
                .label(&label)
                .extension(&extension);
            let location = locate(&request, flat)?;
            println!("{}", serde_json::to_string_pretty(&location)?);
        }
        Command::Enrich { template, data, id, label, extension, output, flat, record } => {
            let request = PathRequest::new(output.unwrap_or(config.output_path), &id, "enrichments")
                .label(&label)
                .extension(&extension);
            run_enrich(&template, &data, &request, flat, record.as_deref())?;
        }
        Command::Transform { xslt, xml, output, document_id, run_id } => {
            let request = TransformRequest {
                output,
                document_id,
                run_id: run_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                xslt_file: xslt,
                xml_file: xml,
            };
            let processor = XsltProcessor::new(&config.services.xslt_program);
            run_transform(&processor, &request).await?;
        }
        Command::Post { file, url } => {
            let url = url
                .or(config.services.upload_url.clone())
                .ok_or_else(|| anyhow!("no --url given and services.upload_url is not configured"))?;
            let request = PostRequest {
                filename: file,
                url,
                headers: config.services.headers.clone(),
            };
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.services.timeout_secs))
                .build()
                .context("Failed to build HTTP client")?;
            run_post(&client, &request).await?;
        }
        Command::Url { base, params } => {
            let params = inputs::parse_pairs(&params)?;
            println!("{}", url::add_parameters(&base, &params));
        }
        Command::Now { format } => {
            println!("{}", dates::now(format.as_deref()));
        }
    }

    Ok(())
}

fn locate(request: &PathRequest, flat: bool) -> Result<FileLocation> {
    let location = if flat { flat_path(request)? } else { istex_path(request)? };
    Ok(location)
}

fn run_select(files: &[FileDescriptor], criteria: &[Criterion], all: bool) -> Result<()> {
    if all {
        let selected = match_all(files, criteria);
        tracing::info!(selected = selected.len(), total = files.len(), "files selected");
        println!("{}", serde_json::to_string_pretty(&selected)?);
        return Ok(());
    }

    match match_first_of(files, criteria) {
        Some(file) => println!("{}", serde_json::to_string_pretty(file)?),
        None => {
            eprintln!("⚠️  No file matches the given criteria");
            std::process::exit(2);
        }
    }
    Ok(())
}

fn run_enrich(
    template_path: &Path,
    data_path: &Path,
    request: &PathRequest,
    flat: bool,
    record: Option<&Path>,
) -> Result<()> {
    let template = enrichments::read_template(template_path)
        .with_context(|| format!("Failed to read template {}", template_path.display()))?;
    let data = inputs::read_json(data_path)?;
    let location = locate(request, flat)?;

    enrichments::write(&template, &data, &location)
        .with_context(|| format!("Failed to write {}", location.full_path().display()))?;
    let written = location.full_path();
    println!("💾 Enrichment written to: {}", written.display());

    if let Some(doc_path) = record {
        let entry = FileDescriptor::new()
            .with("extension", request.extension.trim_start_matches('.'))
            .with("original", false)
            .with("mime", "application/tei+xml")
            .with("path", written.to_string_lossy().into_owned());
        if inputs::record_enrichment(doc_path, &request.label, entry)? {
            println!("📋 Recorded under enrichments.{} in {}", request.label, doc_path.display());
        } else {
            println!("📋 Already recorded in {}", doc_path.display());
        }
    }

    Ok(())
}

async fn run_transform(processor: &XsltProcessor, request: &TransformRequest) -> Result<()> {
    println!("🔧 Transforming {} with {}", request.xml_file.display(), request.xslt_file.display());
    let outcome = processor
        .transform(request)
        .await
        .with_context(|| format!("Failed to run {}", processor.program().display()))?;

    for line in &outcome.output {
        println!("   {line}");
    }

    let outcome = outcome.check()?;
    println!("✅ Transform done (run {}): {}", request.run_id, request.output.display());
    tracing::debug!(lines = outcome.output.len(), "transform logs");
    Ok(())
}

async fn run_post(client: &reqwest::Client, request: &PostRequest) -> Result<()> {
    println!("📤 Uploading {} to {}", request.filename.display(), request.url);
    let response = post(client, request).await?;

    if !response.is_success() {
        eprintln!("❌ Service answered {}", response.status);
        eprintln!("{}", response.body);
        std::process::exit(1);
    }

    println!("✅ Service answered {}", response.status);
    println!("{}", response.body);
    Ok(())
}

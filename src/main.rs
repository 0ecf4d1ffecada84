use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use clap::{CommandFactory, Parser};

use profilgen::ai::backend::MessagesApiBackend;
use profilgen::ai::prompts::PromptSet;
use profilgen::ai::tailoring::{extract_profile, tailor_profile};
use profilgen::analyze::structure::extract_text;
use profilgen::analyze::styles::analysis_json;
use profilgen::config::{
    find_default_config, init_default_config, load_config, AppConfig, CONFIG_FILENAME,
};
use profilgen::docx::reader::parse_docx;
use profilgen::error::ProfilError;
use profilgen::model::profile::{Profile, ProjectRequirements};
use profilgen::pdf::convert::convert_to_pdf;
use profilgen::pdf::text::PdfSource;
use profilgen::progress::ConsoleProgress;
use profilgen::render::context::{build_context, RenderMeta};
use profilgen::render::docx::render_docx;
use profilgen::storage::{default_output_path, list_templates, save_template};

#[derive(Parser, Debug)]
#[command(name = "profilgen")]
#[command(about = "Candidate profile generator: resume in, templated DOCX profile out", long_about = None)]
struct Args {
    /// Generate default config + prompt files, then exit
    #[arg(long)]
    init_config: bool,

    /// Directory to write config/prompt files (default: current directory)
    #[arg(long, value_name = "DIR")]
    init_config_dir: Option<PathBuf>,

    /// Overwrite existing config/prompt files when used with --init-config
    #[arg(long)]
    force: bool,

    /// Input resume (.docx or .pdf)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Print the flat text transcript and exit
    #[arg(long)]
    extract_text: bool,

    /// Print structure + style analysis as JSON and exit (.docx input only)
    #[arg(long)]
    analyze_json: bool,

    /// Use an existing profile JSON instead of the extraction call
    #[arg(long, value_name = "JSON")]
    profile_json: Option<PathBuf>,

    /// Print the template render context as JSON
    #[arg(long)]
    context_json: bool,

    /// DOCX layout template to render into (filename is looked up in the
    /// template store when the path itself does not exist)
    #[arg(long, value_name = "DOCX")]
    template: Option<PathBuf>,

    /// Output path (default: output/<name>_<mode>_<timestamp>.docx)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Also export the rendered document as PDF
    #[arg(long)]
    pdf: bool,

    /// Tailor the profile against this project title
    #[arg(long, value_name = "TITLE")]
    project_title: Option<String>,

    /// Project requirements JSON for tailoring
    #[arg(long, value_name = "JSON")]
    project_file: Option<PathBuf>,

    /// Store a DOCX template in the template store, then exit
    #[arg(long, value_name = "DOCX")]
    save_template: Option<PathBuf>,

    /// List stored templates, then exit
    #[arg(long)]
    list_templates: bool,

    /// Config file path (default: search for profilgen.toml upwards)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Suppress progress output on stderr
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let progress = ConsoleProgress::new(!args.quiet);

    if args.init_config {
        let dir = args
            .init_config_dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        let cfg_path = init_default_config(&dir, args.force).context("init default config")?;
        eprintln!("Wrote config: {}", cfg_path.display());
        return Ok(());
    }

    let (cfg, config_dir) = resolve_config(&args)?;
    let templates_dir = cfg.templates_dir(&config_dir);
    let output_dir = cfg.output_dir(&config_dir);

    if let Some(src) = args.save_template.as_ref() {
        let stored = save_template(&templates_dir, src)?;
        println!("{}", stored.display());
        return Ok(());
    }
    if args.list_templates {
        for t in list_templates(&templates_dir)? {
            println!("{}", t.display());
        }
        return Ok(());
    }

    let Some(input) = args.input.clone() else {
        let mut cmd = Args::command();
        cmd.print_help().context("print help")?;
        return Ok(());
    };

    if args.analyze_json {
        if !has_extension(&input, "docx") {
            anyhow::bail!("--analyze-json requires a .docx input");
        }
        progress.info(format!("analyzing {}", input.display()));
        let doc = parse_docx(&input)?;
        println!("{}", serde_json::to_string_pretty(&analysis_json(&doc))?);
        return Ok(());
    }

    let transcript = read_transcript(&input, &progress)?;
    if args.extract_text {
        println!("{transcript}");
        return Ok(());
    }

    let mut profile = match args.profile_json.as_ref() {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read profile json: {}", path.display()))?;
            serde_json::from_str::<Profile>(&text)
                .map_err(|e| ProfilError::ExtractionParseFailure(e.to_string()))?
        }
        None => {
            let backend = MessagesApiBackend::from_config(&cfg.ai)?;
            let prompts = PromptSet::load(&config_dir.join(CONFIG_FILENAME), &cfg)?;
            progress.info("extracting profile data");
            extract_profile(&backend, &prompts, &transcript)?
        }
    };

    if let Some(req) = tailoring_requirements(&args)? {
        let backend = MessagesApiBackend::from_config(&cfg.ai)?;
        let prompts = PromptSet::load(&config_dir.join(CONFIG_FILENAME), &cfg)?;
        progress.info(format!("tailoring profile for: {}", req.title));
        profile = tailor_profile(&backend, &prompts, &profile, &req)?;
    }

    let meta = RenderMeta {
        date_formatted: Local::now().format("%d.%m.%Y").to_string(),
    };
    let context = build_context(&profile, &meta);

    if args.context_json {
        println!("{}", serde_json::to_string_pretty(&context)?);
        if args.template.is_none() {
            return Ok(());
        }
    }

    let Some(template) = args.template.as_ref() else {
        // No render requested: the structured profile is the product.
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    };

    let template = resolve_template(template, &templates_dir);
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&output_dir, &profile, "docx"));

    progress.info(format!("rendering {}", template.display()));
    render_docx(&template, &context, &output)?;
    println!("{}", output.display());

    if args.pdf {
        progress.info("converting to PDF");
        let pdf_path = convert_to_pdf(&output, None)?;
        println!("{}", pdf_path.display());
    }

    Ok(())
}

fn resolve_config(args: &Args) -> anyhow::Result<(AppConfig, PathBuf)> {
    let explicit = args
        .config
        .clone()
        .or_else(|| std::env::var_os("PROFILGEN_CONFIG").map(PathBuf::from));
    let found = match explicit {
        Some(p) => Some(p),
        None => find_default_config(CONFIG_FILENAME),
    };
    match found {
        Some(path) => {
            let cfg = load_config(&path)?;
            let dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            Ok((cfg, dir))
        }
        None => Ok((AppConfig::default(), PathBuf::from("."))),
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

fn read_transcript(input: &Path, progress: &ConsoleProgress) -> anyhow::Result<String> {
    if has_extension(input, "docx") {
        progress.info(format!("reading {}", input.display()));
        let doc = parse_docx(input)?;
        Ok(extract_text(&doc))
    } else if has_extension(input, "pdf") {
        let src = PdfSource::new(input);
        progress.info(format!(
            "reading {} ({} pages)",
            input.display(),
            src.page_count()?
        ));
        Ok(src.extract_text()?)
    } else {
        Err(ProfilError::UnsupportedInputFormat(input.display().to_string()).into())
    }
}

fn tailoring_requirements(args: &Args) -> anyhow::Result<Option<ProjectRequirements>> {
    let mut req = match args.project_file.as_ref() {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read project file: {}", path.display()))?;
            serde_json::from_str::<ProjectRequirements>(&text)
                .with_context(|| format!("parse project file: {}", path.display()))?
        }
        None => match args.project_title.as_ref() {
            Some(_) => ProjectRequirements::default(),
            None => return Ok(None),
        },
    };
    if let Some(title) = args.project_title.as_ref() {
        req.title = title.clone();
    }
    Ok(Some(req))
}

fn resolve_template(template: &Path, templates_dir: &Path) -> PathBuf {
    if template.exists() {
        return template.to_path_buf();
    }
    if let Some(name) = template.file_name() {
        let stored = templates_dir.join(name);
        if stored.exists() {
            return stored;
        }
    }
    template.to_path_buf()
}

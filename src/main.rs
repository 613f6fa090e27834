use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use datachat::config::Config;
use datachat::ingest::{self, DataFile};
use datachat::session::Session;
use datachat::{invoker, normalize, render_chart, ChartSpec, OutputFormat, RenderOptions};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "datachat")]
#[command(about = "Chat with your data and turn AI chart replies into images", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ImageArgs {
    /// Image format
    #[arg(long, value_enum, default_value_t = OutputFormat::Png)]
    format: OutputFormat,
    #[arg(long, default_value_t = 800)]
    width: u32,
    #[arg(long, default_value_t = 300)]
    height: u32,
}

impl ImageArgs {
    fn options(&self) -> RenderOptions {
        RenderOptions {
            width: self.width,
            height: self.height,
            format: self.format,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render an AI reply (JSON payload or plain text) read from a file or stdin
    Render {
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Write the image here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        image: ImageArgs,
        /// Print the normalized chart spec as JSON instead of drawing it
        #[arg(long)]
        print_spec: bool,
    },
    /// Ask a question, optionally about a data file
    Ask {
        question: String,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        dataset: Option<String>,
    },
    /// Ask for a chart and render whatever comes back
    Chart {
        description: String,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        dataset: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        image: ImageArgs,
    },
    /// Generate a dashboard for a data file: one image per widget plus dashboard.json
    Dashboard {
        file: PathBuf,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        #[command(flatten)]
        image: ImageArgs,
    },
    /// Show the first rows of a data file
    Preview {
        file: PathBuf,
        #[arg(long, default_value_t = 5)]
        rows: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout may carry image bytes
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "datachat=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Render { input, output, image, print_spec } => {
            let text = read_input(input.as_deref())?;
            let payload = normalize::payload_from_text(text);
            let spec = normalize::normalize_payload(&payload);

            if print_spec {
                let json = serde_json::to_string_pretty(&spec).context("Failed to serialize chart spec")?;
                write_output(format!("{}\n", json).as_bytes(), output.as_deref())?;
            } else {
                draw(&spec, &image.options(), output.as_deref())?;
            }
        }
        Command::Ask { question, file, dataset } => {
            let mut session = open_session(file.as_deref(), dataset)?;
            let answer = session.ask(&question).await?;
            println!("{}", answer);
        }
        Command::Chart { description, file, dataset, output, image } => {
            let mut session = open_session(file.as_deref(), dataset)?;
            let spec = session.generate_chart(&description).await?;
            for insight in spec.insights() {
                eprintln!("* {}", insight);
            }
            draw(&spec, &image.options(), output.as_deref())?;
        }
        Command::Dashboard { file, out_dir, image } => {
            let mut session = open_session(Some(&file), None)?;
            let analysis = session.generate_dashboard().await?;
            let options = image.options();

            fs::create_dir_all(&out_dir)
                .with_context(|| format!("Failed to create directory '{}'", out_dir.display()))?;

            for (idx, widget) in analysis.dashboard_config.widgets.iter().enumerate() {
                let path = out_dir.join(format!("{:02}-{}.{}", idx + 1, file_slug(&widget.id), options.format.extension()));
                let bytes = render_chart(&widget.to_chart_spec(), &options)
                    .with_context(|| format!("Failed to render widget '{}'", widget.title))?;
                fs::write(&path, bytes)
                    .with_context(|| format!("Failed to write '{}'", path.display()))?;
                info!(widget = %widget.title, path = %path.display(), "wrote widget chart");
            }

            let json = serde_json::to_string_pretty(&analysis).context("Failed to serialize dashboard")?;
            let path = out_dir.join("dashboard.json");
            fs::write(&path, json).with_context(|| format!("Failed to write '{}'", path.display()))?;
            println!("{}", path.display());
        }
        Command::Preview { file, rows } => {
            let data = ingest::load_file(&file)?;
            let table = ingest::read_csv(data.text.as_bytes())
                .with_context(|| format!("Failed to parse '{}' as CSV", data.name))?;

            println!("{}", table.headers.join(" | "));
            for row in table.rows.iter().take(rows) {
                println!("{}", row.join(" | "));
            }
            eprintln!("{} rows, {} columns", table.row_count(), table.headers.len());
        }
    }

    Ok(())
}

fn open_session(file: Option<&Path>, dataset: Option<String>) -> Result<Session> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let invoker = invoker::from_config(&config)?;
    let mut session = Session::new(invoker).with_dataset(dataset);

    if let Some(path) = file {
        let data: DataFile = ingest::load_file(path)?;
        session.attach_file(data);
    }
    Ok(session)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display())),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read payload from stdin")?;
            Ok(text)
        }
    }
}

fn draw(spec: &ChartSpec, options: &RenderOptions, output: Option<&Path>) -> Result<()> {
    let bytes = render_chart(spec, options).context("Failed to render chart")?;
    write_output(&bytes, output)
}

fn write_output(bytes: &[u8], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => fs::write(path, bytes)
            .with_context(|| format!("Failed to write '{}'", path.display())),
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(bytes).context("Failed to write output to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
            Ok(())
        }
    }
}

/// Widget ids as file-name-safe slugs
fn file_slug(id: &str) -> String {
    let slug: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if slug.is_empty() { "widget".to_string() } else { slug }
}

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[derive(Parser, Debug)]
#[command(name = "cfgmorph", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Morph a start config towards an end config and render each frame.
    Run(RunArgs),
    /// Morph through a chain of keyframe configs and render each frame.
    Chain(ChainArgs),
    /// Only check that two configs line up for morphing.
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Start config JSON (theta = 1).
    #[arg(long, default_value = "start.json")]
    start: PathBuf,

    /// End config JSON (theta = 0).
    #[arg(long, default_value = "end.json")]
    end: PathBuf,

    /// Number of frames.
    #[arg(long, default_value_t = 100)]
    frames: usize,

    /// Theta of the first frame.
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    theta_from: f64,

    /// Theta of the last frame.
    #[arg(long, default_value_t = 0.8, allow_negative_numbers = true)]
    theta_to: f64,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Parser, Debug)]
struct ChainArgs {
    /// Keyframe config JSON, in order (repeat for each keyframe).
    #[arg(long = "config", required = true)]
    configs: Vec<PathBuf>,

    /// Frames between consecutive keyframes (repeat once per pair).
    #[arg(long = "steps", required = true)]
    steps: Vec<usize>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Start config JSON.
    #[arg(long, default_value = "start.json")]
    start: PathBuf,

    /// End config JSON.
    #[arg(long, default_value = "end.json")]
    end: PathBuf,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Directory for per-frame configs; image paths inside them point here too.
    #[arg(long, default_value = "morph_movie3")]
    out_dir: PathBuf,

    /// Zero-padding width of frame file names.
    #[arg(long, default_value_t = 3)]
    pad: usize,

    /// Create the output directory if it is missing.
    #[arg(long)]
    create_dir: bool,

    /// Renderer program, run once per frame.
    #[arg(long, default_value = "cargo")]
    program: String,

    /// Renderer argument placed before the frame config path (repeatable).
    #[arg(
        long = "render-arg",
        allow_hyphen_values = true,
        default_values = ["run", "--release", "evaluate"]
    )]
    render_args: Vec<String>,

    /// Working directory for the renderer; image paths resolve against it, and
    /// --create-dir creates the output directory there as well.
    #[arg(long)]
    render_cwd: Option<PathBuf>,

    /// Write frame configs without rendering them.
    #[arg(long)]
    no_render: bool,

    /// Keep rendering after a failed frame; the run still exits with an error.
    #[arg(long)]
    keep_going: bool,

    /// Check each rendered PNG exists and matches image_settings width/height.
    #[arg(long)]
    verify_output: bool,
}

impl OutputArgs {
    fn job(&self) -> cfgmorph::MorphJob {
        cfgmorph::MorphJob {
            naming: cfgmorph::FrameNaming {
                out_dir: self.out_dir.clone(),
                pad: self.pad,
            },
            policy: if self.keep_going {
                cfgmorph::FailurePolicy::Continue
            } else {
                cfgmorph::FailurePolicy::Halt
            },
            create_out_dir: self.create_dir,
            verify_output: self.verify_output && !self.no_render,
        }
    }

    fn renderer(&self) -> Box<dyn cfgmorph::FrameRenderer> {
        if self.no_render {
            return Box::new(cfgmorph::DryRun);
        }
        let mut r =
            cfgmorph::ExternalRenderer::new(&self.program).with_args(self.render_args.clone());
        if let Some(dir) = &self.render_cwd {
            r = r.with_cwd(dir);
        }
        Box::new(r)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cfgmorph=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Chain(args) => cmd_chain(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn read_config(path: &Path) -> anyhow::Result<cfgmorph::SceneConfig> {
    cfgmorph::SceneConfig::from_path(path)
        .with_context(|| format!("load config '{}'", path.display()))
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let start = read_config(&args.start)?;
    let end = read_config(&args.end)?;
    let schedule = cfgmorph::ThetaSchedule::new(args.theta_from, args.theta_to, args.frames)?;

    let job = args.output.job();
    let mut renderer = args.output.renderer();
    let stats = cfgmorph::run_morph(&start, &end, &schedule, &job, renderer.as_mut())
        .context("morph run failed")?
        .into_result()?;

    eprintln!(
        "wrote {} frames to {} ({} rendered)",
        stats.frames_written,
        job.naming.out_dir.display(),
        stats.frames_rendered
    );
    Ok(())
}

fn cmd_chain(args: ChainArgs) -> anyhow::Result<()> {
    let keyframes = args
        .configs
        .iter()
        .map(|p| read_config(p))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let job = args.output.job();
    let mut renderer = args.output.renderer();
    let stats = cfgmorph::run_chain(&keyframes, &args.steps, &job, renderer.as_mut())
        .context("chain run failed")?
        .into_result()?;

    eprintln!(
        "wrote {} frames to {} ({} rendered)",
        stats.frames_written,
        job.naming.out_dir.display(),
        stats.frames_rendered
    );
    Ok(())
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let start = read_config(&args.start)?;
    let end = read_config(&args.end)?;
    start.check_correspondence(&end).with_context(|| {
        format!(
            "'{}' and '{}' do not line up",
            args.start.display(),
            args.end.display()
        )
    })?;

    eprintln!("ok: {} transforms correspond", start.transforms.len());
    Ok(())
}

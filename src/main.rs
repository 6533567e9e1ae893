use std::path::PathBuf;

use anyhow::{Context as _, bail};
use clap::Parser;
use tracing::info;

use fractal_calc::core::data::position_params::N_PARAMS;
use fractal_calc::logging::{DEFAULT_DIRECTIVE, init_logging};
use fractal_calc::{
    BuiltinPlugin, CalcFileController, CalcFileRequest, CalcOptions, ColourStop, ComputationHandle,
    FormulaParam, FormulaParamKind, ImageFileType, ListColourMap, ParameterSpec, PluginLoader,
    PositionParams, file_presenter_factory,
};

#[derive(Parser, Debug)]
#[command(name = "fractal-calc", version, about = "Calculate a fractal image and save it")]
struct Cli {
    /// Formula library exporting `pf_new`. Uses the built-in formula when omitted.
    #[arg(long)]
    formula: Option<PathBuf>,

    /// Library loaded with global symbol visibility before the formula.
    #[arg(long)]
    support_lib: Option<PathBuf>,

    /// Built-in formula used when no `--formula` is given.
    #[arg(long, default_value_t = BuiltinPlugin::Mandelbrot)]
    builtin: BuiltinPlugin,

    /// Formula parameter as `int:N` or `real:X`, in declaration order.
    #[arg(long = "param")]
    params: Vec<FormulaParam>,

    /// Parameter kinds a native formula expects, e.g. `int,real,real`.
    /// Defaults to the kinds of the supplied parameters.
    #[arg(long, value_delimiter = ',')]
    param_spec: Vec<FormulaParamKind>,

    /// Eleven comma separated reals: 4D centre, size and six rotations.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    position: Vec<f64>,

    #[arg(long, default_value_t = 640)]
    width: u32,

    #[arg(long, default_value_t = 480)]
    height: u32,

    #[arg(long, default_value_t = 100)]
    max_iterations: u32,

    /// Worker threads. Defaults to one per hardware thread.
    #[arg(long)]
    threads: Option<usize>,

    /// Debug bitmask: 1 trace bands, 2 stats frame, 4 timing.
    #[arg(long, default_value_t = 0)]
    debug_flags: u32,

    /// Make y grow up the image.
    #[arg(long)]
    y_flip: bool,

    #[arg(long, default_value = "output/mandelbrot.png")]
    output: PathBuf,

    /// Output format, `png` or `ppm`.
    #[arg(long, default_value_t = ImageFileType::Png)]
    format: ImageFileType,

    /// Gradient stop as `pos:r,g,b[,a]`, repeatable.
    #[arg(long = "colour-stop")]
    colour_stops: Vec<ColourStop>,
}

/// Parameters the demo formula library is run with.
fn default_native_params() -> Vec<FormulaParam> {
    vec![
        FormulaParam::Int(0),
        FormulaParam::Real(4.0),
        FormulaParam::Real(0.0),
        FormulaParam::Real(1.0),
        FormulaParam::Real(4.0),
        FormulaParam::Real(0.0),
        FormulaParam::Real(1.0),
    ]
}

fn position(values: &[f64]) -> anyhow::Result<PositionParams> {
    if values.is_empty() {
        return Ok(PositionParams::default());
    }

    let position = PositionParams::from_slice(values)
        .with_context(|| format!("--position needs {N_PARAMS} values"))?;
    position.validate().context("invalid --position")?;
    Ok(position)
}

fn load_handle(cli: &Cli) -> anyhow::Result<(ComputationHandle, Vec<FormulaParam>)> {
    let Some(formula) = &cli.formula else {
        let params = if cli.params.is_empty() {
            cli.builtin.default_params()
        } else {
            cli.params.clone()
        };
        return Ok((cli.builtin.handle(), params));
    };

    let params = if cli.params.is_empty() {
        default_native_params()
    } else {
        cli.params.clone()
    };

    let spec = if cli.param_spec.is_empty() {
        ParameterSpec::from_kinds(&params.iter().map(FormulaParam::kind).collect::<Vec<_>>())
    } else {
        ParameterSpec::from_kinds(&cli.param_spec)
    };

    let mut loader = PluginLoader::new();
    if let Some(support) = &cli.support_lib {
        loader = loader.with_support_library(support);
    }

    let handle = loader
        .load(formula, spec)
        .with_context(|| format!("failed to load formula {}", formula.display()))?;

    Ok((handle, params))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(DEFAULT_DIRECTIVE).context("failed to initialise logging")?;

    let mut options = CalcOptions::builder()
        .max_iterations(cli.max_iterations)
        .debug_bits(cli.debug_flags)
        .y_flip(cli.y_flip);
    if let Some(threads) = cli.threads {
        options = options.thread_count(threads);
    }
    let options = options.build().context("invalid calculation options")?;

    let (handle, params) = load_handle(&cli)?;

    let stops = if cli.colour_stops.is_empty() {
        ListColourMap::default_stops()
    } else {
        cli.colour_stops.clone()
    };

    let request = CalcFileRequest {
        options,
        position: position(&cli.position)?,
        params,
        width: cli.width,
        height: cli.height,
        stops,
    };

    let mut controller = CalcFileController::new(file_presenter_factory(cli.format));
    let summary = controller
        .generate(handle, &request)
        .context("calculation failed")?;

    info!(
        elapsed_ms = summary.elapsed.as_millis() as u64,
        pixels = summary.outcome.stats.pixels,
        "finished with {:?}",
        summary.completion.state
    );

    if !summary.completion.is_done() {
        bail!(
            "calculation ended with {:?} ({:?}), no image written",
            summary.completion.state,
            summary.completion.source
        );
    }

    controller
        .write(&cli.output)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    Ok(())
}

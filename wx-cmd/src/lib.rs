//! Command implementations for the weather forecast CLI.
//!
//! Each subcommand is one stage of the pipeline: download raw observations,
//! turn them into a labelled feature table, then backtest a model on it.

use clap::Subcommand;
use wx_model::ForecasterKind;

pub mod backtest;
pub mod ingest;
pub mod plot;
pub mod preprocess;

#[derive(Subcommand)]
pub enum Command {
    /// Download daily weather history for a place from Open-Meteo
    Ingest {
        /// Free-form place name, e.g. "Austin, US"
        #[arg(short, long)]
        location: String,

        /// First day to fetch (YYYY-MM-DD)
        #[arg(short, long)]
        start: String,

        /// Last day to fetch (YYYY-MM-DD)
        #[arg(short, long)]
        end: String,

        /// Output CSV; defaults to data/raw/{location}_{start}_{end}.csv
        #[arg(short, long)]
        outfile: Option<String>,
    },

    /// Normalize raw observations and write the labelled feature table
    Preprocess {
        /// Raw observation CSV
        #[arg(short, long)]
        input: String,

        /// Processed dataset CSV
        #[arg(short, long)]
        output: String,
    },

    /// Score one model on the test window of a processed dataset
    Backtest {
        /// Processed dataset CSV
        #[arg(short, long)]
        dataset: String,

        /// naive, seasonal_naive, sarima or ridge
        #[arg(short, long, default_value = "sarima")]
        model: ForecasterKind,

        /// Only score the first N days of the test window
        #[arg(long)]
        horizon: Option<usize>,

        /// Metrics log to append to
        #[arg(long, default_value = backtest::DEFAULT_METRICS_OUT)]
        metrics_out: String,

        /// SVG chart of actual vs predicted
        #[arg(long, default_value = backtest::DEFAULT_PLOT_OUT)]
        plot_out: String,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Ingest {
            location,
            start,
            end,
            outfile,
        } => {
            ingest::run_ingest(&location, &start, &end, outfile.as_deref()).await?;
            Ok(())
        }
        Command::Preprocess { input, output } => preprocess::run_preprocess(&input, &output),
        Command::Backtest {
            dataset,
            model,
            horizon,
            metrics_out,
            plot_out,
        } => {
            let options = backtest::BacktestOptions {
                dataset,
                model,
                horizon,
                metrics_out,
                plot_out,
            };
            let metrics = backtest::run_backtest(&options)?;
            println!(
                "{} -> MAE {:.3}  RMSE {:.3}\nSaved plot to {}",
                model, metrics.mae, metrics.rmse, options.plot_out
            );
            Ok(())
        }
    }
}

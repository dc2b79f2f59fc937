use anyhow::{Context, Result};
use chrono::{Days, Local};
use energy_forecaster::{config, forecast, io, telemetry, ForecastPipeline};
use config::Config;
use forecast::{OpenMeteoClient, WeatherSource};
use telemetry::init_tracing;
use tracing::info;

const USAGE: &str = "usage: energy-forecaster [train|forecast|run]";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = Config::load().context("failed to load configuration")?;
    let pipeline = ForecastPipeline::from_config(&cfg);

    let command = std::env::args().nth(1).unwrap_or_else(|| "run".to_string());
    match command.as_str() {
        "train" => run_training(&cfg, &pipeline)?,
        "forecast" => run_forecast(&cfg, &pipeline).await?,
        "run" => {
            run_training(&cfg, &pipeline)?;
            run_forecast(&cfg, &pipeline).await?;
        }
        other => anyhow::bail!("unknown command `{other}`\n{USAGE}"),
    }

    Ok(())
}

fn run_training(cfg: &Config, pipeline: &ForecastPipeline) -> Result<()> {
    let historical = io::load_historical_csv(&cfg.paths.historical_csv).with_context(|| {
        format!(
            "failed to load historical data from {}",
            cfg.paths.historical_csv.display()
        )
    })?;

    let outcome = pipeline.train(&historical).context("training failed")?;
    info!(
        removed = outcome.cleaning.total_removed(),
        kept = outcome.cleaning.output_rows,
        "cleaning summary"
    );
    info!(metrics = %outcome.model.summary.solar_metrics, "solar model");
    info!(metrics = %outcome.model.summary.wind_metrics, "wind model");

    io::save_model(&outcome.model, &cfg.paths.model_file).context("failed to save model")?;
    Ok(())
}

async fn run_forecast(cfg: &Config, pipeline: &ForecastPipeline) -> Result<()> {
    let model = io::load_model(&cfg.paths.model_file).with_context(|| {
        format!("failed to load model from {}", cfg.paths.model_file.display())
    })?;

    let date = Local::now()
        .date_naive()
        .checked_add_days(Days::new(cfg.weather.days_ahead.into()))
        .context("forecast date out of range")?;

    let client = OpenMeteoClient::new(&cfg.weather)?;
    let observations = client
        .hourly_observations(&cfg.site, date, date)
        .await
        .context("failed to fetch weather forecast")?;

    let predictions = pipeline
        .predict(&observations, &model)
        .context("prediction failed")?;

    let out = &cfg.paths.output_dir;
    io::write_predictions_csv(out.join(format!("energy_forecast_{date}.csv")), &predictions)?;
    let files = io::write_daily_summaries(out, &predictions)?;

    info!(%date, hours = predictions.len(), files = files.len(), "forecast complete");
    Ok(())
}

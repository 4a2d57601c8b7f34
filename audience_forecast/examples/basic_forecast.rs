use audience_forecast::models::{ModelType, TrainedForecastModel};
use audience_forecast::{ForecastEngine, ModelingFrame};
use chrono::{Duration, NaiveDate};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Audience Forecast: Basic Forecasting Example");
    println!("============================================\n");

    // Create sample data
    let frame = create_sample_daily_audience()?;
    println!("Sample data created: {} daily points\n", frame.len());

    let mut engine = ForecastEngine::new();
    for model_type in ModelType::ALL {
        let name = engine.train_model(&frame, model_type)?.name().to_string();
        let forecast = engine.forecast_with_intervals(7, 0.95)?;
        let metrics = engine.in_sample_metrics(&frame)?;

        println!("{} ({})", model_type, name);
        println!("  {}", metrics);
        if let Some(intervals) = forecast.intervals() {
            for (i, (value, (lower, upper))) in forecast.values().iter().zip(intervals).enumerate() {
                println!("  Day {}: {:.0} ({:.0}, {:.0})", i + 1, value, lower, upper);
            }
        }
        println!();
    }

    Ok(())
}

/// Daily audience with an upward trend and a weekend bump
fn create_sample_daily_audience() -> Result<ModelingFrame, Box<dyn std::error::Error>> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or("invalid start date")?;

    let mut index = Vec::with_capacity(120);
    let mut audience = Vec::with_capacity(120);
    for day in 0..120 {
        let trend = 1000.0 + day as f64 * 4.0;
        let weekly = if day % 7 >= 5 { 150.0 } else { 0.0 };
        let wiggle = (day as f64 * 0.9).sin() * 25.0;

        index.push(start + Duration::days(day));
        audience.push(trend + weekly + wiggle);
    }

    Ok(ModelingFrame::from_audience(index, audience)?)
}

use assert_approx_eq::assert_approx_eq;
use audience_forecast::data::{DataLoader, Preprocessor};
use audience_forecast::features::FeaturedTable;
use audience_forecast::insights::{audience_heatmap, engagement_trend, overview, platform_comparison};
use audience_forecast::{DashboardConfig, FeatureEngineer, ForecastError};

fn featured(csv: &str) -> FeaturedTable {
    let config = DashboardConfig::default();
    let raw = DataLoader::from_bytes(csv.as_bytes()).unwrap();
    let clean = Preprocessor::new(&config).unwrap().preprocess(&raw).unwrap();
    FeatureEngineer::new(&config).engineer_features(&clean).unwrap()
}

fn sample() -> FeaturedTable {
    featured(
        "Date,AudienceCount,Platform,EngagementRate,ConversionRate,ForecastError\n\
         2024-01-01 09:00:00,100,Web,4.0,2.0,5.0\n\
         2024-01-01 20:00:00,300,Web,6.0,4.0,3.0\n\
         2024-01-01 20:00:00,200,Mobile,2.0,1.0,7.0\n\
         2024-01-06 20:00:00,400,Mobile,4.0,3.0,5.0\n",
    )
}

#[test]
fn test_overview() {
    let o = overview(&sample()).unwrap();
    assert_eq!(o.rows, 4);
    assert_eq!(o.platforms, vec!["Mobile", "Web"]);
    assert_approx_eq!(o.total_audience, 1000.0, 1e-9);
    assert_approx_eq!(o.avg_engagement_rate, 4.0, 1e-9);
    assert_approx_eq!(o.avg_conversion_rate, 2.5, 1e-9);
    assert_approx_eq!(o.forecast_accuracy, 95.0, 1e-9);

    let err = overview(&FeaturedTable::default()).unwrap_err();
    assert!(matches!(err, ForecastError::EmptyData(_)));
}

#[test]
fn test_engagement_trend_by_day() {
    let trend = engagement_trend(&sample());
    assert_eq!(trend.len(), 2);
    assert_approx_eq!(trend[0].engagement_rate, 4.0, 1e-9);
    assert_approx_eq!(trend[0].conversion_rate, 7.0 / 3.0, 1e-9);
    assert_approx_eq!(trend[1].engagement_rate, 4.0, 1e-9);
}

#[test]
fn test_platform_comparison() {
    let platforms = platform_comparison(&sample());
    assert_eq!(platforms.len(), 2);
    assert_eq!(platforms[0].platform, "Mobile");
    assert_approx_eq!(platforms[0].audience_count, 300.0, 1e-9);
    assert_eq!(platforms[1].rows, 2);
    assert_approx_eq!(platforms[1].engagement_rate, 5.0, 1e-9);
}

#[test]
fn test_heatmap_cells() {
    let heatmap = audience_heatmap(&sample());
    assert_eq!(heatmap.hours, vec![9, 20]);
    assert_eq!(heatmap.days, vec!["Monday", "Saturday"]);

    // 20:00 Monday averages Web 300 and Mobile 200
    assert_eq!(heatmap.values[1][0], Some(250.0));
    assert_eq!(heatmap.values[0][1], None);
    assert_eq!(heatmap.values[1][1], Some(400.0));
}

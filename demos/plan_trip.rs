//! Plan a real trip against Google Maps, Open-Meteo and OpenRouter.
//!
//! Needs `GOOGLE_API_KEY` (and optionally `OPENROUTER_API_KEY`) in the
//! environment or a `.env` file.
//!
//! Run with:
//!   cargo run --example plan_trip --features http -- "San Diego, CA" "Irvine, CA" "Food and Drink" "good tacos"

use route_poi::http::{GoogleMapsClient, OpenMeteoClient, OpenRouterClassifier};
use route_poi::services::TagClassifier;
use route_poi::{plan_trip, Config, PreferenceStore, ServiceError, TripRequest, TripServices};

/// Stands in for the classifier when no OpenRouter key is configured.
struct NoClassifier;

#[async_trait::async_trait]
impl TagClassifier for NoClassifier {
    async fn classify_tags(&self, _free_text: &str) -> Result<String, ServiceError> {
        Err(ServiceError::MissingCredential("OpenRouter"))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let start = args.first().cloned().unwrap_or_else(|| "San Diego, CA".to_string());
    let destination = args.get(1).cloned().unwrap_or_else(|| "Irvine, CA".to_string());
    let category = args.get(2).cloned().unwrap_or_else(|| "Food and Drink".to_string());
    let custom_input = args.get(3).cloned();

    let config = Config::try_from_env()?;
    let maps = GoogleMapsClient::new(&config.google_api_key, config.request_timeout())?;
    let weather = OpenMeteoClient::new(config.weather_timeout())?;

    let classifier: Box<dyn TagClassifier> = match OpenRouterClassifier::new(
        &config.openrouter_api_key,
        &config.classifier_model,
        config.classifier_timeout(),
    ) {
        Ok(classifier) => Box::new(classifier),
        Err(e) => {
            log::warn!("Free-text preferences disabled: {}", e);
            Box::new(NoClassifier)
        }
    };

    let mut preferences = PreferenceStore::new(config.classifier_timeout());
    let update = preferences
        .set(
            &[category.as_str()],
            custom_input.as_deref(),
            classifier.as_ref(),
            &mut rand::thread_rng(),
        )
        .await;
    println!("Preferences: {}", serde_json::to_string_pretty(&update)?);

    let request = TripRequest {
        start_address: start,
        destination_address: destination,
        format: Some("json".to_string()),
    };
    let services = TripServices {
        directions: &maps,
        geocoder: &maps,
        nearby: &maps,
        weather: &weather,
    };

    match plan_trip(&request, &preferences, &services, &config.planner_config()).await {
        Ok(plan) => println!("{}", serde_json::to_string_pretty(&plan)?),
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&e.to_body())?);
            std::process::exit(1);
        }
    }

    Ok(())
}

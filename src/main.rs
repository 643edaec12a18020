use planetscale_provider::{init_logging, serve, PlanetScaleProvider};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    serve(PlanetScaleProvider::new()).await
}

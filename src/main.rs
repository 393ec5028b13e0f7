use dotenvy::dotenv;

use pley::config::Config;
use pley::error::ApplicationError;
use pley::logger;

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    dotenv().ok();

    let config = Config::from_env()?;

    let _guard = logger::init(&config)?;

    pley::serve(&config).await
}

mod cli;
mod infra;
mod routes;
mod score;
mod server;

use talent_forge::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}

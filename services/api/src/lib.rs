mod cli;
mod infra;
mod routes;
mod server;

use report_center::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}

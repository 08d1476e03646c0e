use report_center_api::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("report center error: {err}");
        std::process::exit(1);
    }
}

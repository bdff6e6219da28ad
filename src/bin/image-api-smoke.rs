#[tokio::main]
async fn main() {
    if let Err(err) = image_api_smoke::cli::run_from_env().await {
        eprintln!("{}", err.message);
        std::process::exit(err.code);
    }
}

use anyhow::Result;
use fanout_server::{app, core};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    app::init_logging();

    let cli = core::cli::parse();
    let app = app::App::new(cli)?;
    app.run().await
}

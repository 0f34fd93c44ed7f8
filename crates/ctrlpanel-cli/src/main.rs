//! Thin entrypoint delegating to [`ctrlpanel_cli::run`].

#[tokio::main]
async fn main() {
    let exit_code = ctrlpanel_cli::run().await;
    std::process::exit(exit_code);
}

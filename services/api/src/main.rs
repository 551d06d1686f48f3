use kingdom_dkp_api::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("kingdom-dkp error: {err}");
        std::process::exit(1);
    }
}

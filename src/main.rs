#[tokio::main]
async fn main() {
    listing_backend::run().await;
}

#[tokio::main]
async fn main() {
    internly::boot::boot().await;
}

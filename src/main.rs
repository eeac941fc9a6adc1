#[tokio::main]
async fn main() {
    gatherly::run().await;
}

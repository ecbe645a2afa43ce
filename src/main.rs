#[tokio::main]
async fn main() {
    tubelet::start_server().await;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    commute_board_lib::run().await
}

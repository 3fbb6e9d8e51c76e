#[tracing::instrument(name = "[GET] home")]
pub async fn index() -> &'static str {
    "Alive"
}

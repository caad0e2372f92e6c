use axum::response::IntoResponse;

// axum handler for root
pub async fn root() -> impl IntoResponse {
    format!(
        "{} {} ({})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        &crate::GIT_COMMIT_HASH[..crate::GIT_COMMIT_HASH.len().min(7)]
    )
}

use crate::rest::error::RestApiError;
use crate::upstream::Upstream;
use actix_web::get;
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::web::{Data, Path};
use actix_web::HttpResponse;
use tracing::error;

#[get("/parking/{from}/{to}")]
pub async fn get_parking(
    args: Path<(String, String)>,
    upstream: Data<Upstream>,
) -> Result<HttpResponse, RestApiError> {
    let (from, to) = args.into_inner();
    forward(&upstream, &["poi", "parking", &from, &to]).await
}

#[get("/fuelstations/{fuel}/{from}/{to}")]
pub async fn get_fuel_stations(
    args: Path<(String, String, String)>,
    upstream: Data<Upstream>,
) -> Result<HttpResponse, RestApiError> {
    let (fuel, from, to) = args.into_inner();
    forward(&upstream, &["poi", "fuelstations", &fuel, &from, &to]).await
}

#[get("/roadworks/points/{from}/{to}")]
pub async fn get_roadwork_points(
    args: Path<(String, String)>,
    upstream: Data<Upstream>,
) -> Result<HttpResponse, RestApiError> {
    let (from, to) = args.into_inner();
    forward(&upstream, &["poi", "roadworks", "points", &from, &to]).await
}

#[get("/roadworks/lines/{from}/{to}")]
pub async fn get_roadwork_lines(
    args: Path<(String, String)>,
    upstream: Data<Upstream>,
) -> Result<HttpResponse, RestApiError> {
    let (from, to) = args.into_inner();
    forward(&upstream, &["poi", "roadworks", "lines", &from, &to]).await
}

// Upstream status and body go back to the client untouched
async fn forward(upstream: &Upstream, segments: &[&str]) -> Result<HttpResponse, RestApiError> {
    let res = upstream.forward(segments).await.map_err(|e| {
        error!(error = %e, "Proxy request failed");
        RestApiError::proxy(e)
    })?;
    let status = StatusCode::from_u16(res.status)
        .map_err(|_| RestApiError::proxy(format!("Invalid upstream status: {}", res.status)))?;
    Ok(HttpResponse::build(status)
        .content_type(ContentType::json())
        .body(res.body))
}

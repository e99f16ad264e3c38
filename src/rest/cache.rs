use crate::cache::{Cache, CacheDir};
use crate::rest::error::RestApiError;
use actix_files::NamedFile;
use actix_web::get;
use actix_web::web::{Data, Path};
use actix_web::{HttpRequest, HttpResponse};
use std::str::FromStr;

/// Serves a feature file written by the fetcher, byte for byte
#[get("/{dir}/{id}")]
pub async fn get_by_id(
    req: HttpRequest,
    args: Path<(String, String)>,
    cache: Data<Cache>,
) -> Result<HttpResponse, RestApiError> {
    let (dir, id) = args.into_inner();
    let dir = CacheDir::from_str(&dir).map_err(|_| RestApiError::not_found())?;
    let path = cache
        .lookup(dir, &id)
        .ok_or_else(RestApiError::not_found)?;
    let file = NamedFile::open_async(path)
        .await
        .map_err(|_| RestApiError::not_found())?;
    Ok(file.into_response(&req))
}

use crate::cache::Cache;
use crate::conf::Conf;
use crate::rest;
use crate::upstream::Upstream;
use crate::Result;
use actix_files::Files;
use actix_web::dev::Service;
use actix_web::web::{scope, Data, ServiceConfig};
use actix_web::{middleware::Compress, App, HttpServer};
use futures_util::future::FutureExt;
use std::path::PathBuf;
use time::OffsetDateTime;
use tracing::{info, warn};

pub async fn run(conf: Conf) -> Result<()> {
    if !conf.has_token() {
        warn!("MAPTRIP_TOKEN is empty, upstream endpoints will fail");
    }

    // All the worker threads are sharing a single upstream client
    let upstream = Data::new(Upstream::new(&conf.upstream_url, &conf.token)?);
    let cache = Data::new(Cache::new(&conf.data_dir));
    let static_dir = conf.static_dir.clone();
    let port = conf.port()?;

    let server = HttpServer::new(move || {
        App::new()
            .wrap_fn(|req, srv| {
                let req_query_string = req.query_string().to_string();
                let req_method = req.method().as_str().to_string();
                let req_path = req.path().to_string();
                let req_time = OffsetDateTime::now_utc();
                let req_ip = req
                    .connection_info()
                    .realip_remote_addr()
                    .unwrap_or_default()
                    .to_string();
                srv.call(req).map(move |res| {
                    if let Ok(res) = res.as_ref() {
                        let res_status = res.status().as_u16();
                        info!(
                            req_method = req_method.as_str(),
                            req_path = req_path.as_str(),
                            req_query_string = req_query_string.as_str(),
                            req_ip = req_ip.as_str(),
                            res_status,
                            res_time_sec = (OffsetDateTime::now_utc() - req_time).as_seconds_f64(),
                        );
                    }
                    res
                })
            })
            .wrap(Compress::default())
            .configure(configure(
                upstream.clone(),
                cache.clone(),
                static_dir.clone(),
            ))
    })
    .bind((conf.host.as_str(), port))?;

    info!(addrs = ?server.addrs(), "Server listening");

    server.run().await?;

    Ok(())
}

/// Registers shared state and every route. Static files come last, they
/// catch whatever the API routes don't.
pub fn configure(
    upstream: Data<Upstream>,
    cache: Data<Cache>,
    static_dir: PathBuf,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(upstream)
            .app_data(cache)
            .service(rest::health::get)
            .service(
                scope("/api")
                    .service(rest::poi::get_parking)
                    .service(rest::poi::get_fuel_stations)
                    .service(rest::poi::get_roadwork_points)
                    .service(rest::poi::get_roadwork_lines),
            )
            .service(scope("/cache").service(rest::cache::get_by_id))
            .service(Files::new("/", static_dir).index_file("index.html"));
    }
}

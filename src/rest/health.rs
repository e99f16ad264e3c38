use actix_web::get;
use actix_web::web::Json;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Health {
    pub ok: bool,
}

#[get("/health")]
pub async fn get() -> Json<Health> {
    Json(Health { ok: true })
}

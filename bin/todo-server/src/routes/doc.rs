use crate::models::Variant;
use crate::routes::{health, v1};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(info(
    title = "todo-server",
    description = "Per-user task and time-log records",
    version = "0.1.0",
))]
pub struct ApiDoc;

pub fn get_docs(variant: Variant) -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(health::HealthApi::openapi());
    root.merge(v1::api_docs(variant));
    root
}

use actix_web::{delete, get, post, web, HttpRequest, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

/// Health check.
#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().body("OK")
}

/// Creates a post.
///
/// errors:
/// - InvalidArgument: the title is empty
#[post("/posts")]
async fn create_post(req: HttpRequest, body: web::Json<CreatePost>) -> web::Json<Post> {
    todo!()
}

/// Deletes a post.
///
/// path params:
/// - post_id: the post to delete
#[api(auth)]
#[delete("/posts/{post_id}")]
async fn delete_post(path: web::Path<u64>) -> HttpResponse {
    HttpResponse::NoContent().finish()
}

#[derive(Deserialize)]
pub struct CreatePost {
    pub title: String,
    pub body: String,
}

#[derive(Serialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
}

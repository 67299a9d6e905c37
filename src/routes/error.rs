use rocket::serde::Serialize;
use rocket::serde::json::Json;
use rocket::{Request, catch};

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct Error {
    pub message: String,
}

#[catch(400)]
pub fn bad_request(_: &Request) -> Json<Error> {
    Json(Error {
        message: "Bad request".to_string(),
    })
}

#[catch(401)]
pub fn unauthorized(_: &Request) -> Json<Error> {
    Json(Error {
        message: "Authentication required".to_string(),
    })
}

#[catch(404)]
pub fn not_found(_: &Request) -> Json<Error> {
    Json(Error {
        message: "Not found".to_string(),
    })
}

#[catch(422)]
pub fn unprocessable_entity(_: &Request) -> Json<Error> {
    Json(Error {
        message: "Malformed request body".to_string(),
    })
}

#[catch(500)]
pub fn internal_server_error(_: &Request) -> Json<Error> {
    Json(Error {
        message: "Internal server error".to_string(),
    })
}
